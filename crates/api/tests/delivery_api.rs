//! Integration tests for scheduling, delivery confirmation, progress
//! milestones, and evaluations.

mod common;

use axum::http::StatusCode;
use axum::Router;
use serde_json::json;
use sqlx::PgPool;

use atelie_core::types::DbId;
use atelie_db::repositories::{BudgetRepo, ProjectRepo, ScheduleRepo};

/// Drive a budget through intake → accept → both settlements, returning
/// `(budget_id, project_id)`.
async fn seed_paid_project(app: &Router, pool: &PgPool, pm_token: &str) -> (DbId, DbId) {
    let response = common::post_json(
        app.clone(),
        "/api/v1/budgets",
        json!({ "client_name": "Ana", "client_email": "ana@example.com", "project_type": "site" }),
    )
    .await;
    let body = common::assert_status(response, StatusCode::CREATED).await;
    let budget_id = body["data"]["id"].as_i64().unwrap();

    let response = common::put_json_auth(
        app.clone(),
        &format!("/api/v1/budgets/{budget_id}"),
        json!({ "final_value": 400_000 }),
        pm_token,
    )
    .await;
    common::assert_status(response, StatusCode::OK).await;

    let response = common::post_auth(
        app.clone(),
        &format!("/api/v1/budgets/{budget_id}/accept"),
        pm_token,
    )
    .await;
    common::assert_status(response, StatusCode::OK).await;

    let response =
        common::post_settlement_event(app.clone(), "evt_dp", budget_id, "down_payment").await;
    common::assert_status(response, StatusCode::OK).await;
    let response =
        common::post_settlement_event(app.clone(), "evt_fp", budget_id, "final_payment").await;
    common::assert_status(response, StatusCode::OK).await;

    let budget = BudgetRepo::find_by_id(pool, budget_id).await.unwrap().unwrap();
    assert_eq!(budget.status, "final_payment_paid");
    (budget_id, budget.project_id.expect("project created"))
}

// ---------------------------------------------------------------------------
// Delivery confirmation
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn failed_delivery_appends_reason_and_rolls_back(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    let (_, pm_token) = common::seed_project_manager(&pool).await;
    let (budget_id, project_id) = seed_paid_project(&app, &pool, &pm_token).await;

    // Book the delivery.
    let response = common::post_json_auth(
        app.clone(),
        &format!("/api/v1/projects/{project_id}/schedule"),
        json!({ "date": "2026-09-01", "time": "14:00", "meeting_type": "handover" }),
        &pm_token,
    )
    .await;
    common::assert_status(response, StatusCode::CREATED).await;

    // Failure without a reason is rejected.
    let response = common::post_json_auth(
        app.clone(),
        &format!("/api/v1/projects/{project_id}/delivery-confirmation"),
        json!({ "success": false }),
        &pm_token,
    )
    .await;
    common::assert_status(response, StatusCode::BAD_REQUEST).await;

    // First failure.
    let response = common::post_json_auth(
        app.clone(),
        &format!("/api/v1/projects/{project_id}/delivery-confirmation"),
        json!({ "success": false, "failure_reason": "cliente ausente" }),
        &pm_token,
    )
    .await;
    let body = common::assert_status(response, StatusCode::OK).await;
    assert_eq!(body["data"]["status"], "pending_reschedule");
    assert_eq!(body["data"]["notes"], "cliente ausente");

    // The project is never finished by a failed delivery and the budget
    // rolls back to final_payment_paid.
    let project = ProjectRepo::find_by_id(&pool, project_id).await.unwrap().unwrap();
    assert_ne!(project.status, "finished");
    assert!(project.completed_at.is_none());
    let budget = BudgetRepo::find_by_id(&pool, budget_id).await.unwrap().unwrap();
    assert_eq!(budget.status, "final_payment_paid");

    // Re-book and fail again: the second reason is appended, not replacing.
    let response = common::put_json_auth(
        app.clone(),
        &format!("/api/v1/projects/{project_id}/schedule"),
        json!({ "date": "2026-09-08", "time": "10:00", "meeting_type": "handover" }),
        &pm_token,
    )
    .await;
    let body = common::assert_status(response, StatusCode::OK).await;
    assert_eq!(body["data"]["status"], "scheduled");

    let response = common::post_json_auth(
        app.clone(),
        &format!("/api/v1/projects/{project_id}/delivery-confirmation"),
        json!({ "success": false, "failure_reason": "sem energia no local" }),
        &pm_token,
    )
    .await;
    let body = common::assert_status(response, StatusCode::OK).await;
    assert_eq!(body["data"]["notes"], "cliente ausente\nsem energia no local");

    // Re-book and deliver successfully.
    let response = common::put_json_auth(
        app.clone(),
        &format!("/api/v1/projects/{project_id}/schedule"),
        json!({ "date": "2026-09-15", "time": "10:00", "meeting_type": "handover" }),
        &pm_token,
    )
    .await;
    common::assert_status(response, StatusCode::OK).await;

    let response = common::post_json_auth(
        app.clone(),
        &format!("/api/v1/projects/{project_id}/delivery-confirmation"),
        json!({ "success": true }),
        &pm_token,
    )
    .await;
    let body = common::assert_status(response, StatusCode::OK).await;
    assert_eq!(body["data"]["status"], "completed");

    let project = ProjectRepo::find_by_id(&pool, project_id).await.unwrap().unwrap();
    assert_eq!(project.status, "finished");
    assert!(project.completed_at.is_some());
    let budget = BudgetRepo::find_by_id(&pool, budget_id).await.unwrap().unwrap();
    assert_eq!(budget.status, "completed");

    // A completed delivery cannot be confirmed again.
    let response = common::post_json_auth(
        app,
        &format!("/api/v1/projects/{project_id}/delivery-confirmation"),
        json!({ "success": true }),
        &pm_token,
    )
    .await;
    common::assert_status(response, StatusCode::CONFLICT).await;

    // The failure notes survive on the completed appointment.
    let schedule = ScheduleRepo::find_by_project(&pool, project_id).await.unwrap().unwrap();
    assert_eq!(
        schedule.notes.as_deref(),
        Some("cliente ausente\nsem energia no local")
    );
}

#[sqlx::test(migrations = "../db/migrations")]
async fn one_schedule_per_project(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    let (_, pm_token) = common::seed_project_manager(&pool).await;
    let (_, project_id) = seed_paid_project(&app, &pool, &pm_token).await;

    let body = json!({ "date": "2026-09-01", "time": "14:00", "meeting_type": "handover" });
    let response = common::post_json_auth(
        app.clone(),
        &format!("/api/v1/projects/{project_id}/schedule"),
        body.clone(),
        &pm_token,
    )
    .await;
    common::assert_status(response, StatusCode::CREATED).await;

    let response = common::post_json_auth(
        app,
        &format!("/api/v1/projects/{project_id}/schedule"),
        body,
        &pm_token,
    )
    .await;
    common::assert_status(response, StatusCode::CONFLICT).await;
}

// ---------------------------------------------------------------------------
// Progress milestones
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn progress_updates_gate_on_milestones(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    let (_, pm_token) = common::seed_project_manager(&pool).await;
    let (_, project_id) = seed_paid_project(&app, &pool, &pm_token).await;

    // Off-milestone values are rejected.
    let response = common::put_json_auth(
        app.clone(),
        &format!("/api/v1/projects/{project_id}/progress"),
        json!({ "progress": 33 }),
        &pm_token,
    )
    .await;
    common::assert_status(response, StatusCode::BAD_REQUEST).await;

    // A milestone sets progress and the matching status.
    let response = common::put_json_auth(
        app.clone(),
        &format!("/api/v1/projects/{project_id}/progress"),
        json!({ "progress": 50 }),
        &pm_token,
    )
    .await;
    let body = common::assert_status(response, StatusCode::OK).await;
    assert_eq!(body["data"]["project"]["progress"], 50);
    assert_eq!(body["data"]["project"]["status"], "development_50");

    // Re-sending the same milestone is a harmless no-op.
    let response = common::put_json_auth(
        app,
        &format!("/api/v1/projects/{project_id}/progress"),
        json!({ "progress": 50 }),
        &pm_token,
    )
    .await;
    let body = common::assert_status(response, StatusCode::OK).await;
    assert_eq!(body["data"]["project"]["progress"], 50);
}

// ---------------------------------------------------------------------------
// Evaluations
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn duplicate_evaluation_conflicts(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    let (_, pm_token) = common::seed_project_manager(&pool).await;
    let (member, member_token) = common::seed_team_member(&pool).await;
    let (_, project_id) = seed_paid_project(&app, &pool, &pm_token).await;

    let body = json!({ "target_id": member.id, "kind": "team_member", "rating": 4 });
    let response = common::post_json_auth(
        app.clone(),
        &format!("/api/v1/projects/{project_id}/evaluations"),
        body.clone(),
        &member_token,
    )
    .await;
    common::assert_status(response, StatusCode::CREATED).await;

    // Same evaluator, target, project, kind: "already evaluated".
    let response = common::post_json_auth(
        app.clone(),
        &format!("/api/v1/projects/{project_id}/evaluations"),
        body,
        &member_token,
    )
    .await;
    common::assert_status(response, StatusCode::CONFLICT).await;

    // Out-of-range rating is rejected up front.
    let response = common::post_json_auth(
        app,
        &format!("/api/v1/projects/{project_id}/evaluations"),
        json!({ "target_id": member.id, "kind": "project", "rating": 6 }),
        &member_token,
    )
    .await;
    common::assert_status(response, StatusCode::BAD_REQUEST).await;
}
