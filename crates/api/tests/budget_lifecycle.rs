//! Integration tests for the budget lifecycle: intake, proposal,
//! approval token, staff decisions, payment links, and settlement.

mod common;

use axum::http::StatusCode;
use serde_json::json;
use sqlx::PgPool;

use atelie_db::repositories::{BudgetRepo, PaymentRepo, ProjectRepo};

/// Pull the opaque token out of a `/approval/{token}` URL.
fn token_from_url(url: &str) -> String {
    url.rsplit('/').next().expect("token segment").to_string()
}

// ---------------------------------------------------------------------------
// Intake
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn intake_creates_pending_budget(pool: PgPool) {
    let app = common::build_test_app(pool);

    let response = common::post_json(
        app,
        "/api/v1/budgets",
        json!({
            "client_name": "Ana Souza",
            "client_email": "ana@example.com",
            "client_phone": "+55 11 98765-4321",
            "project_type": "website institucional",
            "complexity": "media",
            "timeline": "8 semanas"
        }),
    )
    .await;

    let body = common::assert_status(response, StatusCode::CREATED).await;
    assert_eq!(body["data"]["status"], "pending");
    assert_eq!(body["data"]["client_name"], "Ana Souza");
    // The token is a capability and must never appear in API output.
    assert!(body["data"].get("approval_token").is_none());
}

#[sqlx::test(migrations = "../db/migrations")]
async fn intake_rejects_missing_fields(pool: PgPool) {
    let app = common::build_test_app(pool);

    let response = common::post_json(
        app.clone(),
        "/api/v1/budgets",
        json!({ "client_name": "Ana", "client_email": "ana@example.com", "project_type": "" }),
    )
    .await;
    common::assert_status(response, StatusCode::BAD_REQUEST).await;

    let response = common::post_json(
        app,
        "/api/v1/budgets",
        json!({ "client_name": "Ana", "client_email": "not-an-email", "project_type": "site" }),
    )
    .await;
    common::assert_status(response, StatusCode::BAD_REQUEST).await;
}

// ---------------------------------------------------------------------------
// Authorization gate
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn plain_team_member_cannot_send_proposal(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    let (_, member_token) = common::seed_team_member(&pool).await;

    let response = common::post_json(
        app.clone(),
        "/api/v1/budgets",
        json!({ "client_name": "Ana", "client_email": "ana@example.com", "project_type": "site" }),
    )
    .await;
    let body = common::assert_status(response, StatusCode::CREATED).await;
    let budget_id = body["data"]["id"].as_i64().unwrap();

    let response = common::post_auth(
        app,
        &format!("/api/v1/budgets/{budget_id}/send"),
        &member_token,
    )
    .await;
    common::assert_status(response, StatusCode::FORBIDDEN).await;
}

// ---------------------------------------------------------------------------
// Scenario: full lifecycle, B1 with finalValue 10000.00
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn down_payment_settlement_creates_exactly_one_project(pool: PgPool) {
    let (app, gateway) = common::build_test_app_with_gateway(pool.clone());
    let (_, pm_token) = common::seed_project_manager(&pool).await;

    // Intake.
    let response = common::post_json(
        app.clone(),
        "/api/v1/budgets",
        json!({
            "client_name": "Ana Souza",
            "client_email": "ana@example.com",
            "client_document": "123.456.789-09",
            "project_type": "ecommerce"
        }),
    )
    .await;
    let body = common::assert_status(response, StatusCode::CREATED).await;
    let budget_id = body["data"]["id"].as_i64().unwrap();

    // Staff price the proposal: R$ 10000,00.
    let response = common::put_json_auth(
        app.clone(),
        &format!("/api/v1/budgets/{budget_id}"),
        json!({ "final_value": 1_000_000 }),
        &pm_token,
    )
    .await;
    common::assert_status(response, StatusCode::OK).await;

    // Send the proposal and capture the approval link.
    let response = common::post_auth(
        app.clone(),
        &format!("/api/v1/budgets/{budget_id}/send"),
        &pm_token,
    )
    .await;
    let body = common::assert_status(response, StatusCode::OK).await;
    assert_eq!(body["data"]["budget"]["status"], "sent");
    let token = token_from_url(body["data"]["approval_url"].as_str().unwrap());

    // Client accepts via the token.
    let response = common::put_json(
        app.clone(),
        &format!("/api/v1/approval/{token}"),
        json!({ "response": "accept" }),
    )
    .await;
    let body = common::assert_status(response, StatusCode::OK).await;
    assert_eq!(body["data"]["status"], "accepted");
    assert!(body["data"]["user_approved_at"].is_string());

    // Down-payment link: exactly 25% of 10000.00.
    let response = common::post_auth(
        app.clone(),
        &format!("/api/v1/budgets/{budget_id}/payments/down-payment"),
        &pm_token,
    )
    .await;
    let body = common::assert_status(response, StatusCode::CREATED).await;
    assert_eq!(body["data"]["payment"]["amount"], 250_000);
    assert_eq!(body["data"]["payment"]["status"], "pending");
    assert!(body["data"]["payment"]["project_id"].is_null());
    assert!(body["data"]["checkout_url"].is_string());
    assert_eq!(gateway.calls.lock().unwrap().len(), 1);

    // Gateway reports the checkout as completed.
    let response =
        common::post_settlement_event(app.clone(), "evt_dp_1", budget_id, "down_payment").await;
    common::assert_status(response, StatusCode::OK).await;

    // Settlement effects: payment paid, budget advanced, one project
    // created and linked from both sides.
    let payment = PaymentRepo::find_by_budget_and_type(&pool, budget_id, "down_payment")
        .await
        .unwrap()
        .expect("payment exists");
    assert_eq!(payment.status, "paid");
    assert!(payment.paid_at.is_some());

    let budget = BudgetRepo::find_by_id(&pool, budget_id)
        .await
        .unwrap()
        .expect("budget exists");
    assert_eq!(budget.status, "down_payment_paid");
    let project_id = budget.project_id.expect("project linked");
    assert_eq!(payment.project_id, Some(project_id));

    let project = ProjectRepo::find_by_id(&pool, project_id)
        .await
        .unwrap()
        .expect("project exists");
    assert_eq!(project.status, "planning");
    assert_eq!(project.progress, 0);
    assert_eq!(project.budget_value, 1_000_000);
    assert_eq!(project.client_name, "Ana Souza");

    // Replay the same event: no second project, nothing double-applied.
    let response =
        common::post_settlement_event(app.clone(), "evt_dp_1", budget_id, "down_payment").await;
    common::assert_status(response, StatusCode::OK).await;

    let budget = BudgetRepo::find_by_id(&pool, budget_id).await.unwrap().unwrap();
    assert_eq!(budget.project_id, Some(project_id), "replay must not re-link");
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM projects")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(count, 1, "replay must not create a second project");

    // A new link request after settlement is a no-op success.
    let response = common::post_auth(
        app,
        &format!("/api/v1/budgets/{budget_id}/payments/down-payment"),
        &pm_token,
    )
    .await;
    let body = common::assert_status(response, StatusCode::OK).await;
    assert!(body["data"]["checkout_url"].is_null());
    assert_eq!(gateway.calls.lock().unwrap().len(), 1, "no second gateway call");
}

// ---------------------------------------------------------------------------
// Approval token: single use, expiry, replacement
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn approval_token_is_single_use(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    let (_, pm_token) = common::seed_project_manager(&pool).await;

    let response = common::post_json(
        app.clone(),
        "/api/v1/budgets",
        json!({ "client_name": "Ana", "client_email": "ana@example.com", "project_type": "site" }),
    )
    .await;
    let body = common::assert_status(response, StatusCode::CREATED).await;
    let budget_id = body["data"]["id"].as_i64().unwrap();

    let response = common::post_auth(
        app.clone(),
        &format!("/api/v1/budgets/{budget_id}/send"),
        &pm_token,
    )
    .await;
    let body = common::assert_status(response, StatusCode::OK).await;
    let token = token_from_url(body["data"]["approval_url"].as_str().unwrap());

    // First use succeeds.
    let response = common::put_json(
        app.clone(),
        &format!("/api/v1/approval/{token}"),
        json!({ "response": "accept" }),
    )
    .await;
    common::assert_status(response, StatusCode::OK).await;

    // Second use of the same link conflicts.
    let response = common::put_json(
        app,
        &format!("/api/v1/approval/{token}"),
        json!({ "response": "accept" }),
    )
    .await;
    common::assert_status(response, StatusCode::CONFLICT).await;
}

#[sqlx::test(migrations = "../db/migrations")]
async fn expired_token_is_rejected_even_if_unused(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    let (_, pm_token) = common::seed_project_manager(&pool).await;

    let response = common::post_json(
        app.clone(),
        "/api/v1/budgets",
        json!({ "client_name": "Ana", "client_email": "ana@example.com", "project_type": "site" }),
    )
    .await;
    let body = common::assert_status(response, StatusCode::CREATED).await;
    let budget_id = body["data"]["id"].as_i64().unwrap();

    let response = common::post_auth(
        app.clone(),
        &format!("/api/v1/budgets/{budget_id}/send"),
        &pm_token,
    )
    .await;
    let body = common::assert_status(response, StatusCode::OK).await;
    let token = token_from_url(body["data"]["approval_url"].as_str().unwrap());

    // Age the token past its window.
    sqlx::query("UPDATE budgets SET approval_token_expires = NOW() - INTERVAL '1 hour' WHERE id = $1")
        .bind(budget_id)
        .execute(&pool)
        .await
        .unwrap();

    let response = common::put_json(
        app,
        &format!("/api/v1/approval/{token}"),
        json!({ "response": "accept" }),
    )
    .await;
    common::assert_status(response, StatusCode::BAD_REQUEST).await;

    // The budget stays undecided.
    let budget = BudgetRepo::find_by_id(&pool, budget_id).await.unwrap().unwrap();
    assert_eq!(budget.status, "sent");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn resending_invalidates_previous_token(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    let (_, pm_token) = common::seed_project_manager(&pool).await;

    let response = common::post_json(
        app.clone(),
        "/api/v1/budgets",
        json!({ "client_name": "Ana", "client_email": "ana@example.com", "project_type": "site" }),
    )
    .await;
    let body = common::assert_status(response, StatusCode::CREATED).await;
    let budget_id = body["data"]["id"].as_i64().unwrap();

    let send_uri = format!("/api/v1/budgets/{budget_id}/send");
    let response = common::post_auth(app.clone(), &send_uri, &pm_token).await;
    let body = common::assert_status(response, StatusCode::OK).await;
    let first_token = token_from_url(body["data"]["approval_url"].as_str().unwrap());

    let response = common::post_auth(app.clone(), &send_uri, &pm_token).await;
    let body = common::assert_status(response, StatusCode::OK).await;
    let second_token = token_from_url(body["data"]["approval_url"].as_str().unwrap());
    assert_ne!(first_token, second_token);

    // The old link fails closed.
    let response = common::put_json(
        app.clone(),
        &format!("/api/v1/approval/{first_token}"),
        json!({ "response": "accept" }),
    )
    .await;
    common::assert_status(response, StatusCode::CONFLICT).await;

    // The fresh link works.
    let response = common::put_json(
        app,
        &format!("/api/v1/approval/{second_token}"),
        json!({ "response": "accept" }),
    )
    .await;
    common::assert_status(response, StatusCode::OK).await;
}

// ---------------------------------------------------------------------------
// Staff decisions: mutual exclusion, last-write-wins
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn staff_decline_after_accept_clears_acceptance(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    let (pm_a, token_a) = common::seed_project_manager(&pool).await;
    let (admin_b, token_b) = common::seed_admin(&pool).await;

    let response = common::post_json(
        app.clone(),
        "/api/v1/budgets",
        json!({ "client_name": "Ana", "client_email": "ana@example.com", "project_type": "site" }),
    )
    .await;
    let body = common::assert_status(response, StatusCode::CREATED).await;
    let budget_id = body["data"]["id"].as_i64().unwrap();

    // Staff A accepts.
    let response = common::post_auth(
        app.clone(),
        &format!("/api/v1/budgets/{budget_id}/accept"),
        &token_a,
    )
    .await;
    let body = common::assert_status(response, StatusCode::OK).await;
    assert_eq!(body["data"]["accepted_by"], pm_a.id);
    assert!(body["data"]["declined_by"].is_null());

    // Staff B declines afterwards. Current design is last-write-wins: the
    // decline succeeds and clears A's acceptance. Whether this race should
    // instead be rejected is an open product question.
    let response = common::post_json_auth(
        app,
        &format!("/api/v1/budgets/{budget_id}/decline"),
        json!({ "reason": "cliente desistiu" }),
        &token_b,
    )
    .await;
    let body = common::assert_status(response, StatusCode::OK).await;
    assert_eq!(body["data"]["status"], "rejected");
    assert_eq!(body["data"]["declined_by"], admin_b.id);
    assert!(body["data"]["accepted_by"].is_null(), "acceptance must be cleared");
    assert!(body["data"]["accepted_at"].is_null());

    // Invariant either way: never both sides set.
    let budget = BudgetRepo::find_by_id(&pool, budget_id).await.unwrap().unwrap();
    assert!(budget.accepted_by.is_none() || budget.declined_by.is_none());
}

#[sqlx::test(migrations = "../db/migrations")]
async fn decline_requires_reason(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    let (_, pm_token) = common::seed_project_manager(&pool).await;

    let response = common::post_json(
        app.clone(),
        "/api/v1/budgets",
        json!({ "client_name": "Ana", "client_email": "ana@example.com", "project_type": "site" }),
    )
    .await;
    let body = common::assert_status(response, StatusCode::CREATED).await;
    let budget_id = body["data"]["id"].as_i64().unwrap();

    let response = common::post_json_auth(
        app,
        &format!("/api/v1/budgets/{budget_id}/decline"),
        json!({}),
        &pm_token,
    )
    .await;
    common::assert_status(response, StatusCode::BAD_REQUEST).await;
}

// ---------------------------------------------------------------------------
// Soft delete
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn budget_delete_requires_reason_and_is_soft(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    let (_, pm_token) = common::seed_project_manager(&pool).await;

    let response = common::post_json(
        app.clone(),
        "/api/v1/budgets",
        json!({ "client_name": "Ana", "client_email": "ana@example.com", "project_type": "site" }),
    )
    .await;
    let body = common::assert_status(response, StatusCode::CREATED).await;
    let budget_id = body["data"]["id"].as_i64().unwrap();

    // No reason: rejected.
    let response = common::request_delete(
        app.clone(),
        &format!("/api/v1/budgets/{budget_id}"),
        json!({ "reason": "  " }),
        &pm_token,
    )
    .await;
    common::assert_status(response, StatusCode::BAD_REQUEST).await;

    // With a reason: soft-deleted, row retained.
    let response = common::request_delete(
        app.clone(),
        &format!("/api/v1/budgets/{budget_id}"),
        json!({ "reason": "duplicado" }),
        &pm_token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = common::get_auth(app, &format!("/api/v1/budgets/{budget_id}"), &pm_token).await;
    common::assert_status(response, StatusCode::NOT_FOUND).await;

    let (deleted_at, reason): (Option<chrono::DateTime<chrono::Utc>>, Option<String>) =
        sqlx::query_as("SELECT deleted_at, deletion_reason FROM budgets WHERE id = $1")
            .bind(budget_id)
            .fetch_one(&pool)
            .await
            .unwrap();
    assert!(deleted_at.is_some());
    assert_eq!(reason.as_deref(), Some("duplicado"));
}
