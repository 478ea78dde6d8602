//! Project handlers: listing, progress milestones, and delivery
//! confirmation.

use atelie_core::error::CoreError;
use atelie_core::project::{status_for_milestone, validate_milestone};
use atelie_core::schedule::{self, ScheduleStatus};
use atelie_core::types::DbId;
use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;

use atelie_db::models::project::{DeliveryConfirmation, ProgressRequest, Project};
use atelie_db::repositories::{BudgetRepo, ProjectRepo, ScheduleRepo};
use atelie_events::bus::{self, PlatformEvent};

use crate::error::{AppError, AppResult};
use crate::handlers::{record_audit, spawn_email, whatsapp_link};
use crate::middleware::rbac::{RequireAuth, RequireProjectManager};
use crate::query::{clamp_limit, clamp_offset, StatusFilterParams};
use crate::response::DataResponse;
use crate::state::AppState;

/// Response payload for a progress update: the refreshed project plus the
/// prepared client message.
#[derive(Debug, Serialize)]
pub struct ProgressUpdated {
    pub project: Project,
    /// Prepared WhatsApp deep link; never auto-sent.
    pub whatsapp_link: Option<String>,
}

/// GET /api/v1/projects
pub async fn list_projects(
    _user: RequireAuth,
    State(state): State<AppState>,
    Query(params): Query<StatusFilterParams>,
) -> AppResult<impl IntoResponse> {
    let limit = clamp_limit(params.limit, 50, 200);
    let offset = clamp_offset(params.offset);
    let projects = ProjectRepo::list(&state.pool, params.status.as_deref(), limit, offset).await?;
    Ok(Json(DataResponse { data: projects }))
}

/// GET /api/v1/projects/{id}
pub async fn get_project(
    _user: RequireAuth,
    State(state): State<AppState>,
    Path(project_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let project = ProjectRepo::find_by_id(&state.pool, project_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Project",
            id: project_id,
        }))?;
    Ok(Json(DataResponse { data: project }))
}

/// PUT /api/v1/projects/{id}/progress
///
/// Set a progress milestone (20/50/70/100) and notify the client. Updates
/// are last-writer-wins; the only hard gate is milestone membership.
pub async fn update_progress(
    RequireProjectManager(user): RequireProjectManager,
    State(state): State<AppState>,
    Path(project_id): Path<DbId>,
    Json(input): Json<ProgressRequest>,
) -> AppResult<impl IntoResponse> {
    validate_milestone(input.progress).map_err(|e| AppError::Core(CoreError::Validation(e)))?;
    let status = status_for_milestone(input.progress)
        .map_err(|e| AppError::Core(CoreError::Validation(e)))?;

    let project = ProjectRepo::set_progress(&state.pool, project_id, input.progress, status.as_str())
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Project",
            id: project_id,
        }))?;

    // Client contact lives on the originating budget.
    let budget = BudgetRepo::find_by_project(&state.pool, project_id).await?;
    let message = format!(
        "Seu projeto \"{}\" chegou a {}% de progresso!",
        project.name, input.progress
    );
    let whatsapp = budget.as_ref().and_then(|b| {
        b.client_phone
            .as_deref()
            .map(|phone| whatsapp_link(phone, &message))
    });
    if let Some(ref budget) = budget {
        spawn_email(
            &state,
            budget.client_email.clone(),
            format!("Atualização do projeto — {}%", input.progress),
            format!("Olá {},\n\n{}\n", budget.client_name, message),
        );
    }

    state.event_bus.publish(
        PlatformEvent::new(bus::PROJECT_PROGRESS)
            .with_source("project", project.id)
            .with_actor(user.user_id)
            .with_payload(serde_json::json!({ "progress": input.progress })),
    );
    record_audit(
        &state,
        Some(user.user_id),
        "project.progress",
        "project",
        project.id,
        serde_json::json!({ "progress": input.progress }),
    )
    .await;

    tracing::info!(project_id, progress = input.progress, user_id = user.user_id, "Project progress updated");
    Ok(Json(DataResponse {
        data: ProgressUpdated {
            project,
            whatsapp_link: whatsapp,
        },
    }))
}

/// POST /api/v1/projects/{id}/delivery-confirmation
///
/// Confirm or fail the delivery appointment. Success finishes the project
/// and completes the budget; failure appends the reason to the schedule
/// notes, parks the appointment for re-booking, and rolls the budget back
/// to `final_payment_paid`.
pub async fn confirm_delivery(
    RequireProjectManager(user): RequireProjectManager,
    State(state): State<AppState>,
    Path(project_id): Path<DbId>,
    Json(input): Json<DeliveryConfirmation>,
) -> AppResult<impl IntoResponse> {
    let failure_note = if input.success {
        None
    } else {
        Some(
            input
                .failure_reason
                .as_deref()
                .map(str::trim)
                .filter(|r| !r.is_empty())
                .ok_or_else(|| {
                    AppError::Core(CoreError::Validation(
                        "failure_reason is required when success is false".into(),
                    ))
                })?,
        )
    };

    let existing = ScheduleRepo::find_by_project(&state.pool, project_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Schedule",
            id: project_id,
        }))?;

    let current = ScheduleStatus::parse(&existing.status).map_err(AppError::InternalError)?;
    let target = if input.success {
        ScheduleStatus::Completed
    } else {
        ScheduleStatus::PendingReschedule
    };
    schedule::validate_transition(current, target)
        .map_err(|e| AppError::Core(CoreError::Conflict(e)))?;

    let outcome = ScheduleRepo::confirm_delivery(&state.pool, project_id, input.success, failure_note)
        .await?
        .ok_or_else(|| {
            AppError::Core(CoreError::Conflict(
                "Delivery was confirmed concurrently".into(),
            ))
        })?;

    let event_type = if input.success {
        bus::DELIVERY_COMPLETED
    } else {
        bus::DELIVERY_FAILED
    };
    state.event_bus.publish(
        PlatformEvent::new(event_type)
            .with_source("project", project_id)
            .with_actor(user.user_id)
            .with_payload(serde_json::json!({ "failure_reason": failure_note })),
    );
    record_audit(
        &state,
        Some(user.user_id),
        if input.success { "delivery.complete" } else { "delivery.fail" },
        "project",
        project_id,
        serde_json::json!({ "success": input.success, "failure_reason": failure_note }),
    )
    .await;

    tracing::info!(
        project_id,
        success = input.success,
        user_id = user.user_id,
        "Delivery confirmation recorded"
    );
    Ok(Json(DataResponse { data: outcome.schedule }))
}
