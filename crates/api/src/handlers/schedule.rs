//! Delivery schedule handlers: booking and re-booking.

use atelie_core::error::CoreError;
use atelie_core::types::DbId;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;

use atelie_db::models::schedule::CreateSchedule;
use atelie_db::repositories::{ProjectRepo, ScheduleRepo};

use crate::error::{AppError, AppResult};
use crate::handlers::record_audit;
use crate::middleware::rbac::{RequireAuth, RequireProjectManager};
use crate::response::DataResponse;
use crate::state::AppState;

/// POST /api/v1/projects/{id}/schedule
///
/// Book the delivery appointment. One appointment per project; a second
/// booking is rejected by the unique constraint with a conflict.
pub async fn create_schedule(
    RequireProjectManager(user): RequireProjectManager,
    State(state): State<AppState>,
    Path(project_id): Path<DbId>,
    Json(input): Json<CreateSchedule>,
) -> AppResult<impl IntoResponse> {
    if input.time.trim().is_empty() || input.meeting_type.trim().is_empty() {
        return Err(AppError::Core(CoreError::Validation(
            "time and meeting_type must not be empty".into(),
        )));
    }

    ProjectRepo::find_by_id(&state.pool, project_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Project",
            id: project_id,
        }))?;

    let schedule = ScheduleRepo::create(
        &state.pool,
        project_id,
        input.date,
        input.time.trim(),
        input.meeting_type.trim(),
    )
    .await?;

    record_audit(
        &state,
        Some(user.user_id),
        "schedule.create",
        "schedule",
        schedule.id,
        serde_json::json!({ "project_id": project_id, "date": input.date }),
    )
    .await;

    tracing::info!(project_id, schedule_id = schedule.id, user_id = user.user_id, "Delivery scheduled");
    Ok((StatusCode::CREATED, Json(DataResponse { data: schedule })))
}

/// GET /api/v1/projects/{id}/schedule
pub async fn get_schedule(
    _user: RequireAuth,
    State(state): State<AppState>,
    Path(project_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let schedule = ScheduleRepo::find_by_project(&state.pool, project_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Schedule",
            id: project_id,
        }))?;
    Ok(Json(DataResponse { data: schedule }))
}

/// PUT /api/v1/projects/{id}/schedule
///
/// Re-book an appointment that failed delivery. Only valid from
/// `pending_reschedule`; the prior failure notes stay on the record.
pub async fn rebook_schedule(
    RequireProjectManager(user): RequireProjectManager,
    State(state): State<AppState>,
    Path(project_id): Path<DbId>,
    Json(input): Json<CreateSchedule>,
) -> AppResult<impl IntoResponse> {
    let existing = ScheduleRepo::find_by_project(&state.pool, project_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Schedule",
            id: project_id,
        }))?;

    let schedule = ScheduleRepo::rebook(
        &state.pool,
        project_id,
        input.date,
        input.time.trim(),
        input.meeting_type.trim(),
    )
    .await?
    .ok_or_else(|| {
        AppError::Core(CoreError::Conflict(format!(
            "Schedule is '{}', only pending_reschedule appointments can be re-booked",
            existing.status
        )))
    })?;

    record_audit(
        &state,
        Some(user.user_id),
        "schedule.rebook",
        "schedule",
        schedule.id,
        serde_json::json!({ "project_id": project_id, "date": input.date }),
    )
    .await;

    tracing::info!(project_id, schedule_id = schedule.id, user_id = user.user_id, "Delivery re-booked");
    Ok(Json(DataResponse { data: schedule }))
}
