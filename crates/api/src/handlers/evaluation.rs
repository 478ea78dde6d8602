//! Evaluation handlers.

use atelie_core::error::CoreError;
use atelie_core::evaluation::{validate_kind, validate_rating};
use atelie_core::types::DbId;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;

use atelie_db::models::evaluation::CreateEvaluation;
use atelie_db::repositories::{EvaluationRepo, ProjectRepo};

use crate::error::{AppError, AppResult};
use crate::middleware::rbac::RequireAuth;
use crate::response::DataResponse;
use crate::state::AppState;

/// POST /api/v1/projects/{id}/evaluations
///
/// Submit a 1–5 rating for a team member, the project, or the client.
/// One rating per evaluator, target, project, and kind; a duplicate is
/// rejected with a conflict ("already evaluated").
pub async fn create_evaluation(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Path(project_id): Path<DbId>,
    Json(input): Json<CreateEvaluation>,
) -> AppResult<impl IntoResponse> {
    validate_rating(input.rating).map_err(|e| AppError::Core(CoreError::Validation(e)))?;
    validate_kind(&input.kind).map_err(|e| AppError::Core(CoreError::Validation(e)))?;

    ProjectRepo::find_by_id(&state.pool, project_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Project",
            id: project_id,
        }))?;

    let evaluation = EvaluationRepo::create(
        &state.pool,
        project_id,
        user.user_id,
        input.target_id,
        &input.kind,
        input.rating,
        input.comment.as_deref(),
    )
    .await?;

    tracing::info!(
        project_id,
        evaluation_id = evaluation.id,
        evaluator_id = user.user_id,
        kind = %input.kind,
        "Evaluation recorded"
    );
    Ok((StatusCode::CREATED, Json(DataResponse { data: evaluation })))
}

/// GET /api/v1/projects/{id}/evaluations
pub async fn list_evaluations(
    _user: RequireAuth,
    State(state): State<AppState>,
    Path(project_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let evaluations = EvaluationRepo::list_for_project(&state.pool, project_id).await?;
    Ok(Json(DataResponse { data: evaluations }))
}
