//! Admin handlers for staff account management.
//!
//! All endpoints require the admin role via [`RequireAdmin`].

use atelie_core::error::CoreError;
use atelie_core::roles::validate_role;
use atelie_core::types::DbId;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;

use atelie_db::models::user::{CreateUser, UpdateUser};
use atelie_db::repositories::UserRepo;

use crate::auth::password::{hash_password, validate_password_strength, MIN_PASSWORD_LENGTH};
use crate::error::{AppError, AppResult};
use crate::middleware::rbac::RequireAdmin;
use crate::response::DataResponse;
use crate::state::AppState;

/// POST /api/v1/admin/users
///
/// Create a staff account.
pub async fn create_user(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Json(input): Json<CreateUser>,
) -> AppResult<impl IntoResponse> {
    validate_role(&input.role).map_err(|e| AppError::Core(CoreError::Validation(e)))?;
    validate_password_strength(&input.password, MIN_PASSWORD_LENGTH)
        .map_err(|e| AppError::Core(CoreError::Validation(e)))?;
    if input.email.trim().is_empty() || !input.email.contains('@') {
        return Err(AppError::Core(CoreError::Validation(
            "A valid email is required".into(),
        )));
    }

    let password_hash = hash_password(&input.password)
        .map_err(|e| AppError::InternalError(format!("Password hashing failed: {e}")))?;

    let user = UserRepo::create(
        &state.pool,
        input.email.trim(),
        &password_hash,
        input.display_name.trim(),
        &input.role,
        input.team_role.as_deref(),
    )
    .await?;

    tracing::info!(user_id = user.id, created_by = admin.user_id, "Staff account created");
    Ok((StatusCode::CREATED, Json(DataResponse { data: user })))
}

/// GET /api/v1/admin/users
///
/// List all staff accounts.
pub async fn list_users(
    _admin: RequireAdmin,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let users = UserRepo::list(&state.pool).await?;
    Ok(Json(DataResponse { data: users }))
}

/// PUT /api/v1/admin/users/{id}
///
/// Update display name, role, or team-role designation.
pub async fn update_user(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(user_id): Path<DbId>,
    Json(input): Json<UpdateUser>,
) -> AppResult<impl IntoResponse> {
    if let Some(ref role) = input.role {
        validate_role(role).map_err(|e| AppError::Core(CoreError::Validation(e)))?;
    }

    let updated = UserRepo::update(&state.pool, user_id, &input)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "User",
            id: user_id,
        }))?;

    tracing::info!(user_id, updated_by = admin.user_id, "Staff account updated");
    Ok(Json(DataResponse { data: updated }))
}

/// DELETE /api/v1/admin/users/{id}
///
/// Deactivate a staff account.
pub async fn deactivate_user(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(user_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let deactivated = UserRepo::deactivate(&state.pool, user_id).await?;
    if !deactivated {
        return Err(AppError::Core(CoreError::NotFound {
            entity: "User",
            id: user_id,
        }));
    }

    tracing::info!(user_id, deactivated_by = admin.user_id, "Staff account deactivated");
    Ok(StatusCode::NO_CONTENT)
}
