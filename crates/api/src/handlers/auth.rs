//! Authentication handlers: login, refresh, logout.

use atelie_core::error::CoreError;
use axum::extract::State;
use axum::Json;
use chrono::Duration;
use serde::Serialize;

use atelie_db::models::user::{LoginRequest, RefreshRequest, User};
use atelie_db::repositories::{SessionRepo, UserRepo};

use crate::auth::jwt::{
    issue_access_token, mint_refresh_token, refresh_token_digest,
};
use crate::auth::password::verify_password;
use crate::error::{AppError, AppResult};
use crate::middleware::rbac::RequireAuth;
use crate::response::DataResponse;
use crate::state::AppState;

/// Response payload for login and refresh.
#[derive(Debug, Serialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub user: User,
}

/// POST /api/v1/auth/login
///
/// Verify credentials and issue an access/refresh token pair.
pub async fn login(
    State(state): State<AppState>,
    Json(input): Json<LoginRequest>,
) -> AppResult<Json<DataResponse<TokenPair>>> {
    let user = UserRepo::find_active_by_email(&state.pool, input.email.trim())
        .await?
        .ok_or_else(|| AppError::Core(CoreError::Unauthorized("Invalid credentials".into())))?;

    let valid = verify_password(&input.password, &user.password_hash)
        .map_err(|e| AppError::InternalError(format!("Password verification failed: {e}")))?;
    if !valid {
        return Err(AppError::Core(CoreError::Unauthorized(
            "Invalid credentials".into(),
        )));
    }

    // Lazy housekeeping: dead sessions cost nothing to drop here.
    let purged = SessionRepo::delete_expired(&state.pool).await?;
    if purged > 0 {
        tracing::debug!(purged, "Expired sessions pruned");
    }

    let pair = issue_tokens(&state, user).await?;
    tracing::info!(user_id = pair.user.id, "User logged in");
    Ok(Json(DataResponse { data: pair }))
}

/// POST /api/v1/auth/refresh
///
/// Exchange a live refresh token for a new token pair. The old session is
/// rotated out.
pub async fn refresh(
    State(state): State<AppState>,
    Json(input): Json<RefreshRequest>,
) -> AppResult<Json<DataResponse<TokenPair>>> {
    let hash = refresh_token_digest(&input.refresh_token);
    let session = SessionRepo::find_valid_by_hash(&state.pool, &hash)
        .await?
        .ok_or_else(|| {
            AppError::Core(CoreError::Unauthorized("Invalid or expired refresh token".into()))
        })?;

    let user = UserRepo::find_by_id(&state.pool, session.user_id)
        .await?
        .filter(|u| u.is_active)
        .ok_or_else(|| AppError::Core(CoreError::Unauthorized("Account is inactive".into())))?;

    // Rotate: the presented token is single-use.
    SessionRepo::delete_by_hash(&state.pool, &hash).await?;

    let pair = issue_tokens(&state, user).await?;
    Ok(Json(DataResponse { data: pair }))
}

/// POST /api/v1/auth/logout
///
/// Invalidate the presented refresh token.
pub async fn logout(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Json(input): Json<RefreshRequest>,
) -> AppResult<Json<DataResponse<serde_json::Value>>> {
    let hash = refresh_token_digest(&input.refresh_token);
    SessionRepo::delete_by_hash(&state.pool, &hash).await?;
    tracing::info!(user_id = user.user_id, "User logged out");
    Ok(Json(DataResponse {
        data: serde_json::json!({ "logged_out": true }),
    }))
}

/// Generate an access token and a stored refresh session for a user.
async fn issue_tokens(state: &AppState, user: User) -> Result<TokenPair, AppError> {
    let access_token = issue_access_token(
        user.id,
        &user.role,
        user.team_role.as_deref(),
        &state.config.jwt,
    )
    .map_err(|e| AppError::InternalError(format!("Token generation failed: {e}")))?;

    let (refresh_token, refresh_hash) = mint_refresh_token();
    let expires_at =
        chrono::Utc::now() + Duration::days(state.config.jwt.refresh_token_expiry_days);
    SessionRepo::create(&state.pool, user.id, &refresh_hash, expires_at).await?;

    Ok(TokenPair {
        access_token,
        refresh_token,
        user,
    })
}
