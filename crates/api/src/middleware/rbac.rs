//! Authorization gates, expressed as extractors.
//!
//! Authorization is a pure predicate over the caller's `(role, team_role)`
//! pair; these newtypes run it during extraction so a handler that
//! compiles with `RequireProjectManager` in its signature cannot be
//! reached by an unauthorized caller.

use atelie_core::error::CoreError;
use atelie_core::roles::{is_project_manager, ROLE_ADMIN};
use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use super::auth::AuthUser;
use crate::error::AppError;
use crate::state::AppState;

/// Any authenticated caller. The explicit name documents, at the route
/// definition, that authentication is the only requirement.
pub struct RequireAuth(pub AuthUser);

/// Admin accounts only.
pub struct RequireAdmin(pub AuthUser);

/// Budget-decision capability: an admin, or a team member carrying the
/// project-manager designation. Evaluated by
/// [`atelie_core::roles::is_project_manager`].
pub struct RequireProjectManager(pub AuthUser);

impl FromRequestParts<AppState> for RequireAuth {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        AuthUser::from_request_parts(parts, state).await.map(Self)
    }
}

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        if user.role != ROLE_ADMIN {
            return Err(forbidden("Admin role required"));
        }
        Ok(Self(user))
    }
}

impl FromRequestParts<AppState> for RequireProjectManager {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        if !is_project_manager(&user.role, user.team_role.as_deref()) {
            return Err(forbidden("Project manager designation required"));
        }
        Ok(Self(user))
    }
}

fn forbidden(message: &str) -> AppError {
    AppError::Core(CoreError::Forbidden(message.to_string()))
}
