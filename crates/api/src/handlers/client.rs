//! Client directory handlers (read-only; clients are created by the
//! settlement transaction's find-or-create).

use atelie_core::error::CoreError;
use atelie_core::types::DbId;
use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::Json;

use atelie_db::repositories::ClientRepo;

use crate::error::{AppError, AppResult};
use crate::middleware::rbac::RequireAuth;
use crate::query::{clamp_limit, clamp_offset, PaginationParams};
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/clients
pub async fn list_clients(
    _user: RequireAuth,
    State(state): State<AppState>,
    Query(params): Query<PaginationParams>,
) -> AppResult<impl IntoResponse> {
    let limit = clamp_limit(params.limit, 50, 200);
    let offset = clamp_offset(params.offset);
    let clients = ClientRepo::list(&state.pool, limit, offset).await?;
    Ok(Json(DataResponse { data: clients }))
}

/// GET /api/v1/clients/{id}
pub async fn get_client(
    _user: RequireAuth,
    State(state): State<AppState>,
    Path(client_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let client = ClientRepo::find_by_id(&state.pool, client_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Client",
            id: client_id,
        }))?;
    Ok(Json(DataResponse { data: client }))
}
