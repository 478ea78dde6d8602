//! Audit trail query handler (admin only).

use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::Json;

use atelie_db::models::audit::AuditQuery;
use atelie_db::repositories::AuditRepo;

use crate::error::AppResult;
use crate::middleware::rbac::RequireAdmin;
use crate::query::{clamp_limit, clamp_offset};
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/admin/audit
///
/// Query the append-only audit trail with optional filters.
pub async fn query_audit_log(
    _admin: RequireAdmin,
    State(state): State<AppState>,
    Query(filters): Query<AuditQuery>,
) -> AppResult<impl IntoResponse> {
    let limit = clamp_limit(filters.limit, 100, 500);
    let offset = clamp_offset(filters.offset);
    let entries = AuditRepo::query(&state.pool, &filters, limit, offset).await?;
    Ok(Json(DataResponse { data: entries }))
}
