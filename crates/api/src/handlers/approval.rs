//! Public approval-link handlers.
//!
//! The token is a capability, not an identity: anyone holding the URL can
//! inspect the proposal and respond once, until the token expires or a
//! newer send replaces it. No authentication is involved.

use atelie_core::approval::{validate_response, validate_token_window};
use atelie_core::error::CoreError;
use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;

use atelie_db::models::budget::TokenResponseRequest;
use atelie_db::repositories::BudgetRepo;
use atelie_events::bus::{self, PlatformEvent};

use crate::error::{AppError, AppResult};
use crate::handlers::record_audit;
use crate::response::DataResponse;
use crate::state::AppState;

/// The proposal summary shown on the public approval page. Deliberately a
/// subset of the budget row.
#[derive(Debug, Serialize)]
pub struct ProposalView {
    pub client_name: String,
    pub project_type: String,
    pub complexity: Option<String>,
    pub timeline: Option<String>,
    pub final_value: i64,
    pub status: String,
}

/// GET /api/v1/approval/{token}
///
/// Inspect the proposal behind a live approval link.
pub async fn view_proposal(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> AppResult<impl IntoResponse> {
    let budget = BudgetRepo::find_by_token(&state.pool, &token)
        .await?
        .ok_or_else(|| {
            AppError::Core(CoreError::Conflict(
                "Approval link already used or no longer valid".into(),
            ))
        })?;

    validate_token_window(budget.approval_token_expires, chrono::Utc::now())
        .map_err(|e| AppError::Core(CoreError::Validation(e)))?;

    Ok(Json(DataResponse {
        data: ProposalView {
            client_name: budget.client_name,
            project_type: budget.project_type,
            complexity: budget.complexity,
            timeline: budget.timeline,
            final_value: budget.final_value,
            status: budget.status,
        },
    }))
}

/// PUT /api/v1/approval/{token}
///
/// Record the client's response and burn the token. A replayed or
/// superseded link no longer resolves and is answered with a conflict,
/// and an expired-but-unused link is rejected outright.
pub async fn respond(
    State(state): State<AppState>,
    Path(token): Path<String>,
    Json(input): Json<TokenResponseRequest>,
) -> AppResult<impl IntoResponse> {
    let accepted =
        validate_response(&input.response).map_err(|e| AppError::Core(CoreError::Validation(e)))?;

    // Token fields are cleared on first use, so a second attempt with the
    // same link finds nothing: the capability was consumed.
    let budget = BudgetRepo::find_by_token(&state.pool, &token)
        .await?
        .ok_or_else(|| {
            AppError::Core(CoreError::Conflict(
                "Approval link already used or no longer valid".into(),
            ))
        })?;

    validate_token_window(budget.approval_token_expires, chrono::Utc::now())
        .map_err(|e| AppError::Core(CoreError::Validation(e)))?;

    let current = atelie_core::budget::BudgetStatus::parse(&budget.status)
        .map_err(AppError::InternalError)?;
    if current.is_decided() {
        return Err(AppError::Core(CoreError::Conflict(format!(
            "Budget has already been decided ('{}')",
            budget.status
        ))));
    }

    // The update re-checks token and status so a racing replay matches zero
    // rows and loses here even after the checks above passed.
    let budget = BudgetRepo::record_token_decision(&state.pool, budget.id, &token, accepted)
        .await?
        .ok_or_else(|| {
            AppError::Core(CoreError::Conflict(
                "Approval link already used or no longer valid".into(),
            ))
        })?;

    let event_type = if accepted {
        bus::BUDGET_ACCEPTED
    } else {
        bus::BUDGET_REJECTED
    };
    state
        .event_bus
        .publish(PlatformEvent::new(event_type).with_source("budget", budget.id));
    record_audit(
        &state,
        None,
        if accepted { "budget.accept" } else { "budget.decline" },
        "budget",
        budget.id,
        serde_json::json!({ "via": "approval_token" }),
    )
    .await;

    tracing::info!(budget_id = budget.id, accepted, "Client responded via approval link");
    Ok(Json(DataResponse { data: budget }))
}
