//! Budget lifecycle handlers: intake, proposal send, staff decisions,
//! listing, and soft deletion.

use atelie_core::budget::{self, BudgetStatus};
use atelie_core::error::CoreError;
use atelie_core::money::format_brl;
use atelie_core::types::DbId;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;

use atelie_db::models::budget::{
    Budget, CreateBudget, DeleteBudgetRequest, StaffDecisionRequest, UpdateBudget,
};
use atelie_db::repositories::BudgetRepo;
use atelie_events::bus::{self, PlatformEvent};

use crate::error::{AppError, AppResult};
use crate::handlers::{record_audit, spawn_email, whatsapp_link};
use crate::middleware::rbac::{RequireAuth, RequireProjectManager};
use crate::query::{clamp_limit, clamp_offset, StatusFilterParams};
use crate::response::DataResponse;
use crate::state::AppState;

/// Response payload for a sent proposal: the refreshed budget plus the
/// links the operator needs.
#[derive(Debug, Serialize)]
pub struct ProposalSent {
    pub budget: Budget,
    pub approval_url: String,
    /// Prepared WhatsApp deep link; never auto-sent.
    pub whatsapp_link: Option<String>,
}

/// POST /api/v1/budgets
///
/// Public intake: create a budget request from the website form.
pub async fn create_budget(
    State(state): State<AppState>,
    Json(input): Json<CreateBudget>,
) -> AppResult<impl IntoResponse> {
    budget::validate_intake(&input.project_type, &input.client_name, &input.client_email)
        .map_err(|e| AppError::Core(CoreError::Validation(e)))?;
    if let Some(raw) = input.client_document.as_deref().filter(|d| !d.trim().is_empty()) {
        let normalized = atelie_core::document::normalize_document(raw);
        atelie_core::document::validate_document(&normalized)
            .map_err(|e| AppError::Core(CoreError::Validation(e)))?;
    }

    let budget = BudgetRepo::create(&state.pool, &input).await?;

    state.event_bus.publish(
        PlatformEvent::new(bus::BUDGET_CREATED)
            .with_source("budget", budget.id)
            .with_payload(serde_json::json!({
                "client_name": budget.client_name,
                "project_type": budget.project_type,
            })),
    );
    record_audit(
        &state,
        None,
        "budget.create",
        "budget",
        budget.id,
        serde_json::json!({ "project_type": budget.project_type }),
    )
    .await;

    tracing::info!(budget_id = budget.id, "Budget intake received");
    Ok((StatusCode::CREATED, Json(DataResponse { data: budget })))
}

/// GET /api/v1/budgets
///
/// List budgets (staff only), optionally filtered by status.
pub async fn list_budgets(
    _user: RequireAuth,
    State(state): State<AppState>,
    Query(params): Query<StatusFilterParams>,
) -> AppResult<impl IntoResponse> {
    if let Some(ref status) = params.status {
        BudgetStatus::parse(status).map_err(|e| AppError::Core(CoreError::Validation(e)))?;
    }
    let limit = clamp_limit(params.limit, 50, 200);
    let offset = clamp_offset(params.offset);

    let budgets = BudgetRepo::list(&state.pool, params.status.as_deref(), limit, offset).await?;
    Ok(Json(DataResponse { data: budgets }))
}

/// GET /api/v1/budgets/{id}
pub async fn get_budget(
    _user: RequireAuth,
    State(state): State<AppState>,
    Path(budget_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let budget = BudgetRepo::find_by_id(&state.pool, budget_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Budget",
            id: budget_id,
        }))?;
    Ok(Json(DataResponse { data: budget }))
}

/// PUT /api/v1/budgets/{id}
///
/// Staff edits before the proposal goes out (final value, estimates).
pub async fn update_budget(
    RequireProjectManager(user): RequireProjectManager,
    State(state): State<AppState>,
    Path(budget_id): Path<DbId>,
    Json(input): Json<UpdateBudget>,
) -> AppResult<impl IntoResponse> {
    if let Some(final_value) = input.final_value {
        if final_value < 0 {
            return Err(AppError::Core(CoreError::Validation(
                "final_value must not be negative".into(),
            )));
        }
    }

    let updated = BudgetRepo::update(&state.pool, budget_id, &input)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Budget",
            id: budget_id,
        }))?;

    tracing::info!(budget_id, user_id = user.user_id, "Budget updated");
    Ok(Json(DataResponse { data: updated }))
}

/// POST /api/v1/budgets/{id}/send
///
/// Send the proposal: mint a fresh single-use approval token (7-day
/// expiry), email the approval link, and prepare a WhatsApp draft.
/// Re-sending replaces the previous token, so older links fail closed.
pub async fn send_proposal(
    RequireProjectManager(user): RequireProjectManager,
    State(state): State<AppState>,
    Path(budget_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let budget = BudgetRepo::find_by_id(&state.pool, budget_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Budget",
            id: budget_id,
        }))?;

    let current = BudgetStatus::parse(&budget.status).map_err(AppError::InternalError)?;
    // Sending from `Sent` is a legitimate re-send with a fresh token.
    if current != BudgetStatus::Sent {
        budget::validate_transition(current, BudgetStatus::Sent)
            .map_err(|e| AppError::Core(CoreError::Conflict(e)))?;
    }

    let token = atelie_core::approval::mint_token();
    let expires = atelie_core::approval::token_expiry(chrono::Utc::now());

    let budget = BudgetRepo::mark_sent(&state.pool, budget_id, &token, expires)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Budget",
            id: budget_id,
        }))?;

    let approval_url = state.config.approval_url(&token);

    let message = format!(
        "Olá {}! Sua proposta para o projeto \"{}\" está pronta: {} ({})",
        budget.client_name,
        budget.project_type,
        format_brl(budget.final_value),
        approval_url,
    );
    let whatsapp = budget
        .client_phone
        .as_deref()
        .map(|phone| whatsapp_link(phone, &message));

    spawn_email(
        &state,
        budget.client_email.clone(),
        format!("Proposta — {}", budget.project_type),
        format!(
            "Olá {},\n\nSua proposta está pronta. Valor: {}.\n\n\
             Para aceitar ou recusar, acesse o link (válido por 7 dias):\n{}\n",
            budget.client_name,
            format_brl(budget.final_value),
            approval_url,
        ),
    );

    state.event_bus.publish(
        PlatformEvent::new(bus::BUDGET_SENT)
            .with_source("budget", budget.id)
            .with_actor(user.user_id),
    );
    record_audit(
        &state,
        Some(user.user_id),
        "budget.send",
        "budget",
        budget.id,
        serde_json::json!({ "token_expires": expires }),
    )
    .await;

    tracing::info!(budget_id, user_id = user.user_id, "Proposal sent");
    Ok(Json(DataResponse {
        data: ProposalSent {
            budget,
            approval_url,
            whatsapp_link: whatsapp,
        },
    }))
}

/// POST /api/v1/budgets/{id}/accept
///
/// Staff acceptance, attributable to the caller. Only valid while the
/// budget is still `pending`.
pub async fn accept_budget(
    RequireProjectManager(user): RequireProjectManager,
    State(state): State<AppState>,
    Path(budget_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    staff_decide(state, budget_id, user.user_id, true, None).await
}

/// POST /api/v1/budgets/{id}/decline
///
/// Staff decline with a reason. Only valid while the budget is still
/// `pending`.
pub async fn decline_budget(
    RequireProjectManager(user): RequireProjectManager,
    State(state): State<AppState>,
    Path(budget_id): Path<DbId>,
    Json(input): Json<StaffDecisionRequest>,
) -> AppResult<impl IntoResponse> {
    let reason = input
        .reason
        .as_deref()
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .ok_or_else(|| {
            AppError::Core(CoreError::Validation("A decline reason is required".into()))
        })?;
    staff_decide(state, budget_id, user.user_id, false, Some(reason)).await
}

/// Shared staff accept/decline path.
///
/// Accepting clears prior decline fields and vice versa; the two are
/// mutually exclusive by construction of the update.
async fn staff_decide(
    state: AppState,
    budget_id: DbId,
    user_id: DbId,
    accepted: bool,
    reason: Option<&str>,
) -> AppResult<impl IntoResponse> {
    let budget = BudgetRepo::find_by_id(&state.pool, budget_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Budget",
            id: budget_id,
        }))?;

    // Staff may decide a pending/sent budget, and may also overturn a
    // fresh accept/decline (last-write-wins; the mutual-exclusion fields
    // are swapped atomically below). Once money has moved the decision is
    // locked in.
    let current = BudgetStatus::parse(&budget.status).map_err(AppError::InternalError)?;
    let decidable = matches!(
        current,
        BudgetStatus::Pending | BudgetStatus::Sent | BudgetStatus::Accepted | BudgetStatus::Rejected
    );
    if !decidable {
        return Err(AppError::Core(CoreError::Conflict(format!(
            "Budget is '{}' and can no longer be decided by staff",
            budget.status
        ))));
    }

    let budget = BudgetRepo::record_staff_decision(&state.pool, budget_id, user_id, accepted, reason)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Budget",
            id: budget_id,
        }))?;

    let (event_type, action, subject, body) = if accepted {
        (
            bus::BUDGET_ACCEPTED,
            "budget.accept",
            "Proposta aceita".to_string(),
            format!(
                "Olá {},\n\nSua proposta \"{}\" foi aprovada. Em breve entraremos em \
                 contato com o contrato e o link do pagamento de entrada.\n",
                budget.client_name, budget.project_type
            ),
        )
    } else {
        (
            bus::BUDGET_REJECTED,
            "budget.decline",
            "Proposta recusada".to_string(),
            format!(
                "Olá {},\n\nInfelizmente sua proposta \"{}\" foi recusada.\nMotivo: {}\n",
                budget.client_name,
                budget.project_type,
                reason.unwrap_or("não informado"),
            ),
        )
    };

    spawn_email(&state, budget.client_email.clone(), subject, body);

    state.event_bus.publish(
        PlatformEvent::new(event_type)
            .with_source("budget", budget.id)
            .with_actor(user_id),
    );
    record_audit(
        &state,
        Some(user_id),
        action,
        "budget",
        budget.id,
        serde_json::json!({ "reason": reason }),
    )
    .await;

    tracing::info!(budget_id, user_id, accepted, "Staff budget decision recorded");
    Ok(Json(DataResponse { data: budget }))
}

/// DELETE /api/v1/budgets/{id}
///
/// Soft-delete with a mandatory recorded reason; budgets are never hard
/// deleted.
pub async fn delete_budget(
    RequireProjectManager(user): RequireProjectManager,
    State(state): State<AppState>,
    Path(budget_id): Path<DbId>,
    Json(input): Json<DeleteBudgetRequest>,
) -> AppResult<impl IntoResponse> {
    let reason = input.reason.trim();
    if reason.is_empty() {
        return Err(AppError::Core(CoreError::Validation(
            "A deletion reason is required".into(),
        )));
    }

    let deleted = BudgetRepo::soft_delete(&state.pool, budget_id, reason).await?;
    if !deleted {
        return Err(AppError::Core(CoreError::NotFound {
            entity: "Budget",
            id: budget_id,
        }));
    }

    record_audit(
        &state,
        Some(user.user_id),
        "budget.delete",
        "budget",
        budget_id,
        serde_json::json!({ "reason": reason }),
    )
    .await;

    tracing::info!(budget_id, user_id = user.user_id, "Budget soft-deleted");
    Ok(StatusCode::NO_CONTENT)
}
