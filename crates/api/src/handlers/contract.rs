//! Contract handlers: drafting, the public signed-document upload, and
//! staff confirmation.

use atelie_core::budget::{self, BudgetStatus};
use atelie_core::contract::{validate_pdf, ContractStatus};
use atelie_core::error::CoreError;
use atelie_core::types::DbId;
use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;

use atelie_db::models::contract::CreateContract;
use atelie_db::repositories::{BudgetRepo, ContractRepo};
use atelie_events::bus::{self, PlatformEvent};

use crate::error::{AppError, AppResult};
use crate::handlers::record_audit;
use crate::middleware::rbac::{RequireAuth, RequireProjectManager};
use crate::response::DataResponse;
use crate::state::AppState;

/// POST /api/v1/contracts
///
/// Draft a contract for an accepted budget. One contract per budget; a
/// second draft is rejected by the unique constraint with a conflict.
pub async fn create_contract(
    RequireProjectManager(user): RequireProjectManager,
    State(state): State<AppState>,
    Json(input): Json<CreateContract>,
) -> AppResult<impl IntoResponse> {
    let budget = BudgetRepo::find_by_id(&state.pool, input.budget_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Budget",
            id: input.budget_id,
        }))?;

    let status = BudgetStatus::parse(&budget.status).map_err(AppError::InternalError)?;
    if !status.is_decided() || status == BudgetStatus::Rejected {
        return Err(AppError::Core(CoreError::Conflict(format!(
            "Cannot draft a contract for a '{}' budget",
            budget.status
        ))));
    }

    let contract = ContractRepo::create(&state.pool, input.budget_id).await?;

    tracing::info!(
        contract_id = contract.id,
        budget_id = input.budget_id,
        user_id = user.user_id,
        "Contract drafted"
    );
    Ok((StatusCode::CREATED, Json(DataResponse { data: contract })))
}

/// GET /api/v1/contracts/{id}
pub async fn get_contract(
    _user: RequireAuth,
    State(state): State<AppState>,
    Path(contract_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let contract = ContractRepo::find_by_id(&state.pool, contract_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Contract",
            id: contract_id,
        }))?;
    Ok(Json(DataResponse { data: contract }))
}

/// POST /api/v1/contracts/{id}/upload
///
/// Public signed-document upload, reachable by the link sent to the
/// client (tied to the contract id, not budget auth). The file must be a
/// PDF; an already-signed contract rejects the upload and keeps the first
/// document.
pub async fn upload_signed_document(
    State(state): State<AppState>,
    Path(contract_id): Path<DbId>,
    mut multipart: Multipart,
) -> AppResult<impl IntoResponse> {
    let contract = ContractRepo::find_by_id(&state.pool, contract_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Contract",
            id: contract_id,
        }))?;

    let status = ContractStatus::parse(&contract.status).map_err(AppError::InternalError)?;
    if !status.accepts_upload() {
        return Err(AppError::Core(CoreError::Conflict(format!(
            "Contract is already '{}'; the signed document cannot be replaced",
            contract.status
        ))));
    }

    let field = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Invalid multipart body: {e}")))?
        .ok_or_else(|| AppError::BadRequest("Missing file field".into()))?;

    let bytes = field
        .bytes()
        .await
        .map_err(|e| AppError::BadRequest(format!("Failed to read upload: {e}")))?;

    validate_pdf(&bytes).map_err(|e| AppError::Core(CoreError::Validation(e)))?;

    let dir = format!("{}/contracts", state.config.upload_dir);
    tokio::fs::create_dir_all(&dir)
        .await
        .map_err(|e| AppError::InternalError(format!("Failed to create upload dir: {e}")))?;
    let document_path = format!("{dir}/contract_{contract_id}.pdf");
    tokio::fs::write(&document_path, &bytes)
        .await
        .map_err(|e| AppError::InternalError(format!("Failed to store upload: {e}")))?;

    // The status guard in the update makes a concurrent double-upload lose.
    let contract = ContractRepo::record_client_signature(&state.pool, contract_id, &document_path)
        .await?
        .ok_or_else(|| {
            AppError::Core(CoreError::Conflict(
                "Contract was signed by a concurrent upload".into(),
            ))
        })?;

    // Cascade: the budget moves to `contract_signed` when the lifecycle
    // allows it (it may already have advanced past that point).
    let budget = BudgetRepo::find_by_id(&state.pool, contract.budget_id).await?;
    if let Some(budget) = budget {
        let current = BudgetStatus::parse(&budget.status).map_err(AppError::InternalError)?;
        if budget::can_transition(current, BudgetStatus::ContractSigned) {
            BudgetRepo::set_status(
                &state.pool,
                budget.id,
                BudgetStatus::ContractSigned.as_str(),
            )
            .await?;
        }
    }

    state.event_bus.publish(
        PlatformEvent::new(bus::CONTRACT_SIGNED_BY_CLIENT)
            .with_source("contract", contract.id)
            .with_payload(serde_json::json!({ "budget_id": contract.budget_id })),
    );
    record_audit(
        &state,
        None,
        "contract.upload",
        "contract",
        contract.id,
        serde_json::json!({ "document_path": document_path }),
    )
    .await;

    tracing::info!(contract_id, "Signed contract uploaded");
    Ok(Json(DataResponse { data: contract }))
}

/// POST /api/v1/contracts/{id}/confirm
///
/// Staff confirmation. Allowed from `draft` as well as
/// `signed_by_client`; only an already-confirmed contract conflicts.
pub async fn confirm_contract(
    RequireProjectManager(user): RequireProjectManager,
    State(state): State<AppState>,
    Path(contract_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    // Distinguish missing from already-confirmed before the guarded update.
    let existing = ContractRepo::find_by_id(&state.pool, contract_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Contract",
            id: contract_id,
        }))?;

    let contract = ContractRepo::confirm(&state.pool, contract_id)
        .await?
        .ok_or_else(|| {
            AppError::Core(CoreError::Conflict(format!(
                "Contract is already '{}'",
                existing.status
            )))
        })?;

    state.event_bus.publish(
        PlatformEvent::new(bus::CONTRACT_CONFIRMED)
            .with_source("contract", contract.id)
            .with_actor(user.user_id),
    );
    record_audit(
        &state,
        Some(user.user_id),
        "contract.confirm",
        "contract",
        contract.id,
        serde_json::json!({ "budget_id": contract.budget_id }),
    )
    .await;

    tracing::info!(contract_id, user_id = user.user_id, "Contract confirmed");
    Ok(Json(DataResponse { data: contract }))
}
