//! Payment handlers: milestone link generation and the gateway webhook.
//!
//! Link generation is idempotent per `(budget, milestone)`: a paid payment
//! never gets a new link, and a pending one has its link re-issued. The
//! webhook handler verifies the HMAC signature over the raw body, then
//! hands the event to the settlement transaction, which is itself
//! idempotent under at-least-once delivery.

use atelie_core::error::CoreError;
use atelie_core::money::{down_payment_amount, final_payment_amount, format_brl};
use atelie_core::payment::{PaymentStatus, PaymentType, PAYMENT_DUE_DAYS};
use atelie_core::types::DbId;
use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use chrono::Duration;

use atelie_db::models::payment::PaymentLinkResponse;
use atelie_db::repositories::{BudgetRepo, PaymentRepo, SettlementRepo};
use atelie_events::bus::{self, PlatformEvent};
use atelie_gateway::webhook::{parse_event, verify_signature, SIGNATURE_HEADER};
use atelie_gateway::LinkMetadata;

use crate::error::{AppError, AppResult};
use crate::handlers::{record_audit, spawn_email};
use crate::middleware::rbac::{RequireAuth, RequireProjectManager};
use crate::response::DataResponse;
use crate::state::AppState;

/// POST /api/v1/budgets/{id}/payments/down-payment
///
/// Generate (or re-issue) the hosted checkout link for the 25% down
/// payment. No-op success when the down payment is already settled.
pub async fn create_down_payment_link(
    RequireProjectManager(user): RequireProjectManager,
    State(state): State<AppState>,
    Path(budget_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    create_payment_link(state, budget_id, user.user_id, PaymentType::DownPayment).await
}

/// POST /api/v1/budgets/{id}/payments/final-payment
///
/// Generate (or re-issue) the hosted checkout link for the remaining
/// balance. Same idempotency rules as the down payment.
pub async fn create_final_payment_link(
    RequireProjectManager(user): RequireProjectManager,
    State(state): State<AppState>,
    Path(budget_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    create_payment_link(state, budget_id, user.user_id, PaymentType::FinalPayment).await
}

/// GET /api/v1/budgets/{id}/payments
pub async fn list_payments(
    _user: RequireAuth,
    State(state): State<AppState>,
    Path(budget_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let payments = PaymentRepo::list_for_budget(&state.pool, budget_id).await?;
    Ok(Json(DataResponse { data: payments }))
}

/// Shared milestone-link path.
async fn create_payment_link(
    state: AppState,
    budget_id: DbId,
    user_id: DbId,
    payment_type: PaymentType,
) -> AppResult<impl IntoResponse> {
    let budget = BudgetRepo::find_by_id(&state.pool, budget_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Budget",
            id: budget_id,
        }))?;

    let amount = match payment_type {
        PaymentType::DownPayment => down_payment_amount(budget.final_value),
        PaymentType::FinalPayment => final_payment_amount(budget.final_value),
    };
    if amount <= 0 {
        return Err(AppError::Core(CoreError::Validation(format!(
            "Cannot create a {} link: computed amount is {}",
            payment_type.as_str(),
            format_brl(amount),
        ))));
    }

    // Idempotency: a settled milestone never gets a new link.
    let existing =
        PaymentRepo::find_by_budget_and_type(&state.pool, budget_id, payment_type.as_str())
            .await?;
    if let Some(payment) = existing {
        if PaymentStatus::parse(&payment.status) == Ok(PaymentStatus::Paid) {
            tracing::info!(budget_id, payment_type = payment_type.as_str(), "Payment already settled, no new link issued");
            return Ok((
                StatusCode::OK,
                Json(DataResponse {
                    data: PaymentLinkResponse {
                        payment,
                        checkout_url: None,
                    },
                }),
            ));
        }
    }

    let gateway = state.gateway.clone().ok_or_else(|| {
        AppError::Core(CoreError::External("Payment gateway is not configured".into()))
    })?;

    let description = match payment_type {
        PaymentType::DownPayment => format!("Entrada (25%) — {}", budget.project_type),
        PaymentType::FinalPayment => format!("Pagamento final — {}", budget.project_type),
    };
    let link = gateway
        .create_payment_link(
            amount,
            &description,
            &LinkMetadata {
                budget_id,
                payment_type: payment_type.as_str().to_string(),
            },
        )
        .await?;

    let due_date = chrono::Utc::now() + Duration::days(PAYMENT_DUE_DAYS);
    let payment = PaymentRepo::upsert_link(
        &state.pool,
        budget_id,
        payment_type.as_str(),
        amount,
        &link.id,
        due_date,
    )
    .await?
    .ok_or_else(|| {
        // The settlement webhook won the race between our paid-check and
        // the upsert; the link is stale but nothing is owed.
        AppError::Core(CoreError::Conflict(format!(
            "The {} settled while the link was being created",
            payment_type.as_str()
        )))
    })?;

    spawn_email(
        &state,
        budget.client_email.clone(),
        format!("Link de pagamento — {}", budget.project_type),
        format!(
            "Olá {},\n\n{}: {}.\nPague pelo link (válido por {} dias):\n{}\n",
            budget.client_name,
            description,
            format_brl(amount),
            PAYMENT_DUE_DAYS,
            link.url,
        ),
    );

    state.event_bus.publish(
        PlatformEvent::new(bus::PAYMENT_LINK_CREATED)
            .with_source("payment", payment.id)
            .with_actor(user_id)
            .with_payload(serde_json::json!({
                "budget_id": budget_id,
                "payment_type": payment_type.as_str(),
                "amount": amount,
            })),
    );
    record_audit(
        &state,
        Some(user_id),
        "payment.link_create",
        "payment",
        payment.id,
        serde_json::json!({ "amount": amount, "gateway_link_id": link.id }),
    )
    .await;

    tracing::info!(
        budget_id,
        payment_id = payment.id,
        payment_type = payment_type.as_str(),
        amount,
        "Payment link created"
    );
    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: PaymentLinkResponse {
                payment,
                checkout_url: Some(link.url),
            },
        }),
    ))
}

/// POST /api/v1/webhooks/gateway
///
/// Inbound gateway webhook. Verifies the signature over the raw body,
/// decodes the event, and runs the settlement transaction. Event types
/// this system does not consume are acknowledged untouched.
pub async fn gateway_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> AppResult<impl IntoResponse> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    verify_signature(&state.config.gateway_webhook_secret, &body, signature)?;

    let Some(event) = parse_event(&body)? else {
        return Ok(Json(DataResponse {
            data: serde_json::json!({ "received": true, "ignored": true }),
        }));
    };

    let payment_type = PaymentType::parse(&event.payment_type)
        .map_err(|e| AppError::Core(CoreError::Validation(e)))?;

    let outcome = SettlementRepo::settle(&state.pool, event.budget_id, payment_type, &event.event_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Budget",
            id: event.budget_id,
        }))?;

    if outcome.changed() {
        state.event_bus.publish(
            PlatformEvent::new(bus::PAYMENT_SETTLED)
                .with_source("budget", outcome.budget_id)
                .with_payload(serde_json::json!({
                    "payment_id": outcome.payment_id,
                    "payment_type": payment_type.as_str(),
                    "gateway_event_id": event.event_id,
                })),
        );
        if outcome.project_created {
            state.event_bus.publish(
                PlatformEvent::new(bus::PROJECT_CREATED)
                    .with_source("project", outcome.project_id.unwrap_or_default())
                    .with_payload(serde_json::json!({ "budget_id": outcome.budget_id })),
            );
        }
        record_audit(
            &state,
            None,
            "payment.settle",
            "payment",
            outcome.payment_id,
            serde_json::json!({
                "gateway_event_id": event.event_id,
                "payment_reference": event.payment_reference,
                "project_created": outcome.project_created,
            }),
        )
        .await;

        // Receipt to the client, outside the settlement transaction.
        if let Some(budget) = BudgetRepo::find_by_id(&state.pool, outcome.budget_id).await? {
            spawn_email(
                &state,
                budget.client_email.clone(),
                "Pagamento confirmado".to_string(),
                format!(
                    "Olá {},\n\nRecebemos seu pagamento do projeto \"{}\". Obrigado!\n",
                    budget.client_name, budget.project_type,
                ),
            );
        }
    } else {
        tracing::info!(
            budget_id = outcome.budget_id,
            gateway_event_id = %event.event_id,
            "Duplicate settlement event ignored"
        );
    }

    tracing::info!(
        budget_id = outcome.budget_id,
        payment_type = payment_type.as_str(),
        budget_status = %outcome.budget_status,
        project_created = outcome.project_created,
        "Gateway webhook processed"
    );
    Ok(Json(DataResponse {
        data: serde_json::json!({ "received": true }),
    }))
}
