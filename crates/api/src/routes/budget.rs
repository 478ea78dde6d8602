//! Route definitions for the budget lifecycle.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::{budget, payment};
use crate::state::AppState;

/// Budget routes, merged into `/budgets`.
///
/// ```text
/// POST   /                                create_budget (public intake)
/// GET    /                                list_budgets
/// GET    /{id}                            get_budget
/// PUT    /{id}                            update_budget
/// DELETE /{id}                            delete_budget (soft, with reason)
/// POST   /{id}/send                       send_proposal
/// POST   /{id}/accept                     accept_budget
/// POST   /{id}/decline                    decline_budget
/// GET    /{id}/payments                   list_payments
/// POST   /{id}/payments/down-payment      create_down_payment_link
/// POST   /{id}/payments/final-payment     create_final_payment_link
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(budget::create_budget).get(budget::list_budgets))
        .route(
            "/{id}",
            get(budget::get_budget)
                .put(budget::update_budget)
                .delete(budget::delete_budget),
        )
        .route("/{id}/send", post(budget::send_proposal))
        .route("/{id}/accept", post(budget::accept_budget))
        .route("/{id}/decline", post(budget::decline_budget))
        .route("/{id}/payments", get(payment::list_payments))
        .route(
            "/{id}/payments/down-payment",
            post(payment::create_down_payment_link),
        )
        .route(
            "/{id}/payments/final-payment",
            post(payment::create_final_payment_link),
        )
}
