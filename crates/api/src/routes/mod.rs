pub mod admin;
pub mod approval;
pub mod budget;
pub mod client;
pub mod contract;
pub mod health;
pub mod notification;
pub mod project;
pub mod webhooks;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /auth/login                                  login (public)
/// /auth/refresh                                refresh (public)
/// /auth/logout                                 logout (requires auth)
///
/// /admin/users                                 list, create (admin only)
/// /admin/users/{id}                            update, deactivate
/// /admin/audit                                 audit trail query (admin only)
///
/// /budgets                                     create (public intake), list
/// /budgets/{id}                                get, update, soft-delete
/// /budgets/{id}/send                           send proposal (mint token)
/// /budgets/{id}/accept                         staff accept
/// /budgets/{id}/decline                        staff decline
/// /budgets/{id}/payments                       list payments
/// /budgets/{id}/payments/down-payment          create down-payment link
/// /budgets/{id}/payments/final-payment         create final-payment link
///
/// /approval/{token}                            view proposal, respond (public)
///
/// /contracts                                   draft contract
/// /contracts/{id}                              get
/// /contracts/{id}/upload                       signed PDF upload (public)
/// /contracts/{id}/confirm                      staff confirm
///
/// /projects                                    list
/// /projects/{id}                               get
/// /projects/{id}/progress                      milestone update (PUT)
/// /projects/{id}/delivery-confirmation         confirm/fail delivery (POST)
/// /projects/{id}/schedule                      book (POST), get, re-book (PUT)
/// /projects/{id}/evaluations                   create, list
///
/// /clients                                     list
/// /clients/{id}                                get
///
/// /notifications                               list (?unread_only, limit, offset)
/// /notifications/unread-count                  unread count (GET)
/// /notifications/read-all                      mark all read (POST)
/// /notifications/{id}/read                     mark read (POST)
///
/// /webhooks/gateway                            payment gateway webhook (public)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Authentication routes (login, refresh, logout).
        .nest("/auth", admin::auth_router())
        // Admin routes (staff management + audit trail).
        .nest("/admin", admin::router())
        // Budget lifecycle (intake, decisions, proposal, payment links).
        .nest("/budgets", budget::router())
        // Public token-bearing approval links.
        .nest("/approval", approval::router())
        // Contracts (draft, public upload, confirmation).
        .nest("/contracts", contract::router())
        // Projects (progress, delivery, schedule, evaluations).
        .nest("/projects", project::router())
        // Client directory.
        .nest("/clients", client::router())
        // Notification inbox.
        .nest("/notifications", notification::router())
        // Inbound webhooks.
        .nest("/webhooks", webhooks::router())
}
