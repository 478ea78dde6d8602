//! Route definitions for projects and their sub-resources.

use axum::routing::{get, post, put};
use axum::Router;

use crate::handlers::{evaluation, project, schedule};
use crate::state::AppState;

/// Project routes, merged into `/projects`.
///
/// ```text
/// GET    /                              list_projects
/// GET    /{id}                          get_project
/// PUT    /{id}/progress                 update_progress
/// POST   /{id}/delivery-confirmation    confirm_delivery
/// POST   /{id}/schedule                 create_schedule
/// GET    /{id}/schedule                 get_schedule
/// PUT    /{id}/schedule                 rebook_schedule
/// POST   /{id}/evaluations              create_evaluation
/// GET    /{id}/evaluations              list_evaluations
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(project::list_projects))
        .route("/{id}", get(project::get_project))
        .route("/{id}/progress", put(project::update_progress))
        .route(
            "/{id}/delivery-confirmation",
            post(project::confirm_delivery),
        )
        .route(
            "/{id}/schedule",
            post(schedule::create_schedule)
                .get(schedule::get_schedule)
                .put(schedule::rebook_schedule),
        )
        .route(
            "/{id}/evaluations",
            post(evaluation::create_evaluation).get(evaluation::list_evaluations),
        )
}
