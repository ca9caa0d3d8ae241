use axum::routing::{get, put};
use axum::Router;

use crate::handlers::directors;
use crate::state::AppState;

/// Director routes mounted at `/directors`.
///
/// ```text
/// GET /resolve         -> resolve_director
/// PUT /{id}/completion -> complete_director
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/resolve", get(directors::resolve_director))
        .route("/{id}/completion", put(directors::complete_director))
}
