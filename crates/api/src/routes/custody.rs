//! Custody lifecycle routes: commit, lookup, holder edit and decommission.

use axum::routing::{get, patch, post};
use axum::Router;

use crate::handlers::custody;
use crate::state::AppState;

/// Custody routes mounted at `/custody`.
///
/// ```text
/// GET   /                                -> list_folios
/// POST  /                                -> commit_custody
/// GET   /{folio}                         -> get_custody_record
/// PATCH /{folio}/assets/{code}/holder    -> update_holder
/// POST  /{folio}/decommission            -> decommission_custody
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(custody::list_folios).post(custody::commit_custody))
        .route("/{folio}", get(custody::get_custody_record))
        .route(
            "/{folio}/assets/{code}/holder",
            patch(custody::update_holder),
        )
        .route("/{folio}/decommission", post(custody::decommission_custody))
}
