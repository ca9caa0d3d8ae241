use axum::routing::get;
use axum::Router;

use crate::handlers::catalog;
use crate::state::AppState;

/// Catalog routes mounted at `/catalog`.
///
/// ```text
/// GET /search -> search_catalog
/// GET /assets -> filter_assets
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/search", get(catalog::search_catalog))
        .route("/assets", get(catalog::filter_assets))
}
