use axum::routing::get;
use axum::Router;

use crate::handlers::folios;
use crate::state::AppState;

/// Folio preview routes mounted at `/folios`.
///
/// ```text
/// GET /custody/next      -> preview_custody_folio
/// GET /decommission/next -> preview_decommission_folio
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/custody/next", get(folios::preview_custody_folio))
        .route("/decommission/next", get(folios::preview_decommission_folio))
}
