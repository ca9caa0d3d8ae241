pub mod catalog;
pub mod custody;
pub mod directors;
pub mod folios;
pub mod health;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /catalog/search                              classify + suggest + matching assets (GET)
/// /catalog/assets                              assets matching one field filter (GET)
///
/// /folios/custody/next                         preview next custody folio (GET)
/// /folios/decommission/next                    preview next decommission folio (GET)
///
/// /custody                                     folios issued on a day (GET), commit (POST)
/// /custody/{folio}                             custody document (GET)
/// /custody/{folio}/assets/{code}/holder        change holder (PATCH)
/// /custody/{folio}/decommission                retire all or some assets (POST)
///
/// /directors/resolve                           resolve by name (GET)
/// /directors/{id}/completion                   complete area + position (PUT)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/catalog", catalog::router())
        .nest("/folios", folios::router())
        .nest("/custody", custody::router())
        .nest("/directors", directors::router())
}
