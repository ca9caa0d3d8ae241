//! Folio previews. Nothing is reserved; the number shown may be taken by a
//! concurrent commit before this client commits.

use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::Json;
use custodia_core::folio::FolioSequencer;

use crate::error::AppResult;
use crate::query::DayParams;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/folios/custody/next?date=
pub async fn preview_custody_folio(
    State(state): State<AppState>,
    Query(params): Query<DayParams>,
) -> AppResult<impl IntoResponse> {
    let issued = FolioSequencer::new(state.store.as_ref())
        .preview_custody_folio_on(params.day())
        .await;
    Ok(Json(DataResponse { data: issued }))
}

/// GET /api/v1/folios/decommission/next?date=
pub async fn preview_decommission_folio(
    State(state): State<AppState>,
    Query(params): Query<DayParams>,
) -> AppResult<impl IntoResponse> {
    let issued = FolioSequencer::new(state.store.as_ref())
        .preview_decommission_folio_on(params.day())
        .await;
    Ok(Json(DataResponse { data: issued }))
}
