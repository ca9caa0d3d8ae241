//! Handlers for the custody lifecycle.
//!
//! A commit rebuilds the client's selection from the cached catalog and
//! re-checks it server-side; the client's own grouping checks are advisory.
//! Every write drops the catalog snapshot so the next search sees the new
//! custodial fields.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use custodia_core::assignment::SelectionSession;
use custodia_core::catalog::AssetRef;
use custodia_core::director::DirectorAreaResolver;
use custodia_core::workflow::{
    CommitRequest, CustodyLifecycleWorkflow, DecommissionRequest, DecommissionTarget,
};
use serde::Deserialize;
use validator::Validate;

use crate::error::AppResult;
use crate::query::DayParams;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request bodies
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, Validate)]
pub struct HolderOverride {
    #[serde(flatten)]
    pub asset: AssetRef,
    #[validate(length(max = 200))]
    pub holder: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CommitCustodyRequest {
    #[validate(length(min = 1, message = "Select at least one asset"))]
    pub assets: Vec<AssetRef>,
    #[validate(length(min = 1, max = 200))]
    pub director: String,
    #[validate(length(min = 1, max = 200))]
    pub area: String,
    #[validate(length(max = 200))]
    pub holder: Option<String>,
    #[serde(default)]
    #[validate(nested)]
    pub holder_overrides: Vec<HolderOverride>,
    #[validate(length(min = 1, max = 100))]
    pub actor: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateHolderRequest {
    /// Blank or absent clears the holder.
    #[validate(length(max = 200))]
    pub holder: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub actor: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct DecommissionCustodyRequest {
    /// Inventory codes to retire; absent retires the whole record.
    pub inventory_codes: Option<Vec<String>>,
    #[validate(length(min = 1, max = 100))]
    pub actor: String,
}

// ---------------------------------------------------------------------------
// Commit
// ---------------------------------------------------------------------------

/// POST /api/v1/custody
///
/// Commit the selected assets as one custody record under a fresh folio
/// dated today. Returns 201 with the document payload and any warnings.
pub async fn commit_custody(
    State(state): State<AppState>,
    Json(input): Json<CommitCustodyRequest>,
) -> AppResult<impl IntoResponse> {
    input.validate()?;

    let store = state.store.as_ref();
    let sink = state.event_bus.as_ref();

    let snapshot = state.catalog.snapshot(store).await?;
    let assets = snapshot.catalog.resolve_all(&input.assets)?;
    let mut selection = SelectionSession::new();
    selection.try_add_all(assets).into_result()?;
    for o in &input.holder_overrides {
        selection.set_holder_override(o.asset, o.holder.as_str())?;
    }

    let director = DirectorAreaResolver::new(store, sink)
        .require(&input.director)
        .await?;

    let result = CustodyLifecycleWorkflow::new(store, sink)
        .commit(CommitRequest {
            selection: &selection,
            director: &director,
            area: &input.area,
            holder: input.holder.as_deref(),
            actor: &input.actor,
            date: None,
        })
        .await;
    // A partial commit still changed assets.
    state.catalog.invalidate().await;
    let outcome = result?;

    Ok((StatusCode::CREATED, Json(DataResponse { data: outcome })))
}

// ---------------------------------------------------------------------------
// Lookup
// ---------------------------------------------------------------------------

/// GET /api/v1/custody?date=
///
/// Distinct custody folios issued on a day (today by default).
pub async fn list_folios(
    State(state): State<AppState>,
    Query(params): Query<DayParams>,
) -> AppResult<impl IntoResponse> {
    let folios = CustodyLifecycleWorkflow::new(state.store.as_ref(), state.event_bus.as_ref())
        .folios_issued_on(params.day())
        .await?;
    Ok(Json(DataResponse { data: folios }))
}

/// GET /api/v1/custody/{folio}
pub async fn get_custody_record(
    State(state): State<AppState>,
    Path(folio): Path<String>,
) -> AppResult<impl IntoResponse> {
    let document = CustodyLifecycleWorkflow::new(state.store.as_ref(), state.event_bus.as_ref())
        .custody_record(&folio)
        .await?;
    Ok(Json(DataResponse { data: document }))
}

// ---------------------------------------------------------------------------
// Edits
// ---------------------------------------------------------------------------

/// PATCH /api/v1/custody/{folio}/assets/{code}/holder
pub async fn update_holder(
    State(state): State<AppState>,
    Path((folio, code)): Path<(String, String)>,
    Json(input): Json<UpdateHolderRequest>,
) -> AppResult<impl IntoResponse> {
    input.validate()?;

    let record = CustodyLifecycleWorkflow::new(state.store.as_ref(), state.event_bus.as_ref())
        .edit_holder(&folio, &code, input.holder.as_deref(), &input.actor)
        .await?;
    state.catalog.invalidate().await;

    Ok(Json(DataResponse { data: record }))
}

/// POST /api/v1/custody/{folio}/decommission
///
/// Retire the listed inventory codes, or the whole record when none are
/// given. Returns 201 with the decommission document and the record's state.
pub async fn decommission_custody(
    State(state): State<AppState>,
    Path(folio): Path<String>,
    Json(input): Json<DecommissionCustodyRequest>,
) -> AppResult<impl IntoResponse> {
    input.validate()?;

    let target = match input.inventory_codes {
        Some(codes) => DecommissionTarget::Subset(codes),
        None => DecommissionTarget::All,
    };

    let result = CustodyLifecycleWorkflow::new(state.store.as_ref(), state.event_bus.as_ref())
        .decommission(DecommissionRequest {
            custody_folio: &folio,
            target,
            actor: &input.actor,
            date: None,
        })
        .await;
    state.catalog.invalidate().await;
    let outcome = result?;

    Ok((StatusCode::CREATED, Json(DataResponse { data: outcome })))
}
