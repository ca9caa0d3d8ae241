//! Handlers for searching the unified asset catalog.

use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::Json;
use custodia_core::catalog::{Asset, CatalogFilter, FieldType};
use custodia_core::search::{self, Suggestion};
use serde::{Deserialize, Serialize};

use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

/// Upper bound on assets returned by one listing.
const MAX_ASSETS: usize = 500;
const DEFAULT_ASSETS: usize = 100;

fn clamp_limit(limit: Option<usize>) -> usize {
    limit.unwrap_or(DEFAULT_ASSETS).clamp(1, MAX_ASSETS)
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub q: String,
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub classification: Option<FieldType>,
    pub suggestions: Vec<Suggestion>,
    /// Assets matching the query on the classified field.
    pub assets: Vec<Asset>,
    pub total: usize,
    pub catalog_version: u64,
}

/// GET /api/v1/catalog/search?q=
///
/// Classify the query, offer suggestions, and list the assets the classified
/// filter selects. An unclassified query returns no assets.
pub async fn search_catalog(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> AppResult<impl IntoResponse> {
    let snapshot = state.catalog.snapshot(state.store.as_ref()).await?;
    let outcome = search::search(&params.q, &snapshot.corpus);

    let matching: Vec<&Asset> = match outcome.classification {
        Some(field) => snapshot
            .catalog
            .filter(&[CatalogFilter::new(field, params.q.trim())]),
        None => Vec::new(),
    };

    Ok(Json(DataResponse {
        data: SearchResponse {
            query: params.q.trim().to_string(),
            classification: outcome.classification,
            suggestions: outcome.suggestions,
            total: matching.len(),
            assets: matching
                .into_iter()
                .take(clamp_limit(params.limit))
                .cloned()
                .collect(),
            catalog_version: snapshot.catalog.version(),
        },
    }))
}

#[derive(Debug, Deserialize)]
pub struct FilterParams {
    pub field: FieldType,
    #[serde(default)]
    pub value: String,
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct AssetListResponse {
    pub assets: Vec<Asset>,
    pub total: usize,
}

/// GET /api/v1/catalog/assets?field=&value=
///
/// List assets whose `field` contains `value` (case-insensitive).
pub async fn filter_assets(
    State(state): State<AppState>,
    Query(params): Query<FilterParams>,
) -> AppResult<impl IntoResponse> {
    let snapshot = state.catalog.snapshot(state.store.as_ref()).await?;
    let matching = snapshot
        .catalog
        .filter(&[CatalogFilter::new(params.field, params.value)]);

    Ok(Json(DataResponse {
        data: AssetListResponse {
            total: matching.len(),
            assets: matching
                .into_iter()
                .take(clamp_limit(params.limit))
                .cloned()
                .collect(),
        },
    }))
}
