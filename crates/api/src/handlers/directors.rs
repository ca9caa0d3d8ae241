use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::Json;
use custodia_core::director::DirectorAreaResolver;
use custodia_core::types::DbId;
use serde::Deserialize;
use validator::Validate;

use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ResolveParams {
    pub name: String,
}

/// GET /api/v1/directors/resolve?name=
///
/// Returns `complete`, `incomplete` (with the missing fields) or `not_found`.
/// An incomplete director must be completed before it can anchor a record.
pub async fn resolve_director(
    State(state): State<AppState>,
    Query(params): Query<ResolveParams>,
) -> AppResult<impl IntoResponse> {
    let resolution = DirectorAreaResolver::new(state.store.as_ref(), state.event_bus.as_ref())
        .resolve(&params.name)
        .await?;
    Ok(Json(DataResponse { data: resolution }))
}

#[derive(Debug, Deserialize, Validate)]
pub struct CompleteDirectorRequest {
    #[validate(length(min = 1, max = 200))]
    pub area: String,
    #[validate(length(min = 1, max = 200))]
    pub position: String,
    pub actor: Option<String>,
}

/// PUT /api/v1/directors/{id}/completion
///
/// Point the director at exactly one area (found or created) and set its
/// position.
pub async fn complete_director(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<CompleteDirectorRequest>,
) -> AppResult<impl IntoResponse> {
    input.validate()?;

    let resolved = DirectorAreaResolver::new(state.store.as_ref(), state.event_bus.as_ref())
        .complete(id, &input.area, &input.position, input.actor.as_deref())
        .await?;

    Ok(Json(DataResponse { data: resolved }))
}
