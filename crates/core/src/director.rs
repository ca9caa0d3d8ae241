//! Custodian ("director / area head") resolution.
//!
//! A director may anchor a custody record only when it has a non-blank
//! position and at least one associated area. Otherwise it is incomplete and
//! must be completed first; completion points the director at exactly one
//! area, replacing any previous links.

use serde::{Deserialize, Serialize};

use crate::catalog::normalize_key;
use crate::error::CoreError;
use crate::notice::{ChangeNotice, ChangeSink};
use crate::store::CustodyStore;
use crate::types::DbId;

// ---------------------------------------------------------------------------
// Entities
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Area {
    pub id: DbId,
    pub name: String,
}

/// A custodian identity. `legacy_area` is informational and may be stale;
/// the authoritative areas come from the director/area links.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Director {
    pub id: DbId,
    pub name: String,
    pub legacy_area: Option<String>,
    pub legacy_position: Option<String>,
}

impl Director {
    /// Trimmed position, `None` when blank.
    pub fn position(&self) -> Option<&str> {
        self.legacy_position
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
    }
}

/// What an incomplete director lacks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingField {
    Position,
    Area,
}

/// A director fit to anchor a custody record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedDirector {
    pub director: Director,
    pub areas: Vec<Area>,
}

impl ResolvedDirector {
    pub fn id(&self) -> DbId {
        self.director.id
    }

    pub fn name(&self) -> &str {
        self.director.name.trim()
    }

    pub fn position(&self) -> &str {
        self.director.position().unwrap_or_default()
    }

    pub fn area_names(&self) -> Vec<&str> {
        self.areas.iter().map(|a| a.name.as_str()).collect()
    }

    /// Exact area name as linked, matched case-insensitively.
    pub fn find_area(&self, name: &str) -> Option<&Area> {
        let wanted = normalize_key(name);
        self.areas.iter().find(|a| normalize_key(&a.name) == wanted)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Resolution {
    Complete(ResolvedDirector),
    Incomplete {
        director: Director,
        areas: Vec<Area>,
        missing: Vec<MissingField>,
    },
    NotFound,
}

/// Classify a director and its linked areas.
pub fn assess(director: Director, areas: Vec<Area>) -> Resolution {
    let mut missing = Vec::new();
    if director.position().is_none() {
        missing.push(MissingField::Position);
    }
    if areas.is_empty() {
        missing.push(MissingField::Area);
    }

    if missing.is_empty() {
        Resolution::Complete(ResolvedDirector { director, areas })
    } else {
        Resolution::Incomplete {
            director,
            areas,
            missing,
        }
    }
}

// ---------------------------------------------------------------------------
// Resolver
// ---------------------------------------------------------------------------

pub struct DirectorAreaResolver<'a, S: CustodyStore + ?Sized, N: ChangeSink + ?Sized> {
    store: &'a S,
    sink: &'a N,
}

impl<'a, S: CustodyStore + ?Sized, N: ChangeSink + ?Sized> DirectorAreaResolver<'a, S, N> {
    pub fn new(store: &'a S, sink: &'a N) -> Self {
        Self { store, sink }
    }

    /// Look up a director by normalized name and check it is usable.
    pub async fn resolve(&self, name: &str) -> Result<Resolution, CoreError> {
        if name.trim().is_empty() {
            return Ok(Resolution::NotFound);
        }
        let Some(director) = self.store.find_director_by_name(name).await? else {
            return Ok(Resolution::NotFound);
        };
        let areas = self.store.director_areas(director.id).await?;
        Ok(assess(director, areas))
    }

    /// Resolve, turning anything but a complete director into an error.
    pub async fn require(&self, name: &str) -> Result<ResolvedDirector, CoreError> {
        match self.resolve(name).await? {
            Resolution::Complete(resolved) => Ok(resolved),
            Resolution::Incomplete { missing, .. } => Err(CoreError::Validation(format!(
                "Director '{}' is incomplete (missing {})",
                name.trim(),
                missing
                    .iter()
                    .map(|m| match m {
                        MissingField::Position => "position",
                        MissingField::Area => "area",
                    })
                    .collect::<Vec<_>>()
                    .join(", ")
            ))),
            Resolution::NotFound => Err(CoreError::not_found("director", name.trim())),
        }
    }

    /// Complete a director with one area and a position.
    ///
    /// The area is found by exact (case-sensitive) name or created. All
    /// previous area links are replaced by the single new one.
    pub async fn complete(
        &self,
        director_id: DbId,
        area: &str,
        position: &str,
        actor: Option<&str>,
    ) -> Result<ResolvedDirector, CoreError> {
        let area = area.trim();
        let position = position.trim();
        if area.is_empty() {
            return Err(CoreError::Validation("Area is required".to_string()));
        }
        if position.is_empty() {
            return Err(CoreError::Validation("Position is required".to_string()));
        }

        let director = self
            .store
            .find_director(director_id)
            .await?
            .ok_or_else(|| CoreError::not_found("director", director_id.to_string()))?;

        let linked = self
            .store
            .complete_director(director.id, area, position)
            .await?;

        let resolved = ResolvedDirector {
            director: Director {
                legacy_position: Some(position.to_string()),
                ..director
            },
            areas: vec![linked],
        };

        tracing::info!(
            director_id = resolved.id(),
            director = %resolved.name(),
            area = %area,
            position = %position,
            "Director completed"
        );
        self.sink
            .emit(ChangeNotice::director_completed(&resolved, actor));

        Ok(resolved)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
