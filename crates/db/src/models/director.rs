use custodia_core::director::Director;
use custodia_core::types::DbId;
use serde::Deserialize;
use sqlx::FromRow;

/// A row from the `directors` table.
#[derive(Debug, Clone, FromRow)]
pub struct DirectorRow {
    pub id: DbId,
    pub name: String,
    pub legacy_area: Option<String>,
    pub legacy_position: Option<String>,
}

impl From<DirectorRow> for Director {
    fn from(row: DirectorRow) -> Self {
        Director {
            id: row.id,
            name: row.name,
            legacy_area: row.legacy_area,
            legacy_position: row.legacy_position,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateDirector {
    pub name: String,
    pub legacy_area: Option<String>,
    pub legacy_position: Option<String>,
}
