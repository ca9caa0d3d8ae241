use custodia_core::director::Area;
use custodia_core::types::DbId;
use sqlx::FromRow;

/// A row from the `areas` table.
#[derive(Debug, Clone, FromRow)]
pub struct AreaRow {
    pub id: DbId,
    pub name: String,
}

impl From<AreaRow> for Area {
    fn from(row: AreaRow) -> Self {
        Area {
            id: row.id,
            name: row.name,
        }
    }
}
