//! Asset rows from the three origin-pool tables.

use custodia_core::catalog::{Asset, OriginPool};
use custodia_core::types::{Date, DbId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from `assets_federal`, `assets_state` or `assets_unlisted`.
///
/// The pool is not a column; it is the table the row came from.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct AssetRow {
    pub id: DbId,
    pub inventory_code: String,
    pub description: String,
    pub category: String,
    pub condition: String,
    pub status: String,
    pub value: Option<Decimal>,
    pub acquired_on: Option<Date>,
    pub location: Option<String>,
    pub area: Option<String>,
    pub custodian: Option<String>,
    pub holder: Option<String>,
    pub decommission_date: Option<Date>,
    pub decommission_cause: Option<String>,
    pub image_ref: Option<String>,
}

impl AssetRow {
    pub fn into_asset(self, pool: OriginPool) -> Asset {
        Asset {
            id: self.id,
            pool,
            inventory_code: self.inventory_code,
            description: self.description,
            category: self.category,
            condition: self.condition,
            status: self.status,
            value: self.value,
            acquired_on: self.acquired_on,
            location: self.location,
            area: self.area,
            custodian: self.custodian,
            holder: self.holder,
            decommission_date: self.decommission_date,
            decommission_cause: self.decommission_cause,
            image_ref: self.image_ref,
        }
    }
}

/// DTO for inserting an asset (imports, fixtures).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateAsset {
    pub inventory_code: String,
    pub description: String,
    pub category: String,
    pub condition: String,
    pub status: String,
    pub value: Option<Decimal>,
    pub acquired_on: Option<Date>,
    pub location: Option<String>,
    pub area: Option<String>,
    pub custodian: Option<String>,
    pub holder: Option<String>,
}
