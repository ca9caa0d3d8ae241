//! Custody and decommission ledger rows.
//!
//! `origin_pool` is stored as its text tag and parsed on the way out.

use custodia_core::custody::{CustodyRecord, DecommissionRecord};
use custodia_core::error::CoreError;
use custodia_core::types::{Date, DbId, Timestamp};
use sqlx::FromRow;

/// A row from the `custody_ledger` table.
#[derive(Debug, Clone, FromRow)]
pub struct CustodyRow {
    pub id: DbId,
    pub folio: String,
    pub assigned_on: Date,
    pub area: String,
    pub custodian: String,
    pub position: String,
    pub inventory_code: String,
    pub description: String,
    pub category: String,
    pub condition: String,
    pub holder: Option<String>,
    pub origin_pool: String,
    pub asset_id: DbId,
    pub created_at: Timestamp,
}

impl TryFrom<CustodyRow> for CustodyRecord {
    type Error = CoreError;

    fn try_from(row: CustodyRow) -> Result<Self, Self::Error> {
        Ok(CustodyRecord {
            origin_pool: row.origin_pool.parse()?,
            id: row.id,
            folio: row.folio,
            assigned_on: row.assigned_on,
            area: row.area,
            custodian: row.custodian,
            position: row.position,
            inventory_code: row.inventory_code,
            description: row.description,
            category: row.category,
            condition: row.condition,
            holder: row.holder,
            asset_id: row.asset_id,
            created_at: row.created_at,
        })
    }
}

/// A row from the `decommission_ledger` table.
#[derive(Debug, Clone, FromRow)]
pub struct DecommissionRow {
    pub id: DbId,
    pub custody_folio: String,
    pub decommission_folio: String,
    pub decommissioned_on: Date,
    pub area: String,
    pub custodian: String,
    pub position: String,
    pub inventory_code: String,
    pub description: String,
    pub category: String,
    pub condition: String,
    pub holder: Option<String>,
    pub origin_pool: String,
    pub actor: String,
    pub created_at: Timestamp,
}

impl TryFrom<DecommissionRow> for DecommissionRecord {
    type Error = CoreError;

    fn try_from(row: DecommissionRow) -> Result<Self, Self::Error> {
        Ok(DecommissionRecord {
            origin_pool: row.origin_pool.parse()?,
            id: row.id,
            custody_folio: row.custody_folio,
            decommission_folio: row.decommission_folio,
            decommissioned_on: row.decommissioned_on,
            area: row.area,
            custodian: row.custodian,
            position: row.position,
            inventory_code: row.inventory_code,
            description: row.description,
            category: row.category,
            condition: row.condition,
            holder: row.holder,
            actor: row.actor,
            created_at: row.created_at,
        })
    }
}
