//! Custody ledger rows, decommission audit rows and the document payloads
//! handed to the document generator.

use serde::{Deserialize, Serialize};

use crate::catalog::{Asset, AssetRef, OriginPool};
use crate::director::ResolvedDirector;
use crate::types::{Date, DbId, Timestamp};

// ---------------------------------------------------------------------------
// Ledger rows
// ---------------------------------------------------------------------------

/// One asset's entry in a custody document.
///
/// Descriptive fields are a snapshot taken at assignment time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustodyRecord {
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
    pub origin_pool: OriginPool,
    pub asset_id: DbId,
    pub created_at: Timestamp,
}

impl CustodyRecord {
    pub fn asset_key(&self) -> AssetRef {
        AssetRef {
            pool: self.origin_pool,
            id: self.asset_id,
        }
    }
}

/// Ledger row about to be appended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewCustodyRecord {
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
    pub origin_pool: OriginPool,
    pub asset_id: DbId,
}

impl NewCustodyRecord {
    /// Snapshot `asset` into a ledger row of `folio`.
    pub fn snapshot(
        asset: &Asset,
        folio: &str,
        assigned_on: Date,
        director: &ResolvedDirector,
        area: &str,
        holder: Option<String>,
    ) -> Self {
        Self {
            folio: folio.to_string(),
            assigned_on,
            area: area.to_string(),
            custodian: director.name().to_string(),
            position: director.position().to_string(),
            inventory_code: asset.inventory_code.clone(),
            description: asset.description.clone(),
            category: asset.category.clone(),
            condition: asset.condition.clone(),
            holder,
            origin_pool: asset.pool,
            asset_id: asset.id,
        }
    }
}

/// Append-only audit copy of a retired ledger row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecommissionRecord {
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
    pub origin_pool: OriginPool,
    pub actor: String,
    pub created_at: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewDecommissionRecord {
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
    pub origin_pool: OriginPool,
    pub actor: String,
}

impl NewDecommissionRecord {
    pub fn from_custody(
        row: &CustodyRecord,
        decommission_folio: &str,
        decommissioned_on: Date,
        actor: &str,
    ) -> Self {
        Self {
            custody_folio: row.folio.clone(),
            decommission_folio: decommission_folio.to_string(),
            decommissioned_on,
            area: row.area.clone(),
            custodian: row.custodian.clone(),
            position: row.position.clone(),
            inventory_code: row.inventory_code.clone(),
            description: row.description.clone(),
            category: row.category.clone(),
            condition: row.condition.clone(),
            holder: row.holder.clone(),
            origin_pool: row.origin_pool,
            actor: actor.to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Asset-side writes
// ---------------------------------------------------------------------------

/// Custodial fields written onto an asset in its origin pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustodyAssignment {
    pub asset: AssetRef,
    pub custodian: String,
    pub area: String,
    pub holder: Option<String>,
}

/// Locates the physical asset behind a ledger row when clearing custody.
///
/// Every descriptive field must match, not just the inventory code, so that a
/// physical duplicate sharing a code is left alone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetMatch {
    pub pool: OriginPool,
    pub inventory_code: String,
    pub description: String,
    pub category: String,
    pub condition: String,
    pub area: String,
}

impl AssetMatch {
    pub fn from_custody(row: &CustodyRecord) -> Self {
        Self {
            pool: row.origin_pool,
            inventory_code: row.inventory_code.clone(),
            description: row.description.clone(),
            category: row.category.clone(),
            condition: row.condition.clone(),
            area: row.area.clone(),
        }
    }

    pub fn matches(&self, asset: &Asset) -> bool {
        asset.pool == self.pool
            && asset.inventory_code == self.inventory_code
            && asset.description == self.description
            && asset.category == self.category
            && asset.condition == self.condition
            && asset.area.as_deref() == Some(self.area.as_str())
    }
}

// ---------------------------------------------------------------------------
// Lifecycle state
// ---------------------------------------------------------------------------

/// Lifecycle of one custody record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CustodyState {
    Draft,
    Committed,
    PartiallyDecommissioned,
    FullyDecommissioned,
}

impl CustodyState {
    /// State after a decommission pass, given the ledger rows left for the folio.
    pub fn after_decommission(remaining_rows: usize) -> Self {
        if remaining_rows == 0 {
            CustodyState::FullyDecommissioned
        } else {
            CustodyState::PartiallyDecommissioned
        }
    }
}

// ---------------------------------------------------------------------------
// Document payloads
// ---------------------------------------------------------------------------

/// One asset line of a custody or decommission document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentLine {
    pub inventory_code: String,
    pub description: String,
    pub category: String,
    pub condition: String,
    pub origin_pool: OriginPool,
    pub holder: Option<String>,
}

impl DocumentLine {
    fn from_custody(row: &CustodyRecord) -> Self {
        Self {
            inventory_code: row.inventory_code.clone(),
            description: row.description.clone(),
            category: row.category.clone(),
            condition: row.condition.clone(),
            origin_pool: row.origin_pool,
            holder: row.holder.clone(),
        }
    }
}

/// Everything the document generator needs to print a custody record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustodyDocument {
    pub folio: String,
    pub date: Date,
    pub custodian: String,
    pub area: String,
    pub position: String,
    /// Document-level holder; lines may override it.
    pub holder: Option<String>,
    pub lines: Vec<DocumentLine>,
}

impl CustodyDocument {
    /// Assemble from ledger rows of one folio, in row order.
    ///
    /// Returns `None` when `rows` is empty.
    pub fn from_records(rows: &[CustodyRecord], holder: Option<String>) -> Option<Self> {
        let first = rows.first()?;
        Some(Self {
            folio: first.folio.clone(),
            date: first.assigned_on,
            custodian: first.custodian.clone(),
            area: first.area.clone(),
            position: first.position.clone(),
            holder: holder.or_else(|| first.holder.clone()),
            lines: rows.iter().map(DocumentLine::from_custody).collect(),
        })
    }
}

/// Payload for the decommission document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecommissionDocument {
    pub decommission_folio: String,
    pub custody_folio: String,
    pub date: Date,
    pub custodian: String,
    pub area: String,
    pub position: String,
    pub actor: String,
    pub lines: Vec<DocumentLine>,
}

impl DecommissionDocument {
    pub fn from_records(rows: &[DecommissionRecord]) -> Option<Self> {
        let first = rows.first()?;
        Some(Self {
            decommission_folio: first.decommission_folio.clone(),
            custody_folio: first.custody_folio.clone(),
            date: first.decommissioned_on,
            custodian: first.custodian.clone(),
            area: first.area.clone(),
            position: first.position.clone(),
            actor: first.actor.clone(),
            lines: rows
                .iter()
                .map(|row| DocumentLine {
                    inventory_code: row.inventory_code.clone(),
                    description: row.description.clone(),
                    category: row.category.clone(),
                    condition: row.condition.clone(),
                    origin_pool: row.origin_pool,
                    holder: row.holder.clone(),
                })
                .collect(),
        })
    }
}
