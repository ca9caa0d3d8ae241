//! Persistence seam for the custody lifecycle.
//!
//! [`CustodyStore`] lists the single-row operations the workflow needs, plus
//! batch operations with sequential, non-transactional defaults. A backend
//! that can do better (a database transaction) overrides the batch methods so
//! a batch becomes all-or-nothing.

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::catalog::{Asset, AssetCatalog, OriginPool};
use crate::custody::{
    AssetMatch, CustodyAssignment, CustodyRecord, DecommissionRecord, NewCustodyRecord,
    NewDecommissionRecord,
};
use crate::director::{Area, Director};
use crate::error::{CoreError, StepFailure};
use crate::folio::FolioScope;
use crate::types::DbId;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// A backend failure, tagged with the operation that failed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{step}: {message}")]
pub struct StoreError {
    pub step: &'static str,
    pub message: String,
}

impl StoreError {
    pub fn new(step: &'static str, err: impl std::fmt::Display) -> Self {
        Self {
            step,
            message: err.to_string(),
        }
    }
}

impl From<StoreError> for CoreError {
    fn from(err: StoreError) -> Self {
        CoreError::Store {
            step: err.step,
            message: err.message,
        }
    }
}

// ---------------------------------------------------------------------------
// Batch steps
// ---------------------------------------------------------------------------

/// Assign one asset: write custodial fields and append its ledger row.
#[derive(Debug, Clone)]
pub struct AssignmentStep {
    pub assignment: CustodyAssignment,
    pub record: NewCustodyRecord,
}

/// Retire one ledger row: audit copy, ledger delete, asset clearing.
///
/// Rows sharing `(folio, inventory_code)` each get their own step; the ledger
/// delete covers all of them, so it runs once per group.
#[derive(Debug, Clone)]
pub struct RetirementStep {
    pub folio: String,
    pub inventory_code: String,
    pub audit: NewDecommissionRecord,
    pub asset_match: AssetMatch,
}

/// A successfully retired row.
#[derive(Debug, Clone)]
pub struct Retired {
    pub record: DecommissionRecord,
    /// `false` when no asset matched the row in its origin pool.
    pub asset_cleared: bool,
}

/// Per-step results of a batch.
#[derive(Debug, Clone)]
pub struct BatchReport<T> {
    pub succeeded: Vec<T>,
    pub failed: Vec<StepFailure>,
}

impl<T> Default for BatchReport<T> {
    fn default() -> Self {
        Self {
            succeeded: Vec::new(),
            failed: Vec::new(),
        }
    }
}

/// Steps grouped by `(folio, inventory_code)`, in first-seen order.
pub fn retirement_groups(steps: &[RetirementStep]) -> Vec<Vec<&RetirementStep>> {
    let mut groups: Vec<Vec<&RetirementStep>> = Vec::new();
    for step in steps {
        match groups.iter_mut().find(|g| {
            g[0].folio == step.folio && g[0].inventory_code == step.inventory_code
        }) {
            Some(group) => group.push(step),
            None => groups.push(vec![step]),
        }
    }
    groups
}

impl<T> BatchReport<T> {
    fn fail(&mut self, inventory_code: &str, err: StoreError) {
        self.failed.push(StepFailure {
            inventory_code: inventory_code.to_string(),
            step: err.step,
            message: err.message,
        });
    }
}

// ---------------------------------------------------------------------------
// Store trait
// ---------------------------------------------------------------------------

#[async_trait]
pub trait CustodyStore: Send + Sync {
    // -- catalog ------------------------------------------------------------

    async fn load_assets(&self, pool: OriginPool) -> Result<Vec<Asset>, StoreError>;

    /// Project every pool into one catalog snapshot.
    async fn load_catalog(&self, version: u64) -> Result<AssetCatalog, StoreError> {
        let mut pools = Vec::with_capacity(OriginPool::ALL.len());
        for pool in OriginPool::ALL {
            pools.push(self.load_assets(pool).await?);
        }
        Ok(AssetCatalog::from_pools(version, pools))
    }

    // -- folios -------------------------------------------------------------

    /// Folio of every ledger row assigned on `day` (duplicates included).
    async fn custody_folios_on(&self, day: NaiveDate) -> Result<Vec<String>, StoreError>;

    /// Folio of the most recently created decommission row, any year.
    async fn latest_decommission_folio(&self) -> Result<Option<String>, StoreError>;

    /// Reserve a sequence number for `(scope, period)`.
    ///
    /// Returns `max(candidate, last reserved + 1)` on backends with a
    /// reservation table; the default keeps the candidate unchanged.
    async fn reserve_sequence(
        &self,
        _scope: FolioScope,
        _period: &str,
        candidate: u32,
    ) -> Result<u32, StoreError> {
        Ok(candidate)
    }

    // -- assets -------------------------------------------------------------

    /// Write custodian/area/holder onto one asset. `false` if it does not exist.
    async fn assign_asset(&self, assignment: &CustodyAssignment) -> Result<bool, StoreError>;

    /// Write only the holder, and only while the asset still carries
    /// `assignment`'s custodian and area. `false` when nothing matched.
    async fn set_asset_holder(&self, assignment: &CustodyAssignment) -> Result<bool, StoreError>;

    /// Clear custodian/area/holder on assets matching `target`; returns the count.
    async fn clear_asset_custody(&self, target: &AssetMatch) -> Result<u64, StoreError>;

    // -- ledgers ------------------------------------------------------------

    async fn append_custody_record(
        &self,
        record: &NewCustodyRecord,
    ) -> Result<CustodyRecord, StoreError>;

    /// Ledger rows of one folio, in insertion order.
    async fn custody_records(&self, folio: &str) -> Result<Vec<CustodyRecord>, StoreError>;

    /// Distinct folios assigned on `day`, in issue order.
    async fn custody_folios_issued_on(&self, day: NaiveDate) -> Result<Vec<String>, StoreError> {
        let mut folios = self.custody_folios_on(day).await?;
        let mut seen = std::collections::HashSet::new();
        folios.retain(|f| seen.insert(f.clone()));
        Ok(folios)
    }

    /// Delete every ledger row of `folio` carrying `inventory_code`.
    async fn delete_custody_records(
        &self,
        folio: &str,
        inventory_code: &str,
    ) -> Result<u64, StoreError>;

    async fn update_custody_holder(
        &self,
        folio: &str,
        inventory_code: &str,
        holder: Option<&str>,
    ) -> Result<u64, StoreError>;

    async fn insert_decommission_record(
        &self,
        record: &NewDecommissionRecord,
    ) -> Result<DecommissionRecord, StoreError>;

    async fn decommission_records(
        &self,
        decommission_folio: &str,
    ) -> Result<Vec<DecommissionRecord>, StoreError>;

    // -- directors ----------------------------------------------------------

    /// Director whose trimmed, case-folded name equals `name`'s.
    async fn find_director_by_name(&self, name: &str) -> Result<Option<Director>, StoreError>;

    async fn find_director(&self, id: DbId) -> Result<Option<Director>, StoreError>;

    async fn director_areas(&self, director_id: DbId) -> Result<Vec<Area>, StoreError>;

    /// Area with exactly this name (case-sensitive).
    async fn find_area_by_name(&self, name: &str) -> Result<Option<Area>, StoreError>;

    async fn create_area(&self, name: &str) -> Result<Area, StoreError>;

    /// Replace every area link of a director with `area_ids`.
    async fn replace_director_areas(
        &self,
        director_id: DbId,
        area_ids: &[DbId],
    ) -> Result<(), StoreError>;

    async fn update_director_position(
        &self,
        director_id: DbId,
        position: &str,
    ) -> Result<(), StoreError>;

    // -- batches ------------------------------------------------------------

    /// Assign every step in order. Failed steps are reported and skipped;
    /// earlier successes stay applied.
    async fn apply_assignments(
        &self,
        steps: &[AssignmentStep],
    ) -> Result<BatchReport<CustodyRecord>, StoreError> {
        let mut report = BatchReport::default();
        for step in steps {
            let code = &step.record.inventory_code;
            match self.assign_asset(&step.assignment).await {
                Ok(true) => {}
                Ok(false) => {
                    report.fail(
                        code,
                        StoreError::new(
                            "assign_asset",
                            format!("asset {code} not found in {}", step.assignment.asset.pool),
                        ),
                    );
                    continue;
                }
                Err(err) => {
                    report.fail(code, err);
                    continue;
                }
            }
            match self.append_custody_record(&step.record).await {
                Ok(record) => report.succeeded.push(record),
                Err(err) => report.fail(code, err),
            }
        }
        Ok(report)
    }

    /// Retire every step, one `(folio, code)` group at a time. A group with
    /// any audit copy unwritten is left in the ledger; audit copies written
    /// before the failure stay behind.
    async fn apply_retirements(
        &self,
        steps: &[RetirementStep],
    ) -> Result<BatchReport<Retired>, StoreError> {
        let mut report = BatchReport::default();
        'groups: for group in retirement_groups(steps) {
            let first = group[0];
            let code = &first.inventory_code;

            let mut records = Vec::with_capacity(group.len());
            for step in &group {
                match self.insert_decommission_record(&step.audit).await {
                    Ok(record) => records.push(record),
                    Err(err) => {
                        report.fail(code, err);
                        continue 'groups;
                    }
                }
            }
            if let Err(err) = self.delete_custody_records(&first.folio, code).await {
                report.fail(code, err);
                continue;
            }

            let mut cleared: Vec<(&AssetMatch, bool)> = Vec::new();
            let mut retired = Vec::with_capacity(group.len());
            for (step, record) in group.iter().zip(records) {
                let known = cleared
                    .iter()
                    .find(|(m, _)| **m == step.asset_match)
                    .map(|(_, hit)| *hit);
                let asset_cleared = match known {
                    Some(hit) => hit,
                    None => match self.clear_asset_custody(&step.asset_match).await {
                        Ok(count) => {
                            cleared.push((&step.asset_match, count > 0));
                            count > 0
                        }
                        Err(err) => {
                            report.fail(code, err);
                            continue 'groups;
                        }
                    },
                };
                retired.push(Retired {
                    record,
                    asset_cleared,
                });
            }
            report.succeeded.extend(retired);
        }
        Ok(report)
    }

    /// Point a director at exactly one area (found or created by exact name)
    /// and set the position.
    async fn complete_director(
        &self,
        director_id: DbId,
        area_name: &str,
        position: &str,
    ) -> Result<Area, StoreError> {
        let area = match self.find_area_by_name(area_name).await? {
            Some(area) => area,
            None => self.create_area(area_name).await?,
        };
        self.replace_director_areas(director_id, &[area.id]).await?;
        self.update_director_position(director_id, position).await?;
        Ok(area)
    }
}
