//! Postgres implementation of [`CustodyStore`].
//!
//! Single-row operations go straight to the pool. The batch operations are
//! overridden to run inside one transaction each: the first failing step rolls
//! back the whole batch and surfaces as a [`StoreError`] naming that step, so a
//! report returned from here never carries failures.

use async_trait::async_trait;
use chrono::NaiveDate;
use custodia_core::catalog::{Asset, OriginPool};
use custodia_core::custody::{
    AssetMatch, CustodyAssignment, CustodyRecord, DecommissionRecord, NewCustodyRecord,
    NewDecommissionRecord,
};
use custodia_core::director::{Area, Director};
use custodia_core::folio::FolioScope;
use custodia_core::store::{
    retirement_groups, AssignmentStep, BatchReport, CustodyStore, Retired, RetirementStep,
    StoreError,
};
use custodia_core::types::DbId;

use crate::repositories::{
    AreaRepo, AssetRepo, CustodyLedgerRepo, DecommissionLedgerRepo, DirectorRepo,
    FolioReservationRepo,
};
use crate::DbPool;

#[derive(Debug, Clone)]
pub struct PgCustodyStore {
    pool: DbPool,
}

impl PgCustodyStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

/// Tag a `sqlx` failure with the step it happened in.
fn step(name: &'static str) -> impl Fn(sqlx::Error) -> StoreError {
    move |err| StoreError::new(name, err)
}

fn decode<T, R>(name: &'static str, row: R) -> Result<T, StoreError>
where
    R: TryInto<T>,
    R::Error: std::fmt::Display,
{
    row.try_into().map_err(|err| StoreError::new(name, err))
}

#[async_trait]
impl CustodyStore for PgCustodyStore {
    // -- catalog ------------------------------------------------------------

    async fn load_assets(&self, pool: OriginPool) -> Result<Vec<Asset>, StoreError> {
        let rows = AssetRepo::list(&self.pool, pool)
            .await
            .map_err(step("load_assets"))?;
        Ok(rows.into_iter().map(|row| row.into_asset(pool)).collect())
    }

    // -- folios -------------------------------------------------------------

    async fn custody_folios_on(&self, day: NaiveDate) -> Result<Vec<String>, StoreError> {
        CustodyLedgerRepo::folios_on(&self.pool, day)
            .await
            .map_err(step("custody_folios_on"))
    }

    async fn latest_decommission_folio(&self) -> Result<Option<String>, StoreError> {
        DecommissionLedgerRepo::latest_folio(&self.pool)
            .await
            .map_err(step("latest_decommission_folio"))
    }

    async fn reserve_sequence(
        &self,
        scope: FolioScope,
        period: &str,
        candidate: u32,
    ) -> Result<u32, StoreError> {
        let candidate = i32::try_from(candidate)
            .map_err(|err| StoreError::new("reserve_sequence", err))?;
        let reserved =
            FolioReservationRepo::reserve(&self.pool, scope.as_str(), period, candidate)
                .await
                .map_err(step("reserve_sequence"))?;
        u32::try_from(reserved).map_err(|err| StoreError::new("reserve_sequence", err))
    }

    // -- assets -------------------------------------------------------------

    async fn assign_asset(&self, assignment: &CustodyAssignment) -> Result<bool, StoreError> {
        AssetRepo::assign(
            &self.pool,
            assignment.asset.pool,
            assignment.asset.id,
            &assignment.custodian,
            &assignment.area,
            assignment.holder.as_deref(),
        )
        .await
        .map_err(step("assign_asset"))
    }

    async fn set_asset_holder(&self, assignment: &CustodyAssignment) -> Result<bool, StoreError> {
        AssetRepo::set_holder(
            &self.pool,
            assignment.asset.pool,
            assignment.asset.id,
            &assignment.custodian,
            &assignment.area,
            assignment.holder.as_deref(),
        )
        .await
        .map_err(step("set_asset_holder"))
    }

    async fn clear_asset_custody(&self, target: &AssetMatch) -> Result<u64, StoreError> {
        AssetRepo::clear_custody(&self.pool, target)
            .await
            .map_err(step("clear_asset_custody"))
    }

    // -- ledgers ------------------------------------------------------------

    async fn append_custody_record(
        &self,
        record: &NewCustodyRecord,
    ) -> Result<CustodyRecord, StoreError> {
        let row = CustodyLedgerRepo::insert(&self.pool, record)
            .await
            .map_err(step("append_custody_record"))?;
        decode("append_custody_record", row)
    }

    async fn custody_records(&self, folio: &str) -> Result<Vec<CustodyRecord>, StoreError> {
        CustodyLedgerRepo::list_by_folio(&self.pool, folio)
            .await
            .map_err(step("custody_records"))?
            .into_iter()
            .map(|row| decode("custody_records", row))
            .collect()
    }

    async fn custody_folios_issued_on(&self, day: NaiveDate) -> Result<Vec<String>, StoreError> {
        CustodyLedgerRepo::distinct_folios_on(&self.pool, day)
            .await
            .map_err(step("custody_folios_issued_on"))
    }

    async fn delete_custody_records(
        &self,
        folio: &str,
        inventory_code: &str,
    ) -> Result<u64, StoreError> {
        CustodyLedgerRepo::delete_by_folio_and_code(&self.pool, folio, inventory_code)
            .await
            .map_err(step("delete_custody_records"))
    }

    async fn update_custody_holder(
        &self,
        folio: &str,
        inventory_code: &str,
        holder: Option<&str>,
    ) -> Result<u64, StoreError> {
        CustodyLedgerRepo::update_holder(&self.pool, folio, inventory_code, holder)
            .await
            .map_err(step("update_custody_holder"))
    }

    async fn insert_decommission_record(
        &self,
        record: &NewDecommissionRecord,
    ) -> Result<DecommissionRecord, StoreError> {
        let row = DecommissionLedgerRepo::insert(&self.pool, record)
            .await
            .map_err(step("insert_decommission_record"))?;
        decode("insert_decommission_record", row)
    }

    async fn decommission_records(
        &self,
        decommission_folio: &str,
    ) -> Result<Vec<DecommissionRecord>, StoreError> {
        DecommissionLedgerRepo::list_by_decommission_folio(&self.pool, decommission_folio)
            .await
            .map_err(step("decommission_records"))?
            .into_iter()
            .map(|row| decode("decommission_records", row))
            .collect()
    }

    // -- directors ----------------------------------------------------------

    async fn find_director_by_name(&self, name: &str) -> Result<Option<Director>, StoreError> {
        Ok(DirectorRepo::find_by_normalized_name(&self.pool, name)
            .await
            .map_err(step("find_director_by_name"))?
            .map(Director::from))
    }

    async fn find_director(&self, id: DbId) -> Result<Option<Director>, StoreError> {
        Ok(DirectorRepo::find_by_id(&self.pool, id)
            .await
            .map_err(step("find_director"))?
            .map(Director::from))
    }

    async fn director_areas(&self, director_id: DbId) -> Result<Vec<Area>, StoreError> {
        Ok(AreaRepo::list_for_director(&self.pool, director_id)
            .await
            .map_err(step("director_areas"))?
            .into_iter()
            .map(Area::from)
            .collect())
    }

    async fn find_area_by_name(&self, name: &str) -> Result<Option<Area>, StoreError> {
        Ok(AreaRepo::find_by_name(&self.pool, name)
            .await
            .map_err(step("find_area_by_name"))?
            .map(Area::from))
    }

    async fn create_area(&self, name: &str) -> Result<Area, StoreError> {
        Ok(AreaRepo::create(&self.pool, name)
            .await
            .map_err(step("create_area"))?
            .into())
    }

    async fn replace_director_areas(
        &self,
        director_id: DbId,
        area_ids: &[DbId],
    ) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await.map_err(step("begin"))?;
        DirectorRepo::replace_areas(&mut *tx, director_id, area_ids)
            .await
            .map_err(step("replace_director_areas"))?;
        tx.commit().await.map_err(step("commit"))
    }

    async fn update_director_position(
        &self,
        director_id: DbId,
        position: &str,
    ) -> Result<(), StoreError> {
        DirectorRepo::update_position(&self.pool, director_id, position)
            .await
            .map_err(step("update_director_position"))?;
        Ok(())
    }

    // -- batches ------------------------------------------------------------

    async fn apply_assignments(
        &self,
        steps: &[AssignmentStep],
    ) -> Result<BatchReport<CustodyRecord>, StoreError> {
        let mut tx = self.pool.begin().await.map_err(step("begin"))?;
        let mut report = BatchReport::<CustodyRecord>::default();

        for s in steps {
            let assignment = &s.assignment;
            let found = AssetRepo::assign(
                &mut *tx,
                assignment.asset.pool,
                assignment.asset.id,
                &assignment.custodian,
                &assignment.area,
                assignment.holder.as_deref(),
            )
            .await
            .map_err(step("assign_asset"))?;
            if !found {
                return Err(StoreError::new(
                    "assign_asset",
                    format!(
                        "asset {} not found in {}",
                        s.record.inventory_code, assignment.asset.pool
                    ),
                ));
            }

            let row = CustodyLedgerRepo::insert(&mut *tx, &s.record)
                .await
                .map_err(step("append_custody_record"))?;
            report
                .succeeded
                .push(decode("append_custody_record", row)?);
        }

        tx.commit().await.map_err(step("commit"))?;
        tracing::debug!(rows = report.succeeded.len(), "Assignment batch committed");
        Ok(report)
    }

    async fn apply_retirements(
        &self,
        steps: &[RetirementStep],
    ) -> Result<BatchReport<Retired>, StoreError> {
        let mut tx = self.pool.begin().await.map_err(step("begin"))?;
        let mut report = BatchReport::<Retired>::default();

        for group in retirement_groups(steps) {
            let first = group[0];
            let mut cleared: Vec<(&AssetMatch, bool)> = Vec::new();
            for s in &group {
                let row = DecommissionLedgerRepo::insert(&mut *tx, &s.audit)
                    .await
                    .map_err(step("insert_decommission_record"))?;
                let record = decode("insert_decommission_record", row)?;

                let known = cleared
                    .iter()
                    .find(|(m, _)| **m == s.asset_match)
                    .map(|(_, hit)| *hit);
                let asset_cleared = match known {
                    Some(hit) => hit,
                    None => {
                        let count = AssetRepo::clear_custody(&mut *tx, &s.asset_match)
                            .await
                            .map_err(step("clear_asset_custody"))?;
                        cleared.push((&s.asset_match, count > 0));
                        count > 0
                    }
                };
                report.succeeded.push(Retired {
                    record,
                    asset_cleared,
                });
            }

            CustodyLedgerRepo::delete_by_folio_and_code(
                &mut *tx,
                &first.folio,
                &first.inventory_code,
            )
            .await
            .map_err(step("delete_custody_records"))?;
        }

        tx.commit().await.map_err(step("commit"))?;
        tracing::debug!(rows = report.succeeded.len(), "Retirement batch committed");
        Ok(report)
    }

    async fn complete_director(
        &self,
        director_id: DbId,
        area_name: &str,
        position: &str,
    ) -> Result<Area, StoreError> {
        let mut tx = self.pool.begin().await.map_err(step("begin"))?;

        let existing = AreaRepo::find_by_name(&mut *tx, area_name)
            .await
            .map_err(step("find_area_by_name"))?;
        let area = match existing {
            Some(area) => area,
            None => AreaRepo::create(&mut *tx, area_name)
                .await
                .map_err(step("create_area"))?,
        };
        DirectorRepo::replace_areas(&mut *tx, director_id, &[area.id])
            .await
            .map_err(step("replace_director_areas"))?;
        DirectorRepo::update_position(&mut *tx, director_id, position)
            .await
            .map_err(step("update_director_position"))?;

        tx.commit().await.map_err(step("commit"))?;
        Ok(area.into())
    }
}
