//! In-process [`CustodyStore`] and [`ChangeSink`] used by tests and local tooling.
//!
//! Follows the non-transactional batch defaults of the trait. Failures can be
//! injected per step (optionally per inventory code) to exercise partial
//! commits, and the whole store can be marked unreachable.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};

use crate::catalog::{normalize_key, Asset, AssetRef, OriginPool};
use crate::custody::{
    AssetMatch, CustodyAssignment, CustodyRecord, DecommissionRecord, NewCustodyRecord,
    NewDecommissionRecord,
};
use crate::director::{Area, Director};
use crate::folio::FolioScope;
use crate::notice::{ChangeNotice, ChangeSink};
use crate::store::{CustodyStore, StoreError};
use crate::types::DbId;

#[derive(Debug, Default)]
struct Tables {
    assets: Vec<Asset>,
    custody: Vec<CustodyRecord>,
    decommission: Vec<DecommissionRecord>,
    directors: Vec<Director>,
    areas: Vec<Area>,
    director_areas: Vec<(DbId, DbId)>,
    reservations: Vec<(FolioScope, String, u32)>,
    failures: Vec<(&'static str, Option<String>)>,
    next_id: DbId,
}

impl Tables {
    fn next_id(&mut self) -> DbId {
        self.next_id += 1;
        self.next_id
    }
}

#[derive(Debug, Default)]
pub struct InMemoryStore {
    tables: Mutex<Tables>,
    reservations: bool,
    unreachable: AtomicBool,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable the `(scope, period)` reservation table.
    pub fn with_reservations() -> Self {
        Self {
            reservations: true,
            ..Self::default()
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn check(&self, step: &'static str, inventory_code: Option<&str>) -> Result<(), StoreError> {
        if self.unreachable.load(Ordering::SeqCst) {
            return Err(StoreError::new(step, "store unreachable"));
        }
        let tables = self.lock();
        let injected = tables.failures.iter().any(|(s, code)| {
            *s == step && (code.is_none() || code.as_deref() == inventory_code)
        });
        if injected {
            return Err(StoreError::new(step, "injected failure"));
        }
        Ok(())
    }

    // -- seeding ------------------------------------------------------------

    pub fn add_asset(&self, asset: Asset) -> AssetRef {
        let key = asset.key();
        self.lock().assets.push(asset);
        key
    }

    /// Edit a seeded asset in place; `false` when it does not exist.
    pub fn update_asset(&self, key: AssetRef, edit: impl FnOnce(&mut Asset)) -> bool {
        match self.lock().assets.iter_mut().find(|a| a.key() == key) {
            Some(asset) => {
                edit(asset);
                true
            }
            None => false,
        }
    }

    pub fn add_area(&self, name: &str) -> DbId {
        let mut tables = self.lock();
        let id = tables.next_id();
        tables.areas.push(Area {
            id,
            name: name.to_string(),
        });
        id
    }

    pub fn add_director(&self, name: &str, position: Option<&str>) -> DbId {
        let mut tables = self.lock();
        let id = tables.next_id();
        tables.directors.push(Director {
            id,
            name: name.to_string(),
            legacy_area: None,
            legacy_position: position.map(str::to_string),
        });
        id
    }

    /// Link a director to an area by name, creating the area if needed.
    pub fn link_director_area(&self, director_id: DbId, area: &str) {
        let existing = self
            .lock()
            .areas
            .iter()
            .find(|a| a.name == area)
            .map(|a| a.id);
        let area_id = existing.unwrap_or_else(|| self.add_area(area));
        self.lock().director_areas.push((director_id, area_id));
    }

    /// Make `step` fail, for every asset or only for `inventory_code`.
    pub fn fail_step(&self, step: &'static str, inventory_code: Option<&str>) {
        self.lock()
            .failures
            .push((step, inventory_code.map(str::to_string)));
    }

    pub fn set_unreachable(&self, unreachable: bool) {
        self.unreachable.store(unreachable, Ordering::SeqCst);
    }

    // -- inspection ---------------------------------------------------------

    pub fn asset(&self, key: AssetRef) -> Option<Asset> {
        self.lock().assets.iter().find(|a| a.key() == key).cloned()
    }

    pub fn custody_rows(&self) -> Vec<CustodyRecord> {
        self.lock().custody.clone()
    }

    pub fn decommission_rows(&self) -> Vec<DecommissionRecord> {
        self.lock().decommission.clone()
    }
}

#[async_trait]
impl CustodyStore for InMemoryStore {
    async fn load_assets(&self, pool: OriginPool) -> Result<Vec<Asset>, StoreError> {
        self.check("load_assets", None)?;
        Ok(self
            .lock()
            .assets
            .iter()
            .filter(|a| a.pool == pool)
            .cloned()
            .collect())
    }

    async fn custody_folios_on(&self, day: NaiveDate) -> Result<Vec<String>, StoreError> {
        self.check("custody_folios_on", None)?;
        Ok(self
            .lock()
            .custody
            .iter()
            .filter(|r| r.assigned_on == day)
            .map(|r| r.folio.clone())
            .collect())
    }

    async fn latest_decommission_folio(&self) -> Result<Option<String>, StoreError> {
        self.check("latest_decommission_folio", None)?;
        Ok(self
            .lock()
            .decommission
            .last()
            .map(|r| r.decommission_folio.clone()))
    }

    async fn reserve_sequence(
        &self,
        scope: FolioScope,
        period: &str,
        candidate: u32,
    ) -> Result<u32, StoreError> {
        self.check("reserve_sequence", None)?;
        if !self.reservations {
            return Ok(candidate);
        }
        let mut tables = self.lock();
        let slot = tables
            .reservations
            .iter()
            .position(|(s, p, _)| *s == scope && p == period);
        let reserved = match slot {
            Some(index) => {
                let last = &mut tables.reservations[index].2;
                *last = candidate.max(last.saturating_add(1));
                *last
            }
            None => {
                tables
                    .reservations
                    .push((scope, period.to_string(), candidate));
                candidate
            }
        };
        Ok(reserved)
    }

    async fn assign_asset(&self, assignment: &CustodyAssignment) -> Result<bool, StoreError> {
        let code = self
            .lock()
            .assets
            .iter()
            .find(|a| a.key() == assignment.asset)
            .map(|a| a.inventory_code.clone());
        self.check("assign_asset", code.as_deref())?;

        let mut tables = self.lock();
        let Some(asset) = tables
            .assets
            .iter_mut()
            .find(|a| a.key() == assignment.asset)
        else {
            return Ok(false);
        };
        asset.custodian = Some(assignment.custodian.clone());
        asset.area = Some(assignment.area.clone());
        asset.holder = assignment.holder.clone();
        Ok(true)
    }

    async fn set_asset_holder(&self, assignment: &CustodyAssignment) -> Result<bool, StoreError> {
        let code = self
            .lock()
            .assets
            .iter()
            .find(|a| a.key() == assignment.asset)
            .map(|a| a.inventory_code.clone());
        self.check("set_asset_holder", code.as_deref())?;

        let mut tables = self.lock();
        let Some(asset) = tables.assets.iter_mut().find(|a| {
            a.key() == assignment.asset
                && a.custodian.as_deref() == Some(assignment.custodian.as_str())
                && a.area.as_deref() == Some(assignment.area.as_str())
        }) else {
            return Ok(false);
        };
        asset.holder = assignment.holder.clone();
        Ok(true)
    }

    async fn clear_asset_custody(&self, target: &AssetMatch) -> Result<u64, StoreError> {
        self.check("clear_asset_custody", Some(&target.inventory_code))?;
        let mut cleared = 0;
        for asset in self.lock().assets.iter_mut() {
            if target.matches(asset) {
                asset.custodian = None;
                asset.area = None;
                asset.holder = None;
                cleared += 1;
            }
        }
        Ok(cleared)
    }

    async fn append_custody_record(
        &self,
        record: &NewCustodyRecord,
    ) -> Result<CustodyRecord, StoreError> {
        self.check("append_custody_record", Some(&record.inventory_code))?;
        let mut tables = self.lock();
        let row = CustodyRecord {
            id: tables.next_id(),
            folio: record.folio.clone(),
            assigned_on: record.assigned_on,
            area: record.area.clone(),
            custodian: record.custodian.clone(),
            position: record.position.clone(),
            inventory_code: record.inventory_code.clone(),
            description: record.description.clone(),
            category: record.category.clone(),
            condition: record.condition.clone(),
            holder: record.holder.clone(),
            origin_pool: record.origin_pool,
            asset_id: record.asset_id,
            created_at: Utc::now(),
        };
        tables.custody.push(row.clone());
        Ok(row)
    }

    async fn custody_records(&self, folio: &str) -> Result<Vec<CustodyRecord>, StoreError> {
        self.check("custody_records", None)?;
        Ok(self
            .lock()
            .custody
            .iter()
            .filter(|r| r.folio == folio)
            .cloned()
            .collect())
    }

    async fn delete_custody_records(
        &self,
        folio: &str,
        inventory_code: &str,
    ) -> Result<u64, StoreError> {
        self.check("delete_custody_records", Some(inventory_code))?;
        let mut tables = self.lock();
        let before = tables.custody.len();
        tables
            .custody
            .retain(|r| !(r.folio == folio && r.inventory_code == inventory_code));
        Ok((before - tables.custody.len()) as u64)
    }

    async fn update_custody_holder(
        &self,
        folio: &str,
        inventory_code: &str,
        holder: Option<&str>,
    ) -> Result<u64, StoreError> {
        self.check("update_custody_holder", Some(inventory_code))?;
        let mut updated = 0;
        for row in self.lock().custody.iter_mut() {
            if row.folio == folio && row.inventory_code == inventory_code {
                row.holder = holder.map(str::to_string);
                updated += 1;
            }
        }
        Ok(updated)
    }

    async fn insert_decommission_record(
        &self,
        record: &NewDecommissionRecord,
    ) -> Result<DecommissionRecord, StoreError> {
        self.check("insert_decommission_record", Some(&record.inventory_code))?;
        let mut tables = self.lock();
        let row = DecommissionRecord {
            id: tables.next_id(),
            custody_folio: record.custody_folio.clone(),
            decommission_folio: record.decommission_folio.clone(),
            decommissioned_on: record.decommissioned_on,
            area: record.area.clone(),
            custodian: record.custodian.clone(),
            position: record.position.clone(),
            inventory_code: record.inventory_code.clone(),
            description: record.description.clone(),
            category: record.category.clone(),
            condition: record.condition.clone(),
            holder: record.holder.clone(),
            origin_pool: record.origin_pool,
            actor: record.actor.clone(),
            created_at: Utc::now(),
        };
        tables.decommission.push(row.clone());
        Ok(row)
    }

    async fn decommission_records(
        &self,
        decommission_folio: &str,
    ) -> Result<Vec<DecommissionRecord>, StoreError> {
        self.check("decommission_records", None)?;
        Ok(self
            .lock()
            .decommission
            .iter()
            .filter(|r| r.decommission_folio == decommission_folio)
            .cloned()
            .collect())
    }

    async fn find_director_by_name(&self, name: &str) -> Result<Option<Director>, StoreError> {
        self.check("find_director_by_name", None)?;
        let wanted = normalize_key(name);
        Ok(self
            .lock()
            .directors
            .iter()
            .find(|d| normalize_key(&d.name) == wanted)
            .cloned())
    }

    async fn find_director(&self, id: DbId) -> Result<Option<Director>, StoreError> {
        self.check("find_director", None)?;
        Ok(self.lock().directors.iter().find(|d| d.id == id).cloned())
    }

    async fn director_areas(&self, director_id: DbId) -> Result<Vec<Area>, StoreError> {
        self.check("director_areas", None)?;
        let tables = self.lock();
        Ok(tables
            .director_areas
            .iter()
            .filter(|(d, _)| *d == director_id)
            .filter_map(|(_, a)| tables.areas.iter().find(|area| area.id == *a).cloned())
            .collect())
    }

    async fn find_area_by_name(&self, name: &str) -> Result<Option<Area>, StoreError> {
        self.check("find_area_by_name", None)?;
        Ok(self.lock().areas.iter().find(|a| a.name == name).cloned())
    }

    async fn create_area(&self, name: &str) -> Result<Area, StoreError> {
        self.check("create_area", None)?;
        let id = self.add_area(name);
        Ok(Area {
            id,
            name: name.to_string(),
        })
    }

    async fn replace_director_areas(
        &self,
        director_id: DbId,
        area_ids: &[DbId],
    ) -> Result<(), StoreError> {
        self.check("replace_director_areas", None)?;
        let mut tables = self.lock();
        tables.director_areas.retain(|(d, _)| *d != director_id);
        tables
            .director_areas
            .extend(area_ids.iter().map(|a| (director_id, *a)));
        Ok(())
    }

    async fn update_director_position(
        &self,
        director_id: DbId,
        position: &str,
    ) -> Result<(), StoreError> {
        self.check("update_director_position", None)?;
        if let Some(director) = self
            .lock()
            .directors
            .iter_mut()
            .find(|d| d.id == director_id)
        {
            director.legacy_position = Some(position.to_string());
        }
        Ok(())
    }
}

/// Keeps every notice it receives.
#[derive(Debug, Default)]
pub struct RecordingSink {
    notices: Mutex<Vec<ChangeNotice>>,
}

impl RecordingSink {
    pub fn notices(&self) -> Vec<ChangeNotice> {
        self.notices
            .lock()
            .map(|n| n.clone())
            .unwrap_or_default()
    }

    pub fn kinds(&self) -> Vec<String> {
        self.notices().into_iter().map(|n| n.kind).collect()
    }
}

impl ChangeSink for RecordingSink {
    fn emit(&self, notice: ChangeNotice) {
        if let Ok(mut notices) = self.notices.lock() {
            notices.push(notice);
        }
    }
}
