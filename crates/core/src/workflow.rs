//! Custody lifecycle: commit a selection under one folio, edit holders,
//! and retire some or all of a folio's assets.
//!
//! ```text
//! Draft(selection) --commit--> Committed(folio)
//!     --decommission(subset)--> PartiallyDecommissioned
//!     --decommission(rest)-->   FullyDecommissioned
//! ```

use std::collections::BTreeSet;

use serde::Serialize;

use crate::assignment::SelectionSession;
use crate::catalog::normalize_key;
use crate::custody::{
    AssetMatch, CustodyAssignment, CustodyDocument, CustodyRecord, CustodyState,
    DecommissionDocument, DecommissionRecord, NewCustodyRecord, NewDecommissionRecord,
};
use crate::director::ResolvedDirector;
use crate::error::{CoreError, StepFailure};
use crate::folio::FolioSequencer;
use crate::notice::{ChangeNotice, ChangeSink};
use crate::store::{AssignmentStep, CustodyStore, RetirementStep};
use crate::types::{today, Date};

// ---------------------------------------------------------------------------
// Requests and outcomes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct CommitRequest<'r> {
    pub selection: &'r SelectionSession,
    pub director: &'r ResolvedDirector,
    pub area: &'r str,
    /// Document-level holder; per-asset overrides live in the selection.
    pub holder: Option<&'r str>,
    pub actor: &'r str,
    /// Assignment date, today when `None`.
    pub date: Option<Date>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CommitOutcome {
    pub document: CustodyDocument,
    pub records: Vec<CustodyRecord>,
    /// The folio was issued without consulting the store.
    pub folio_fallback: bool,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecommissionTarget {
    All,
    Subset(Vec<String>),
}

#[derive(Debug, Clone)]
pub struct DecommissionRequest<'r> {
    pub custody_folio: &'r str,
    pub target: DecommissionTarget,
    pub actor: &'r str,
    pub date: Option<Date>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DecommissionOutcome {
    pub document: DecommissionDocument,
    pub records: Vec<DecommissionRecord>,
    pub state: CustodyState,
    /// Ledger rows still carrying the custody folio.
    pub remaining: usize,
    pub folio_fallback: bool,
    pub warnings: Vec<String>,
}

fn required<'a>(value: &'a str, what: &str) -> Result<&'a str, CoreError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(CoreError::Validation(format!("{what} is required")));
    }
    Ok(value)
}

fn blank_to_none(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Turn a batch with failures into an error. Nothing succeeded means the
/// first failure is reported as a plain store error.
fn batch_error(folio: &str, succeeded: Vec<String>, mut failed: Vec<StepFailure>) -> CoreError {
    if succeeded.is_empty() {
        let first = failed.remove(0);
        return CoreError::Store {
            step: first.step,
            message: format!("{}: {}", first.inventory_code, first.message),
        };
    }
    CoreError::PartialCommit {
        folio: folio.to_string(),
        succeeded,
        failed,
    }
}

// ---------------------------------------------------------------------------
// Workflow
// ---------------------------------------------------------------------------

pub struct CustodyLifecycleWorkflow<'a, S: CustodyStore + ?Sized, N: ChangeSink + ?Sized> {
    store: &'a S,
    sink: &'a N,
}

impl<'a, S: CustodyStore + ?Sized, N: ChangeSink + ?Sized> CustodyLifecycleWorkflow<'a, S, N> {
    pub fn new(store: &'a S, sink: &'a N) -> Self {
        Self { store, sink }
    }

    /// Commit the selection as one custody record.
    ///
    /// Every asset gets the director and area written onto it and one ledger
    /// row snapshotting its descriptive fields, all under a single folio.
    pub async fn commit(&self, request: CommitRequest<'_>) -> Result<CommitOutcome, CoreError> {
        let selection = request.selection;
        if selection.is_empty() {
            return Err(CoreError::Validation("Selection is empty".to_string()));
        }
        selection.validate()?;
        let actor = required(request.actor, "Actor")?;
        let director = request.director;
        let requested_area = required(request.area, "Area")?;
        let area = director
            .find_area(requested_area)
            .ok_or_else(|| {
                CoreError::Validation(format!(
                    "Area '{requested_area}' is not assigned to director '{}'",
                    director.name()
                ))
            })?
            .name
            .clone();

        let mut warnings = Vec::new();
        if let Some(current) = blank_to_none(selection.custodian()) {
            if normalize_key(current) != normalize_key(director.name()) {
                warnings.push(format!(
                    "Selection is currently held by '{current}' and will be reassigned"
                ));
            }
        }

        let date = request.date.unwrap_or_else(today);
        let issued = FolioSequencer::new(self.store)
            .next_custody_folio_on(date)
            .await;
        if issued.fallback {
            warnings.push(format!("Folio {} issued offline and may collide", issued.folio));
        }

        let default_holder = blank_to_none(request.holder);
        let steps: Vec<AssignmentStep> = selection
            .items()
            .iter()
            .map(|asset| {
                let holder = selection.holder_for(asset.key(), default_holder);
                AssignmentStep {
                    assignment: CustodyAssignment {
                        asset: asset.key(),
                        custodian: director.name().to_string(),
                        area: area.clone(),
                        holder: holder.clone(),
                    },
                    record: NewCustodyRecord::snapshot(
                        asset,
                        &issued.folio,
                        date,
                        director,
                        &area,
                        holder,
                    ),
                }
            })
            .collect();

        let report = self.store.apply_assignments(&steps).await?;
        let document =
            CustodyDocument::from_records(&report.succeeded, default_holder.map(str::to_string));

        if !report.failed.is_empty() {
            tracing::warn!(
                folio = %issued.folio,
                succeeded = report.succeeded.len(),
                failed = report.failed.len(),
                "Custody commit partially applied"
            );
            if let Some(document) = &document {
                self.sink.emit(ChangeNotice::custody_committed(document, actor));
            }
            let succeeded = report
                .succeeded
                .iter()
                .map(|r| r.inventory_code.clone())
                .collect();
            return Err(batch_error(&issued.folio, succeeded, report.failed));
        }

        let document = document.ok_or_else(|| {
            CoreError::Internal(format!("Commit of {} wrote no ledger rows", issued.folio))
        })?;

        tracing::info!(
            folio = %document.folio,
            custodian = %document.custodian,
            area = %document.area,
            assets = document.lines.len(),
            actor = %actor,
            "Custody record committed"
        );
        self.sink.emit(ChangeNotice::custody_committed(&document, actor));

        Ok(CommitOutcome {
            document,
            records: report.succeeded,
            folio_fallback: issued.fallback,
            warnings,
        })
    }

    /// Retire all or some assets of a committed custody record.
    pub async fn decommission(
        &self,
        request: DecommissionRequest<'_>,
    ) -> Result<DecommissionOutcome, CoreError> {
        let actor = required(request.actor, "Actor")?;
        let custody_folio = required(request.custody_folio, "Custody folio")?;

        let rows = self.store.custody_records(custody_folio).await?;
        if rows.is_empty() {
            return Err(CoreError::not_found("custody record", custody_folio));
        }

        let targeted: Vec<&CustodyRecord> = match &request.target {
            DecommissionTarget::All => rows.iter().collect(),
            DecommissionTarget::Subset(codes) => {
                let wanted: BTreeSet<&str> = codes
                    .iter()
                    .map(|c| c.trim())
                    .filter(|c| !c.is_empty())
                    .collect();
                if wanted.is_empty() {
                    return Err(CoreError::Validation(
                        "No inventory codes selected".to_string(),
                    ));
                }
                let unknown: Vec<&str> = wanted
                    .iter()
                    .copied()
                    .filter(|code| !rows.iter().any(|r| r.inventory_code == *code))
                    .collect();
                if !unknown.is_empty() {
                    return Err(CoreError::Validation(format!(
                        "Not part of {custody_folio}: {}",
                        unknown.join(", ")
                    )));
                }
                rows.iter()
                    .filter(|r| wanted.contains(r.inventory_code.as_str()))
                    .collect()
            }
        };

        let date = request.date.unwrap_or_else(today);
        let issued = FolioSequencer::new(self.store)
            .next_decommission_folio_on(date)
            .await;
        let mut warnings = Vec::new();
        if issued.fallback {
            warnings.push(format!("Folio {} issued offline and may collide", issued.folio));
        }

        // One step per row, so duplicates sharing a code each get an audit copy.
        let steps: Vec<RetirementStep> = targeted
            .iter()
            .map(|row| RetirementStep {
                folio: custody_folio.to_string(),
                inventory_code: row.inventory_code.clone(),
                audit: NewDecommissionRecord::from_custody(row, &issued.folio, date, actor),
                asset_match: AssetMatch::from_custody(row),
            })
            .collect();

        let report = self.store.apply_retirements(&steps).await?;

        for retired in report.succeeded.iter().filter(|r| !r.asset_cleared) {
            tracing::warn!(
                folio = %custody_folio,
                inventory_code = %retired.record.inventory_code,
                pool = %retired.record.origin_pool,
                "No matching asset to clear"
            );
            warnings.push(format!(
                "No matching asset found for {} in {}; custody fields left untouched",
                retired.record.inventory_code, retired.record.origin_pool
            ));
        }

        let remaining = self.store.custody_records(custody_folio).await?.len();
        let state = CustodyState::after_decommission(remaining);
        let records: Vec<DecommissionRecord> =
            report.succeeded.into_iter().map(|r| r.record).collect();
        let document = DecommissionDocument::from_records(&records);

        if !report.failed.is_empty() {
            tracing::warn!(
                folio = %custody_folio,
                decommission_folio = %issued.folio,
                succeeded = records.len(),
                failed = report.failed.len(),
                "Decommission partially applied"
            );
            if let Some(document) = &document {
                self.sink
                    .emit(ChangeNotice::custody_decommissioned(document, state));
            }
            let mut succeeded: Vec<String> =
                records.iter().map(|r| r.inventory_code.clone()).collect();
            succeeded.dedup();
            return Err(batch_error(&issued.folio, succeeded, report.failed));
        }

        let document = document.ok_or_else(|| {
            CoreError::Internal(format!("Decommission {} wrote no audit rows", issued.folio))
        })?;

        tracing::info!(
            folio = %custody_folio,
            decommission_folio = %document.decommission_folio,
            assets = document.lines.len(),
            remaining,
            ?state,
            actor = %actor,
            "Custody record decommissioned"
        );
        self.sink
            .emit(ChangeNotice::custody_decommissioned(&document, state));

        Ok(DecommissionOutcome {
            document,
            records,
            state,
            remaining,
            folio_fallback: issued.fallback,
            warnings,
        })
    }

    /// Change who physically holds one asset of a committed record.
    ///
    /// Updates the ledger row(s), and the asset too while it is still held
    /// under this record. A blank holder clears it.
    pub async fn edit_holder(
        &self,
        custody_folio: &str,
        inventory_code: &str,
        holder: Option<&str>,
        actor: &str,
    ) -> Result<CustodyRecord, CoreError> {
        let actor = required(actor, "Actor")?;
        let inventory_code = inventory_code.trim();
        let holder = blank_to_none(holder);

        let rows = self.store.custody_records(custody_folio.trim()).await?;
        let mut record = rows
            .into_iter()
            .find(|r| r.inventory_code == inventory_code)
            .ok_or_else(|| {
                CoreError::not_found(
                    "custody row",
                    format!("{}/{inventory_code}", custody_folio.trim()),
                )
            })?;

        self.store
            .update_custody_holder(&record.folio, inventory_code, holder)
            .await?;
        let updated = self
            .store
            .set_asset_holder(&CustodyAssignment {
                asset: record.asset_key(),
                custodian: record.custodian.clone(),
                area: record.area.clone(),
                holder: holder.map(str::to_string),
            })
            .await?;
        if !updated {
            tracing::warn!(
                folio = %record.folio,
                inventory_code = %inventory_code,
                "Asset gone or reassigned since this record; only the ledger row changed"
            );
        }

        record.holder = holder.map(str::to_string);
        tracing::info!(
            folio = %record.folio,
            inventory_code = %inventory_code,
            holder = ?record.holder,
            actor = %actor,
            "Custody holder changed"
        );
        self.sink.emit(ChangeNotice::holder_changed(&record, actor));
        Ok(record)
    }

    /// Reassemble the document of a committed record.
    pub async fn custody_record(&self, custody_folio: &str) -> Result<CustodyDocument, CoreError> {
        let custody_folio = custody_folio.trim();
        let rows = self.store.custody_records(custody_folio).await?;
        CustodyDocument::from_records(&rows, None)
            .ok_or_else(|| CoreError::not_found("custody record", custody_folio))
    }

    /// Distinct custody folios issued on `day`.
    pub async fn folios_issued_on(&self, day: Date) -> Result<Vec<String>, CoreError> {
        Ok(self.store.custody_folios_issued_on(day).await?)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::fixtures::{asset, held};
    use crate::catalog::{Asset, AssetRef};
    use crate::director::{Area, Director};
    use crate::memory::{InMemoryStore, RecordingSink};
    use assert_matches::assert_matches;

    fn day() -> Date {
        Date::from_ymd_opt(2026, 3, 9).unwrap()
    }

    fn juan() -> ResolvedDirector {
        ResolvedDirector {
            director: Director {
                id: 1,
                name: "Juan Pérez".to_string(),
                legacy_area: None,
                legacy_position: Some("JEFE".to_string()),
            },
            areas: vec![
                Area {
                    id: 1,
                    name: "FINANZAS".to_string(),
                },
                Area {
                    id: 2,
                    name: "COMPRAS".to_string(),
                },
            ],
        }
    }

    fn seed(store: &InMemoryStore, assets: Vec<Asset>) -> SelectionSession {
        let mut selection = SelectionSession::new();
        for a in assets {
            store.add_asset(a.clone());
            assert!(selection.try_add(a).is_accepted());
        }
        selection
    }

    fn request<'r>(
        selection: &'r SelectionSession,
        director: &'r ResolvedDirector,
    ) -> CommitRequest<'r> {
        CommitRequest {
            selection,
            director,
            area: "finanzas",
            holder: Some("Luis"),
            actor: "admin",
            date: Some(day()),
        }
    }

    fn three() -> Vec<Asset> {
        vec![asset(1, "A-1"), asset(2, "A-2"), asset(3, "A-3")]
    }

    async fn committed(store: &InMemoryStore) -> String {
        let selection = seed(store, three());
        let director = juan();
        let workflow = CustodyLifecycleWorkflow::new(store, &crate::notice::NullSink);
        workflow
            .commit(request(&selection, &director))
            .await
            .unwrap()
            .document
            .folio
    }

    // -- commit ---------------------------------------------------------------

    #[tokio::test]
    async fn commit_writes_assets_and_ledger() {
        let store = InMemoryStore::new();
        let mut selection = seed(&store, three());
        selection
            .set_holder_override(AssetRef { pool: crate::catalog::OriginPool::Federal, id: 2 }, "Rosa")
            .unwrap();
        let director = juan();
        let sink = RecordingSink::default();
        let workflow = CustodyLifecycleWorkflow::new(&store, &sink);

        let outcome = workflow.commit(request(&selection, &director)).await.unwrap();

        assert_eq!(outcome.document.folio, "RES-20260309-001");
        assert_eq!(outcome.document.area, "FINANZAS");
        assert_eq!(outcome.document.position, "JEFE");
        let holders: Vec<_> = outcome
            .document
            .lines
            .iter()
            .map(|l| l.holder.as_deref())
            .collect();
        assert_eq!(holders, [Some("Luis"), Some("Rosa"), Some("Luis")]);
        assert!(!outcome.folio_fallback);

        let stored = store.asset(selection.items()[1].key()).unwrap();
        assert_eq!(stored.custodian.as_deref(), Some("Juan Pérez"));
        assert_eq!(stored.area.as_deref(), Some("FINANZAS"));
        assert_eq!(stored.holder.as_deref(), Some("Rosa"));
        assert_eq!(store.custody_rows().len(), 3);
        assert_eq!(sink.kinds(), vec!["custody.committed"]);
    }

    #[tokio::test]
    async fn second_folio_of_the_day_is_002() {
        let store = InMemoryStore::new();
        let selection = seed(&store, vec![asset(1, "A-1"), asset(2, "A-2")]);
        let director = juan();
        let workflow = CustodyLifecycleWorkflow::new(&store, &crate::notice::NullSink);
        workflow.commit(request(&selection, &director)).await.unwrap();

        let next = FolioSequencer::new(&store).next_custody_folio_on(day()).await;
        assert_eq!(next.folio, "RES-20260309-002");
    }

    #[tokio::test]
    async fn commit_validates_before_writing() {
        let store = InMemoryStore::new();
        let director = juan();
        let workflow = CustodyLifecycleWorkflow::new(&store, &crate::notice::NullSink);

        let empty = SelectionSession::new();
        assert_matches!(
            workflow.commit(request(&empty, &director)).await,
            Err(CoreError::Validation(_))
        );

        let selection = seed(&store, three());
        let wrong_area = CommitRequest {
            area: "ALMACEN",
            ..request(&selection, &director)
        };
        assert_matches!(
            workflow.commit(wrong_area).await,
            Err(CoreError::Validation(msg)) if msg.contains("ALMACEN")
        );

        let no_actor = CommitRequest {
            actor: "  ",
            ..request(&selection, &director)
        };
        assert_matches!(workflow.commit(no_actor).await, Err(CoreError::Validation(_)));
        assert!(store.custody_rows().is_empty());
    }

    #[tokio::test]
    async fn commit_warns_on_reassignment() {
        let store = InMemoryStore::new();
        let selection = seed(&store, vec![held(1, "A-1", "Ana", "FINANZAS")]);
        let director = juan();
        let workflow = CustodyLifecycleWorkflow::new(&store, &crate::notice::NullSink);

        let outcome = workflow.commit(request(&selection, &director)).await.unwrap();
        assert_eq!(outcome.warnings.len(), 1);
        assert!(outcome.warnings[0].contains("Ana"));
    }

    #[tokio::test]
    async fn failed_step_reports_partial_commit() {
        let store = InMemoryStore::new();
        let selection = seed(&store, three());
        store.fail_step("append_custody_record", Some("A-2"));
        let director = juan();
        let sink = RecordingSink::default();
        let workflow = CustodyLifecycleWorkflow::new(&store, &sink);

        let err = workflow.commit(request(&selection, &director)).await.unwrap_err();
        assert_matches!(
            err,
            CoreError::PartialCommit { ref folio, ref succeeded, ref failed }
                if folio == "RES-20260309-001"
                    && succeeded == &["A-1".to_string(), "A-3".to_string()]
                    && failed.len() == 1
                    && failed[0].inventory_code == "A-2"
                    && failed[0].step == "append_custody_record"
        );
        assert_eq!(store.custody_rows().len(), 2);
        assert_eq!(sink.kinds(), vec!["custody.committed"]);
    }

    #[tokio::test]
    async fn total_failure_is_a_store_error() {
        let store = InMemoryStore::new();
        let selection = seed(&store, three());
        store.fail_step("assign_asset", None);
        let director = juan();
        let workflow = CustodyLifecycleWorkflow::new(&store, &crate::notice::NullSink);

        assert_matches!(
            workflow.commit(request(&selection, &director)).await,
            Err(CoreError::Store { step: "assign_asset", .. })
        );
    }

    // -- decommission ---------------------------------------------------------

    #[tokio::test]
    async fn subset_decommission_keeps_other_rows() {
        let store = InMemoryStore::new();
        let folio = committed(&store).await;
        let sink = RecordingSink::default();
        let workflow = CustodyLifecycleWorkflow::new(&store, &sink);

        let outcome = workflow
            .decommission(DecommissionRequest {
                custody_folio: &folio,
                target: DecommissionTarget::Subset(vec!["A-1".into(), "A-3".into()]),
                actor: "admin",
                date: Some(day()),
            })
            .await
            .unwrap();

        assert_eq!(outcome.state, CustodyState::PartiallyDecommissioned);
        assert_eq!(outcome.remaining, 1);
        assert_eq!(outcome.document.decommission_folio, "BAJA-2026-0001");
        assert!(outcome.warnings.is_empty());

        let audit = store.decommission_rows();
        assert_eq!(audit.len(), 2);
        assert!(audit
            .iter()
            .all(|r| r.custody_folio == folio && r.decommission_folio == "BAJA-2026-0001"));

        let left: Vec<_> = store
            .custody_rows()
            .into_iter()
            .map(|r| r.inventory_code)
            .collect();
        assert_eq!(left, ["A-2"]);

        let cleared = store.asset(asset(1, "A-1").key()).unwrap();
        assert!(cleared.custodian.is_none() && cleared.area.is_none());
        let kept = store.asset(asset(2, "A-2").key()).unwrap();
        assert_eq!(kept.custodian.as_deref(), Some("Juan Pérez"));
        assert_eq!(sink.kinds(), vec!["custody.decommissioned"]);
    }

    #[tokio::test]
    async fn full_decommission_empties_the_folio() {
        let store = InMemoryStore::new();
        let folio = committed(&store).await;
        let workflow = CustodyLifecycleWorkflow::new(&store, &crate::notice::NullSink);

        let outcome = workflow
            .decommission(DecommissionRequest {
                custody_folio: &folio,
                target: DecommissionTarget::All,
                actor: "admin",
                date: Some(day()),
            })
            .await
            .unwrap();

        assert_eq!(outcome.state, CustodyState::FullyDecommissioned);
        assert_eq!(outcome.remaining, 0);
        assert_eq!(outcome.records.len(), 3);
        assert!(store.custody_rows().is_empty());
        assert_matches!(
            workflow.custody_record(&folio).await,
            Err(CoreError::NotFound { .. })
        );

        let next = FolioSequencer::new(&store)
            .next_decommission_folio_on(day())
            .await;
        assert_eq!(next.folio, "BAJA-2026-0002");
    }

    #[tokio::test]
    async fn decommission_rejects_unknown_folio_and_codes() {
        let store = InMemoryStore::new();
        let folio = committed(&store).await;
        let workflow = CustodyLifecycleWorkflow::new(&store, &crate::notice::NullSink);

        assert_matches!(
            workflow
                .decommission(DecommissionRequest {
                    custody_folio: "RES-20260309-099",
                    target: DecommissionTarget::All,
                    actor: "admin",
                    date: None,
                })
                .await,
            Err(CoreError::NotFound { entity: "custody record", .. })
        );
        assert_matches!(
            workflow
                .decommission(DecommissionRequest {
                    custody_folio: &folio,
                    target: DecommissionTarget::Subset(vec!["A-1".into(), "Z-9".into()]),
                    actor: "admin",
                    date: None,
                })
                .await,
            Err(CoreError::Validation(msg)) if msg.contains("Z-9")
        );
        assert_eq!(store.custody_rows().len(), 3);
        assert!(store.decommission_rows().is_empty());
    }

    #[tokio::test]
    async fn missing_asset_is_a_warning() {
        let store = InMemoryStore::new();
        let folio = committed(&store).await;
        store.update_asset(asset(2, "A-2").key(), |a| a.condition = "M".to_string());
        let workflow = CustodyLifecycleWorkflow::new(&store, &crate::notice::NullSink);

        let outcome = workflow
            .decommission(DecommissionRequest {
                custody_folio: &folio,
                target: DecommissionTarget::Subset(vec!["A-2".into()]),
                actor: "admin",
                date: Some(day()),
            })
            .await
            .unwrap();

        assert_eq!(outcome.warnings.len(), 1);
        assert!(outcome.warnings[0].contains("A-2"));
        assert_eq!(outcome.records.len(), 1);
        let untouched = store.asset(asset(2, "A-2").key()).unwrap();
        assert!(untouched.custodian.is_some());
    }

    #[tokio::test]
    async fn reservations_keep_freed_custody_numbers_retired() {
        let store = InMemoryStore::with_reservations();
        let folio = committed(&store).await;
        assert_eq!(folio, "RES-20260309-001");
        let workflow = CustodyLifecycleWorkflow::new(&store, &crate::notice::NullSink);
        workflow
            .decommission(DecommissionRequest {
                custody_folio: &folio,
                target: DecommissionTarget::All,
                actor: "admin",
                date: Some(day()),
            })
            .await
            .unwrap();

        let next = FolioSequencer::new(&store).next_custody_folio_on(day()).await;
        assert_eq!(next.folio, "RES-20260309-002");
    }

    /// Append a second ledger row for `code` under `folio`, held by `holder`.
    async fn duplicate_row(store: &InMemoryStore, folio: &str, code: &str, holder: &str) {
        let row = store
            .custody_rows()
            .into_iter()
            .find(|r| r.folio == folio && r.inventory_code == code)
            .unwrap();
        store
            .append_custody_record(&NewCustodyRecord {
                folio: row.folio,
                assigned_on: row.assigned_on,
                area: row.area,
                custodian: row.custodian,
                position: row.position,
                inventory_code: row.inventory_code,
                description: row.description,
                category: row.category,
                condition: row.condition,
                holder: Some(holder.to_string()),
                origin_pool: row.origin_pool,
                asset_id: row.asset_id,
            })
            .await
            .unwrap();
    }

    fn retire_all(folio: &str) -> DecommissionRequest<'_> {
        DecommissionRequest {
            custody_folio: folio,
            target: DecommissionTarget::All,
            actor: "admin",
            date: Some(day()),
        }
    }

    #[tokio::test]
    async fn duplicate_rows_each_get_an_audit_copy() {
        let store = InMemoryStore::new();
        let selection = seed(&store, vec![asset(1, "A-1")]);
        let director = juan();
        let workflow = CustodyLifecycleWorkflow::new(&store, &crate::notice::NullSink);
        let folio = workflow
            .commit(request(&selection, &director))
            .await
            .unwrap()
            .document
            .folio;
        duplicate_row(&store, &folio, "A-1", "Rosa").await;
        assert_eq!(store.custody_rows().len(), 2);

        let outcome = workflow.decommission(retire_all(&folio)).await.unwrap();

        assert_eq!(outcome.records.len(), 2);
        assert!(outcome.warnings.is_empty());
        assert_eq!(outcome.state, CustodyState::FullyDecommissioned);
        let holders: Vec<_> = store
            .decommission_rows()
            .into_iter()
            .map(|r| r.holder)
            .collect();
        assert_eq!(holders, [Some("Luis".to_string()), Some("Rosa".to_string())]);
        assert!(store.custody_rows().is_empty());
        let cleared = store.asset(asset(1, "A-1").key()).unwrap();
        assert!(cleared.custodian.is_none());
    }

    #[tokio::test]
    async fn failed_audit_copy_keeps_the_row() {
        let store = InMemoryStore::new();
        let folio = committed(&store).await;
        store.fail_step("insert_decommission_record", Some("A-2"));
        let sink = RecordingSink::default();
        let workflow = CustodyLifecycleWorkflow::new(&store, &sink);

        let err = workflow.decommission(retire_all(&folio)).await.unwrap_err();
        assert_matches!(
            err,
            CoreError::PartialCommit { ref folio, ref succeeded, ref failed }
                if folio == "BAJA-2026-0001"
                    && succeeded == &["A-1".to_string(), "A-3".to_string()]
                    && failed.len() == 1
                    && failed[0].inventory_code == "A-2"
                    && failed[0].step == "insert_decommission_record"
        );
        let left: Vec<_> = store
            .custody_rows()
            .into_iter()
            .map(|r| r.inventory_code)
            .collect();
        assert_eq!(left, ["A-2"]);
        assert_eq!(store.decommission_rows().len(), 2);
        let kept = store.asset(asset(2, "A-2").key()).unwrap();
        assert_eq!(kept.custodian.as_deref(), Some("Juan Pérez"));
        assert_eq!(sink.kinds(), vec!["custody.decommissioned"]);
    }

    #[tokio::test]
    async fn failed_ledger_delete_keeps_the_row() {
        let store = InMemoryStore::new();
        let folio = committed(&store).await;
        store.fail_step("delete_custody_records", Some("A-3"));
        let workflow = CustodyLifecycleWorkflow::new(&store, &crate::notice::NullSink);

        let err = workflow.decommission(retire_all(&folio)).await.unwrap_err();
        assert_matches!(
            err,
            CoreError::PartialCommit { ref folio, ref succeeded, ref failed }
                if folio == "BAJA-2026-0001"
                    && succeeded == &["A-1".to_string(), "A-2".to_string()]
                    && failed.len() == 1
                    && failed[0].inventory_code == "A-3"
                    && failed[0].step == "delete_custody_records"
        );
        let left: Vec<_> = store
            .custody_rows()
            .into_iter()
            .map(|r| r.inventory_code)
            .collect();
        assert_eq!(left, ["A-3"]);
        // The audit copy was written before the delete failed.
        assert_eq!(store.decommission_rows().len(), 3);
        let kept = store.asset(asset(3, "A-3").key()).unwrap();
        assert_eq!(kept.custodian.as_deref(), Some("Juan Pérez"));
    }

    #[tokio::test]
    async fn decommission_total_failure_is_a_store_error() {
        let store = InMemoryStore::new();
        let folio = committed(&store).await;
        store.fail_step("insert_decommission_record", None);
        let sink = RecordingSink::default();
        let workflow = CustodyLifecycleWorkflow::new(&store, &sink);

        assert_matches!(
            workflow.decommission(retire_all(&folio)).await,
            Err(CoreError::Store { step: "insert_decommission_record", .. })
        );
        assert_eq!(store.custody_rows().len(), 3);
        assert!(store.decommission_rows().is_empty());
        assert!(sink.kinds().is_empty());
    }

    #[tokio::test]
    async fn failed_duplicate_code_keeps_every_row() {
        let store = InMemoryStore::new();
        let folio = committed(&store).await;
        duplicate_row(&store, &folio, "A-1", "Rosa").await;
        store.fail_step("insert_decommission_record", Some("A-1"));
        let workflow = CustodyLifecycleWorkflow::new(&store, &crate::notice::NullSink);

        let err = workflow.decommission(retire_all(&folio)).await.unwrap_err();
        assert_matches!(
            err,
            CoreError::PartialCommit { ref succeeded, ref failed, .. }
                if succeeded == &["A-2".to_string(), "A-3".to_string()]
                    && failed.len() == 1
                    && failed[0].inventory_code == "A-1"
        );
        let left: Vec<_> = store
            .custody_rows()
            .into_iter()
            .map(|r| (r.inventory_code, r.holder))
            .collect();
        assert_eq!(
            left,
            [
                ("A-1".to_string(), Some("Luis".to_string())),
                ("A-1".to_string(), Some("Rosa".to_string())),
            ]
        );
        assert_eq!(store.decommission_rows().len(), 2);
    }

    // -- holder edit and lookup -------------------------------------------------

    #[tokio::test]
    async fn edit_holder_updates_ledger_and_asset() {
        let store = InMemoryStore::new();
        let folio = committed(&store).await;
        let sink = RecordingSink::default();
        let workflow = CustodyLifecycleWorkflow::new(&store, &sink);

        let record = workflow
            .edit_holder(&folio, "A-3", Some(" Marta "), "admin")
            .await
            .unwrap();
        assert_eq!(record.holder.as_deref(), Some("Marta"));

        let document = workflow.custody_record(&folio).await.unwrap();
        assert_eq!(document.lines[2].holder.as_deref(), Some("Marta"));
        let stored = store.asset(asset(3, "A-3").key()).unwrap();
        assert_eq!(stored.holder.as_deref(), Some("Marta"));
        assert_eq!(stored.custodian.as_deref(), Some("Juan Pérez"));
        assert_eq!(sink.kinds(), vec!["custody.holder_changed"]);

        assert_matches!(
            workflow.edit_holder(&folio, "Z-9", None, "admin").await,
            Err(CoreError::NotFound { .. })
        );
    }

    #[tokio::test]
    async fn edit_holder_leaves_a_reassigned_asset_alone() {
        let store = InMemoryStore::new();
        let selection = seed(&store, vec![asset(1, "A-1")]);
        let director = juan();
        let workflow = CustodyLifecycleWorkflow::new(&store, &crate::notice::NullSink);
        let first = workflow
            .commit(request(&selection, &director))
            .await
            .unwrap()
            .document
            .folio;

        let ana = ResolvedDirector {
            director: Director {
                id: 2,
                name: "Ana Gómez".to_string(),
                legacy_area: None,
                legacy_position: Some("COORDINADORA".to_string()),
            },
            areas: vec![Area {
                id: 2,
                name: "COMPRAS".to_string(),
            }],
        };
        let mut again = SelectionSession::new();
        assert!(again
            .try_add(store.asset(asset(1, "A-1").key()).unwrap())
            .is_accepted());
        workflow
            .commit(CommitRequest {
                area: "COMPRAS",
                holder: Some("Pedro"),
                ..request(&again, &ana)
            })
            .await
            .unwrap();

        let record = workflow
            .edit_holder(&first, "A-1", Some("Rosa"), "admin")
            .await
            .unwrap();
        assert_eq!(record.holder.as_deref(), Some("Rosa"));

        let stored = store.asset(asset(1, "A-1").key()).unwrap();
        assert_eq!(stored.custodian.as_deref(), Some("Ana Gómez"));
        assert_eq!(stored.area.as_deref(), Some("COMPRAS"));
        assert_eq!(stored.holder.as_deref(), Some("Pedro"));
    }

    #[tokio::test]
    async fn folios_issued_on_lists_distinct_folios() {
        let store = InMemoryStore::new();
        let folio = committed(&store).await;
        let workflow = CustodyLifecycleWorkflow::new(&store, &crate::notice::NullSink);
        assert_eq!(workflow.folios_issued_on(day()).await.unwrap(), vec![folio]);
        assert!(workflow
            .folios_issued_on(day().succ_opt().unwrap())
            .await
            .unwrap()
            .is_empty());
    }
}
