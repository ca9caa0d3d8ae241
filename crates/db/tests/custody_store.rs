//! Integration tests for the Postgres custody store.
//!
//! Drives the core workflow against a real database to verify that:
//! - Folio numbering follows the ledger and the reservation table
//! - Commit writes assets and ledger rows under one folio
//! - Subset and full decommission move rows into the audit ledger
//! - A failing step rolls back the whole batch
//! - Duplicate ledger rows each get their own audit copy
//! - Director completion replaces every area link

use assert_matches::assert_matches;
use chrono::NaiveDate;
use custodia_core::assignment::SelectionSession;
use custodia_core::catalog::{AssetRef, OriginPool};
use custodia_core::custody::{CustodyState, NewCustodyRecord, CustodyAssignment};
use custodia_core::director::{DirectorAreaResolver, Resolution, ResolvedDirector};
use custodia_core::error::CoreError;
use custodia_core::folio::{FolioScope, FolioSequencer};
use custodia_core::notice::{ChangeNotice, NullSink};
use custodia_core::store::{AssignmentStep, CustodyStore};
use custodia_core::workflow::{
    CommitRequest, CustodyLifecycleWorkflow, DecommissionRequest, DecommissionTarget,
};
use custodia_db::models::asset::CreateAsset;
use custodia_db::models::director::CreateDirector;
use custodia_db::repositories::{
    AreaRepo, AssetRepo, ChangeLogRepo, CustodyLedgerRepo, DecommissionLedgerRepo,
    DirectorRepo, FolioReservationRepo,
};
use custodia_db::PgCustodyStore;
use sqlx::PgPool;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, 9).unwrap()
}

fn new_asset(code: &str) -> CreateAsset {
    CreateAsset {
        inventory_code: code.to_string(),
        description: format!("Escritorio {code}"),
        category: "MOBILIARIO".to_string(),
        condition: "B".to_string(),
        status: "ACTIVO".to_string(),
        ..Default::default()
    }
}

async fn seed_assets(pool: &PgPool, codes: &[&str]) -> Vec<AssetRef> {
    let mut keys = Vec::new();
    for code in codes {
        let row = AssetRepo::create(pool, OriginPool::Federal, &new_asset(code))
            .await
            .unwrap();
        keys.push(AssetRef {
            pool: OriginPool::Federal,
            id: row.id,
        });
    }
    keys
}

async fn seed_director(pool: &PgPool, name: &str, position: &str, area: &str) -> ResolvedDirector {
    let director = DirectorRepo::create(
        pool,
        &CreateDirector {
            name: name.to_string(),
            legacy_area: None,
            legacy_position: Some(position.to_string()),
        },
    )
    .await
    .unwrap();
    let area = AreaRepo::create(pool, area).await.unwrap();
    DirectorRepo::link_area(pool, director.id, area.id)
        .await
        .unwrap();

    let store = PgCustodyStore::new(pool.clone());
    DirectorAreaResolver::new(&store, &NullSink)
        .require(name)
        .await
        .unwrap()
}

async fn select_all(store: &PgCustodyStore) -> SelectionSession {
    let catalog = store.load_catalog(1).await.unwrap();
    let mut selection = SelectionSession::new();
    assert!(selection
        .try_add_all(catalog.assets().to_vec())
        .is_accepted());
    selection
}

async fn commit_all(pool: &PgPool, codes: &[&str]) -> String {
    seed_assets(pool, codes).await;
    let director = seed_director(pool, "Juan Pérez", "JEFE", "FINANZAS").await;
    let store = PgCustodyStore::new(pool.clone());
    let selection = select_all(&store).await;

    CustodyLifecycleWorkflow::new(&store, &NullSink)
        .commit(CommitRequest {
            selection: &selection,
            director: &director,
            area: "FINANZAS",
            holder: None,
            actor: "admin",
            date: Some(day()),
        })
        .await
        .unwrap()
        .document
        .folio
}

// ---------------------------------------------------------------------------
// Folios
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_first_folio_of_the_day(pool: PgPool) {
    let store = PgCustodyStore::new(pool);
    let issued = FolioSequencer::new(&store).next_custody_folio_on(day()).await;
    assert_eq!(issued.folio, "RES-20260309-001");
    assert!(!issued.fallback);

    let issued = FolioSequencer::new(&store)
        .next_decommission_folio_on(day())
        .await;
    assert_eq!(issued.folio, "BAJA-2026-0001");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_second_folio_after_two_row_commit(pool: PgPool) {
    let folio = commit_all(&pool, &["A-1", "A-2"]).await;
    assert_eq!(folio, "RES-20260309-001");

    let rows = CustodyLedgerRepo::list_by_folio(&pool, &folio).await.unwrap();
    assert_eq!(rows.len(), 2);

    let store = PgCustodyStore::new(pool);
    let next = FolioSequencer::new(&store).next_custody_folio_on(day()).await;
    assert_eq!(next.folio, "RES-20260309-002");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_reservation_takes_the_larger_value(pool: PgPool) {
    let period = "20260309";
    let scope = FolioScope::Custody.as_str();
    assert_eq!(
        FolioReservationRepo::reserve(&pool, scope, period, 1).await.unwrap(),
        1
    );
    assert_eq!(
        FolioReservationRepo::reserve(&pool, scope, period, 1).await.unwrap(),
        2
    );
    assert_eq!(
        FolioReservationRepo::reserve(&pool, scope, period, 7).await.unwrap(),
        7
    );
    assert_eq!(
        FolioReservationRepo::current(&pool, scope, "20260310").await.unwrap(),
        None
    );
}

// ---------------------------------------------------------------------------
// Commit
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_commit_writes_assets(pool: PgPool) {
    let folio = commit_all(&pool, &["A-1", "A-2", "A-3"]).await;

    for asset in AssetRepo::list(&pool, OriginPool::Federal).await.unwrap() {
        assert_eq!(asset.custodian.as_deref(), Some("Juan Pérez"));
        assert_eq!(asset.area.as_deref(), Some("FINANZAS"));
    }

    let store = PgCustodyStore::new(pool);
    let document = CustodyLifecycleWorkflow::new(&store, &NullSink)
        .custody_record(&folio)
        .await
        .unwrap();
    let codes: Vec<_> = document
        .lines
        .iter()
        .map(|l| l.inventory_code.as_str())
        .collect();
    assert_eq!(codes, ["A-1", "A-2", "A-3"]);
    assert_eq!(document.position, "JEFE");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_failed_step_rolls_back_batch(pool: PgPool) {
    let keys = seed_assets(&pool, &["A-1"]).await;
    let director = seed_director(&pool, "Juan", "JEFE", "FINANZAS").await;
    let store = PgCustodyStore::new(pool.clone());
    let catalog = store.load_catalog(1).await.unwrap();
    let asset = catalog.get(keys[0]).unwrap();

    let good = AssignmentStep {
        assignment: CustodyAssignment {
            asset: keys[0],
            custodian: "Juan".to_string(),
            area: "FINANZAS".to_string(),
            holder: None,
        },
        record: NewCustodyRecord::snapshot(asset, "RES-20260309-001", day(), &director, "FINANZAS", None),
    };
    let mut missing = good.clone();
    missing.assignment.asset.id = keys[0].id + 1000;
    missing.record.inventory_code = "GHOST".to_string();

    let err = store.apply_assignments(&[good, missing]).await.unwrap_err();
    assert_eq!(err.step, "assign_asset");

    let rows = CustodyLedgerRepo::list_by_folio(&pool, "RES-20260309-001")
        .await
        .unwrap();
    assert!(rows.is_empty(), "ledger insert should be rolled back");
    let row = AssetRepo::find_by_id(&pool, OriginPool::Federal, keys[0].id)
        .await
        .unwrap()
        .unwrap();
    assert!(row.custodian.is_none(), "asset update should be rolled back");
}

// ---------------------------------------------------------------------------
// Decommission
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_subset_decommission(pool: PgPool) {
    let folio = commit_all(&pool, &["A-1", "A-2", "A-3"]).await;
    let store = PgCustodyStore::new(pool.clone());

    let outcome = CustodyLifecycleWorkflow::new(&store, &NullSink)
        .decommission(DecommissionRequest {
            custody_folio: &folio,
            target: DecommissionTarget::Subset(vec!["A-2".to_string()]),
            actor: "admin",
            date: Some(day()),
        })
        .await
        .unwrap();

    assert_eq!(outcome.state, CustodyState::PartiallyDecommissioned);
    assert_eq!(outcome.remaining, 2);

    let audit = DecommissionLedgerRepo::list_by_custody_folio(&pool, &folio)
        .await
        .unwrap();
    assert_eq!(audit.len(), 1);
    assert_eq!(audit[0].inventory_code, "A-2");
    assert_eq!(audit[0].decommission_folio, "BAJA-2026-0001");
    assert_eq!(audit[0].actor, "admin");

    let left: Vec<_> = CustodyLedgerRepo::list_by_folio(&pool, &folio)
        .await
        .unwrap()
        .into_iter()
        .map(|r| r.inventory_code)
        .collect();
    assert_eq!(left, ["A-1", "A-3"]);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_full_decommission_empties_folio(pool: PgPool) {
    let folio = commit_all(&pool, &["A-1", "A-2"]).await;
    let store = PgCustodyStore::new(pool.clone());
    let workflow = CustodyLifecycleWorkflow::new(&store, &NullSink);

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
    assert!(CustodyLedgerRepo::list_by_folio(&pool, &folio)
        .await
        .unwrap()
        .is_empty());
    for asset in AssetRepo::list(&pool, OriginPool::Federal).await.unwrap() {
        assert!(asset.custodian.is_none() && asset.area.is_none());
    }
    assert_matches!(
        workflow.custody_record(&folio).await,
        Err(CoreError::NotFound { .. })
    );

    let records = store
        .decommission_records(&outcome.document.decommission_folio)
        .await
        .unwrap();
    assert_eq!(records.len(), 2);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_duplicate_rows_each_get_an_audit_copy(pool: PgPool) {
    let folio = commit_all(&pool, &["A-1"]).await;
    let store = PgCustodyStore::new(pool.clone());
    let row = CustodyLedgerRepo::list_by_folio(&pool, &folio)
        .await
        .unwrap()
        .remove(0);
    store
        .append_custody_record(&NewCustodyRecord {
            folio: row.folio.clone(),
            assigned_on: row.assigned_on,
            area: row.area.clone(),
            custodian: row.custodian.clone(),
            position: row.position.clone(),
            inventory_code: row.inventory_code.clone(),
            description: row.description.clone(),
            category: row.category.clone(),
            condition: row.condition.clone(),
            holder: Some("Rosa".to_string()),
            origin_pool: OriginPool::Federal,
            asset_id: row.asset_id,
        })
        .await
        .unwrap();

    let outcome = CustodyLifecycleWorkflow::new(&store, &NullSink)
        .decommission(DecommissionRequest {
            custody_folio: &folio,
            target: DecommissionTarget::All,
            actor: "admin",
            date: Some(day()),
        })
        .await
        .unwrap();

    assert_eq!(outcome.records.len(), 2);
    assert!(outcome.warnings.is_empty());
    let audit = DecommissionLedgerRepo::list_by_custody_folio(&pool, &folio)
        .await
        .unwrap();
    assert_eq!(audit.len(), 2);
    assert!(CustodyLedgerRepo::list_by_folio(&pool, &folio)
        .await
        .unwrap()
        .is_empty());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_set_holder_requires_current_custodian(pool: PgPool) {
    let key = seed_assets(&pool, &["A-1"]).await.remove(0);
    let store = PgCustodyStore::new(pool.clone());
    let assignment = CustodyAssignment {
        asset: key,
        custodian: "Ana Gómez".to_string(),
        area: "COMPRAS".to_string(),
        holder: Some("Pedro".to_string()),
    };
    assert!(store.assign_asset(&assignment).await.unwrap());

    let stale = CustodyAssignment {
        custodian: "Juan Pérez".to_string(),
        area: "FINANZAS".to_string(),
        holder: Some("Rosa".to_string()),
        ..assignment.clone()
    };
    assert!(!store.set_asset_holder(&stale).await.unwrap());

    let current = CustodyAssignment {
        holder: Some("Marta".to_string()),
        ..assignment
    };
    assert!(store.set_asset_holder(&current).await.unwrap());

    let asset = AssetRepo::find_by_id(&pool, OriginPool::Federal, key.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(asset.custodian.as_deref(), Some("Ana Gómez"));
    assert_eq!(asset.area.as_deref(), Some("COMPRAS"));
    assert_eq!(asset.holder.as_deref(), Some("Marta"));
}

// ---------------------------------------------------------------------------
// Directors
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_complete_director_replaces_areas(pool: PgPool) {
    let director = DirectorRepo::create(
        &pool,
        &CreateDirector {
            name: "Ana López".to_string(),
            legacy_area: Some("COMPRAS".to_string()),
            legacy_position: None,
        },
    )
    .await
    .unwrap();
    for name in ["COMPRAS", "ALMACEN"] {
        let area = AreaRepo::create(&pool, name).await.unwrap();
        DirectorRepo::link_area(&pool, director.id, area.id)
            .await
            .unwrap();
    }

    let store = PgCustodyStore::new(pool.clone());
    let resolver = DirectorAreaResolver::new(&store, &NullSink);
    assert_matches!(
        resolver.resolve(" ana lópez ").await.unwrap(),
        Resolution::Incomplete { .. }
    );

    resolver
        .complete(director.id, "FINANZAS", "JEFE", Some("admin"))
        .await
        .unwrap();

    let resolved = resolver.require("Ana López").await.unwrap();
    assert_eq!(resolved.area_names(), vec!["FINANZAS"]);
    assert_eq!(resolved.position(), "JEFE");
    assert_eq!(AreaRepo::list(&pool).await.unwrap().len(), 3);
}

// ---------------------------------------------------------------------------
// Change log
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_change_log_round_trip(pool: PgPool) {
    let notice = ChangeNotice {
        kind: "custody.committed".to_string(),
        reference: "RES-20260309-001".to_string(),
        actor: Some("admin".to_string()),
        collections: vec!["assets".to_string(), "custody_ledger".to_string()],
        changes: vec!["A-1 assigned to Juan (FINANZAS)".to_string()],
    };
    ChangeLogRepo::insert(&pool, &notice).await.unwrap();

    let entries = ChangeLogRepo::list_by_reference(&pool, "RES-20260309-001")
        .await
        .unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].kind, "custody.committed");
    assert_eq!(entries[0].collections, notice.collections);
    assert_eq!(entries[0].changes[0], "A-1 assigned to Juan (FINANZAS)");
}
