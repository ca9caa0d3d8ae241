//! Change notices emitted to the notification collaborator.
//!
//! A notice names the collections a write touched and carries a short,
//! human-readable change list. Delivery is someone else's job; the core only
//! hands notices to a [`ChangeSink`].

use serde::{Deserialize, Serialize};

use crate::custody::{CustodyDocument, CustodyRecord, DecommissionDocument, CustodyState};
use crate::director::ResolvedDirector;

/// Persisted collection names, as the notification consumer knows them.
pub mod collections {
    pub const ASSETS: &str = "assets";
    pub const CUSTODY_LEDGER: &str = "custody_ledger";
    pub const DECOMMISSION_LEDGER: &str = "decommission_ledger";
    pub const DIRECTORS: &str = "directors";
    pub const DIRECTOR_AREAS: &str = "director_areas";
    pub const AREAS: &str = "areas";
}

/// Dot-separated notice kinds.
pub mod change_kinds {
    pub const CUSTODY_COMMITTED: &str = "custody.committed";
    pub const CUSTODY_DECOMMISSIONED: &str = "custody.decommissioned";
    pub const CUSTODY_HOLDER_CHANGED: &str = "custody.holder_changed";
    pub const DIRECTOR_COMPLETED: &str = "director.completed";
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeNotice {
    pub kind: String,
    /// Folio or director name the change is about.
    pub reference: String,
    pub actor: Option<String>,
    pub collections: Vec<String>,
    pub changes: Vec<String>,
}

impl ChangeNotice {
    fn new(kind: &str, reference: impl Into<String>, actor: Option<&str>) -> Self {
        Self {
            kind: kind.to_string(),
            reference: reference.into(),
            actor: actor.map(str::to_string),
            collections: Vec::new(),
            changes: Vec::new(),
        }
    }

    fn touching(mut self, collections: &[&str]) -> Self {
        self.collections = collections.iter().map(|c| c.to_string()).collect();
        self
    }

    pub fn custody_committed(document: &CustodyDocument, actor: &str) -> Self {
        let mut notice = Self::new(change_kinds::CUSTODY_COMMITTED, &document.folio, Some(actor))
            .touching(&[collections::ASSETS, collections::CUSTODY_LEDGER]);
        notice.changes = document
            .lines
            .iter()
            .map(|line| {
                format!(
                    "{} assigned to {} ({})",
                    line.inventory_code, document.custodian, document.area
                )
            })
            .collect();
        notice
    }

    pub fn custody_decommissioned(
        document: &DecommissionDocument,
        state: CustodyState,
    ) -> Self {
        let mut notice = Self::new(
            change_kinds::CUSTODY_DECOMMISSIONED,
            &document.custody_folio,
            Some(&document.actor),
        )
        .touching(&[
            collections::ASSETS,
            collections::CUSTODY_LEDGER,
            collections::DECOMMISSION_LEDGER,
        ]);
        notice.changes = document
            .lines
            .iter()
            .map(|line| {
                format!(
                    "{} retired under {}",
                    line.inventory_code, document.decommission_folio
                )
            })
            .collect();
        if state == CustodyState::FullyDecommissioned {
            notice
                .changes
                .push(format!("{} fully decommissioned", document.custody_folio));
        }
        notice
    }

    pub fn holder_changed(record: &CustodyRecord, actor: &str) -> Self {
        let mut notice = Self::new(
            change_kinds::CUSTODY_HOLDER_CHANGED,
            &record.folio,
            Some(actor),
        )
        .touching(&[collections::ASSETS, collections::CUSTODY_LEDGER]);
        notice.changes.push(format!(
            "{} now held by {}",
            record.inventory_code,
            record.holder.as_deref().unwrap_or("nobody")
        ));
        notice
    }

    pub fn director_completed(director: &ResolvedDirector, actor: Option<&str>) -> Self {
        let mut notice = Self::new(change_kinds::DIRECTOR_COMPLETED, director.name(), actor)
            .touching(&[
                collections::DIRECTORS,
                collections::DIRECTOR_AREAS,
                collections::AREAS,
            ]);
        notice.changes.push(format!(
            "{} is {} of {}",
            director.name(),
            director.position(),
            director.area_names().join(", ")
        ));
        notice
    }
}

/// Receives change notices. Must not block.
pub trait ChangeSink: Send + Sync {
    fn emit(&self, notice: ChangeNotice);
}

/// Discards every notice.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl ChangeSink for NullSink {
    fn emit(&self, _notice: ChangeNotice) {}
}
