//! Grouping rules for assets pending one custody record.
//!
//! Every row of a custody document must share one custodian and one area.
//! The ledger does not enforce that, so selection does: an asset only joins
//! the pending [`SelectionSession`] when it agrees with the first selected
//! item on both names (trimmed, case-folded; blank values never conflict).

use std::collections::HashMap;

use serde::Serialize;

use crate::catalog::{normalize_opt, Asset, AssetRef};
use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Outcome
// ---------------------------------------------------------------------------

/// Result of testing a candidate against a selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum JoinOutcome {
    Accepted,
    RejectedCustodianConflict { existing: String },
    RejectedAreaConflict { existing: String },
}

impl JoinOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, JoinOutcome::Accepted)
    }

    /// Convert a rejection into a blocking validation error.
    pub fn into_result(self) -> Result<(), CoreError> {
        match self {
            JoinOutcome::Accepted => Ok(()),
            JoinOutcome::RejectedCustodianConflict { existing } => Err(CoreError::Validation(
                format!("Selection already belongs to custodian '{existing}'"),
            )),
            JoinOutcome::RejectedAreaConflict { existing } => Err(CoreError::Validation(format!(
                "Selection already belongs to area '{existing}'"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// Rules
// ---------------------------------------------------------------------------

fn names_conflict(candidate: Option<&str>, anchor: Option<&str>) -> bool {
    let candidate = normalize_opt(candidate);
    let anchor = normalize_opt(anchor);
    !candidate.is_empty() && !anchor.is_empty() && candidate != anchor
}

/// Custodian first, then area.
fn check_against(candidate: &Asset, anchor: &Asset) -> JoinOutcome {
    if names_conflict(candidate.custodian.as_deref(), anchor.custodian.as_deref()) {
        return JoinOutcome::RejectedCustodianConflict {
            existing: anchor.custodian.as_deref().unwrap_or("").trim().to_string(),
        };
    }
    if names_conflict(candidate.area.as_deref(), anchor.area.as_deref()) {
        return JoinOutcome::RejectedAreaConflict {
            existing: anchor.area.as_deref().unwrap_or("").trim().to_string(),
        };
    }
    JoinOutcome::Accepted
}

/// Can `candidate` join `selection`?
pub fn can_join(candidate: &Asset, selection: &[Asset]) -> JoinOutcome {
    match selection.first() {
        None => JoinOutcome::Accepted,
        Some(anchor) => check_against(candidate, anchor),
    }
}

/// Can every candidate join `selection` together?
///
/// The anchor is the first selected item, or the first candidate when the
/// selection is empty. One violating candidate rejects the whole batch.
pub fn can_join_all(candidates: &[Asset], selection: &[Asset]) -> JoinOutcome {
    let Some(anchor) = selection.first().or(candidates.first()) else {
        return JoinOutcome::Accepted;
    };
    candidates
        .iter()
        .map(|candidate| check_against(candidate, anchor))
        .find(|outcome| !outcome.is_accepted())
        .unwrap_or(JoinOutcome::Accepted)
}

// ---------------------------------------------------------------------------
// Selection session
// ---------------------------------------------------------------------------

/// Assets pending one custody record, plus per-asset holder overrides.
#[derive(Debug, Clone, Default)]
pub struct SelectionSession {
    items: Vec<Asset>,
    holder_overrides: HashMap<AssetRef, String>,
}

impl SelectionSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn items(&self) -> &[Asset] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn contains(&self, key: AssetRef) -> bool {
        self.items.iter().any(|a| a.key() == key)
    }

    /// Add one asset if it satisfies the grouping rules.
    ///
    /// Re-adding an asset that is already selected is accepted as a no-op.
    pub fn try_add(&mut self, candidate: Asset) -> JoinOutcome {
        if self.contains(candidate.key()) {
            return JoinOutcome::Accepted;
        }
        let outcome = can_join(&candidate, &self.items);
        if outcome.is_accepted() {
            self.items.push(candidate);
        }
        outcome
    }

    /// Add a batch; nothing is added unless every candidate is accepted.
    pub fn try_add_all(&mut self, candidates: Vec<Asset>) -> JoinOutcome {
        let fresh: Vec<Asset> = candidates
            .into_iter()
            .filter(|c| !self.contains(c.key()))
            .collect();
        let outcome = can_join_all(&fresh, &self.items);
        if outcome.is_accepted() {
            for candidate in fresh {
                if !self.contains(candidate.key()) {
                    self.items.push(candidate);
                }
            }
        }
        outcome
    }

    pub fn remove(&mut self, key: AssetRef) -> Option<Asset> {
        let index = self.items.iter().position(|a| a.key() == key)?;
        self.holder_overrides.remove(&key);
        Some(self.items.remove(index))
    }

    pub fn clear(&mut self) {
        self.items.clear();
        self.holder_overrides.clear();
    }

    /// Give one selected asset a holder different from the document default.
    pub fn set_holder_override(
        &mut self,
        key: AssetRef,
        holder: impl Into<String>,
    ) -> Result<(), CoreError> {
        if !self.contains(key) {
            return Err(CoreError::Validation(format!(
                "Asset {}/{} is not part of the selection",
                key.pool, key.id
            )));
        }
        let holder = holder.into().trim().to_string();
        if holder.is_empty() {
            self.holder_overrides.remove(&key);
        } else {
            self.holder_overrides.insert(key, holder);
        }
        Ok(())
    }

    /// Holder for one asset: its override, else the document default.
    pub fn holder_for(&self, key: AssetRef, default: Option<&str>) -> Option<String> {
        self.holder_overrides
            .get(&key)
            .cloned()
            .or_else(|| {
                default
                    .map(str::trim)
                    .filter(|h| !h.is_empty())
                    .map(str::to_string)
            })
    }

    /// Custodian carried by the selection's anchor, if any.
    pub fn custodian(&self) -> Option<&str> {
        self.items.first().and_then(|a| a.custodian.as_deref())
    }

    /// Area carried by the selection's anchor, if any.
    pub fn area(&self) -> Option<&str> {
        self.items.first().and_then(|a| a.area.as_deref())
    }

    /// Re-check the grouping rules over the whole selection.
    pub fn validate(&self) -> Result<(), CoreError> {
        match self.items.split_first() {
            None => Ok(()),
            Some((anchor, rest)) => rest
                .iter()
                .map(|item| check_against(item, anchor))
                .find(|outcome| !outcome.is_accepted())
                .unwrap_or(JoinOutcome::Accepted)
                .into_result(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
