//! Folio numbering for custody and decommission documents.
//!
//! Formats (bit-exact, printed on signed documents):
//!
//! - custody: `RES-YYYYMMDD-NNN`, counter scoped to the calendar day
//! - decommission: `BAJA-YYYY-NNNN`, counter running across years
//!
//! The two counters are derived differently. The custody counter is the number
//! of *distinct* folios already issued today plus one (so a fully retired
//! folio frees its number). The decommission counter is the suffix of the
//! latest decommission folio plus one. Both are kept as deployed.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use chrono::Datelike;
use regex::Regex;
use serde::Serialize;

use crate::store::{CustodyStore, StoreError};
use crate::types::{today, Date};

pub const CUSTODY_PREFIX: &str = "RES";
pub const DECOMMISSION_PREFIX: &str = "BAJA";

/// Zero-padded width of the custody counter.
pub const CUSTODY_SEQUENCE_WIDTH: usize = 3;

/// Zero-padded width of the decommission counter.
pub const DECOMMISSION_SEQUENCE_WIDTH: usize = 4;

/// Reservation period of the decommission counter, which never resets.
const DECOMMISSION_PERIOD: &str = "all";

static CUSTODY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^RES-(\d{8})-(\d+)$").expect("valid regex"));

static DECOMMISSION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^BAJA-(\d{4})-(\d+)$").expect("valid regex"));

// ---------------------------------------------------------------------------
// Formatting and parsing
// ---------------------------------------------------------------------------

/// Which counter a folio belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FolioScope {
    Custody,
    Decommission,
}

impl FolioScope {
    pub fn as_str(self) -> &'static str {
        match self {
            FolioScope::Custody => "custody",
            FolioScope::Decommission => "decommission",
        }
    }
}

/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use custodia_core::folio::custody_folio;
///
/// let day = NaiveDate::from_ymd_opt(2026, 3, 9).unwrap();
/// assert_eq!(custody_folio(day, 7), "RES-20260309-007");
/// ```
pub fn custody_folio(day: Date, sequence: u32) -> String {
    format!(
        "{CUSTODY_PREFIX}-{}-{sequence:0width$}",
        day.format("%Y%m%d"),
        width = CUSTODY_SEQUENCE_WIDTH
    )
}

/// # Examples
///
/// ```
/// use custodia_core::folio::decommission_folio;
///
/// assert_eq!(decommission_folio(2026, 42), "BAJA-2026-0042");
/// ```
pub fn decommission_folio(year: i32, sequence: u32) -> String {
    format!(
        "{DECOMMISSION_PREFIX}-{year:04}-{sequence:0width$}",
        width = DECOMMISSION_SEQUENCE_WIDTH
    )
}

/// Split a custody folio into its day and counter.
pub fn parse_custody_folio(folio: &str) -> Option<(Date, u32)> {
    let caps = CUSTODY_RE.captures(folio.trim())?;
    let day = Date::parse_from_str(&caps[1], "%Y%m%d").ok()?;
    let sequence = caps[2].parse().ok()?;
    Some((day, sequence))
}

/// Counter of a decommission folio, if it is well-formed.
pub fn parse_decommission_sequence(folio: &str) -> Option<u32> {
    DECOMMISSION_RE.captures(folio.trim())?[2].parse().ok()
}

/// Counter for the next custody folio, given today's ledger folios.
pub fn next_custody_sequence<'a, I>(folios_today: I) -> u32
where
    I: IntoIterator<Item = &'a str>,
{
    let distinct: BTreeSet<&str> = folios_today.into_iter().collect();
    distinct.len() as u32 + 1
}

/// Counter for the next decommission folio, given the latest one issued.
pub fn next_decommission_sequence(latest: Option<&str>) -> u32 {
    let Some(sequence) = latest.and_then(parse_decommission_sequence) else {
        return 1;
    };
    sequence.checked_add(1).unwrap_or_else(|| {
        tracing::warn!(latest = ?latest, "Decommission counter exhausted; restarting at 1");
        1
    })
}

// ---------------------------------------------------------------------------
// Sequencer
// ---------------------------------------------------------------------------

/// A folio handed out by the sequencer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IssuedFolio {
    pub folio: String,
    pub sequence: u32,
    /// Built without consulting the store; may collide with an existing folio.
    pub fallback: bool,
}

/// Issues folios from the ledger state held by a [`CustodyStore`].
///
/// Never fails: when the store is unreachable a date-only fallback folio is
/// returned with `fallback = true`.
pub struct FolioSequencer<'a, S: CustodyStore + ?Sized> {
    store: &'a S,
}

impl<'a, S: CustodyStore + ?Sized> FolioSequencer<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    pub async fn next_custody_folio(&self) -> IssuedFolio {
        self.next_custody_folio_on(today()).await
    }

    pub async fn next_custody_folio_on(&self, day: Date) -> IssuedFolio {
        self.custody(day, true).await
    }

    /// The folio a commit on `day` would get, without reserving it.
    pub async fn preview_custody_folio_on(&self, day: Date) -> IssuedFolio {
        self.custody(day, false).await
    }

    pub async fn next_decommission_folio(&self) -> IssuedFolio {
        self.next_decommission_folio_on(today()).await
    }

    pub async fn next_decommission_folio_on(&self, day: Date) -> IssuedFolio {
        self.decommission(day.year(), true).await
    }

    pub async fn preview_decommission_folio_on(&self, day: Date) -> IssuedFolio {
        self.decommission(day.year(), false).await
    }

    async fn custody(&self, day: Date, reserve: bool) -> IssuedFolio {
        match self.try_custody(day, reserve).await {
            Ok(issued) => issued,
            Err(err) => {
                let folio = custody_folio(day, 1);
                tracing::warn!(
                    error = %err,
                    %folio,
                    "Folio store unreachable, issuing fallback custody folio (may collide)"
                );
                IssuedFolio {
                    folio,
                    sequence: 1,
                    fallback: true,
                }
            }
        }
    }

    async fn decommission(&self, year: i32, reserve: bool) -> IssuedFolio {
        match self.try_decommission(year, reserve).await {
            Ok(issued) => issued,
            Err(err) => {
                let folio = decommission_folio(year, 1);
                tracing::warn!(
                    error = %err,
                    %folio,
                    "Folio store unreachable, issuing fallback decommission folio (may collide)"
                );
                IssuedFolio {
                    folio,
                    sequence: 1,
                    fallback: true,
                }
            }
        }
    }

    async fn try_custody(&self, day: Date, reserve: bool) -> Result<IssuedFolio, StoreError> {
        let folios = self.store.custody_folios_on(day).await?;
        let mut sequence = next_custody_sequence(folios.iter().map(String::as_str));
        if reserve {
            let period = day.format("%Y%m%d").to_string();
            sequence = self
                .store
                .reserve_sequence(FolioScope::Custody, &period, sequence)
                .await?;
        }
        Ok(IssuedFolio {
            folio: custody_folio(day, sequence),
            sequence,
            fallback: false,
        })
    }

    async fn try_decommission(&self, year: i32, reserve: bool) -> Result<IssuedFolio, StoreError> {
        let latest = self.store.latest_decommission_folio().await?;
        let mut sequence = next_decommission_sequence(latest.as_deref());
        if reserve {
            sequence = self
                .store
                .reserve_sequence(FolioScope::Decommission, DECOMMISSION_PERIOD, sequence)
                .await?;
        }
        Ok(IssuedFolio {
            folio: decommission_folio(year, sequence),
            sequence,
            fallback: false,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
