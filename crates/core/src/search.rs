//! Ranked search over the asset catalog.
//!
//! Two independent operations run against a precomputed [`SearchCorpus`]:
//!
//! - [`classify`] picks the single field a committed query should filter on.
//! - [`suggest`] offers discrete values to complete the query with.
//!
//! They may disagree; `classify` answers "which filter", `suggest` answers
//! "which values can be offered right now".

use std::collections::HashSet;
use std::sync::Arc;

use serde::Serialize;

use crate::catalog::{AssetCatalog, FieldType};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Shortest query (in characters) that produces suggestions.
pub const MIN_SUGGEST_QUERY_LEN: usize = 2;

/// Unique suggestions collected before the scan stops.
pub const SUGGEST_SCAN_CAP: usize = 10;

/// Suggestions returned for display.
pub const SUGGEST_DISPLAY_LIMIT: usize = 7;

/// Order in which field value lists are scanned for suggestions.
pub const SUGGEST_FIELD_ORDER: [FieldType; FieldType::COUNT] = FieldType::ALL;

// ---------------------------------------------------------------------------
// Classification rules
// ---------------------------------------------------------------------------

/// One priority tier of the classifier: the first field in `fields` whose
/// value contains the query claims the row for this tier.
#[derive(Debug, Clone, Copy)]
pub struct ClassifyRule {
    pub fields: &'static [FieldType],
    pub tier: u8,
}

impl ClassifyRule {
    /// Score of an exact (case-insensitive) match.
    pub const fn exact_score(&self) -> u8 {
        self.tier * 2
    }

    /// Score of a substring match; always one below the exact score.
    pub const fn partial_score(&self) -> u8 {
        self.tier * 2 - 1
    }
}

/// Classifier tiers, evaluated top to bottom.
pub const CLASSIFY_RULES: &[ClassifyRule] = &[
    ClassifyRule {
        fields: &[FieldType::Custodian, FieldType::Holder],
        tier: 4,
    },
    ClassifyRule {
        fields: &[FieldType::Area],
        tier: 3,
    },
    ClassifyRule {
        fields: &[FieldType::Identifier],
        tier: 2,
    },
    ClassifyRule {
        fields: &[FieldType::Description],
        tier: 1,
    },
];

/// Highest score any row can reach; reaching it ends the scan.
pub fn max_classify_score() -> u8 {
    CLASSIFY_RULES
        .iter()
        .map(ClassifyRule::exact_score)
        .max()
        .unwrap_or(0)
}

// ---------------------------------------------------------------------------
// Corpus
// ---------------------------------------------------------------------------

/// A field value kept alongside its case-folded form.
#[derive(Debug, Clone)]
struct IndexedValue {
    value: String,
    folded: String,
}

/// Search-ready projection of one catalog version.
///
/// Holds the rows in catalog order (for [`classify`]) and one flat value
/// list per field (for [`suggest`]).
#[derive(Debug, Clone, Default)]
pub struct SearchCorpus {
    version: u64,
    rows: Vec<[String; FieldType::COUNT]>,
    fields: [Vec<IndexedValue>; FieldType::COUNT],
}

impl SearchCorpus {
    pub fn build(catalog: &AssetCatalog) -> Self {
        let mut rows = Vec::with_capacity(catalog.len());
        let mut fields: [Vec<IndexedValue>; FieldType::COUNT] = Default::default();

        for asset in catalog.assets() {
            let mut row: [String; FieldType::COUNT] = Default::default();
            for field in FieldType::ALL {
                let value = asset.field_value(field).trim();
                let folded = value.to_lowercase();
                if !value.is_empty() {
                    fields[field.index()].push(IndexedValue {
                        value: value.to_string(),
                        folded: folded.clone(),
                    });
                }
                row[field.index()] = folded;
            }
            rows.push(row);
        }

        Self {
            version: catalog.version(),
            rows,
            fields,
        }
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    fn folded(&self, row: usize, field: FieldType) -> &str {
        &self.rows[row][field.index()]
    }

    fn values(&self, field: FieldType) -> &[IndexedValue] {
        &self.fields[field.index()]
    }
}

/// Caches the corpus of the latest catalog version.
#[derive(Debug, Default)]
pub struct CorpusCache {
    current: Option<Arc<SearchCorpus>>,
}

impl CorpusCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached corpus, rebuilding it only when the catalog version moved.
    pub fn get_or_build(&mut self, catalog: &AssetCatalog) -> Arc<SearchCorpus> {
        match &self.current {
            Some(corpus) if corpus.version() == catalog.version() => Arc::clone(corpus),
            _ => {
                let corpus = Arc::new(SearchCorpus::build(catalog));
                self.current = Some(Arc::clone(&corpus));
                corpus
            }
        }
    }

    pub fn invalidate(&mut self) {
        self.current = None;
    }
}

// ---------------------------------------------------------------------------
// classify
// ---------------------------------------------------------------------------

/// Score a single row: the first rule (in tier order) with a containing field
/// decides the score.
fn score_row(corpus: &SearchCorpus, row: usize, query: &str) -> Option<(u8, FieldType)> {
    for rule in CLASSIFY_RULES {
        for &field in rule.fields {
            let value = corpus.folded(row, field);
            if value.contains(query) {
                let score = if value == query {
                    rule.exact_score()
                } else {
                    rule.partial_score()
                };
                return Some((score, field));
            }
        }
    }
    None
}

/// Pick the field a committed query should filter on.
///
/// Returns `None` for an empty query or when no row matches.
pub fn classify(query: &str, corpus: &SearchCorpus) -> Option<FieldType> {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return None;
    }

    let ceiling = max_classify_score();
    let mut best: Option<(u8, FieldType)> = None;

    for row in 0..corpus.row_count() {
        let Some((score, field)) = score_row(corpus, row, &query) else {
            continue;
        };
        if best.map_or(true, |(top, _)| score > top) {
            best = Some((score, field));
            if score == ceiling {
                break;
            }
        }
    }

    best.map(|(_, field)| field)
}

// ---------------------------------------------------------------------------
// suggest
// ---------------------------------------------------------------------------

/// A discrete value offered to complete the current query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Suggestion {
    pub value: String,
    pub field: FieldType,
}

/// Offer up to [`SUGGEST_DISPLAY_LIMIT`] values containing `query`.
///
/// Prefix matches come first; otherwise scan order is preserved.
pub fn suggest(query: &str, corpus: &SearchCorpus) -> Vec<Suggestion> {
    let query = query.trim().to_lowercase();
    if query.chars().count() < MIN_SUGGEST_QUERY_LEN {
        return Vec::new();
    }

    let mut seen: HashSet<(FieldType, &str)> = HashSet::new();
    let mut collected: Vec<(bool, Suggestion)> = Vec::new();

    'scan: for field in SUGGEST_FIELD_ORDER {
        for entry in corpus.values(field) {
            if collected.len() >= SUGGEST_SCAN_CAP {
                break 'scan;
            }
            if entry.folded.contains(&query) && seen.insert((field, entry.folded.as_str())) {
                collected.push((
                    entry.folded.starts_with(&query),
                    Suggestion {
                        value: entry.value.clone(),
                        field,
                    },
                ));
            }
        }
    }

    // Stable: ties keep scan order.
    collected.sort_by_key(|(is_prefix, _)| !is_prefix);
    collected
        .into_iter()
        .take(SUGGEST_DISPLAY_LIMIT)
        .map(|(_, suggestion)| suggestion)
        .collect()
}

/// Combined result of both operations for one query.
#[derive(Debug, Clone, Serialize)]
pub struct SearchOutcome {
    pub classification: Option<FieldType>,
    pub suggestions: Vec<Suggestion>,
}

pub fn search(query: &str, corpus: &SearchCorpus) -> SearchOutcome {
    SearchOutcome {
        classification: classify(query, corpus),
        suggestions: suggest(query, corpus),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
