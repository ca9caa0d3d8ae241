//! Persisted change notices.

use custodia_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `change_log` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ChangeLogEntry {
    pub id: DbId,
    /// Dot-separated kind, e.g. `"custody.committed"`.
    pub kind: String,
    /// Folio or director name the change is about.
    pub reference: String,
    pub actor: Option<String>,
    pub collections: Vec<String>,
    /// JSON array of human-readable change lines.
    pub changes: serde_json::Value,
    pub created_at: Timestamp,
}
