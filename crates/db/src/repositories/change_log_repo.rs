//! Repository for the `change_log` table.

use custodia_core::notice::ChangeNotice;
use custodia_core::types::DbId;
use sqlx::PgExecutor;

use crate::models::change_log::ChangeLogEntry;

const COLUMNS: &str = "id, kind, reference, actor, collections, changes, created_at";

pub struct ChangeLogRepo;

impl ChangeLogRepo {
    /// Persist one notice, returning the generated ID.
    pub async fn insert<'e, E: PgExecutor<'e>>(
        executor: E,
        notice: &ChangeNotice,
    ) -> Result<DbId, sqlx::Error> {
        sqlx::query_scalar(
            "INSERT INTO change_log (kind, reference, actor, collections, changes) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING id",
        )
        .bind(&notice.kind)
        .bind(&notice.reference)
        .bind(&notice.actor)
        .bind(&notice.collections)
        .bind(serde_json::json!(notice.changes))
        .fetch_one(executor)
        .await
    }

    /// Newest first.
    pub async fn list_recent<'e, E: PgExecutor<'e>>(
        executor: E,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<ChangeLogEntry>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM change_log ORDER BY created_at DESC, id DESC \
             LIMIT $1 OFFSET $2"
        );
        sqlx::query_as::<_, ChangeLogEntry>(&query)
            .bind(limit)
            .bind(offset)
            .fetch_all(executor)
            .await
    }

    pub async fn list_by_reference<'e, E: PgExecutor<'e>>(
        executor: E,
        reference: &str,
    ) -> Result<Vec<ChangeLogEntry>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM change_log WHERE reference = $1 ORDER BY id");
        sqlx::query_as::<_, ChangeLogEntry>(&query)
            .bind(reference)
            .fetch_all(executor)
            .await
    }
}
