//! Repository for `directors` and their `director_areas` links.

use custodia_core::types::DbId;
use sqlx::{PgConnection, PgExecutor};

use crate::models::director::{CreateDirector, DirectorRow};

const COLUMNS: &str = "id, name, legacy_area, legacy_position";

pub struct DirectorRepo;

impl DirectorRepo {
    /// Director whose trimmed, lower-cased name equals `name`'s. The oldest
    /// row wins when several normalize to the same key.
    pub async fn find_by_normalized_name<'e, E: PgExecutor<'e>>(
        executor: E,
        name: &str,
    ) -> Result<Option<DirectorRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM directors \
             WHERE lower(btrim(name)) = lower(btrim($1)) \
             ORDER BY id LIMIT 1"
        );
        sqlx::query_as::<_, DirectorRow>(&query)
            .bind(name)
            .fetch_optional(executor)
            .await
    }

    pub async fn find_by_id<'e, E: PgExecutor<'e>>(
        executor: E,
        id: DbId,
    ) -> Result<Option<DirectorRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM directors WHERE id = $1");
        sqlx::query_as::<_, DirectorRow>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    pub async fn create<'e, E: PgExecutor<'e>>(
        executor: E,
        input: &CreateDirector,
    ) -> Result<DirectorRow, sqlx::Error> {
        let query = format!(
            "INSERT INTO directors (name, legacy_area, legacy_position) \
             VALUES ($1, $2, $3) RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, DirectorRow>(&query)
            .bind(&input.name)
            .bind(&input.legacy_area)
            .bind(&input.legacy_position)
            .fetch_one(executor)
            .await
    }

    pub async fn update_position<'e, E: PgExecutor<'e>>(
        executor: E,
        id: DbId,
        position: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE directors SET legacy_position = $2, updated_at = now() WHERE id = $1",
        )
        .bind(id)
        .bind(position)
        .execute(executor)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn link_area<'e, E: PgExecutor<'e>>(
        executor: E,
        director_id: DbId,
        area_id: DbId,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO director_areas (director_id, area_id) VALUES ($1, $2) \
             ON CONFLICT DO NOTHING",
        )
        .bind(director_id)
        .bind(area_id)
        .execute(executor)
        .await?;
        Ok(())
    }

    /// Replace every area link of a director. Run it inside a transaction.
    pub async fn replace_areas(
        conn: &mut PgConnection,
        director_id: DbId,
        area_ids: &[DbId],
    ) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM director_areas WHERE director_id = $1")
            .bind(director_id)
            .execute(&mut *conn)
            .await?;

        for &area_id in area_ids {
            Self::link_area(&mut *conn, director_id, area_id).await?;
        }

        Ok(())
    }
}
