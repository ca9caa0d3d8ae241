use custodia_core::types::DbId;
use sqlx::PgExecutor;

use crate::models::area::AreaRow;

pub struct AreaRepo;

impl AreaRepo {
    /// Area with exactly this name. Case-sensitive.
    pub async fn find_by_name<'e, E: PgExecutor<'e>>(
        executor: E,
        name: &str,
    ) -> Result<Option<AreaRow>, sqlx::Error> {
        sqlx::query_as::<_, AreaRow>("SELECT id, name FROM areas WHERE name = $1")
            .bind(name)
            .fetch_optional(executor)
            .await
    }

    pub async fn create<'e, E: PgExecutor<'e>>(
        executor: E,
        name: &str,
    ) -> Result<AreaRow, sqlx::Error> {
        sqlx::query_as::<_, AreaRow>("INSERT INTO areas (name) VALUES ($1) RETURNING id, name")
            .bind(name)
            .fetch_one(executor)
            .await
    }

    pub async fn list<'e, E: PgExecutor<'e>>(executor: E) -> Result<Vec<AreaRow>, sqlx::Error> {
        sqlx::query_as::<_, AreaRow>("SELECT id, name FROM areas ORDER BY name")
            .fetch_all(executor)
            .await
    }

    /// Areas linked to one director, by name.
    pub async fn list_for_director<'e, E: PgExecutor<'e>>(
        executor: E,
        director_id: DbId,
    ) -> Result<Vec<AreaRow>, sqlx::Error> {
        sqlx::query_as::<_, AreaRow>(
            "SELECT a.id, a.name FROM areas a \
             JOIN director_areas da ON da.area_id = a.id \
             WHERE da.director_id = $1 \
             ORDER BY a.name",
        )
        .bind(director_id)
        .fetch_all(executor)
        .await
    }
}
