//! Repository for the origin-pool asset tables.
//!
//! Table names come from [`OriginPool::table`], never from input.

use custodia_core::catalog::OriginPool;
use custodia_core::custody::AssetMatch;
use custodia_core::types::DbId;
use sqlx::PgExecutor;

use crate::models::asset::{AssetRow, CreateAsset};

/// Column list shared by the three pool tables.
const COLUMNS: &str = "id, inventory_code, description, category, condition, status, value, \
    acquired_on, location, area, custodian, holder, decommission_date, decommission_cause, \
    image_ref";

pub struct AssetRepo;

impl AssetRepo {
    /// Every asset of one pool, by id.
    pub async fn list<'e, E: PgExecutor<'e>>(
        executor: E,
        pool: OriginPool,
    ) -> Result<Vec<AssetRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM {} ORDER BY id", pool.table());
        sqlx::query_as::<_, AssetRow>(&query)
            .fetch_all(executor)
            .await
    }

    pub async fn find_by_id<'e, E: PgExecutor<'e>>(
        executor: E,
        pool: OriginPool,
        id: DbId,
    ) -> Result<Option<AssetRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM {} WHERE id = $1", pool.table());
        sqlx::query_as::<_, AssetRow>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    pub async fn create<'e, E: PgExecutor<'e>>(
        executor: E,
        pool: OriginPool,
        input: &CreateAsset,
    ) -> Result<AssetRow, sqlx::Error> {
        let query = format!(
            "INSERT INTO {} \
                (inventory_code, description, category, condition, status, value, \
                 acquired_on, location, area, custodian, holder) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) \
             RETURNING {COLUMNS}",
            pool.table()
        );
        sqlx::query_as::<_, AssetRow>(&query)
            .bind(&input.inventory_code)
            .bind(&input.description)
            .bind(&input.category)
            .bind(&input.condition)
            .bind(&input.status)
            .bind(input.value)
            .bind(input.acquired_on)
            .bind(&input.location)
            .bind(&input.area)
            .bind(&input.custodian)
            .bind(&input.holder)
            .fetch_one(executor)
            .await
    }

    /// Write custodial fields onto one asset. Returns `false` if it does not exist.
    pub async fn assign<'e, E: PgExecutor<'e>>(
        executor: E,
        pool: OriginPool,
        id: DbId,
        custodian: &str,
        area: &str,
        holder: Option<&str>,
    ) -> Result<bool, sqlx::Error> {
        let query = format!(
            "UPDATE {} SET custodian = $2, area = $3, holder = $4, updated_at = now() \
             WHERE id = $1",
            pool.table()
        );
        let result = sqlx::query(&query)
            .bind(id)
            .bind(custodian)
            .bind(area)
            .bind(holder)
            .execute(executor)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Write only the holder, and only while the asset is still held by
    /// `custodian` in `area`.
    pub async fn set_holder<'e, E: PgExecutor<'e>>(
        executor: E,
        pool: OriginPool,
        id: DbId,
        custodian: &str,
        area: &str,
        holder: Option<&str>,
    ) -> Result<bool, sqlx::Error> {
        let query = format!(
            "UPDATE {} SET holder = $4, updated_at = now() \
             WHERE id = $1 AND custodian = $2 AND area = $3",
            pool.table()
        );
        let result = sqlx::query(&query)
            .bind(id)
            .bind(custodian)
            .bind(area)
            .bind(holder)
            .execute(executor)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Clear custodian, area and holder on every asset matching all of the
    /// descriptive fields of `target`.
    pub async fn clear_custody<'e, E: PgExecutor<'e>>(
        executor: E,
        target: &AssetMatch,
    ) -> Result<u64, sqlx::Error> {
        let query = format!(
            "UPDATE {} SET custodian = NULL, area = NULL, holder = NULL, updated_at = now() \
             WHERE inventory_code = $1 AND description = $2 AND category = $3 \
               AND condition = $4 AND area = $5",
            target.pool.table()
        );
        let result = sqlx::query(&query)
            .bind(&target.inventory_code)
            .bind(&target.description)
            .bind(&target.category)
            .bind(&target.condition)
            .bind(&target.area)
            .execute(executor)
            .await?;
        Ok(result.rows_affected())
    }
}
