//! Repository for the `custody_ledger` table.

use custodia_core::custody::NewCustodyRecord;
use custodia_core::types::Date;
use sqlx::PgExecutor;

use crate::models::custody::CustodyRow;

const COLUMNS: &str = "id, folio, assigned_on, area, custodian, position, inventory_code, \
    description, category, condition, holder, origin_pool, asset_id, created_at";

pub struct CustodyLedgerRepo;

impl CustodyLedgerRepo {
    pub async fn insert<'e, E: PgExecutor<'e>>(
        executor: E,
        input: &NewCustodyRecord,
    ) -> Result<CustodyRow, sqlx::Error> {
        let query = format!(
            "INSERT INTO custody_ledger \
                (folio, assigned_on, area, custodian, position, inventory_code, \
                 description, category, condition, holder, origin_pool, asset_id) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, CustodyRow>(&query)
            .bind(&input.folio)
            .bind(input.assigned_on)
            .bind(&input.area)
            .bind(&input.custodian)
            .bind(&input.position)
            .bind(&input.inventory_code)
            .bind(&input.description)
            .bind(&input.category)
            .bind(&input.condition)
            .bind(&input.holder)
            .bind(input.origin_pool.as_str())
            .bind(input.asset_id)
            .fetch_one(executor)
            .await
    }

    /// Rows of one folio in insertion order.
    pub async fn list_by_folio<'e, E: PgExecutor<'e>>(
        executor: E,
        folio: &str,
    ) -> Result<Vec<CustodyRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM custody_ledger WHERE folio = $1 ORDER BY id");
        sqlx::query_as::<_, CustodyRow>(&query)
            .bind(folio)
            .fetch_all(executor)
            .await
    }

    /// Folio of every row assigned on `day`, duplicates included.
    pub async fn folios_on<'e, E: PgExecutor<'e>>(
        executor: E,
        day: Date,
    ) -> Result<Vec<String>, sqlx::Error> {
        sqlx::query_scalar("SELECT folio FROM custody_ledger WHERE assigned_on = $1 ORDER BY id")
            .bind(day)
            .fetch_all(executor)
            .await
    }

    /// Distinct folios assigned on `day`, in the order they were first issued.
    pub async fn distinct_folios_on<'e, E: PgExecutor<'e>>(
        executor: E,
        day: Date,
    ) -> Result<Vec<String>, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT folio FROM custody_ledger WHERE assigned_on = $1 \
             GROUP BY folio ORDER BY MIN(id)",
        )
        .bind(day)
        .fetch_all(executor)
        .await
    }

    /// Delete every row of `folio` carrying `inventory_code`.
    pub async fn delete_by_folio_and_code<'e, E: PgExecutor<'e>>(
        executor: E,
        folio: &str,
        inventory_code: &str,
    ) -> Result<u64, sqlx::Error> {
        let result =
            sqlx::query("DELETE FROM custody_ledger WHERE folio = $1 AND inventory_code = $2")
                .bind(folio)
                .bind(inventory_code)
                .execute(executor)
                .await?;
        Ok(result.rows_affected())
    }

    pub async fn update_holder<'e, E: PgExecutor<'e>>(
        executor: E,
        folio: &str,
        inventory_code: &str,
        holder: Option<&str>,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE custody_ledger SET holder = $3 WHERE folio = $1 AND inventory_code = $2",
        )
        .bind(folio)
        .bind(inventory_code)
        .bind(holder)
        .execute(executor)
        .await?;
        Ok(result.rows_affected())
    }
}
