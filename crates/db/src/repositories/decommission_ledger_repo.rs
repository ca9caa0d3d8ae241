//! Repository for the append-only `decommission_ledger` table.

use custodia_core::custody::NewDecommissionRecord;
use sqlx::PgExecutor;

use crate::models::custody::DecommissionRow;

const COLUMNS: &str = "id, custody_folio, decommission_folio, decommissioned_on, area, \
    custodian, position, inventory_code, description, category, condition, holder, \
    origin_pool, actor, created_at";

pub struct DecommissionLedgerRepo;

impl DecommissionLedgerRepo {
    pub async fn insert<'e, E: PgExecutor<'e>>(
        executor: E,
        input: &NewDecommissionRecord,
    ) -> Result<DecommissionRow, sqlx::Error> {
        let query = format!(
            "INSERT INTO decommission_ledger \
                (custody_folio, decommission_folio, decommissioned_on, area, custodian, \
                 position, inventory_code, description, category, condition, holder, \
                 origin_pool, actor) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, DecommissionRow>(&query)
            .bind(&input.custody_folio)
            .bind(&input.decommission_folio)
            .bind(input.decommissioned_on)
            .bind(&input.area)
            .bind(&input.custodian)
            .bind(&input.position)
            .bind(&input.inventory_code)
            .bind(&input.description)
            .bind(&input.category)
            .bind(&input.condition)
            .bind(&input.holder)
            .bind(input.origin_pool.as_str())
            .bind(&input.actor)
            .fetch_one(executor)
            .await
    }

    pub async fn list_by_decommission_folio<'e, E: PgExecutor<'e>>(
        executor: E,
        decommission_folio: &str,
    ) -> Result<Vec<DecommissionRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM decommission_ledger WHERE decommission_folio = $1 ORDER BY id"
        );
        sqlx::query_as::<_, DecommissionRow>(&query)
            .bind(decommission_folio)
            .fetch_all(executor)
            .await
    }

    /// Audit history of one custody folio, oldest first.
    pub async fn list_by_custody_folio<'e, E: PgExecutor<'e>>(
        executor: E,
        custody_folio: &str,
    ) -> Result<Vec<DecommissionRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM decommission_ledger WHERE custody_folio = $1 ORDER BY id"
        );
        sqlx::query_as::<_, DecommissionRow>(&query)
            .bind(custody_folio)
            .fetch_all(executor)
            .await
    }

    /// Folio of the most recently created row, any year.
    pub async fn latest_folio<'e, E: PgExecutor<'e>>(
        executor: E,
    ) -> Result<Option<String>, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT decommission_folio FROM decommission_ledger \
             ORDER BY created_at DESC, id DESC LIMIT 1",
        )
        .fetch_optional(executor)
        .await
    }
}
