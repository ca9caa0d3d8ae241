//! Repository for the `folio_reservations` table.

use sqlx::PgExecutor;

pub struct FolioReservationRepo;

impl FolioReservationRepo {
    /// Atomically reserve `max(candidate, last + 1)` for `(scope, period)`.
    ///
    /// The upsert holds the row lock for the rest of the statement, so two
    /// concurrent callers can never receive the same value.
    pub async fn reserve<'e, E: PgExecutor<'e>>(
        executor: E,
        scope: &str,
        period: &str,
        candidate: i32,
    ) -> Result<i32, sqlx::Error> {
        sqlx::query_scalar(
            "INSERT INTO folio_reservations (scope, period, last_value) \
             VALUES ($1, $2, $3) \
             ON CONFLICT (scope, period) DO UPDATE \
                SET last_value = GREATEST(EXCLUDED.last_value, folio_reservations.last_value + 1), \
                    updated_at = now() \
             RETURNING last_value",
        )
        .bind(scope)
        .bind(period)
        .bind(candidate)
        .fetch_one(executor)
        .await
    }

    /// Last value handed out, if any.
    pub async fn current<'e, E: PgExecutor<'e>>(
        executor: E,
        scope: &str,
        period: &str,
    ) -> Result<Option<i32>, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT last_value FROM folio_reservations WHERE scope = $1 AND period = $2",
        )
        .bind(scope)
        .bind(period)
        .fetch_optional(executor)
        .await
    }
}
