//! Durable change log.
//!
//! [`ChangeLogger`] subscribes to the [`EventBus`](crate::bus::EventBus) and
//! writes every [`ChangeEvent`] to the `change_log` table. It runs as a
//! long-lived background task and stops when the bus is dropped.

use custodia_db::repositories::ChangeLogRepo;
use custodia_db::DbPool;
use tokio::sync::broadcast;

use crate::bus::ChangeEvent;

pub struct ChangeLogger;

impl ChangeLogger {
    /// Persist events until the channel closes.
    pub async fn run(pool: DbPool, mut receiver: broadcast::Receiver<ChangeEvent>) {
        loop {
            match receiver.recv().await {
                Ok(event) => {
                    if let Err(e) = ChangeLogRepo::insert(&pool, &event.notice).await {
                        tracing::error!(
                            error = %e,
                            kind = %event.kind(),
                            reference = %event.notice.reference,
                            "Failed to persist change event"
                        );
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(skipped = n, "Change logger lagged, some events were not persisted");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::info!("Event bus closed, change logger shutting down");
                    break;
                }
            }
        }
    }
}
