//! In-process event bus backed by a `tokio::sync::broadcast` channel.
//!
//! Shared as `Arc<EventBus>` across the application. Workflows publish through
//! the [`ChangeSink`] impl; consumers (the change logger, live UIs) subscribe.

use chrono::{DateTime, Utc};
use custodia_core::notice::{ChangeNotice, ChangeSink};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

// ---------------------------------------------------------------------------
// ChangeEvent
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeEvent {
    #[serde(flatten)]
    pub notice: ChangeNotice,

    /// When the event was published (UTC).
    pub timestamp: DateTime<Utc>,
}

impl ChangeEvent {
    pub fn new(notice: ChangeNotice) -> Self {
        Self {
            notice,
            timestamp: Utc::now(),
        }
    }

    /// Dot-separated kind, e.g. `"custody.committed"`.
    pub fn kind(&self) -> &str {
        &self.notice.kind
    }
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 256;

/// In-process fan-out event bus.
///
/// ```rust
/// use custodia_core::notice::{ChangeNotice, ChangeSink};
/// use custodia_events::bus::EventBus;
///
/// let bus = EventBus::default();
/// let mut rx = bus.subscribe();
///
/// bus.emit(ChangeNotice {
///     kind: "custody.committed".into(),
///     reference: "RES-20260309-001".into(),
///     actor: Some("admin".into()),
///     collections: vec!["custody_ledger".into()],
///     changes: vec![],
/// });
/// assert_eq!(rx.try_recv().unwrap().kind(), "custody.committed");
/// ```
pub struct EventBus {
    sender: broadcast::Sender<ChangeEvent>,
}

impl EventBus {
    /// When the buffer is full the oldest un-consumed events are dropped and
    /// slow receivers observe `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish to all current subscribers; dropped when there are none.
    pub fn publish(&self, event: ChangeEvent) {
        // SendError only means zero receivers.
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl ChangeSink for EventBus {
    fn emit(&self, notice: ChangeNotice) {
        tracing::debug!(kind = %notice.kind, reference = %notice.reference, "Change published");
        self.publish(ChangeEvent::new(notice));
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
