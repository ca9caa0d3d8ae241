//! Change-event bus for custody writes.
//!
//! - [`EventBus`]: in-process publish/subscribe hub backed by
//!   `tokio::sync::broadcast`; implements the core's `ChangeSink`.
//! - [`ChangeEvent`]: a change notice stamped with its publication time.
//! - [`ChangeLogger`]: background service that writes every event to the
//!   `change_log` table.

pub mod bus;
pub mod persistence;

pub use bus::{ChangeEvent, EventBus};
pub use persistence::ChangeLogger;
