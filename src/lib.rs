//! Event storage and reminder scheduling for a local calendar app.
//!
//! The view layer talks to two objects: an [`store::EventStore`] holding the
//! persisted date -> events map, and a [`scheduler::ReminderScheduler`] that
//! turns that map into armed one-shot timers. After any store mutation the
//! caller runs `reschedule_all` so the timer set always mirrors disk.

pub mod error;
pub mod event;
pub mod scheduler;
pub mod store;

pub use error::{StorageError, ValidationError};
pub use event::EventRecord;
pub use scheduler::{Notifier, ReminderScheduler};
pub use store::{EventMap, EventStore};
