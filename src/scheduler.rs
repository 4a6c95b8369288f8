use std::collections::HashMap;
use std::sync::Arc;

use chrono::{Duration, NaiveDateTime};
use log::{debug, info, warn};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{Instant, sleep_until};

use crate::event::{EventRecord, parse_date_key};
use crate::store::EventStore;

/// Delivery mechanism for a reminder that has come due. The view layer
/// supplies the real alert; tests record the calls.
pub trait Notifier: Send + Sync {
    fn notify(&self, title: &str, time: &str, date: &str);
}

/// Owns the process-local set of armed one-shot timers, keyed by event id.
/// At most one timer is armed per id. The set is never patched in place: any
/// change to the underlying store is followed by a full `reschedule_all`,
/// which tears the set down and rebuilds it from a fresh snapshot.
pub struct ReminderScheduler {
    notifier: Arc<dyn Notifier>,
    timers: Arc<Mutex<HashMap<String, JoinHandle<()>>>>,
}

impl ReminderScheduler {
    pub fn new(notifier: Arc<dyn Notifier>) -> Self {
        Self {
            notifier,
            timers: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Cancels every armed timer, re-reads the whole store, and arms a fresh
    /// timer for each event whose reminder deadline is still ahead of `now`.
    ///
    /// A reminder whose deadline already passed is skipped silently and never
    /// fires retroactively. A record whose stored date or time no longer
    /// parses is skipped on its own; its siblings still get armed.
    pub async fn reschedule_all(&self, store: &EventStore, now: NaiveDateTime) {
        let mut timers = self.timers.lock().await;
        for (_, handle) in timers.drain() {
            handle.abort();
        }

        for (key, records) in store.load() {
            let Some(date) = parse_date_key(&key) else {
                warn!("skipping reminders under malformed date key {:?}", key);
                continue;
            };
            for record in records {
                if record.reminder == 0 {
                    continue;
                }
                let Some(parsed) = record.parsed_time() else {
                    warn!(
                        "skipping reminder for event {} with malformed time {:?}",
                        record.id, record.time
                    );
                    continue;
                };
                let fire_at = date.and_time(parsed) - Duration::minutes(record.reminder as i64);
                if fire_at <= now {
                    debug!("reminder for event {} is past due, skipping", record.id);
                    continue;
                }
                let Ok(delay) = (fire_at - now).to_std() else {
                    continue;
                };
                // Pin the deadline now: the spawned task may first be polled
                // after the clock has already moved.
                let deadline = Instant::now() + delay;

                let EventRecord { id, title, time, .. } = record;
                let timer_id = id.clone();
                let date_str = key.clone();
                let notifier = Arc::clone(&self.notifier);
                let set = Arc::clone(&self.timers);
                let handle = tokio::spawn(async move {
                    sleep_until(deadline).await;
                    // Leave the set before notifying; there are no await
                    // points between here and the callback, so a fire is
                    // always all-or-nothing.
                    set.lock().await.remove(&timer_id);
                    info!("reminder due for event {}", timer_id);
                    notifier.notify(&title, &time, &date_str);
                });
                if let Some(stale) = timers.insert(id, handle) {
                    stale.abort();
                }
            }
        }
    }

    /// Cancels the armed timer for `id`, if any. Returns whether one was
    /// armed; calling this for an unknown or already-fired id is a no-op, so
    /// delete flows stay idempotent.
    pub async fn cancel(&self, id: &str) -> bool {
        match self.timers.lock().await.remove(id) {
            Some(handle) => {
                handle.abort();
                true
            }
            None => false,
        }
    }

    /// Cancels every armed timer without consulting the store.
    pub async fn cancel_all(&self) {
        let mut timers = self.timers.lock().await;
        for (_, handle) in timers.drain() {
            handle.abort();
        }
    }

    pub async fn armed_count(&self) -> usize {
        self.timers.lock().await.len()
    }

    pub async fn is_armed(&self, id: &str) -> bool {
        self.timers.lock().await.contains_key(id)
    }
}
