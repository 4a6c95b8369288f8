use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use log::warn;

use crate::error::StorageError;
use crate::event::{EventRecord, date_key};

/// Full persisted state: date key ("YYYY-MM-DD") to the events on that day,
/// in insertion order.
pub type EventMap = BTreeMap<String, Vec<EventRecord>>;

// Returns the directory where the event DB lives.
// Defaults to a relative "./data" directory.
pub fn get_db_location() -> String {
    env::var("DB_LOCATION").unwrap_or("./data".to_string())
}

/// File-backed event store. Every mutation is written through to disk
/// immediately; readers re-load from disk rather than trusting a cache.
pub struct EventStore {
    path: PathBuf,
}

impl EventStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store rooted at `DB_LOCATION` (or `./data`), matching where the rest
    /// of the app keeps its state.
    pub fn from_env() -> Self {
        Self::new(Path::new(&get_db_location()).join("events.json"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the whole map from disk. A missing file or an unparsable payload
    /// is treated as "no data", never as a fatal error.
    pub fn load(&self) -> EventMap {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(_) => return EventMap::new(),
        };
        match serde_json::from_str(&raw) {
            Ok(events) => events,
            Err(err) => {
                warn!(
                    "event store at {} is corrupt ({}), starting empty",
                    self.path.display(),
                    err
                );
                EventMap::new()
            }
        }
    }

    /// Overwrites the store. Writes to a temp file in the same directory and
    /// renames it over the target, so a reader never observes a partial write.
    pub fn save(&self, events: &EventMap) -> Result<(), StorageError> {
        let payload = serde_json::to_string(events)?;
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, payload)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    /// Appends `record` under `date` (creating the key if needed) and persists.
    pub fn upsert(&self, date: NaiveDate, record: EventRecord) -> Result<(), StorageError> {
        let mut events = self.load();
        events.entry(date_key(date)).or_default().push(record);
        self.save(&events)
    }

    /// Deletes the event with `id` on `date` and persists. A date whose last
    /// event was removed disappears from the map entirely. Returns whether a
    /// record was actually removed, so deletes stay idempotent.
    pub fn remove(&self, date: NaiveDate, id: &str) -> Result<bool, StorageError> {
        let key = date_key(date);
        let mut events = self.load();
        let Some(day) = events.get_mut(&key) else {
            return Ok(false);
        };
        let before = day.len();
        day.retain(|event| event.id != id);
        let removed = day.len() < before;
        if !removed {
            return Ok(false);
        }
        if day.is_empty() {
            events.remove(&key);
        }
        self.save(&events)?;
        Ok(true)
    }

    /// The events stored for `date`, in insertion order.
    pub fn events_on(&self, date: NaiveDate) -> Vec<EventRecord> {
        self.load().remove(&date_key(date)).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::EventRecord;
    use std::fs;

    fn temp_store() -> EventStore {
        let dir = env::temp_dir().join(format!("datebook_test_{}", uuid::Uuid::new_v4()));
        EventStore::new(dir.join("events.json"))
    }

    fn record(title: &str, time: &str, reminder: u32) -> EventRecord {
        EventRecord {
            id: uuid::Uuid::new_v4().to_string(),
            title: title.to_string(),
            time: time.to_string(),
            reminder,
        }
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn load_is_empty_when_file_is_missing() {
        let store = temp_store();
        assert!(store.load().is_empty());
    }

    #[test]
    fn load_degrades_to_empty_on_corrupt_payload() {
        let store = temp_store();
        fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        fs::write(store.path(), "{not json at all").unwrap();
        assert!(store.load().is_empty());
    }

    #[test]
    fn upsert_then_events_on_contains_record_exactly_once() {
        let store = temp_store();
        let date = day(2026, 3, 14);
        let event = record("Dentist", "09:30", 15);
        store.upsert(date, event.clone()).unwrap();

        let events = store.events_on(date);
        assert_eq!(events.iter().filter(|e| e.id == event.id).count(), 1);
    }

    #[test]
    fn upsert_preserves_insertion_order_within_a_day() {
        let store = temp_store();
        let date = day(2026, 3, 14);
        let late = record("Late", "23:00", 0);
        let early = record("Early", "06:00", 0);
        store.upsert(date, late.clone()).unwrap();
        store.upsert(date, early.clone()).unwrap();

        let ids: Vec<String> = store.events_on(date).into_iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![late.id, early.id]);
    }

    #[test]
    fn remove_prunes_empty_date_key() {
        let store = temp_store();
        let date = day(2026, 3, 14);
        let event = record("Dentist", "09:30", 0);
        store.upsert(date, event.clone()).unwrap();

        assert!(store.remove(date, &event.id).unwrap());
        assert!(store.events_on(date).is_empty());
        assert!(!store.load().contains_key("2026-03-14"));
    }

    #[test]
    fn remove_keeps_siblings_on_the_same_day() {
        let store = temp_store();
        let date = day(2026, 3, 14);
        let gone = record("Gone", "09:30", 0);
        let kept = record("Kept", "11:00", 0);
        store.upsert(date, gone.clone()).unwrap();
        store.upsert(date, kept.clone()).unwrap();

        assert!(store.remove(date, &gone.id).unwrap());
        let events = store.events_on(date);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].id, kept.id);
    }

    #[test]
    fn remove_is_idempotent() {
        let store = temp_store();
        let date = day(2026, 3, 14);
        let event = record("Dentist", "09:30", 0);
        let other = record("Standup", "10:00", 0);
        store.upsert(date, event.clone()).unwrap();
        store.upsert(date, other.clone()).unwrap();

        assert!(store.remove(date, &event.id).unwrap());
        let snapshot = store.load();
        assert!(!store.remove(date, &event.id).unwrap());
        assert_eq!(store.load(), snapshot);
    }

    #[test]
    fn remove_on_unknown_date_reports_nothing_removed() {
        let store = temp_store();
        assert!(!store.remove(day(2026, 3, 14), "no-such-id").unwrap());
    }

    #[test]
    fn save_survives_a_reload() {
        let store = temp_store();
        let date = day(2026, 12, 1);
        let event = record("Party", "19:00", 60);
        store.upsert(date, event.clone()).unwrap();

        let reopened = EventStore::new(store.path().to_path_buf());
        assert_eq!(reopened.events_on(date), vec![event]);
    }
}
