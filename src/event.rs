use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ValidationError;

pub const DATE_KEY_FORMAT: &str = "%Y-%m-%d";
pub const TIME_FORMAT: &str = "%H:%M";

/// One calendar event as it lives on disk. The calendar date is the partition
/// key in the store, so it is not repeated inside the record. `time` stays a
/// string so a single corrupted record cannot take down a whole store load;
/// the scheduler re-parses it and skips the record if it is junk.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct EventRecord {
    pub id: String,
    pub title: String,
    pub time: String,
    #[serde(default)]
    pub reminder: u32,
}

impl EventRecord {
    /// Validates raw user input and builds a record with a fresh id.
    /// A missing reminder offset means "no reminder".
    pub fn create(
        title: &str,
        date: &str,
        time: &str,
        reminder: Option<i64>,
    ) -> Result<(NaiveDate, EventRecord), ValidationError> {
        let title = title.trim();
        if title.is_empty() {
            return Err(ValidationError::EmptyTitle);
        }
        let date = parse_date_key(date).ok_or_else(|| ValidationError::BadDate(date.to_string()))?;
        let time = NaiveTime::parse_from_str(time, TIME_FORMAT)
            .map_err(|_| ValidationError::BadTime(time.to_string()))?;
        let reminder = match reminder.unwrap_or(0) {
            offset if offset < 0 => return Err(ValidationError::NegativeReminder(offset)),
            offset => offset as u32,
        };
        Ok((
            date,
            EventRecord {
                id: Uuid::new_v4().to_string(),
                title: title.to_string(),
                time: time.format(TIME_FORMAT).to_string(),
                reminder,
            },
        ))
    }

    /// The stored time, if it still parses as HH:MM.
    pub fn parsed_time(&self) -> Option<NaiveTime> {
        NaiveTime::parse_from_str(&self.time, TIME_FORMAT).ok()
    }
}

pub fn date_key(date: NaiveDate) -> String {
    date.format(DATE_KEY_FORMAT).to_string()
}

pub fn parse_date_key(key: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(key, DATE_KEY_FORMAT).ok()
}

/// Display order for a day's panel. Insertion order is what gets persisted;
/// views sort by time just before rendering.
pub fn sort_by_time(events: &mut [EventRecord]) {
    events.sort_by(|a, b| a.time.cmp(&b.time));
}
