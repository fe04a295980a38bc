//! Attendance clock ("ponto") of an event day.
//!
//! Entries live in local storage under `entries-{dayId}` as a JSON array,
//! newest first.

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::db::{queries, Database, DbError};
use crate::model::Id;

pub const ENTRIES_KEY_PREFIX: &str = "entries-";

#[derive(Debug, Error)]
pub enum AttendanceError {
    #[error(transparent)]
    Db(#[from] DbError),
    #[error("a name is required to clock in or out")]
    BlankName,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClockType {
    In,
    Out,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceEntry {
    pub entry_at: DateTime<Utc>,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ClockType,
}

pub fn entries_key(day_id: Id) -> String {
    format!("{ENTRIES_KEY_PREFIX}{day_id}")
}

pub struct AttendanceLog {
    db: Arc<Database>,
    write_lock: Mutex<()>,
}

impl AttendanceLog {
    pub fn new(db: Arc<Database>) -> Self {
        Self {
            db,
            write_lock: Mutex::new(()),
        }
    }

    /// Entries of `day_id`, newest first.
    pub fn entries(&self, day_id: Id) -> Result<Vec<AttendanceEntry>, AttendanceError> {
        let stored = queries::get_json::<Vec<AttendanceEntry>>(&self.db, &entries_key(day_id))?;
        Ok(stored.unwrap_or_default())
    }

    pub fn clock(
        &self,
        day_id: Id,
        name: &str,
        kind: ClockType,
    ) -> Result<AttendanceEntry, AttendanceError> {
        self.clock_at(day_id, name, kind, Utc::now())
    }

    pub fn clock_in(&self, day_id: Id, name: &str) -> Result<AttendanceEntry, AttendanceError> {
        self.clock(day_id, name, ClockType::In)
    }

    pub fn clock_out(&self, day_id: Id, name: &str) -> Result<AttendanceEntry, AttendanceError> {
        self.clock(day_id, name, ClockType::Out)
    }

    /// Clock `name` out if they are in, in otherwise. The lookup and the
    /// write happen under one lock, so concurrent toggles alternate.
    pub fn toggle(&self, day_id: Id, name: &str) -> Result<AttendanceEntry, AttendanceError> {
        self.record(day_id, name, Utc::now(), |entries, name| {
            let latest = entries.iter().find(|entry| entry.name == name);
            match latest.map(|entry| entry.kind) {
                Some(ClockType::In) => ClockType::Out,
                _ => ClockType::In,
            }
        })
    }

    /// Names whose latest entry is a clock-in, most recent first.
    pub fn present(&self, day_id: Id) -> Result<Vec<String>, AttendanceError> {
        let entries = self.entries(day_id)?;
        let mut seen = Vec::<&str>::new();
        let mut present = Vec::new();
        for entry in &entries {
            if seen.contains(&entry.name.as_str()) {
                continue;
            }
            seen.push(&entry.name);
            if entry.kind == ClockType::In {
                present.push(entry.name.clone());
            }
        }
        Ok(present)
    }

    pub fn clear(&self, day_id: Id) -> Result<bool, AttendanceError> {
        let _guard = self.write_lock.lock().expect("attendance lock poisoned");
        Ok(queries::remove_item(&self.db, &entries_key(day_id))?)
    }

    /// Days with at least one stored entry.
    pub fn logged_days(&self) -> Result<Vec<Id>, AttendanceError> {
        let keys = queries::list_keys(&self.db, ENTRIES_KEY_PREFIX)?;
        Ok(keys
            .iter()
            .filter_map(|key| key.strip_prefix(ENTRIES_KEY_PREFIX)?.parse::<Id>().ok())
            .collect())
    }

    fn clock_at(
        &self,
        day_id: Id,
        name: &str,
        kind: ClockType,
        entry_at: DateTime<Utc>,
    ) -> Result<AttendanceEntry, AttendanceError> {
        self.record(day_id, name, entry_at, |_, _| kind)
    }

    /// Prepend an entry whose type `choose` picks from the current entries.
    fn record(
        &self,
        day_id: Id,
        name: &str,
        entry_at: DateTime<Utc>,
        choose: impl FnOnce(&[AttendanceEntry], &str) -> ClockType,
    ) -> Result<AttendanceEntry, AttendanceError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AttendanceError::BlankName);
        }

        let _guard = self.write_lock.lock().expect("attendance lock poisoned");
        let mut entries = self.entries(day_id)?;
        let entry = AttendanceEntry {
            entry_at,
            name: name.to_string(),
            kind: choose(&entries, name),
        };
        entries.insert(0, entry.clone());
        queries::set_json(&self.db, &entries_key(day_id), &entries)?;

        tracing::info!("day {day_id}: {name} clocked {:?}", entry.kind);
        Ok(entry)
    }
}
