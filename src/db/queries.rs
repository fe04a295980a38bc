use chrono::Utc;
use rusqlite::params;
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::{Database, DbError};

// ---------------------------------------------------------------------------
// Local storage queries
// ---------------------------------------------------------------------------

pub fn set_item(db: &Database, key: &str, value_json: &str) -> Result<(), DbError> {
    let conn = db.conn();
    conn.execute(
        "INSERT INTO local_storage (key, value_json, updated_at)
         VALUES (?1, ?2, ?3)
         ON CONFLICT(key)
         DO UPDATE SET value_json = excluded.value_json, updated_at = excluded.updated_at",
        params![key, value_json, Utc::now().to_rfc3339()],
    )?;
    Ok(())
}

pub fn get_item(db: &Database, key: &str) -> Result<Option<String>, DbError> {
    let conn = db.conn();
    let mut stmt = conn.prepare("SELECT value_json FROM local_storage WHERE key = ?1")?;
    let mut rows = stmt.query_map(params![key], |row| row.get(0))?;
    match rows.next() {
        Some(row) => Ok(Some(row?)),
        None => Ok(None),
    }
}

/// Returns whether a row was removed.
pub fn remove_item(db: &Database, key: &str) -> Result<bool, DbError> {
    let conn = db.conn();
    let changed = conn.execute("DELETE FROM local_storage WHERE key = ?1", params![key])?;
    Ok(changed > 0)
}

pub fn list_keys(db: &Database, prefix: &str) -> Result<Vec<String>, DbError> {
    let conn = db.conn();
    let mut stmt = conn.prepare(
        "SELECT key FROM local_storage WHERE substr(key, 1, length(?1)) = ?1 ORDER BY key",
    )?;
    let keys = stmt
        .query_map(params![prefix], |row| row.get(0))?
        .collect::<Result<Vec<String>, _>>()?;
    Ok(keys)
}

// ---------------------------------------------------------------------------
// Typed helpers
// ---------------------------------------------------------------------------

pub fn get_json<T: DeserializeOwned>(db: &Database, key: &str) -> Result<Option<T>, DbError> {
    let Some(raw) = get_item(db, key)? else {
        return Ok(None);
    };
    serde_json::from_str(&raw)
        .map(Some)
        .map_err(|e| DbError::Corrupt {
            key: key.to_string(),
            reason: e.to_string(),
        })
}

pub fn set_json<T: Serialize>(db: &Database, key: &str, value: &T) -> Result<(), DbError> {
    let raw = serde_json::to_string(value).map_err(|e| DbError::Corrupt {
        key: key.to_string(),
        reason: e.to_string(),
    })?;
    set_item(db, key, &raw)
}
