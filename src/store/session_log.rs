use std::sync::Arc;

use serde_json::Value;

use super::KeyValueStore;
use crate::{
    error::{FocusError, FocusResult},
    models::SessionRecord,
};

const ENABLE_LOGS: bool = true;

use crate::{log_info, log_warn};

/// Key the whole log is stored under.
pub const SESSIONS_KEY: &str = "sessions";

/// Append-only, chronologically ordered log of finished sessions.
///
/// The log is persisted as one JSON array. It is only appended to or cleared,
/// and appends assume a single writer.
#[derive(Clone)]
pub struct SessionLog {
    store: Arc<dyn KeyValueStore>,
}

impl SessionLog {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Strict read: storage failures come back as `StorageRead`.
    ///
    /// A payload that is not a JSON array reads as an empty log. Individual
    /// entries that fail to decode are skipped.
    pub async fn try_read_all(&self) -> FocusResult<Vec<SessionRecord>> {
        let raw = self
            .store
            .get(SESSIONS_KEY)
            .await
            .map_err(|err| FocusError::StorageRead(format!("{err:#}")))?;

        Ok(raw.map(|raw| decode_log(&raw)).unwrap_or_default())
    }

    /// Lenient read used by reporting: any failure degrades to an empty log.
    pub async fn read_all(&self) -> Vec<SessionRecord> {
        match self.try_read_all().await {
            Ok(records) => records,
            Err(err) => {
                log_warn!("{err}; treating session log as empty");
                Vec::new()
            }
        }
    }

    /// Read the stored array, push `record`, write the array back.
    ///
    /// Existing entries are carried over as raw JSON, so ones this build
    /// cannot decode survive. Nothing is written when the current payload
    /// cannot be read or is not an array; the new record is lost instead of
    /// the history.
    pub async fn append(&self, record: SessionRecord) -> FocusResult<usize> {
        let raw = self
            .store
            .get(SESSIONS_KEY)
            .await
            .map_err(|err| append_refused(format!("could not read session log: {err:#}")))?;

        let mut entries = match raw {
            None => Vec::new(),
            Some(raw) => match serde_json::from_str::<Value>(&raw) {
                Ok(Value::Array(entries)) => entries,
                Ok(other) => {
                    return Err(append_refused(format!(
                        "session log is {}, not an array",
                        kind_of(&other)
                    )))
                }
                Err(err) => {
                    return Err(append_refused(format!("session log is not valid JSON: {err}")))
                }
            },
        };

        let entry = serde_json::to_value(&record)
            .map_err(|err| FocusError::StorageWrite(err.to_string()))?;
        entries.push(entry);
        let count = entries.len();

        self.replace_all(&entries).await?;
        Ok(count)
    }

    /// Whole-log write. Only `append` calls it, with the raw entries it read.
    async fn replace_all(&self, entries: &[Value]) -> FocusResult<()> {
        let serialized = serde_json::to_string(entries)
            .map_err(|err| FocusError::StorageWrite(err.to_string()))?;

        self.store
            .set(SESSIONS_KEY, serialized)
            .await
            .map_err(|err| FocusError::StorageWrite(format!("{err:#}")))
    }

    /// User-initiated wipe of every recorded session.
    pub async fn clear(&self) -> FocusResult<()> {
        self.store
            .remove(SESSIONS_KEY)
            .await
            .map_err(|err| FocusError::StorageWrite(format!("{err:#}")))?;
        log_info!("Session log cleared");
        Ok(())
    }
}

fn decode_log(raw: &str) -> Vec<SessionRecord> {
    let entries = match serde_json::from_str::<Value>(raw) {
        Ok(Value::Array(entries)) => entries,
        Ok(other) => {
            log_warn!("session log is not a JSON array (found {}); ignoring it", kind_of(&other));
            return Vec::new();
        }
        Err(err) => {
            log_warn!("session log is not valid JSON: {err}; ignoring it");
            return Vec::new();
        }
    };

    entries
        .into_iter()
        .enumerate()
        .filter_map(|(index, entry)| match serde_json::from_value(entry) {
            Ok(record) => Some(record),
            Err(err) => {
                log_warn!("skipping malformed session log entry #{index}: {err}");
                None
            }
        })
        .collect()
}

fn append_refused(reason: String) -> FocusError {
    log_warn!("{reason}; leaving stored sessions untouched");
    FocusError::StorageWrite(reason)
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
