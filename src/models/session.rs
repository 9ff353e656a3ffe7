use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::category::normalize_category;
use crate::utils::format_mmss;

/// How a run left the Running state.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum ExitKind {
    Completed,
    Paused,
    Distracted,
}

impl ExitKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExitKind::Completed => "Completed",
            ExitKind::Paused => "Paused",
            ExitKind::Distracted => "Distracted",
        }
    }
}

/// One entry of the persisted session log.
///
/// The JSON shape is shared with other clients of the same log:
/// `{ "date", "focusedSeconds", "distractions", "category" }`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    #[serde(with = "iso_millis")]
    pub date: DateTime<Utc>,
    #[serde(default)]
    pub focused_seconds: u32,
    #[serde(default)]
    pub distractions: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl SessionRecord {
    pub fn new(
        date: DateTime<Utc>,
        focused_seconds: u32,
        distractions: u32,
        category: impl Into<String>,
    ) -> Self {
        Self {
            date,
            focused_seconds,
            distractions,
            category: Some(category.into()),
        }
    }

    /// Category used for display and grouping; blank or missing reads as "General".
    pub fn category_label(&self) -> String {
        normalize_category(self.category.as_deref())
    }
}

/// Shown to the user after a session has been written.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub recorded_at: DateTime<Utc>,
    pub focused_seconds: u32,
    pub category: String,
    pub distractions: u32,
    pub exit: ExitKind,
}

impl SessionSummary {
    pub fn from_record(record: &SessionRecord, exit: ExitKind) -> Self {
        Self {
            recorded_at: record.date,
            focused_seconds: record.focused_seconds,
            category: record.category_label(),
            distractions: record.distractions,
            exit,
        }
    }
}

impl fmt::Display for SessionSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Session {} | Duration: {} | Category: {} | Distractions: {}",
            self.exit.as_str().to_lowercase(),
            format_mmss(self.focused_seconds),
            self.category,
            self.distractions
        )
    }
}

/// RFC 3339 timestamps with millisecond precision and a `Z` suffix.
mod iso_millis {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&value.to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|err| D::Error::custom(format!("invalid date '{raw}': {err}")))
    }
}
