use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct AllTimeTotals {
    pub focused_seconds: u64,
    pub distractions: u64,
}

/// One calendar day of the trend view.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DayBucket {
    pub date: NaiveDate,
    /// `DD/MM`
    pub label: String,
    pub minutes: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CategorySlice {
    pub name: String,
    pub minutes: u64,
    /// Share of the displayed slices only, not of all recorded time.
    pub percentage: f64,
    /// 0-based position, used for legend order and shading.
    pub rank: usize,
}

impl CategorySlice {
    pub fn rounded_percentage(&self) -> u64 {
        self.percentage.round() as u64
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub session_count: usize,
    pub today_seconds: u64,
    pub all_time: AllTimeTotals,
    pub last_7_days: Vec<DayBucket>,
    pub by_category: Vec<CategorySlice>,
}
