use std::{fmt, str::FromStr};

use anyhow::{anyhow, Error};
use serde::{Deserialize, Serialize};

/// Label written for records whose category is missing or blank.
pub const FALLBACK_CATEGORY: &str = "General";

/// Categories selectable on the timer.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
pub enum Category {
    #[default]
    Study,
    Coding,
    Project,
    Reading,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Study,
        Category::Coding,
        Category::Project,
        Category::Reading,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Study => "Study",
            Category::Coding => "Coding",
            Category::Project => "Project",
            Category::Reading => "Reading",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        Category::ALL
            .into_iter()
            .find(|category| category.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| {
                let known: Vec<&str> = Category::ALL.iter().map(Category::as_str).collect();
                anyhow!("unknown category '{trimmed}' (expected one of {})", known.join(", "))
            })
    }
}

/// Maps a stored category string onto the label used for grouping.
pub fn normalize_category(raw: Option<&str>) -> String {
    match raw.map(str::trim) {
        Some(value) if !value.is_empty() => value.to_string(),
        _ => FALLBACK_CATEGORY.to_string(),
    }
}
