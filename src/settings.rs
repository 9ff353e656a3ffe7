use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
    sync::{PoisonError, RwLock},
};

use crate::{
    models::Category,
    timer::{state::clamp_minutes, TimerRunState, DEFAULT_MINUTES},
};

/// What a fresh timer starts with.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TimerDefaults {
    pub default_minutes: u32,
    pub default_category: Category,
}

impl Default for TimerDefaults {
    fn default() -> Self {
        Self {
            default_minutes: DEFAULT_MINUTES,
            default_category: Category::default(),
        }
    }
}

impl TimerDefaults {
    pub fn initial_state(&self) -> TimerRunState {
        TimerRunState::new(self.default_minutes, self.default_category)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct UserSettings {
    #[serde(default)]
    timer: TimerDefaults,
}

pub struct SettingsStore {
    path: PathBuf,
    data: RwLock<UserSettings>,
}

impl SettingsStore {
    pub fn new(path: PathBuf) -> Result<Self> {
        let data = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read settings from {}", path.display()))?;
            serde_json::from_str(&contents).unwrap_or_else(|err| {
                log::warn!("Ignoring malformed settings at {}: {err}", path.display());
                UserSettings::default()
            })
        } else {
            UserSettings::default()
        };

        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn timer_defaults(&self) -> TimerDefaults {
        self.data
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .timer
            .clone()
    }

    /// Minutes are clamped the same way the timer clamps them.
    pub fn update_timer_defaults(&self, mut defaults: TimerDefaults) -> Result<TimerDefaults> {
        defaults.default_minutes = clamp_minutes(i64::from(defaults.default_minutes));

        let mut guard = self.data.write().unwrap_or_else(PoisonError::into_inner);
        guard.timer = defaults.clone();
        self.persist(&guard)?;
        Ok(defaults)
    }

    fn persist(&self, data: &UserSettings) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let serialized = serde_json::to_string_pretty(data)?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("Failed to write settings to {}", self.path.display()))
    }
}
