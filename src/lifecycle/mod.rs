//! Bridge between the host's foreground/background notifications and the timer.

use std::{fmt, str::FromStr};

use anyhow::{anyhow, bail, Context, Result};
use serde::{Deserialize, Serialize};
use tokio::{sync::watch, task::JoinHandle};
use tokio_util::sync::CancellationToken;

use crate::{error::FocusError, timer::TimerController};

const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_info, log_warn};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum ForegroundState {
    #[default]
    Active,
    Background,
    Inactive,
}

impl fmt::Display for ForegroundState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ForegroundState::Active => "active",
            ForegroundState::Background => "background",
            ForegroundState::Inactive => "inactive",
        };
        f.write_str(label)
    }
}

impl FromStr for ForegroundState {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "active" => Ok(ForegroundState::Active),
            "background" => Ok(ForegroundState::Background),
            "inactive" => Ok(ForegroundState::Inactive),
            other => Err(anyhow!("unknown foreground state '{other}'")),
        }
    }
}

/// Forwards foreground changes from a watch channel into a [`TimerController`].
///
/// Only edges into `Background` reach the timer; repeated `Background` values
/// without an intervening foreground state are collapsed.
pub struct LifecycleMonitor {
    handle: Option<JoinHandle<()>>,
    cancel_token: Option<CancellationToken>,
}

impl LifecycleMonitor {
    pub fn new() -> Self {
        Self {
            handle: None,
            cancel_token: None,
        }
    }

    pub fn start(
        &mut self,
        timer: TimerController,
        signals: watch::Receiver<ForegroundState>,
    ) -> Result<()> {
        if self.handle.is_some() {
            bail!("lifecycle monitor already active");
        }

        let cancel_token = CancellationToken::new();
        let handle = tokio::spawn(lifecycle_loop(timer, signals, cancel_token.clone()));

        self.handle = Some(handle);
        self.cancel_token = Some(cancel_token);
        Ok(())
    }

    pub async fn stop(&mut self) -> Result<()> {
        if let Some(token) = self.cancel_token.take() {
            token.cancel();
        }

        if let Some(handle) = self.handle.take() {
            handle
                .await
                .context("lifecycle loop task failed to join")
                .map(|_| ())
        } else {
            Ok(())
        }
    }
}

impl Default for LifecycleMonitor {
    fn default() -> Self {
        Self::new()
    }
}

async fn lifecycle_loop(
    timer: TimerController,
    mut signals: watch::Receiver<ForegroundState>,
    cancel_token: CancellationToken,
) {
    let mut previous = *signals.borrow_and_update();

    loop {
        tokio::select! {
            changed = signals.changed() => {
                if changed.is_err() {
                    log_debug!("lifecycle signal source closed");
                    break;
                }
            }
            _ = cancel_token.cancelled() => {
                log_info!("lifecycle monitor shutting down");
                break;
            }
        }

        let next = *signals.borrow_and_update();
        log_debug!("foreground state {} -> {}", previous, next);
        let entered_background = next == ForegroundState::Background && previous != next;
        previous = next;

        if !entered_background {
            continue;
        }

        match timer.handle_foreground_change(next).await {
            Ok(_) => {}
            Err(err @ FocusError::StorageWrite(_)) => {
                log_warn!("distraction recorded but session was not saved: {err}");
            }
            Err(err) => log_warn!("background signal not applied: {err}"),
        }
    }
}
