use std::{sync::Arc, time::Duration};

use serde::Serialize;
use tokio::{
    sync::{broadcast, Mutex},
    task::JoinHandle,
    time::{self, Instant},
};
use tokio_util::sync::CancellationToken;

use super::{
    recorder::{PendingRecord, RecordOutcome, SessionRecorder, SkipReason},
    state::TimerRunState,
};
use crate::{
    error::{FocusError, FocusResult},
    lifecycle::ForegroundState,
    models::{Category, SessionSummary},
    utils::format_mmss,
};

const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_error, log_info};

const EVENT_CAPACITY: usize = 128;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerSnapshot {
    pub state: TimerRunState,
    pub remaining: String,
}

impl From<&TimerRunState> for TimerSnapshot {
    fn from(state: &TimerRunState) -> Self {
        Self {
            remaining: format_mmss(state.seconds_left),
            state: state.clone(),
        }
    }
}

/// Broadcast to every subscriber of a [`TimerController`].
#[derive(Debug, Clone)]
pub enum TimerEvent {
    StateChanged(TimerSnapshot),
    Heartbeat(TimerSnapshot),
    SessionRecorded(SessionSummary),
    RecordFailed(String),
}

struct Ticker {
    run_id: u64,
    handle: JoinHandle<()>,
    cancel_token: CancellationToken,
}

/// Owns the run state and the 1-second countdown task.
///
/// Every transition runs to completion under the state lock, including the
/// claim of the save guard; only the log write happens after the lock is
/// released.
#[derive(Clone)]
pub struct TimerController {
    state: Arc<Mutex<TimerRunState>>,
    recorder: SessionRecorder,
    events: broadcast::Sender<TimerEvent>,
    ticker: Arc<Mutex<Option<Ticker>>>,
    tick_interval: Duration,
    heartbeat_every_ticks: u32,
}

impl TimerController {
    pub fn new(recorder: SessionRecorder, initial: TimerRunState) -> Self {
        let debug_mode = std::env::var("FOCUSLOG_DEBUG")
            .map(|value| value == "1" || value.eq_ignore_ascii_case("true"))
            .unwrap_or(false);
        let (events, _) = broadcast::channel(EVENT_CAPACITY);

        Self {
            state: Arc::new(Mutex::new(initial)),
            recorder,
            events,
            ticker: Arc::new(Mutex::new(None)),
            tick_interval: Duration::from_secs(1),
            heartbeat_every_ticks: if debug_mode { 1 } else { 10 },
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<TimerEvent> {
        self.events.subscribe()
    }

    pub async fn get_state(&self) -> TimerRunState {
        self.state.lock().await.clone()
    }

    pub async fn get_snapshot(&self) -> TimerSnapshot {
        TimerSnapshot::from(&*self.state.lock().await)
    }

    pub async fn start(&self) -> FocusResult<TimerSnapshot> {
        let (run_id, snapshot) = {
            let mut state = self.state.lock().await;
            let run_id = state.start()?;
            (run_id, TimerSnapshot::from(&*state))
        };

        log_info!(
            "Run {} started: {} left, category {}",
            run_id,
            snapshot.remaining,
            snapshot.state.category
        );

        self.spawn_ticker(run_id).await;
        self.emit(TimerEvent::StateChanged(snapshot.clone()));
        Ok(snapshot)
    }

    pub async fn pause(&self) -> FocusResult<RecordOutcome> {
        let (run_id, claim, snapshot) = {
            let mut state = self.state.lock().await;
            let exit = state.pause()?;
            log_info!("Run {} paused at {}", exit.run_id, format_mmss(exit.end_seconds_left));
            let claim = SessionRecorder::claim(&mut state, &exit);
            (exit.run_id, claim, TimerSnapshot::from(&*state))
        };

        self.cancel_ticker(run_id).await;
        self.emit(TimerEvent::StateChanged(snapshot));
        self.finish(claim).await
    }

    /// Reacts to the host app's foreground state. Only a move into the
    /// background while Running has an effect.
    pub async fn handle_foreground_change(
        &self,
        next: ForegroundState,
    ) -> FocusResult<Option<RecordOutcome>> {
        if next != ForegroundState::Background {
            return Ok(None);
        }

        let (run_id, claim, snapshot) = {
            let mut state = self.state.lock().await;
            let Some(exit) = state.background() else {
                log_debug!("background signal while idle; ignoring");
                return Ok(None);
            };
            log_info!(
                "Run {} interrupted by distraction #{} at {}",
                exit.run_id,
                exit.distractions,
                format_mmss(exit.end_seconds_left)
            );
            let claim = SessionRecorder::claim(&mut state, &exit);
            (exit.run_id, claim, TimerSnapshot::from(&*state))
        };

        self.cancel_ticker(run_id).await;
        self.emit(TimerEvent::StateChanged(snapshot));
        self.finish(claim).await.map(Some)
    }

    /// Back to the configured baseline. Never records.
    pub async fn reset(&self) -> TimerSnapshot {
        let (run_id, snapshot) = {
            let mut state = self.state.lock().await;
            state.reset();
            (state.run_id, TimerSnapshot::from(&*state))
        };

        self.cancel_ticker(run_id).await;
        log_info!("Timer reset to {}", snapshot.remaining);
        self.emit(TimerEvent::StateChanged(snapshot.clone()));
        snapshot
    }

    pub async fn step_minutes(&self, delta: i64) -> FocusResult<TimerSnapshot> {
        self.edit(|state| state.step_minutes(delta).map(|_| ())).await
    }

    pub async fn set_minutes(&self, minutes: i64) -> FocusResult<TimerSnapshot> {
        self.edit(|state| state.set_minutes(minutes).map(|_| ())).await
    }

    pub async fn reset_minutes(&self) -> FocusResult<TimerSnapshot> {
        self.edit(|state| state.reset_minutes().map(|_| ())).await
    }

    pub async fn set_category(&self, category: Category) -> FocusResult<TimerSnapshot> {
        self.edit(|state| state.set_category(category)).await
    }

    /// Stops the countdown task when the owning surface goes away.
    pub async fn shutdown(&self) {
        let ticker = self.ticker.lock().await.take();
        if let Some(ticker) = ticker {
            ticker.cancel_token.cancel();
            if let Err(err) = ticker.handle.await {
                log_error!("ticker task failed to join: {err}");
            }
        }
    }

    async fn edit<F>(&self, apply: F) -> FocusResult<TimerSnapshot>
    where
        F: FnOnce(&mut TimerRunState) -> FocusResult<()>,
    {
        let snapshot = {
            let mut state = self.state.lock().await;
            apply(&mut state)?;
            TimerSnapshot::from(&*state)
        };
        self.emit(TimerEvent::StateChanged(snapshot.clone()));
        Ok(snapshot)
    }

    async fn finish(
        &self,
        claim: Result<PendingRecord, SkipReason>,
    ) -> FocusResult<RecordOutcome> {
        let pending = match claim {
            Ok(pending) => pending,
            Err(reason) => return Ok(RecordOutcome::Skipped(reason)),
        };

        match self.recorder.commit(pending).await {
            Ok(summary) => {
                self.emit(TimerEvent::SessionRecorded(summary.clone()));
                Ok(RecordOutcome::Recorded(summary))
            }
            Err(err) => {
                self.emit(TimerEvent::RecordFailed(err.to_string()));
                Err(err)
            }
        }
    }

    async fn spawn_ticker(&self, run_id: u64) {
        let mut ticker_guard = self.ticker.lock().await;
        if let Some(previous) = ticker_guard.take() {
            previous.cancel_token.cancel();
        }

        let cancel_token = CancellationToken::new();
        let controller = self.clone();
        let token = cancel_token.clone();
        let handle = tokio::spawn(async move { controller.run_ticker(run_id, token).await });

        *ticker_guard = Some(Ticker {
            run_id,
            handle,
            cancel_token,
        });
    }

    /// Stops the ticker only if it still belongs to `run_id`; a run started
    /// in the meantime keeps its countdown.
    async fn cancel_ticker(&self, run_id: u64) {
        let mut ticker_guard = self.ticker.lock().await;
        if ticker_guard.as_ref().is_some_and(|ticker| ticker.run_id == run_id) {
            if let Some(ticker) = ticker_guard.take() {
                ticker.cancel_token.cancel();
            }
        }
    }

    async fn run_ticker(&self, run_id: u64, cancel_token: CancellationToken) {
        let mut interval = time::interval_at(Instant::now() + self.tick_interval, self.tick_interval);
        let mut ticks: u32 = 0;

        loop {
            tokio::select! {
                _ = cancel_token.cancelled() => break,
                _ = interval.tick() => {}
            }

            let (completion, snapshot) = {
                let mut state = self.state.lock().await;
                // A transition may have won the lock between the tick and here.
                if cancel_token.is_cancelled() || state.run_id != run_id || !state.is_running() {
                    break;
                }
                let completion = state
                    .tick()
                    .map(|exit| SessionRecorder::claim(&mut state, &exit));
                (completion, TimerSnapshot::from(&*state))
            };

            if let Some(claim) = completion {
                log_info!("Run {} completed", run_id);
                self.emit(TimerEvent::StateChanged(snapshot));
                if let Err(err) = self.finish(claim).await {
                    log_error!("failed to record completed run {}: {err}", run_id);
                }
                break;
            }

            ticks = ticks.wrapping_add(1);
            if ticks % self.heartbeat_every_ticks == 0 {
                self.emit(TimerEvent::Heartbeat(snapshot));
            }
        }

        log_debug!("ticker for run {} stopped", run_id);
    }

    fn emit(&self, event: TimerEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }
}
