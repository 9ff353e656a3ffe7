use serde::{Deserialize, Serialize};

use crate::{
    error::{FocusError, FocusResult},
    models::{Category, ExitKind},
};

const ENABLE_LOGS: bool = true;

use crate::log_debug;

pub const MIN_MINUTES: u32 = 5;
pub const MAX_MINUTES: u32 = 60;
pub const MINUTES_STEP: u32 = 5;
pub const DEFAULT_MINUTES: u32 = 25;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum TimerStatus {
    /// Duration and category may be edited.
    #[default]
    Idle,
    /// Countdown active, settings locked.
    Running,
}

/// Snaps a requested duration onto 5..=60 in steps of 5.
pub fn clamp_minutes(requested: i64) -> u32 {
    let step = i64::from(MINUTES_STEP);
    let snapped = (((requested + step / 2) / step) * step)
        .clamp(i64::from(MIN_MINUTES), i64::from(MAX_MINUTES));
    if snapped != requested {
        log_debug!("duration of {requested} min clamped to {snapped} min");
    }
    snapped as u32
}

/// A transition out of Running that may produce a session record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordableExit {
    pub kind: ExitKind,
    pub configured_minutes: u32,
    pub end_seconds_left: u32,
    /// Count taken at the moment of the transition, including the
    /// distraction that caused it.
    pub distractions: u32,
    pub category: Category,
    pub run_id: u64,
}

impl RecordableExit {
    pub fn focused_seconds(&self) -> u32 {
        (self.configured_minutes * 60).saturating_sub(self.end_seconds_left)
    }
}

/// Transient countdown state. Lives for the whole process and is never
/// persisted; only the records derived from it are.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TimerRunState {
    pub status: TimerStatus,
    pub configured_minutes: u32,
    pub seconds_left: u32,
    pub distraction_count: u32,
    pub category: Category,
    /// Set once the current run has produced (or is producing) a record.
    pub save_guard: bool,
    /// Bumped on every Start so a stale ticker can tell it no longer owns the run.
    #[serde(skip)]
    pub run_id: u64,
}

impl Default for TimerRunState {
    fn default() -> Self {
        Self::new(DEFAULT_MINUTES, Category::default())
    }
}

impl TimerRunState {
    pub fn new(minutes: u32, category: Category) -> Self {
        let configured_minutes = clamp_minutes(i64::from(minutes));
        Self {
            status: TimerStatus::Idle,
            configured_minutes,
            seconds_left: configured_minutes * 60,
            distraction_count: 0,
            category,
            save_guard: false,
            run_id: 0,
        }
    }

    pub fn is_running(&self) -> bool {
        self.status == TimerStatus::Running
    }

    pub fn start(&mut self) -> FocusResult<u64> {
        if self.is_running() {
            return Err(FocusError::AlreadyRunning);
        }
        if self.seconds_left == 0 {
            return Err(FocusError::NothingLeft);
        }

        self.save_guard = false;
        self.status = TimerStatus::Running;
        self.run_id = self.run_id.wrapping_add(1);
        Ok(self.run_id)
    }

    /// One second of countdown. Returns the completion exit when the
    /// countdown hits zero; ticks outside Running are ignored.
    pub fn tick(&mut self) -> Option<RecordableExit> {
        if !self.is_running() {
            return None;
        }

        self.seconds_left = self.seconds_left.saturating_sub(1);
        if self.seconds_left > 0 {
            return None;
        }

        self.status = TimerStatus::Idle;
        Some(self.exit(ExitKind::Completed, 0, self.distraction_count))
    }

    pub fn pause(&mut self) -> FocusResult<RecordableExit> {
        if !self.is_running() {
            return Err(FocusError::NotRunning);
        }

        self.status = TimerStatus::Idle;
        Ok(self.exit(ExitKind::Paused, self.seconds_left, self.distraction_count))
    }

    /// The app moved to the background. Only counts while Running.
    pub fn background(&mut self) -> Option<RecordableExit> {
        if !self.is_running() {
            return None;
        }

        let distractions = self.distraction_count + 1;
        self.distraction_count = distractions;
        self.status = TimerStatus::Idle;
        Some(self.exit(ExitKind::Distracted, self.seconds_left, distractions))
    }

    /// Back to the configured baseline from any state. Never records.
    pub fn reset(&mut self) {
        self.status = TimerStatus::Idle;
        self.rebaseline();
    }

    pub fn set_minutes(&mut self, requested: i64) -> FocusResult<u32> {
        if self.is_running() {
            return Err(FocusError::Locked);
        }

        self.configured_minutes = clamp_minutes(requested);
        self.rebaseline();
        Ok(self.configured_minutes)
    }

    pub fn step_minutes(&mut self, delta: i64) -> FocusResult<u32> {
        self.set_minutes(i64::from(self.configured_minutes) + delta)
    }

    pub fn reset_minutes(&mut self) -> FocusResult<u32> {
        self.set_minutes(i64::from(DEFAULT_MINUTES))
    }

    pub fn set_category(&mut self, category: Category) -> FocusResult<()> {
        if self.is_running() {
            return Err(FocusError::Locked);
        }
        self.category = category;
        Ok(())
    }

    fn rebaseline(&mut self) {
        self.seconds_left = self.configured_minutes * 60;
        self.distraction_count = 0;
        self.save_guard = false;
    }

    fn exit(&self, kind: ExitKind, end_seconds_left: u32, distractions: u32) -> RecordableExit {
        RecordableExit {
            kind,
            configured_minutes: self.configured_minutes,
            end_seconds_left,
            distractions,
            category: self.category,
            run_id: self.run_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn running(minutes: u32) -> TimerRunState {
        let mut state = TimerRunState::new(minutes, Category::Coding);
        state.start().unwrap();
        state
    }

    #[test]
    fn clamps_and_snaps_durations() {
        assert_eq!(clamp_minutes(0), 5);
        assert_eq!(clamp_minutes(-20), 5);
        assert_eq!(clamp_minutes(7), 5);
        assert_eq!(clamp_minutes(8), 10);
        assert_eq!(clamp_minutes(25), 25);
        assert_eq!(clamp_minutes(61), 60);
        assert_eq!(clamp_minutes(500), 60);
    }

    struct CaptureLogger {
        lines: std::sync::Mutex<Vec<String>>,
    }

    impl log::Log for CaptureLogger {
        fn enabled(&self, _metadata: &log::Metadata) -> bool {
            true
        }

        fn log(&self, record: &log::Record) {
            if let Ok(mut lines) = self.lines.lock() {
                lines.push(record.args().to_string());
            }
        }

        fn flush(&self) {}
    }

    static CAPTURE: CaptureLogger = CaptureLogger {
        lines: std::sync::Mutex::new(Vec::new()),
    };

    #[test]
    fn adjusted_durations_are_logged() {
        let _ = log::set_logger(&CAPTURE);
        log::set_max_level(log::LevelFilter::Debug);

        clamp_minutes(7);
        clamp_minutes(90);
        clamp_minutes(35);

        let lines = CAPTURE.lines.lock().unwrap();
        assert!(lines.iter().any(|line| line == "duration of 7 min clamped to 5 min"));
        assert!(lines.iter().any(|line| line == "duration of 90 min clamped to 60 min"));
        assert!(!lines.iter().any(|line| line.starts_with("duration of 35 min")));
    }

    #[test]
    fn countdown_to_zero_completes_once() {
        let mut state = running(5);
        let mut exits = Vec::new();
        for _ in 0..400 {
            if let Some(exit) = state.tick() {
                exits.push(exit);
            }
        }

        assert_eq!(exits.len(), 1);
        assert_eq!(exits[0].kind, ExitKind::Completed);
        assert_eq!(exits[0].focused_seconds(), 300);
        assert_eq!(state.status, TimerStatus::Idle);
        assert_eq!(state.seconds_left, 0);
        assert!(matches!(state.start(), Err(FocusError::NothingLeft)));
    }

    #[test]
    fn pause_reports_elapsed_seconds() {
        let mut state = running(25);
        for _ in 0..42 {
            assert!(state.tick().is_none());
        }

        let exit = state.pause().unwrap();
        assert_eq!(exit.kind, ExitKind::Paused);
        assert_eq!(exit.end_seconds_left, 25 * 60 - 42);
        assert_eq!(exit.focused_seconds(), 42);
        assert!(!state.is_running());
        assert!(matches!(state.pause(), Err(FocusError::NotRunning)));
    }

    #[test]
    fn immediate_pause_has_nothing_focused() {
        let mut state = running(25);
        assert_eq!(state.pause().unwrap().focused_seconds(), 0);
    }

    #[test]
    fn background_counts_the_distraction_it_reports() {
        let mut state = running(25);
        for _ in 0..300 {
            state.tick();
        }

        let exit = state.background().unwrap();
        assert_eq!(exit.kind, ExitKind::Distracted);
        assert_eq!(exit.distractions, 1);
        assert_eq!(exit.focused_seconds(), 300);
        assert_eq!(state.distraction_count, 1);

        // Not running any more: further background signals are ignored.
        assert!(state.background().is_none());
        assert_eq!(state.distraction_count, 1);
    }

    #[test]
    fn distractions_accumulate_across_resumed_runs() {
        let mut state = running(25);
        state.tick();
        state.background().unwrap();
        state.start().unwrap();
        state.tick();

        let exit = state.background().unwrap();
        assert_eq!(exit.distractions, 2);
        assert_eq!(exit.focused_seconds(), 2);
    }

    #[test]
    fn reset_returns_to_baseline_from_any_state() {
        let mut state = running(30);
        for _ in 0..10 {
            state.tick();
        }
        state.background();
        state.save_guard = true;

        state.reset();
        assert_eq!(state.status, TimerStatus::Idle);
        assert_eq!(state.seconds_left, 30 * 60);
        assert_eq!(state.distraction_count, 0);
        assert!(!state.save_guard);

        let mut state = running(30);
        state.reset();
        assert!(!state.is_running());
        assert_eq!(state.seconds_left, 30 * 60);
    }

    #[test]
    fn duration_edits_rebaseline_and_lock_while_running() {
        let mut state = TimerRunState::default();
        assert_eq!(state.step_minutes(5).unwrap(), 30);
        assert_eq!(state.seconds_left, 30 * 60);
        assert_eq!(state.step_minutes(-100).unwrap(), 5);
        assert_eq!(state.step_minutes(100).unwrap(), 60);
        assert_eq!(state.reset_minutes().unwrap(), DEFAULT_MINUTES);

        state.start().unwrap();
        assert!(matches!(state.step_minutes(5), Err(FocusError::Locked)));
        assert!(matches!(state.set_category(Category::Reading), Err(FocusError::Locked)));
        assert_eq!(state.configured_minutes, DEFAULT_MINUTES);
        assert_eq!(state.category, Category::Study);
    }

    #[test]
    fn start_clears_guard_and_bumps_run_id() {
        let mut state = TimerRunState::default();
        state.save_guard = true;
        let first = state.start().unwrap();
        assert!(!state.save_guard);
        assert!(matches!(state.start(), Err(FocusError::AlreadyRunning)));

        state.pause().unwrap();
        let second = state.start().unwrap();
        assert_ne!(first, second);
    }
}
