use chrono::Utc;
use log::{debug, info, warn};

use super::state::{RecordableExit, TimerRunState};
use crate::{
    error::FocusResult,
    models::{ExitKind, SessionRecord, SessionSummary},
    store::SessionLog,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The run already produced its record.
    AlreadySaved,
    /// Nothing was counted down.
    Empty,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordOutcome {
    Recorded(SessionSummary),
    Skipped(SkipReason),
}

/// A record whose guard has been claimed but which is not written yet.
#[derive(Debug, Clone)]
pub struct PendingRecord {
    pub record: SessionRecord,
    pub exit: ExitKind,
}

/// Turns recordable exits into session log entries, at most once per run.
#[derive(Clone)]
pub struct SessionRecorder {
    log: SessionLog,
}

impl SessionRecorder {
    pub fn new(log: SessionLog) -> Self {
        Self { log }
    }

    pub fn log(&self) -> &SessionLog {
        &self.log
    }

    /// Synchronous half of recording, run while the caller holds the state.
    ///
    /// Sets the guard before any I/O is issued so a second exit racing the
    /// write cannot pass the check.
    pub fn claim(
        state: &mut TimerRunState,
        exit: &RecordableExit,
    ) -> Result<PendingRecord, SkipReason> {
        if state.save_guard {
            debug!("run {} already recorded; ignoring {:?}", exit.run_id, exit.kind);
            return Err(SkipReason::AlreadySaved);
        }

        let focused_seconds = exit.focused_seconds();
        if focused_seconds == 0 {
            debug!("run {} ended with nothing focused; not recording", exit.run_id);
            return Err(SkipReason::Empty);
        }

        state.save_guard = true;

        Ok(PendingRecord {
            record: SessionRecord::new(
                Utc::now(),
                focused_seconds,
                exit.distractions,
                exit.category.as_str(),
            ),
            exit: exit.kind,
        })
    }

    /// Asynchronous half: append to the log. The guard stays set on failure;
    /// the record is dropped.
    pub async fn commit(&self, pending: PendingRecord) -> FocusResult<SessionSummary> {
        let summary = SessionSummary::from_record(&pending.record, pending.exit);

        match self.log.append(pending.record).await {
            Ok(count) => {
                info!("Recorded session ({summary}); log now holds {count} entries");
                Ok(summary)
            }
            Err(err) => {
                warn!("Dropping session ({summary}): {err}");
                Err(err)
            }
        }
    }

    /// Claim and commit in one call for callers that own the state outright.
    pub async fn record(
        &self,
        state: &mut TimerRunState,
        exit: &RecordableExit,
    ) -> FocusResult<RecordOutcome> {
        match Self::claim(state, exit) {
            Ok(pending) => self.commit(pending).await.map(RecordOutcome::Recorded),
            Err(reason) => Ok(RecordOutcome::Skipped(reason)),
        }
    }
}
