use thiserror::Error;

/// Errors surfaced by the timer and the session log.
///
/// Storage failures never abort the state machine: callers log them and
/// carry on with an empty log or a dropped record.
#[derive(Debug, Error)]
pub enum FocusError {
    #[error("failed to read session log: {0}")]
    StorageRead(String),

    #[error("failed to write session log: {0}")]
    StorageWrite(String),

    #[error("timer already running")]
    AlreadyRunning,

    #[error("timer is not running")]
    NotRunning,

    #[error("no time left on the countdown, reset first")]
    NothingLeft,

    #[error("timer settings are locked while running")]
    Locked,
}

impl FocusError {
    pub fn is_storage(&self) -> bool {
        matches!(self, FocusError::StorageRead(_) | FocusError::StorageWrite(_))
    }
}

pub type FocusResult<T> = std::result::Result<T, FocusError>;
