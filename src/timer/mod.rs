pub mod controller;
pub mod recorder;
pub mod state;

pub use controller::{TimerController, TimerEvent, TimerSnapshot};
pub use recorder::{RecordOutcome, SessionRecorder, SkipReason};
pub use state::{TimerRunState, TimerStatus, DEFAULT_MINUTES};
