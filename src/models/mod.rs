pub mod category;
pub mod session;

pub use category::{normalize_category, Category, FALLBACK_CATEGORY};
pub use session::{ExitKind, SessionRecord, SessionSummary};
