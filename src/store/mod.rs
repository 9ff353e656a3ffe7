//! Key-value persistence and the session log built on top of it.

mod memory;
mod session_log;

use anyhow::Result;
use async_trait::async_trait;

pub use memory::MemoryStore;
pub use session_log::{SessionLog, SESSIONS_KEY};

/// String key-value storage the session log is persisted in.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;

    async fn set(&self, key: &str, value: String) -> Result<()>;

    async fn remove(&self, key: &str) -> Result<()>;
}
