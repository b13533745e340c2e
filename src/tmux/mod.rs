mod manager;
mod session;

use std::path::Path;

use async_trait::async_trait;

use crate::error::Result;

pub use manager::TmuxManager;
pub use session::{carry_forward, Session, Window};

/// Operations the picker needs from the terminal multiplexer.
#[async_trait]
pub trait Multiplexer: Send + Sync {
    /// List sessions, most recently active first, leaving out `exclude`.
    async fn list_sessions(&self, exclude: Option<&str>) -> Result<Vec<Session>>;

    async fn list_windows(&self, session: &str) -> Result<Vec<Window>>;

    /// Switch the attached client to `target` (`name` or `name:index`).
    async fn switch_client(&self, target: &str) -> Result<()>;

    async fn kill_session(&self, name: &str) -> Result<()>;

    async fn kill_window(&self, session: &str, index: u32) -> Result<()>;

    async fn create_session(&self, name: &str, working_dir: &Path) -> Result<()>;
}
