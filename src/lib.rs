pub mod claude;
pub mod cli;
pub mod config;
pub mod error;
pub mod layout;
pub mod logging;
pub mod picker;
pub mod tmux;
pub mod ui;

pub use error::{Error, Result};

/// Version of tsm
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
