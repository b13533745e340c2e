//! Layout scripts applied to freshly created sessions.
//!
//! Running a layout is a detached task: the script is spawned and forgotten.
//! Nothing about its outcome ever reaches the picker.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::process::Command;

#[derive(Debug, Clone)]
pub struct LayoutRunner {
    script: Option<PathBuf>,
}

impl LayoutRunner {
    /// `layout` names a script `<layout_dir>/<layout>.sh`; `None` disables layouts.
    pub fn new(layout: Option<&str>, layout_dir: &Path) -> Self {
        let script = layout
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(|l| layout_dir.join(format!("{l}.sh")));
        Self { script }
    }

    pub fn disabled() -> Self {
        Self { script: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.script.is_some()
    }

    pub fn script(&self) -> Option<&Path> {
        self.script.as_deref()
    }

    /// Spawn the layout script for `session`. Best-effort: a missing script
    /// or a failed spawn is logged and otherwise ignored.
    pub fn apply_detached(&self, session: &str, working_dir: &Path) {
        let Some(script) = self.script.as_deref() else {
            return;
        };
        if !script.is_file() {
            tracing::debug!("Layout script not found: {}", script.display());
            return;
        }

        let spawned = Command::new("/bin/sh")
            .arg(script)
            .arg(session)
            .arg(working_dir)
            .env("TMUX_SESSION", session)
            .env("TMUX_WORKING_DIR", working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn();

        match spawned {
            Ok(_child) => tracing::info!("Applied layout {} to {}", script.display(), session),
            Err(e) => tracing::warn!("Failed to spawn layout {}: {}", script.display(), e),
        }
    }
}
