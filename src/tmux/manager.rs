use std::path::Path;

use async_trait::async_trait;
use tokio::process::Command;

use crate::error::{Error, Result};

use super::session::{Session, Window};
use super::Multiplexer;

/// Tmux manager - runs tmux subcommands against the default server
#[derive(Debug, Default)]
pub struct TmuxManager;

impl TmuxManager {
    pub fn new() -> Self {
        Self
    }

    fn tmux_cmd(&self) -> Command {
        Command::new("tmux")
    }

    /// Check if tmux is available
    pub async fn is_available() -> bool {
        Command::new("tmux")
            .arg("-V")
            .output()
            .await
            .is_ok_and(|o| o.status.success())
    }

    /// Name of the session the calling client is attached to, if any
    pub async fn current_session(&self) -> Option<String> {
        std::env::var_os("TMUX")?;

        let output = self
            .tmux_cmd()
            .args(["display-message", "-p", "#S"])
            .output()
            .await
            .ok()?;

        if !output.status.success() {
            return None;
        }

        let name = String::from_utf8_lossy(&output.stdout).trim().to_string();
        (!name.is_empty()).then_some(name)
    }

    /// Run a tmux subcommand, mapping a non-zero exit to `Error::Tmux`
    async fn run(&self, args: &[&str], what: &str) -> Result<String> {
        let output = self.tmux_cmd().args(args).output().await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::tmux(format!("Failed to {what}: {}", stderr.trim())));
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }
}

#[async_trait]
impl Multiplexer for TmuxManager {
    async fn list_sessions(&self, exclude: Option<&str>) -> Result<Vec<Session>> {
        let args = ["list-sessions", "-F", "#{session_name}\t#{session_activity}"];
        let stdout = match self.run(&args, "list sessions").await {
            Ok(stdout) => stdout,
            // No server simply means no sessions
            Err(Error::Tmux(msg)) if is_no_server(&msg) => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };

        let mut sessions: Vec<Session> = stdout
            .lines()
            .filter_map(Session::from_list_line)
            .filter(|s| exclude != Some(s.name.as_str()))
            .collect();

        sessions.sort_by(|a, b| {
            b.last_activity
                .cmp(&a.last_activity)
                .then_with(|| a.name.cmp(&b.name))
        });

        Ok(sessions)
    }

    async fn list_windows(&self, session: &str) -> Result<Vec<Window>> {
        let stdout = self
            .run(
                &[
                    "list-windows",
                    "-t",
                    session,
                    "-F",
                    "#{window_index}\t#{window_name}",
                ],
                "list windows",
            )
            .await?;

        Ok(stdout.lines().filter_map(Window::from_list_line).collect())
    }

    async fn switch_client(&self, target: &str) -> Result<()> {
        self.run(&["switch-client", "-t", target], "switch client")
            .await
            .map(|_| ())
    }

    async fn kill_session(&self, name: &str) -> Result<()> {
        self.run(&["kill-session", "-t", name], "kill session")
            .await
            .map(|_| ())
    }

    async fn kill_window(&self, session: &str, index: u32) -> Result<()> {
        let target = format!("{session}:{index}");
        self.run(&["kill-window", "-t", &target], "kill window")
            .await
            .map(|_| ())
    }

    async fn create_session(&self, name: &str, working_dir: &Path) -> Result<()> {
        let dir = working_dir.to_string_lossy();
        self.run(
            &["new-session", "-d", "-s", name, "-c", dir.as_ref()],
            "create session",
        )
        .await
        .map(|_| ())
    }
}

/// Whether tmux stderr says there is no server to talk to
fn is_no_server(stderr: &str) -> bool {
    stderr.contains("no server running") || stderr.contains("error connecting to")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_server_stderr_is_empty_listing() {
        assert!(is_no_server(
            "Failed to list sessions: no server running on /tmp/tmux-1000/default"
        ));
        assert!(is_no_server(
            "Failed to list sessions: error connecting to /tmp/tmux-1000/default (No such file or directory)"
        ));
    }

    #[test]
    fn test_other_stderr_is_an_error() {
        assert!(!is_no_server("Failed to list sessions: permission denied"));
        assert!(!is_no_server("Failed to list sessions: unknown format: #{bogus}"));
        assert!(!is_no_server(""));
    }
}
