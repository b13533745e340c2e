use std::sync::Arc;

use chrono::Utc;

use crate::cli::{Args, Command};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::picker::format_time_ago;
use crate::tmux::{Multiplexer, TmuxManager};

pub async fn run_cli(args: Args) -> Result<()> {
    match args.command {
        Some(Command::Version) => {
            println!("tsm v{}", crate::VERSION);
            return Ok(());
        }
        Some(Command::Init) => return handle_init().await,
        _ => {}
    }

    let config = Config::load().await?;
    crate::logging::init(&config.cache_dir);

    if !TmuxManager::is_available().await {
        return Err(Error::tmux("tmux is not installed or not on PATH"));
    }

    let tmux = TmuxManager::new();
    let exclude = if args.include_current {
        None
    } else {
        tmux.current_session().await
    };
    tracing::debug!("excluding current session: {:?}", exclude);

    match args.command {
        Some(Command::List { json }) => handle_list(&tmux, exclude.as_deref(), json).await,
        _ => {
            let working_dir = std::env::current_dir()?;
            let mut app = crate::ui::App::new(&config, Arc::new(tmux), exclude, working_dir);
            app.run().await
        }
    }
}

async fn handle_init() -> Result<()> {
    let path = Config::init().await?;
    println!("✓ Wrote {}", path.display());
    Ok(())
}

async fn handle_list(tmux: &TmuxManager, exclude: Option<&str>, json: bool) -> Result<()> {
    let sessions = tmux.list_sessions(exclude).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&sessions)?);
        return Ok(());
    }

    if sessions.is_empty() {
        println!("No sessions found.");
        return Ok(());
    }

    let now = Utc::now();
    let width = sessions.iter().map(|s| s.name.len()).max().unwrap_or(0);
    for session in &sessions {
        println!(
            "{:<width$}  {}",
            session.name,
            format_time_ago(session.last_activity, now)
        );
    }
    Ok(())
}
