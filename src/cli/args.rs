use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "tsm")]
#[command(version, about = "Interactive tmux session and window picker", long_about = None)]
pub struct Args {
    /// Also list the session this client is attached to
    #[arg(long, global = true)]
    pub include_current: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Write a default config file to ~/.config/tsm/config.toml
    Init,

    /// List sessions, most recently used first
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show version
    Version,
}
