use clap::Parser;
use tmux_session_picker::cli::{run_cli, Args};

#[tokio::main]
async fn main() {
    // Logging is set up once the config (and its cache dir) is known
    let args = Args::parse();

    if let Err(e) = run_cli(args).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
