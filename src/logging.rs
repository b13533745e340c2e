use std::fs::{self, OpenOptions};
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::{fmt, EnvFilter};

pub const LOG_FILE: &str = "tsm.log";

/// Install the global subscriber. Output goes to `<dir>/tsm.log` since the
/// terminal belongs to the picker; if the file can't be opened, logs are
/// discarded.
pub fn init(dir: &Path) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let file = fs::create_dir_all(dir).and_then(|_| {
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(dir.join(LOG_FILE))
    });

    let builder = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(false);

    // Already initialised (e.g. in tests) is fine
    let _ = match file {
        Ok(file) => builder.with_writer(Mutex::new(file)).try_init(),
        Err(_) => builder.with_writer(std::io::sink).try_init(),
    };
}
