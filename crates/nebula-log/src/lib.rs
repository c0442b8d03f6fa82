//! Structured logging for the `.vox` tooling.
//!
//! Console output is human readable with uptime stamps. When enabled, a
//! second layer writes JSON lines to a file for later inspection. The level
//! comes from `RUST_LOG` if set, otherwise from the config.

use std::fs::File;
use std::path::Path;

use nebula_config::Config;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Name of the JSON log file inside the log directory.
pub const LOG_FILE_NAME: &str = "nebula-voxtool.log";

const DEFAULT_FILTER: &str = "info";

/// Filter directive derived from `config`, falling back to `info`.
pub fn filter_directive(config: Option<&Config>) -> String {
    match config {
        Some(config) if !config.debug.log_level.trim().is_empty() => {
            config.debug.log_level.trim().to_string()
        }
        _ => DEFAULT_FILTER.to_string(),
    }
}

/// Creates `log_dir` if needed and truncates the log file inside it.
fn open_log_file(log_dir: &Path) -> Option<File> {
    std::fs::create_dir_all(log_dir).ok()?;
    File::create(log_dir.join(LOG_FILE_NAME)).ok()
}

/// Install the global tracing subscriber.
///
/// File logging is on in debug builds, or whenever `debug.log_to_file` is
/// set, provided `log_dir` is given and writable.
///
/// ```no_run
/// use nebula_config::Config;
/// use nebula_log::init_logging;
///
/// let config = Config::default();
/// init_logging(Some(std::path::Path::new("./logs")), true, Some(&config));
/// ```
pub fn init_logging(log_dir: Option<&Path>, debug_build: bool, config: Option<&Config>) {
    let filter = filter_directive(config);
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&filter));

    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true)
        .with_timer(fmt::time::uptime());

    let subscriber = tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer);

    let want_file = debug_build || config.is_some_and(|c| c.debug.log_to_file);
    if want_file
        && let Some(log_dir) = log_dir
        && let Some(log_file) = open_log_file(log_dir)
    {
        let file_layer = fmt::layer()
            .with_writer(log_file)
            .with_ansi(false)
            .with_target(true)
            .with_timer(fmt::time::uptime())
            .json();

        subscriber.with(file_layer).init();
        return;
    }

    subscriber.init();
}

/// The filter used when neither `RUST_LOG` nor the config says otherwise.
pub fn default_env_filter() -> EnvFilter {
    EnvFilter::new(DEFAULT_FILTER)
}
