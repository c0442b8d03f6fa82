//! Configuration for the `.vox` tooling.
//!
//! Settings persist to disk as `config.ron` and can be overridden from the
//! command line via clap. Unknown or missing fields fall back to defaults so
//! old config files keep loading.

mod cli;
mod config;
mod error;

pub use cli::{CliArgs, parse_repeat};
pub use config::{CONFIG_FILE_NAME, Config, DebugConfig, LoaderConfig, default_config_dir};
pub use error::ConfigError;
