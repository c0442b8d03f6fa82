//! `nebula-voxtool`: loads `.vox` files and prints what they contain.
//!
//! Configuration is loaded from `config.ron` and can be overridden via CLI
//! flags.

mod report;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use nebula_assets::VoxelModelLibrary;
use nebula_config::{CliArgs, Config, default_config_dir};
use tracing::{error, info};

fn main() -> ExitCode {
    let args = CliArgs::parse();

    let config_dir = args
        .config
        .clone()
        .or_else(default_config_dir)
        .unwrap_or_else(|| PathBuf::from("."));

    let mut config = Config::load_or_create(&config_dir).unwrap_or_else(|e| {
        eprintln!("Failed to load config: {e}, using defaults");
        Config::default()
    });
    config.apply_cli_overrides(&args);

    let log_dir = dirs::cache_dir()
        .map(|dir| dir.join("nebula-voxtool").join("logs"))
        .unwrap_or_else(|| config_dir.join("logs"));
    nebula_log::init_logging(Some(&log_dir), cfg!(debug_assertions), Some(&config));

    if let Err(e) = config.validate() {
        error!("{e}");
        return ExitCode::FAILURE;
    }

    let repeat = config.loader.repeat();
    let options = config.loader.parse_options();
    info!(
        files = args.files.len(),
        repeat = ?repeat.to_array(),
        header_policy = ?options.header_policy,
        "loading vox files"
    );

    let mut library = VoxelModelLibrary::new();
    let mut failures = 0usize;
    for path in &args.files {
        match library.load_file(path, repeat, &options) {
            Ok(_) => {
                let name = path.display().to_string();
                println!("{}", report::file_summary(&library, &name, args.bricks));
            }
            Err(e) => {
                error!(path = %path.display(), kind = ?e.kind(), "{e}");
                failures += 1;
            }
        }
    }

    info!(
        models = library.model_count(),
        instances = library.instance_count(),
        failures,
        "done"
    );
    if failures > 0 {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
