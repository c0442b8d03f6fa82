//! Command-line argument parsing for the `.vox` inspector.

use std::path::PathBuf;

use clap::Parser;

use crate::Config;

/// `nebula-voxtool` command-line arguments.
///
/// CLI values override settings loaded from `config.ron`.
#[derive(Parser, Debug, Default)]
#[command(name = "nebula-voxtool", about = "Inspect MagicaVoxel .vox files")]
pub struct CliArgs {
    /// `.vox` files to load.
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Tile every model X,Y,Z times (engine axes).
    #[arg(long, value_name = "X,Y,Z", value_parser = parse_repeat)]
    pub repeat: Option<[u32; 3]>,

    /// Accept files with a bad magic number or an old version.
    #[arg(long)]
    pub lenient_header: bool,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Path to config directory (overrides default location).
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Print brick statistics for every model.
    #[arg(long)]
    pub bricks: bool,
}

/// Parses `"X,Y,Z"` into three positive tile counts.
pub fn parse_repeat(value: &str) -> Result<[u32; 3], String> {
    let parts: Vec<&str> = value.split(',').map(str::trim).collect();
    let [x, y, z] = parts.as_slice() else {
        return Err(format!("expected X,Y,Z, got {value:?}"));
    };
    let mut out = [0u32; 3];
    for (slot, part) in out.iter_mut().zip([x, y, z]) {
        *slot = part
            .parse()
            .map_err(|err| format!("invalid repeat count {part:?}: {err}"))?;
        if *slot == 0 {
            return Err("repeat counts must be at least 1".to_string());
        }
    }
    Ok(out)
}

impl Config {
    /// Apply CLI overrides to a loaded config.
    pub fn apply_cli_overrides(&mut self, args: &CliArgs) {
        if let Some(repeat) = args.repeat {
            self.loader.repeat = repeat;
        }
        if args.lenient_header {
            self.loader.strict_header = false;
        }
        if let Some(ref level) = args.log_level {
            self.debug.log_level = level.clone();
        }
    }
}
