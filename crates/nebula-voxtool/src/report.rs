//! Human-readable summaries of loaded files.

use std::fmt::Write;

use nebula_assets::VoxelModelLibrary;
use nebula_voxel::{VOXELS_PER_BRICK, VoxelBrickAS};

/// One line per file plus, with `bricks`, one line per model.
pub fn file_summary(library: &VoxelModelLibrary, name: &str, bricks: bool) -> String {
    let models = library.file_models(name).unwrap_or_default();
    let instances = library.file_instances(name).unwrap_or_default();
    let hidden = instances.iter().filter(|i| i.hidden).count();

    let mut out = format!(
        "{name}: {} model(s), {} instance(s)",
        models.len(),
        instances.len()
    );
    if hidden > 0 {
        let _ = write!(out, " ({hidden} hidden)");
    }
    if bricks {
        for model in models {
            let _ = write!(out, "\n  {}: {}", model.key, brick_stats(&model.bricks));
        }
    }
    out
}

fn brick_stats(bricks: &VoxelBrickAS) -> String {
    let size = bricks.size_in_bricks;
    let total = bricks.bricks.len();
    let voxels = bricks.occupied_voxels();
    let fill = if total == 0 {
        0.0
    } else {
        voxels as f64 * 100.0 / (total as f64 * f64::from(VOXELS_PER_BRICK))
    };
    format!(
        "{}x{}x{} bricks, {}/{} non-empty, {} voxels ({fill:.1}% full)",
        size.x,
        size.y,
        size.z,
        bricks.non_empty_bricks(),
        total,
        voxels
    )
}
