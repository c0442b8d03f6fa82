//! One-shot `.vox` loading: bytes in, brick structures and instances out.

use std::path::Path;

use glam::UVec3;
use nebula_vox::{Instance, Palette, ParseOptions, parse_scene};
use nebula_voxel::{VoxelBrickAS, build_brick_as, build_raw_voxel_model};
use tracing::{debug, info};

use crate::error::AssetError;

/// A fully converted `.vox` file.
#[derive(Clone, Debug, PartialEq)]
pub struct VoxAsset {
    /// One brick structure per model, in file order.
    pub models: Vec<VoxelBrickAS>,
    /// Instance `model_id`s index into `models`.
    pub instances: Vec<Instance>,
    pub palette: Palette,
}

/// Parses `bytes` and converts every model, tiling each `repeat` times.
pub fn load_vox_bytes(
    bytes: &[u8],
    repeat: UVec3,
    options: &ParseOptions,
) -> Result<VoxAsset, AssetError> {
    let scene = parse_scene(bytes, options)?;

    let models = scene
        .models
        .iter()
        .map(|model| build_raw_voxel_model(model, repeat).map(|raw| build_brick_as(&raw)))
        .collect::<Result<Vec<VoxelBrickAS>, _>>()?;

    debug!(
        version = scene.version,
        models = models.len(),
        instances = scene.instances.len(),
        "converted vox scene"
    );

    Ok(VoxAsset {
        models,
        instances: scene.instances,
        palette: scene.palette,
    })
}

/// Reads the whole file at `path` and loads it with [`load_vox_bytes`].
pub fn load_vox_file(
    path: impl AsRef<Path>,
    repeat: UVec3,
    options: &ParseOptions,
) -> Result<VoxAsset, AssetError> {
    let path = path.as_ref();
    let bytes = std::fs::read(path).map_err(|source| AssetError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    info!(path = %path.display(), bytes = bytes.len(), "loading vox file");
    load_vox_bytes(&bytes, repeat, options)
}
