//! Asset loading errors.

use std::path::PathBuf;

use nebula_vox::{ErrorKind, VoxError};
use nebula_voxel::VoxelError;

/// Errors that can occur while loading a `.vox` asset.
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    /// The file could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The bytes are not a valid `.vox` scene.
    #[error("failed to parse vox data: {0}")]
    Vox(#[from] VoxError),

    /// A model is too large to convert with the requested repeat.
    #[error("failed to build voxel grid: {0}")]
    Voxel(#[from] VoxelError),
}

impl AssetError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Io { .. } => ErrorKind::Io,
            Self::Vox(err) => err.kind(),
            Self::Voxel(_) => ErrorKind::OutOfBounds,
        }
    }
}
