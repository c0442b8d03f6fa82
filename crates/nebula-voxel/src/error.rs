//! Grid construction errors.

/// Errors that can occur while building voxel grids.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VoxelError {
    /// The requested grid does not fit the addressable or allowed size.
    #[error("voxel grid of {}x{}x{} exceeds the limit of {max} voxels", dims[0], dims[1], dims[2])]
    GridTooLarge {
        /// Requested dimensions before padding.
        dims: [u64; 3],
        /// Largest accepted voxel count.
        max: u64,
    },
}
