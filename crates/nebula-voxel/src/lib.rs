//! Dense voxel grids and brick occupancy structures built from `.vox` models.

pub mod brick;
mod error;
pub mod raw;

pub use brick::{
    VOXEL_BRICK_SIZE, VOXELS_PER_BRICK, VoxelBrickAS, VoxelOccupancyBrick, build_brick_as,
    round_up_to_multiple,
};
pub use error::VoxelError;
pub use raw::{MAX_GRID_VOXELS, RawVoxelModel, build_raw_voxel_model};
