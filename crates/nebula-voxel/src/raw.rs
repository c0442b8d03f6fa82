//! Dense occupancy grids in engine axis convention.
//!
//! `.vox` models are Z-up; the engine is Y-up. Converting a model swaps the
//! source Y and Z axes and mirrors the source Y axis:
//!
//! | Engine | Source |
//! |--------|--------|
//! | x | x |
//! | y | z |
//! | z | size_y - 1 - y |
//!
//! Grid dimensions are padded up to whole bricks; padding is always empty.

use glam::UVec3;
use nebula_vox::VoxModel;
use tracing::warn;

use crate::brick::{VOXEL_BRICK_SIZE, round_up_to_multiple};
use crate::error::VoxelError;

/// Largest grid, in voxels, that [`RawVoxelModel::new`] will allocate.
pub const MAX_GRID_VOXELS: u64 = 1 << 30;

/// One byte per voxel, 1 = occupied, x-fastest.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawVoxelModel {
    size: UVec3,
    voxels: Vec<u8>,
}

impl RawVoxelModel {
    /// Creates an empty grid. Each axis is rounded up to a multiple of
    /// [`VOXEL_BRICK_SIZE`].
    pub fn new(size: UVec3) -> Result<Self, VoxelError> {
        Self::with_dims(size.to_array().map(u64::from))
    }

    fn with_dims(dims: [u64; 3]) -> Result<Self, VoxelError> {
        let too_large = || VoxelError::GridTooLarge {
            dims,
            max: MAX_GRID_VOXELS,
        };

        let mut padded = [0u32; 3];
        for (out, &dim) in padded.iter_mut().zip(&dims) {
            *out = u32::try_from(dim)
                .ok()
                .and_then(|dim| round_up_to_multiple(dim, VOXEL_BRICK_SIZE))
                .ok_or_else(too_large)?;
        }
        let volume = padded
            .iter()
            .try_fold(1u64, |acc, &dim| acc.checked_mul(u64::from(dim)))
            .filter(|&volume| volume <= MAX_GRID_VOXELS)
            .ok_or_else(too_large)?;

        Ok(Self {
            size: UVec3::from_array(padded),
            voxels: vec![0; volume as usize],
        })
    }

    /// Brick-aligned dimensions.
    pub fn size(&self) -> UVec3 {
        self.size
    }

    pub fn voxels(&self) -> &[u8] {
        &self.voxels
    }

    /// Linear index of `pos`, x fastest then y then z.
    pub fn index_of(&self, pos: UVec3) -> usize {
        debug_assert!(pos.cmplt(self.size).all(), "{pos} outside {}", self.size);
        let (w, h) = (self.size.x as usize, self.size.y as usize);
        pos.x as usize + pos.y as usize * w + pos.z as usize * w * h
    }

    pub fn get(&self, pos: UVec3) -> bool {
        self.voxels[self.index_of(pos)] != 0
    }

    /// Marks `pos` occupied.
    pub fn set(&mut self, pos: UVec3) {
        let index = self.index_of(pos);
        self.voxels[index] = 1;
    }

    pub fn occupied_count(&self) -> usize {
        self.voxels.iter().filter(|&&v| v != 0).count()
    }
}

/// Converts a parsed model into a dense grid, tiled `repeat` times per
/// engine axis.
///
/// Records with colour index 0 are empty. Records outside the model's `SIZE`
/// are dropped with a warning. Fails if the tiled grid exceeds
/// [`MAX_GRID_VOXELS`].
pub fn build_raw_voxel_model(model: &VoxModel, repeat: UVec3) -> Result<RawVoxelModel, VoxelError> {
    let source = model.size;
    let tile = UVec3::new(source.x, source.z, source.y);
    let dims = [
        u64::from(tile.x) * u64::from(repeat.x),
        u64::from(tile.y) * u64::from(repeat.y),
        u64::from(tile.z) * u64::from(repeat.z),
    ];
    let mut raw = RawVoxelModel::with_dims(dims)?;

    let mut out_of_bounds = 0usize;
    for voxel in model.voxels.iter().filter(|v| v.color_index != 0) {
        if !source.contains(voxel) {
            out_of_bounds += 1;
            continue;
        }
        let base = UVec3::new(
            u32::from(voxel.x),
            u32::from(voxel.z),
            source.y - 1 - u32::from(voxel.y),
        );
        for rz in 0..repeat.z {
            for ry in 0..repeat.y {
                for rx in 0..repeat.x {
                    raw.set(base + tile * UVec3::new(rx, ry, rz));
                }
            }
        }
    }

    if out_of_bounds > 0 {
        warn!(
            out_of_bounds,
            size = ?(source.x, source.y, source.z),
            "dropped voxel records outside model bounds"
        );
    }
    Ok(raw)
}

#[cfg(test)]
mod tests {
    use nebula_vox::{SizeChunk, VoxelRecord};

    use super::*;

    fn model(size: [u32; 3], voxels: &[[u8; 4]]) -> VoxModel {
        VoxModel {
            size: SizeChunk {
                x: size[0],
                y: size[1],
                z: size[2],
            },
            voxels: voxels
                .iter()
                .map(|&[x, y, z, color_index]| VoxelRecord {
                    x,
                    y,
                    z,
                    color_index,
                })
                .collect(),
        }
    }

    #[test]
    fn test_new_pads_to_bricks() {
        let raw = RawVoxelModel::new(UVec3::new(3, 4, 9)).unwrap();
        assert_eq!(raw.size(), UVec3::new(4, 4, 12));
        assert_eq!(raw.voxels().len(), 4 * 4 * 12);
        assert_eq!(raw.occupied_count(), 0);
    }

    #[test]
    fn test_axis_remap_and_mirror() {
        // Source is 2 wide, 3 deep, 5 tall.
        let m = model([2, 3, 5], &[[1, 0, 4, 7]]);
        let raw = build_raw_voxel_model(&m, UVec3::ONE).unwrap();
        // Engine dims (x, z, y) = (2, 5, 3), padded.
        assert_eq!(raw.size(), UVec3::new(4, 8, 4));
        assert_eq!(raw.occupied_count(), 1);
        assert!(raw.get(UVec3::new(1, 4, 2)));
    }

    #[test]
    fn test_origin_voxel_lands_on_far_z() {
        let m = model([4, 4, 4], &[[0, 0, 0, 1]]);
        let raw = build_raw_voxel_model(&m, UVec3::ONE).unwrap();
        assert!(raw.get(UVec3::new(0, 0, 3)));
        assert_eq!(raw.occupied_count(), 1);
    }

    #[test]
    fn test_empty_color_index_ignored() {
        let m = model([2, 2, 2], &[[0, 0, 0, 0], [1, 1, 1, 0]]);
        let raw = build_raw_voxel_model(&m, UVec3::ONE).unwrap();
        assert_eq!(raw.occupied_count(), 0);
    }

    #[test]
    fn test_out_of_bounds_records_dropped() {
        let m = model([2, 2, 2], &[[5, 0, 0, 1], [1, 1, 1, 1]]);
        let raw = build_raw_voxel_model(&m, UVec3::ONE).unwrap();
        assert_eq!(raw.occupied_count(), 1);
    }

    #[test]
    fn test_repeat_fills_every_tile() {
        let m = model([1, 1, 1], &[[0, 0, 0, 1]]);
        let raw = build_raw_voxel_model(&m, UVec3::new(2, 3, 4)).unwrap();
        assert_eq!(raw.size(), UVec3::new(4, 4, 4));
        assert_eq!(raw.occupied_count(), 2 * 3 * 4);
        for z in 0..4 {
            for y in 0..4 {
                for x in 0..4 {
                    let expected = x < 2 && y < 3 && z < 4;
                    assert_eq!(raw.get(UVec3::new(x, y, z)), expected, "({x},{y},{z})");
                }
            }
        }
    }

    #[test]
    fn test_repeat_offsets_by_tile_size() {
        let m = model([2, 3, 5], &[[1, 0, 4, 7]]);
        let raw = build_raw_voxel_model(&m, UVec3::new(1, 2, 1)).unwrap();
        // Engine tile is (2, 5, 3); the second copy is 5 further along y.
        assert_eq!(raw.size(), UVec3::new(4, 12, 4));
        assert!(raw.get(UVec3::new(1, 4, 2)));
        assert!(raw.get(UVec3::new(1, 9, 2)));
        assert_eq!(raw.occupied_count(), 2);
    }

    #[test]
    fn test_oversized_grid_is_rejected() {
        let m = model([256, 256, 256], &[[0, 0, 0, 1]]);
        let result = build_raw_voxel_model(&m, UVec3::new(u32::MAX, 1, 1));
        assert!(
            matches!(result, Err(VoxelError::GridTooLarge { .. })),
            "expected GridTooLarge, got {result:?}"
        );

        // Fits every axis but not the voxel budget.
        let result = build_raw_voxel_model(&m, UVec3::splat(8));
        assert!(
            matches!(result, Err(VoxelError::GridTooLarge { dims: [2048, 2048, 2048], .. })),
            "expected GridTooLarge, got {result:?}"
        );
    }

    #[test]
    fn test_unpadded_axis_overflow_is_rejected() {
        let result = RawVoxelModel::new(UVec3::new(u32::MAX, 1, 1));
        assert!(
            matches!(result, Err(VoxelError::GridTooLarge { .. })),
            "expected GridTooLarge, got {result:?}"
        );
    }

    #[test]
    fn test_zero_repeat_is_empty() {
        let m = model([4, 4, 4], &[[0, 0, 0, 1]]);
        let raw = build_raw_voxel_model(&m, UVec3::new(1, 0, 1)).unwrap();
        assert_eq!(raw.voxels().len(), 0);
    }
}
