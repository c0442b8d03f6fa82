//! Brick occupancy structure for ray traversal.
//!
//! A grid is split into 4×4×4 bricks. Each brick is one `u64`, one bit per
//! voxel.
//!
//! | Index | Formula |
//! |-------|---------|
//! | Brick | `bx + by * W + bz * W * H` (W, H in bricks) |
//! | Bit | `lx + ly * 4 + lz * 16` (local coordinates 0..4) |
//!
//! The brick buffer is uploaded as-is; [`VoxelBrickAS::as_bytes`] exposes it
//! without copying.

use glam::UVec3;

use crate::raw::RawVoxelModel;

/// Edge length of a brick in voxels.
pub const VOXEL_BRICK_SIZE: u32 = 4;

/// Voxels (and bits) per brick.
pub const VOXELS_PER_BRICK: u32 = VOXEL_BRICK_SIZE * VOXEL_BRICK_SIZE * VOXEL_BRICK_SIZE;

/// Occupancy mask of one brick.
pub type VoxelOccupancyBrick = u64;

/// Smallest multiple of `multiple` that is `>= value`, or `None` if that
/// does not fit in a `u32`.
pub fn round_up_to_multiple(value: u32, multiple: u32) -> Option<u32> {
    value.div_ceil(multiple).checked_mul(multiple)
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VoxelBrickAS {
    pub size_in_bricks: UVec3,
    pub bricks: Vec<VoxelOccupancyBrick>,
}

impl VoxelBrickAS {
    /// All-empty structure of the given brick dimensions.
    pub fn empty(size_in_bricks: UVec3) -> Self {
        let count = size_in_bricks.x as usize * size_in_bricks.y as usize * size_in_bricks.z as usize;
        Self {
            size_in_bricks,
            bricks: vec![0; count],
        }
    }

    pub fn size_in_voxels(&self) -> UVec3 {
        self.size_in_bricks * VOXEL_BRICK_SIZE
    }

    pub fn brick_index(&self, brick: UVec3) -> usize {
        let (w, h) = (
            self.size_in_bricks.x as usize,
            self.size_in_bricks.y as usize,
        );
        brick.x as usize + brick.y as usize * w + brick.z as usize * w * h
    }

    /// Bit position of a voxel inside its brick.
    pub fn local_bit(local: UVec3) -> u32 {
        local.x + local.y * VOXEL_BRICK_SIZE + local.z * VOXEL_BRICK_SIZE * VOXEL_BRICK_SIZE
    }

    /// Whether the voxel at `pos` is set. Positions outside the grid are empty.
    pub fn is_occupied(&self, pos: UVec3) -> bool {
        if !pos.cmplt(self.size_in_voxels()).all() {
            return false;
        }
        let brick = self.bricks[self.brick_index(pos / VOXEL_BRICK_SIZE)];
        brick & (1u64 << Self::local_bit(pos % VOXEL_BRICK_SIZE)) != 0
    }

    pub fn occupied_voxels(&self) -> usize {
        self.bricks.iter().map(|b| b.count_ones() as usize).sum()
    }

    pub fn non_empty_bricks(&self) -> usize {
        self.bricks.iter().filter(|&&b| b != 0).count()
    }

    /// Brick buffer as bytes in native endianness.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.bricks)
    }
}

/// Packs a dense grid into bricks.
pub fn build_brick_as(model: &RawVoxelModel) -> VoxelBrickAS {
    let size = model.size();
    debug_assert!(
        (size % VOXEL_BRICK_SIZE).cmpeq(UVec3::ZERO).all(),
        "grid {size} is not brick aligned"
    );
    let mut out = VoxelBrickAS::empty(size / VOXEL_BRICK_SIZE);

    let voxels = model.voxels();
    let mut i = 0;
    for z in 0..size.z {
        for y in 0..size.y {
            for x in 0..size.x {
                if voxels[i] != 0 {
                    let pos = UVec3::new(x, y, z);
                    let index = out.brick_index(pos / VOXEL_BRICK_SIZE);
                    out.bricks[index] |= 1u64 << VoxelBrickAS::local_bit(pos % VOXEL_BRICK_SIZE);
                }
                i += 1;
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use nebula_vox::{SizeChunk, VoxModel, VoxelRecord};

    use super::*;
    use crate::raw::build_raw_voxel_model;

    fn grid_with(size: UVec3, occupied: &[UVec3]) -> RawVoxelModel {
        let mut raw = RawVoxelModel::new(size).unwrap();
        for &pos in occupied {
            raw.set(pos);
        }
        raw
    }

    #[test]
    fn test_round_up_to_multiple() {
        assert_eq!(round_up_to_multiple(0, 4), Some(0));
        assert_eq!(round_up_to_multiple(1, 4), Some(4));
        assert_eq!(round_up_to_multiple(4, 4), Some(4));
        assert_eq!(round_up_to_multiple(5, 4), Some(8));
        assert_eq!(round_up_to_multiple(126, 4), Some(128));
        assert_eq!(round_up_to_multiple(u32::MAX, 4), None);
    }

    #[test]
    fn test_empty_grid_has_zero_bricks() {
        let bricks = build_brick_as(&RawVoxelModel::new(UVec3::new(8, 4, 4)).unwrap());
        assert_eq!(bricks.size_in_bricks, UVec3::new(2, 1, 1));
        assert_eq!(bricks.bricks, vec![0, 0]);
        assert_eq!(bricks.occupied_voxels(), 0);
    }

    #[test]
    fn test_source_origin_sets_bit_48() {
        // Source (0,0,0) in a 4³ model maps to engine (0,0,3).
        let model = VoxModel {
            size: SizeChunk { x: 4, y: 4, z: 4 },
            voxels: vec![VoxelRecord {
                x: 0,
                y: 0,
                z: 0,
                color_index: 1,
            }],
        };
        let raw = build_raw_voxel_model(&model, UVec3::ONE).unwrap();
        let bricks = build_brick_as(&raw);
        assert_eq!(bricks.bricks, vec![1u64 << 48]);
    }

    #[test]
    fn test_local_bit_layout() {
        let bricks = build_brick_as(&grid_with(UVec3::splat(4), &[UVec3::new(1, 2, 3)]));
        assert_eq!(bricks.bricks, vec![1u64 << 57]);
        assert_eq!(VoxelBrickAS::local_bit(UVec3::new(3, 3, 3)), 63);
    }

    #[test]
    fn test_brick_index_order() {
        let size = UVec3::splat(8);
        let cases = [
            (UVec3::new(4, 0, 0), 1),
            (UVec3::new(0, 4, 0), 2),
            (UVec3::new(0, 0, 4), 4),
            (UVec3::new(7, 7, 7), 7),
        ];
        for (pos, expected) in cases {
            let bricks = build_brick_as(&grid_with(size, &[pos]));
            assert_eq!(bricks.non_empty_bricks(), 1);
            assert_ne!(bricks.bricks[expected], 0, "{pos} should be in brick {expected}");
        }
    }

    #[test]
    fn test_brick_count_covers_volume() {
        for size in [UVec3::new(3, 9, 1), UVec3::new(16, 4, 12), UVec3::new(5, 5, 5)] {
            let raw = RawVoxelModel::new(size).unwrap();
            let bricks = build_brick_as(&raw);
            let s = bricks.size_in_bricks;
            assert_eq!(bricks.bricks.len(), (s.x * s.y * s.z) as usize);
            assert!(
                bricks.bricks.len() * VOXELS_PER_BRICK as usize >= raw.voxels().len(),
                "{size}"
            );
        }
    }

    #[test]
    fn test_occupancy_matches_raw_grid() {
        let occupied = [
            UVec3::new(0, 0, 0),
            UVec3::new(5, 1, 2),
            UVec3::new(11, 7, 3),
            UVec3::new(3, 4, 7),
        ];
        let raw = grid_with(UVec3::new(12, 8, 8), &occupied);
        let bricks = build_brick_as(&raw);
        assert_eq!(bricks.occupied_voxels(), occupied.len());
        for z in 0..8 {
            for y in 0..8 {
                for x in 0..12 {
                    let pos = UVec3::new(x, y, z);
                    assert_eq!(bricks.is_occupied(pos), raw.get(pos), "{pos}");
                }
            }
        }
        assert!(!bricks.is_occupied(UVec3::new(12, 0, 0)));
    }

    #[test]
    fn test_as_bytes_length() {
        let bricks = build_brick_as(&grid_with(UVec3::new(8, 8, 4), &[UVec3::ZERO]));
        assert_eq!(bricks.as_bytes().len(), bricks.bricks.len() * 8);
        assert_eq!(bricks.as_bytes()[..8], 1u64.to_ne_bytes());
    }
}
