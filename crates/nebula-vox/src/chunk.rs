//! Chunk headers and typed chunk payloads.
//!
//! ## Chunk Layout
//!
//! | Offset | Size | Field |
//! |--------|------|-------|
//! | 0 | 4 | Type tag (e.g. `SIZE`, `nTRN`) |
//! | 4 | 4 | Content length (`i32`) |
//! | 8 | 4 | Children length (`i32`) |
//! | 12 | N | Content |
//! | 12+N | M | Children |
//!
//! Payload readers operate on a cursor that covers exactly the chunk's
//! declared content, so trailing bytes the reader does not understand (extra
//! animation frames, fields added by newer writers) are skipped for free.

use std::fmt;

use crate::cursor::{ByteCursor, Dict};
use crate::error::VoxError;

/// Size of a chunk header in bytes.
pub const CHUNK_HEADER_LEN: usize = 12;

/// Chunk type, parsed from its 4-byte tag.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ChunkId {
    Main,
    Pack,
    Size,
    Xyzi,
    Rgba,
    /// `nTRN`: transform node.
    Transform,
    /// `nGRP`: group node.
    Group,
    /// `nSHP`: shape node.
    Shape,
    /// Any chunk this reader does not interpret (`MATL`, `LAYR`, `rOBJ`, ...).
    Opaque([u8; 4]),
}

impl ChunkId {
    /// Classifies a raw tag.
    pub fn from_tag(tag: [u8; 4]) -> Self {
        match &tag {
            b"MAIN" => Self::Main,
            b"PACK" => Self::Pack,
            b"SIZE" => Self::Size,
            b"XYZI" => Self::Xyzi,
            b"RGBA" => Self::Rgba,
            b"nTRN" => Self::Transform,
            b"nGRP" => Self::Group,
            b"nSHP" => Self::Shape,
            _ => Self::Opaque(tag),
        }
    }

    /// Returns the raw 4-byte tag.
    pub fn tag(self) -> [u8; 4] {
        match self {
            Self::Main => *b"MAIN",
            Self::Pack => *b"PACK",
            Self::Size => *b"SIZE",
            Self::Xyzi => *b"XYZI",
            Self::Rgba => *b"RGBA",
            Self::Transform => *b"nTRN",
            Self::Group => *b"nGRP",
            Self::Shape => *b"nSHP",
            Self::Opaque(tag) => tag,
        }
    }
}

impl fmt::Display for ChunkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for b in self.tag() {
            if b.is_ascii_graphic() || b == b' ' {
                write!(f, "{}", b as char)?;
            } else {
                write!(f, "\\x{b:02x}")?;
            }
        }
        Ok(())
    }
}

/// Fixed 12-byte header preceding every chunk.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChunkHeader {
    pub id: ChunkId,
    /// Bytes of content directly owned by this chunk.
    pub content_len: usize,
    /// Bytes of nested child chunks following the content.
    pub children_len: usize,
}

impl ChunkHeader {
    /// Reads a chunk header.
    pub fn read(cursor: &mut ByteCursor<'_>) -> Result<Self, VoxError> {
        let start = cursor.position();
        let result = (|| -> Result<Self, VoxError> {
            let id = ChunkId::from_tag(cursor.read_array()?);
            let content_len = cursor.read_len()?;
            let children_len = cursor.read_len()?;
            Ok(Self {
                id,
                content_len,
                children_len,
            })
        })();
        if result.is_err() {
            cursor.rewind(cursor.position() - start);
        }
        result
    }

    /// Number of bytes following the header that belong to this chunk.
    pub fn body_len(&self) -> usize {
        self.content_len.saturating_add(self.children_len)
    }

    /// Consumes the chunk body and returns a cursor over its content only.
    pub fn read_content<'a>(
        &self,
        cursor: &mut ByteCursor<'a>,
    ) -> Result<ByteCursor<'a>, VoxError> {
        let content = cursor.split(self.content_len)?;
        cursor.skip(self.children_len)?;
        Ok(content)
    }

    /// Skips the chunk body using the declared lengths alone.
    pub fn skip(&self, cursor: &mut ByteCursor<'_>) -> Result<(), VoxError> {
        cursor.skip(self.body_len())
    }
}

/// `PACK`: number of models in the file.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PackChunk {
    pub num_models: usize,
}

impl PackChunk {
    pub fn read(cursor: &mut ByteCursor<'_>) -> Result<Self, VoxError> {
        Ok(Self {
            num_models: cursor.read_len()?,
        })
    }
}

/// Largest model extent per axis. `XYZI` coordinates are single bytes.
pub const MAX_MODEL_SIZE: u32 = 256;

/// `SIZE`: model dimensions in source axis convention (Z up).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SizeChunk {
    pub x: u32,
    pub y: u32,
    pub z: u32,
}

impl SizeChunk {
    pub fn read(cursor: &mut ByteCursor<'_>) -> Result<Self, VoxError> {
        let (x, y, z) = (cursor.read_len()?, cursor.read_len()?, cursor.read_len()?);
        let max = MAX_MODEL_SIZE as usize;
        if x > max || y > max || z > max {
            return Err(VoxError::InvalidModelSize {
                x,
                y,
                z,
                max: MAX_MODEL_SIZE,
            });
        }
        Ok(Self {
            x: x as u32,
            y: y as u32,
            z: z as u32,
        })
    }

    /// Returns `true` if the source coordinate lies inside the model.
    pub fn contains(&self, voxel: &VoxelRecord) -> bool {
        u32::from(voxel.x) < self.x && u32::from(voxel.y) < self.y && u32::from(voxel.z) < self.z
    }
}

/// One `XYZI` entry: a source-space position and a palette index.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VoxelRecord {
    pub x: u8,
    pub y: u8,
    pub z: u8,
    /// Palette index; 0 means empty.
    pub color_index: u8,
}

/// `XYZI`: the voxels of the model described by the preceding `SIZE`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct XyziChunk {
    pub voxels: Vec<VoxelRecord>,
}

impl XyziChunk {
    pub fn read(cursor: &mut ByteCursor<'_>) -> Result<Self, VoxError> {
        let count = cursor.read_len()?;
        let raw = cursor.read_bytes(count.saturating_mul(4))?;
        let voxels = raw
            .chunks_exact(4)
            .map(|v| VoxelRecord {
                x: v[0],
                y: v[1],
                z: v[2],
                color_index: v[3],
            })
            .collect();
        Ok(Self { voxels })
    }
}

/// Number of palette entries.
pub const PALETTE_LEN: usize = 256;

/// 256 packed colours, one byte each of R, G, B, A from least to most
/// significant.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Palette(pub [u32; PALETTE_LEN]);

impl Default for Palette {
    /// Opaque white in every slot, used when the file has no `RGBA` chunk.
    fn default() -> Self {
        Self([0xFFFF_FFFF; PALETTE_LEN])
    }
}

impl Palette {
    /// Reads an `RGBA` chunk payload.
    pub fn read(cursor: &mut ByteCursor<'_>) -> Result<Self, VoxError> {
        let raw = cursor.read_bytes(PALETTE_LEN * 4)?;
        let mut colors = [0u32; PALETTE_LEN];
        for (color, bytes) in colors.iter_mut().zip(raw.chunks_exact(4)) {
            *color = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
        }
        Ok(Self(colors))
    }

    /// Returns the packed colour at `index`.
    pub fn color(&self, index: u8) -> u32 {
        self.0[index as usize]
    }

    /// Returns the colour at `index` as `[r, g, b, a]`.
    pub fn rgba(&self, index: u8) -> [u8; 4] {
        self.color(index).to_le_bytes()
    }
}

/// `nTRN`: places its single child in the parent's space.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransformNode {
    pub node_id: i32,
    pub attributes: Dict,
    pub child_id: i32,
    /// Always -1 in files written so far.
    pub reserved_id: i32,
    pub layer_id: i32,
    pub frame_count: usize,
    /// Attributes of the first animation frame (`_r`, `_t`, `_f`).
    pub first_frame: Option<Dict>,
}

impl TransformNode {
    /// Reads the node and its first frame. Later frames are left unread.
    pub fn read(cursor: &mut ByteCursor<'_>) -> Result<Self, VoxError> {
        let node_id = cursor.read_i32()?;
        let attributes = cursor.read_dict()?;
        let child_id = cursor.read_i32()?;
        let reserved_id = cursor.read_i32()?;
        let layer_id = cursor.read_i32()?;
        let frame_count = cursor.read_len()?;
        let first_frame = if frame_count > 0 {
            Some(cursor.read_dict()?)
        } else {
            None
        };
        Ok(Self {
            node_id,
            attributes,
            child_id,
            reserved_id,
            layer_id,
            frame_count,
            first_frame,
        })
    }
}

/// `nGRP`: a list of child transform nodes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GroupNode {
    pub node_id: i32,
    pub attributes: Dict,
    pub child_count: usize,
}

impl GroupNode {
    pub fn read(cursor: &mut ByteCursor<'_>) -> Result<Self, VoxError> {
        let node_id = cursor.read_i32()?;
        let attributes = cursor.read_dict()?;
        let child_count = cursor.read_len()?;
        // Child ids are implied by pre-order traversal; only the count matters.
        cursor.skip(child_count.saturating_mul(4))?;
        Ok(Self {
            node_id,
            attributes,
            child_count,
        })
    }
}

/// One model reference inside a shape node.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ShapeModel {
    pub model_id: i32,
    pub attributes: Dict,
}

/// `nSHP`: the models drawn at this node.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ShapeNode {
    pub node_id: i32,
    pub attributes: Dict,
    pub models: Vec<ShapeModel>,
}

impl ShapeNode {
    pub fn read(cursor: &mut ByteCursor<'_>) -> Result<Self, VoxError> {
        let node_id = cursor.read_i32()?;
        let attributes = cursor.read_dict()?;
        let count = cursor.read_len()?;
        let mut models = Vec::with_capacity(count.min(cursor.remaining() / 8));
        for _ in 0..count {
            let model_id = cursor.read_i32()?;
            let attributes = cursor.read_dict()?;
            models.push(ShapeModel {
                model_id,
                attributes,
            });
        }
        Ok(Self {
            node_id,
            attributes,
            models,
        })
    }
}
