//! Reader for the chunked `.vox` voxel scene format.
//!
//! Decodes models (`SIZE`/`XYZI`), the palette (`RGBA`) and the scene graph
//! (`nTRN`/`nGRP`/`nSHP`) from an in-memory buffer. Every read is bounds
//! checked; malformed input yields a [`VoxError`] instead of a panic.

mod chunk;
mod cursor;
mod error;
mod scene;
mod transform;

pub use chunk::{
    CHUNK_HEADER_LEN, ChunkHeader, ChunkId, GroupNode, MAX_MODEL_SIZE, PALETTE_LEN, PackChunk,
    Palette, ShapeModel, ShapeNode, SizeChunk, TransformNode, VoxelRecord, XyziChunk,
};
pub use cursor::{ByteCursor, Dict};
pub use error::{ErrorKind, VoxError};
pub use scene::{
    HeaderPolicy, Instance, MIN_VOX_VERSION, ParseOptions, VOX_MAGIC, VoxModel, VoxScene,
    parse_scene,
};
pub use transform::{
    DEFAULT_MAX_DICT_VALUE_LEN, PackedRotation, ROTATION_KEY, TRANSLATION_KEY,
    decode_frame_transform, decode_rotation, decode_translation,
};
