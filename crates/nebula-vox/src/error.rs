//! Error types for `.vox` decoding.

use crate::chunk::ChunkId;

/// Coarse classification of a [`VoxError`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// Source bytes were unavailable or empty.
    Io,
    /// The file header is not a supported `.vox` header.
    Format,
    /// A read would have run past the end of the buffer.
    OutOfBounds,
    /// The bytes are readable but violate the scene's structural rules.
    Structure,
}

/// Errors that can occur while decoding a `.vox` scene.
///
/// Every variant aborts only the parse call that produced it; no state is
/// shared between calls.
#[derive(Debug, thiserror::Error)]
pub enum VoxError {
    /// The input buffer contains no bytes.
    #[error("empty input buffer")]
    Empty,

    /// The file does not start with `"VOX "`.
    #[error("invalid magic bytes: {0:?}")]
    InvalidMagic([u8; 4]),

    /// The file version is older than the oldest supported version.
    #[error("unsupported vox version: {0}")]
    UnsupportedVersion(i32),

    /// The first chunk after the file header is not `MAIN`.
    #[error("expected MAIN chunk, found {0}")]
    MissingMainChunk(ChunkId),

    /// A read would advance past the end of the buffer.
    #[error("read of {requested} bytes at offset {offset} exceeds buffer ({available} bytes left)")]
    OutOfBounds {
        /// Absolute byte offset where the read started.
        offset: usize,
        /// Number of bytes the read needed.
        requested: usize,
        /// Number of bytes that were left.
        available: usize,
    },

    /// A length or count field is negative.
    #[error("negative length {value} at offset {offset}")]
    NegativeLength {
        /// Absolute byte offset of the length field.
        offset: usize,
        /// The decoded value.
        value: i32,
    },

    /// Scene graph node ids are not strictly sequential.
    #[error("node id out of sequence: expected {expected}, found {found}")]
    NodeIdOutOfSequence {
        /// The id the parser expected next.
        expected: i32,
        /// The id found in the file.
        found: i32,
    },

    /// A `SIZE` chunk was not immediately followed by an `XYZI` chunk.
    #[error("SIZE chunk followed by {found} instead of XYZI")]
    SizeWithoutXyzi {
        /// The chunk that followed the `SIZE` chunk.
        found: ChunkId,
    },

    /// A dictionary value could not be decoded as the expected number(s).
    #[error("invalid value for dictionary key {key:?}: {value:?}")]
    InvalidDictValue {
        /// Dictionary key.
        key: String,
        /// Offending value (possibly truncated for display).
        value: String,
    },

    /// A packed rotation byte does not describe a permutation of the axes.
    #[error("invalid packed rotation: {0:#010b}")]
    InvalidRotation(u8),

    /// A `SIZE` axis is larger than any `XYZI` coordinate can address.
    #[error("invalid model size {x}x{y}x{z}, axes are limited to {max}")]
    InvalidModelSize {
        x: usize,
        y: usize,
        z: usize,
        /// Largest accepted extent per axis.
        max: u32,
    },

    /// A shape node references a model that does not exist.
    #[error("invalid model reference: {0}")]
    InvalidModelReference(i32),
}

impl VoxError {
    /// Returns the coarse classification of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Empty => ErrorKind::Io,
            Self::InvalidMagic(_) | Self::UnsupportedVersion(_) | Self::MissingMainChunk(_) => {
                ErrorKind::Format
            }
            Self::OutOfBounds { .. } => ErrorKind::OutOfBounds,
            Self::NegativeLength { .. }
            | Self::NodeIdOutOfSequence { .. }
            | Self::SizeWithoutXyzi { .. }
            | Self::InvalidDictValue { .. }
            | Self::InvalidRotation(_)
            | Self::InvalidModelSize { .. }
            | Self::InvalidModelReference(_) => ErrorKind::Structure,
        }
    }
}
