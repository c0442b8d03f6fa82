//! Decoding of node frame attributes into affine transforms.
//!
//! Frames store rotation as a packed byte under `_r` and translation as three
//! space-separated integers under `_t`, both as ASCII text. Matrices follow
//! glam's column-vector convention: `local = translation * rotation`.

use glam::{IVec3, Mat3, Mat4, Vec3};

use crate::cursor::Dict;
use crate::error::VoxError;

/// Frame key holding the packed rotation.
pub const ROTATION_KEY: &str = "_r";

/// Frame key holding the translation.
pub const TRANSLATION_KEY: &str = "_t";

/// Default bound on the length of a numeric dictionary value.
pub const DEFAULT_MAX_DICT_VALUE_LEN: usize = 64;

/// Axis-aligned rotation packed into a single byte.
///
/// | Bits | Meaning |
/// |------|---------|
/// | 0-1 | Output row of the X basis vector |
/// | 2-3 | Output row of the Y basis vector |
/// | 4 | X basis sign (1 = negative) |
/// | 5 | Y basis sign |
/// | 6 | Z basis sign |
///
/// The Z row is whichever row X and Y leave free.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PackedRotation(u8);

impl PackedRotation {
    /// The rotation that leaves every axis in place (`_r` = 4).
    pub const IDENTITY: Self = Self(0b0000_0100);

    /// Validates that the row indices form a permutation of the three axes.
    pub fn from_bits(bits: u8) -> Result<Self, VoxError> {
        let x = bits & 0b11;
        let y = (bits >> 2) & 0b11;
        if x == 3 || y == 3 || x == y {
            return Err(VoxError::InvalidRotation(bits));
        }
        Ok(Self(bits))
    }

    pub fn bits(self) -> u8 {
        self.0
    }

    pub fn x_basis_index(self) -> usize {
        (self.0 & 0b11) as usize
    }

    pub fn y_basis_index(self) -> usize {
        ((self.0 >> 2) & 0b11) as usize
    }

    pub fn z_basis_index(self) -> usize {
        0b11 ^ self.x_basis_index() ^ self.y_basis_index()
    }

    /// Sign applied to the basis vector of input axis `axis` (0 = X).
    pub fn sign(self, axis: usize) -> f32 {
        if self.0 & (0b1_0000 << axis) != 0 {
            -1.0
        } else {
            1.0
        }
    }

    /// Expands to a 3×3 matrix whose column `axis` has a single signed unit
    /// entry at that axis' basis row.
    pub fn to_mat3(self) -> Mat3 {
        let rows = [
            self.x_basis_index(),
            self.y_basis_index(),
            self.z_basis_index(),
        ];
        let mut cols = [Vec3::ZERO; 3];
        for (axis, col) in cols.iter_mut().enumerate() {
            col[rows[axis]] = self.sign(axis);
        }
        Mat3::from_cols(cols[0], cols[1], cols[2])
    }
}

impl Default for PackedRotation {
    fn default() -> Self {
        Self::IDENTITY
    }
}

fn invalid_value(key: &str, value: &str) -> VoxError {
    let mut value = value.to_string();
    if value.len() > DEFAULT_MAX_DICT_VALUE_LEN {
        let mut cut = DEFAULT_MAX_DICT_VALUE_LEN;
        while !value.is_char_boundary(cut) {
            cut -= 1;
        }
        value.truncate(cut);
        value.push('…');
    }
    VoxError::InvalidDictValue {
        key: key.to_string(),
        value,
    }
}

/// Parses an `_r` value.
pub fn decode_rotation(value: &str, max_len: usize) -> Result<PackedRotation, VoxError> {
    if value.len() > max_len {
        return Err(invalid_value(ROTATION_KEY, value));
    }
    let bits: u8 = value
        .trim()
        .parse()
        .map_err(|_| invalid_value(ROTATION_KEY, value))?;
    PackedRotation::from_bits(bits)
}

/// Parses a `_t` value: exactly three signed integers.
pub fn decode_translation(value: &str, max_len: usize) -> Result<IVec3, VoxError> {
    if value.len() > max_len {
        return Err(invalid_value(TRANSLATION_KEY, value));
    }
    let mut parts = value.split_ascii_whitespace();
    let mut next = || -> Result<i32, VoxError> {
        parts
            .next()
            .and_then(|p| p.parse().ok())
            .ok_or_else(|| invalid_value(TRANSLATION_KEY, value))
    };
    let t = IVec3::new(next()?, next()?, next()?);
    if parts.next().is_some() {
        return Err(invalid_value(TRANSLATION_KEY, value));
    }
    Ok(t)
}

/// Builds the local transform described by a frame dictionary.
///
/// Missing keys contribute identity.
pub fn decode_frame_transform(frame: &Dict, max_len: usize) -> Result<Mat4, VoxError> {
    let rotation = match frame.get(ROTATION_KEY) {
        Some(value) => decode_rotation(value, max_len)?.to_mat3(),
        None => Mat3::IDENTITY,
    };
    let translation = match frame.get(TRANSLATION_KEY) {
        Some(value) => decode_translation(value, max_len)?.as_vec3(),
        None => Vec3::ZERO,
    };
    Ok(Mat4::from_translation(translation) * Mat4::from_mat3(rotation))
}
