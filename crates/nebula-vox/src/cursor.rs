//! Bounds-checked sequential reader over an immutable byte buffer.
//!
//! All multi-byte values in a `.vox` file are little-endian. Every read either
//! advances the cursor by exactly its width or fails with
//! [`VoxError::OutOfBounds`] and leaves the cursor where it was.

use crate::error::VoxError;

/// Sequential little-endian reader over a borrowed byte slice.
///
/// Sub-cursors created with [`ByteCursor::split`] remember the absolute offset
/// of their first byte so that errors always report positions in the
/// source buffer.
#[derive(Clone, Debug)]
pub struct ByteCursor<'a> {
    data: &'a [u8],
    pos: usize,
    /// Absolute offset of `data[0]` in the source buffer.
    base: usize,
}

impl<'a> ByteCursor<'a> {
    /// Creates a cursor positioned at the start of `data`.
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            pos: 0,
            base: 0,
        }
    }

    /// Position relative to the start of this cursor's slice.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Absolute position in the source buffer.
    pub fn offset(&self) -> usize {
        self.base + self.pos
    }

    /// Total length of the slice this cursor reads from.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` if the underlying slice is empty.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Number of unread bytes.
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    /// Returns `true` once every byte has been consumed.
    pub fn is_at_end(&self) -> bool {
        self.pos == self.data.len()
    }

    fn out_of_bounds(&self, requested: usize) -> VoxError {
        VoxError::OutOfBounds {
            offset: self.offset(),
            requested,
            available: self.remaining(),
        }
    }

    /// Reads `n` raw bytes without copying.
    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8], VoxError> {
        if n > self.remaining() {
            return Err(self.out_of_bounds(n));
        }
        let slice = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    /// Reads a fixed-size array.
    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N], VoxError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_bytes(N)?);
        Ok(out)
    }

    pub fn read_u8(&mut self) -> Result<u8, VoxError> {
        Ok(self.read_array::<1>()?[0])
    }

    pub fn read_u32(&mut self) -> Result<u32, VoxError> {
        Ok(u32::from_le_bytes(self.read_array()?))
    }

    pub fn read_i32(&mut self) -> Result<i32, VoxError> {
        Ok(i32::from_le_bytes(self.read_array()?))
    }

    /// Reads a signed 32-bit length or count and rejects negative values.
    pub fn read_len(&mut self) -> Result<usize, VoxError> {
        let offset = self.offset();
        let value = self.read_i32()?;
        usize::try_from(value).map_err(|_| {
            self.pos -= 4;
            VoxError::NegativeLength { offset, value }
        })
    }

    /// Reads an `i32` length followed by that many raw bytes.
    pub fn read_string(&mut self) -> Result<&'a [u8], VoxError> {
        let start = self.pos;
        let len = self.read_len()?;
        match self.read_bytes(len) {
            Ok(bytes) => Ok(bytes),
            Err(e) => {
                self.pos = start;
                Err(e)
            }
        }
    }

    /// Reads an `i32` pair count followed by that many key/value strings.
    pub fn read_dict(&mut self) -> Result<Dict, VoxError> {
        let start = self.pos;
        let result = self.read_dict_entries();
        if result.is_err() {
            self.pos = start;
        }
        result
    }

    fn read_dict_entries(&mut self) -> Result<Dict, VoxError> {
        let count = self.read_len()?;
        // Each pair needs at least two length prefixes.
        let min_bytes = count.saturating_mul(8);
        if min_bytes > self.remaining() {
            return Err(self.out_of_bounds(min_bytes));
        }
        let mut entries = Vec::with_capacity(count);
        for _ in 0..count {
            let key = lossy(self.read_string()?);
            let value = lossy(self.read_string()?);
            entries.push((key, value));
        }
        Ok(Dict { entries })
    }

    /// Advances past `n` bytes.
    pub fn skip(&mut self, n: usize) -> Result<(), VoxError> {
        self.read_bytes(n).map(|_| ())
    }

    /// Moves the cursor back by `n` bytes.
    ///
    /// # Panics
    ///
    /// Panics if `n` exceeds the current position.
    pub fn rewind(&mut self, n: usize) {
        assert!(n <= self.pos, "rewind past start of buffer");
        self.pos -= n;
    }

    /// Consumes the next `n` bytes and returns a cursor over exactly them.
    pub fn split(&mut self, n: usize) -> Result<ByteCursor<'a>, VoxError> {
        let base = self.offset();
        let data = self.read_bytes(n)?;
        Ok(ByteCursor { data, pos: 0, base })
    }
}

fn lossy(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

/// Ordered key/value attributes attached to scene graph nodes.
///
/// The format does not forbid duplicate keys; lookups return the first
/// occurrence.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Dict {
    entries: Vec<(String, String)>,
}

impl Dict {
    /// Builds a dictionary from ordered pairs.
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            entries: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Returns the value of the first entry with the given key.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn push_str(buf: &mut Vec<u8>, s: &str) {
        buf.extend_from_slice(&(s.len() as i32).to_le_bytes());
        buf.extend_from_slice(s.as_bytes());
    }

    #[test]
    fn test_reads_advance_by_width() {
        let mut data = Vec::new();
        data.extend_from_slice(&0xDEAD_BEEFu32.to_le_bytes());
        data.extend_from_slice(&(-7i32).to_le_bytes());
        data.push(9);

        let mut c = ByteCursor::new(&data);
        assert_eq!(c.read_u32().unwrap(), 0xDEAD_BEEF);
        assert_eq!(c.position(), 4);
        assert_eq!(c.read_i32().unwrap(), -7);
        assert_eq!(c.position(), 8);
        assert_eq!(c.read_u8().unwrap(), 9);
        assert!(c.is_at_end());
    }

    #[test]
    fn test_out_of_bounds_does_not_advance() {
        let data = [1u8, 2, 3];
        let mut c = ByteCursor::new(&data);
        c.skip(1).unwrap();
        let result = c.read_u32();
        assert!(
            matches!(
                result,
                Err(VoxError::OutOfBounds {
                    offset: 1,
                    requested: 4,
                    available: 2
                })
            ),
            "expected OutOfBounds, got {result:?}"
        );
        assert_eq!(c.position(), 1);
    }

    #[test]
    fn test_negative_length_rejected() {
        let data = (-1i32).to_le_bytes();
        let mut c = ByteCursor::new(&data);
        let result = c.read_string();
        assert!(
            matches!(result, Err(VoxError::NegativeLength { offset: 0, value: -1 })),
            "expected NegativeLength, got {result:?}"
        );
    }

    #[test]
    fn test_string_longer_than_buffer() {
        let mut data = Vec::new();
        data.extend_from_slice(&100i32.to_le_bytes());
        data.extend_from_slice(b"short");
        let mut c = ByteCursor::new(&data);
        assert!(matches!(c.read_string(), Err(VoxError::OutOfBounds { .. })));
        assert_eq!(c.position(), 0);
    }

    #[test]
    fn test_read_dict_keeps_order_and_first_match() {
        let mut data = Vec::new();
        data.extend_from_slice(&3i32.to_le_bytes());
        push_str(&mut data, "_name");
        push_str(&mut data, "tree");
        push_str(&mut data, "_t");
        push_str(&mut data, "1 2 3");
        push_str(&mut data, "_name");
        push_str(&mut data, "shadowed");

        let mut c = ByteCursor::new(&data);
        let dict = c.read_dict().unwrap();
        assert!(c.is_at_end());
        assert_eq!(dict.len(), 3);
        assert_eq!(dict.get("_name"), Some("tree"));
        assert_eq!(dict.get("_t"), Some("1 2 3"));
        assert_eq!(dict.get("_r"), None);
        let keys: Vec<_> = dict.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, ["_name", "_t", "_name"]);
    }

    #[test]
    fn test_huge_dict_count_fails_fast() {
        let data = i32::MAX.to_le_bytes();
        let mut c = ByteCursor::new(&data);
        assert!(matches!(c.read_dict(), Err(VoxError::OutOfBounds { .. })));
        assert_eq!(c.position(), 0);
    }

    #[test]
    fn test_split_reports_absolute_offsets() {
        let data = [0u8; 10];
        let mut c = ByteCursor::new(&data);
        c.skip(4).unwrap();
        let mut sub = c.split(3).unwrap();
        assert_eq!(c.position(), 7);
        assert_eq!(sub.len(), 3);
        let result = sub.read_u32();
        assert!(
            matches!(result, Err(VoxError::OutOfBounds { offset: 4, .. })),
            "expected OutOfBounds at 4, got {result:?}"
        );
    }

    #[test]
    fn test_rewind() {
        let data = [0u8; 16];
        let mut c = ByteCursor::new(&data);
        c.skip(12).unwrap();
        c.rewind(12);
        assert_eq!(c.position(), 0);
    }
}
