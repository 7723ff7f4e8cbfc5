// Copyright 2015 Ted Mielczarek. See the COPYRIGHT
// file at the top-level directory of this distribution.

//! Bounded, absolute-offset reads over a byte slice.
//!
//! Every read in this module is expressed relative to the start of the
//! file, never relative to some implicit cursor: header fields live at
//! fixed offsets, and nothing here needs to "seek" anywhere.

use scroll::{Pread, LE};

/// A bounds-checked view over a file's bytes.
///
/// `ByteWindow` never panics on an out-of-range offset; short or
/// out-of-bounds reads of a fixed-width integer return `0`, matching the
/// documented "value absent" convention for header fields the core still
/// wants to report on rather than treat as fatal.
#[derive(Copy, Clone, Debug)]
pub struct ByteWindow<'a> {
    data: &'a [u8],
}

impl<'a> ByteWindow<'a> {
    pub fn new(data: &'a [u8]) -> ByteWindow<'a> {
        ByteWindow { data }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Read `len` bytes starting at `offset`. Returns `None` if the read
    /// would run past the end of the data.
    pub fn read_bytes(&self, offset: usize, len: usize) -> Option<&'a [u8]> {
        let end = offset.checked_add(len)?;
        self.data.get(offset..end)
    }

    /// Read a little-endian `u16` at `offset`, or `0` on a short read.
    pub fn read_u16(&self, offset: usize) -> u16 {
        self.read_bytes(offset, 2)
            .and_then(|b| b.pread_with::<u16>(0, LE).ok())
            .unwrap_or(0)
    }

    /// Read a little-endian `u32` at `offset`, or `0` on a short read.
    pub fn read_u32(&self, offset: usize) -> u32 {
        self.read_bytes(offset, 4)
            .and_then(|b| b.pread_with::<u32>(0, LE).ok())
            .unwrap_or(0)
    }

    /// Read a little-endian `u64` at `offset`, or `0` on a short read.
    pub fn read_u64(&self, offset: usize) -> u64 {
        self.read_bytes(offset, 8)
            .and_then(|b| b.pread_with::<u64>(0, LE).ok())
            .unwrap_or(0)
    }

    /// Read `len` bytes at `offset` and decode them as ASCII, replacing any
    /// non-ASCII byte with `U+FFFD`. Used only for the signature fields.
    pub fn read_fixed_ascii(&self, offset: usize, len: usize) -> String {
        match self.read_bytes(offset, len) {
            Some(bytes) => bytes
                .iter()
                .map(|&b| if b.is_ascii() { b as char } else { '\u{FFFD}' })
                .collect(),
            None => std::iter::repeat('\u{FFFD}').take(len).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_le_integers() {
        let data = [0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08];
        let w = ByteWindow::new(&data);
        assert_eq!(w.read_u16(0), 0x0201);
        assert_eq!(w.read_u32(0), 0x0403_0201);
        assert_eq!(w.read_u64(0), 0x0807_0605_0403_0201);
    }

    #[test]
    fn short_reads_return_zero_not_panic() {
        let data = [0xAAu8, 0xBB];
        let w = ByteWindow::new(&data);
        assert_eq!(w.read_u32(0), 0);
        assert_eq!(w.read_u64(0), 0);
        assert_eq!(w.read_u16(10), 0);
    }

    #[test]
    fn fixed_ascii_substitutes_non_ascii() {
        let data = [b'P', b'A', 0xFF, b'E'];
        let w = ByteWindow::new(&data);
        assert_eq!(w.read_fixed_ascii(0, 4), "PA\u{FFFD}E");
    }

    #[test]
    fn fixed_ascii_on_short_read_is_all_replacement() {
        let data = [b'P', b'A'];
        let w = ByteWindow::new(&data);
        assert_eq!(w.read_fixed_ascii(0, 4), "\u{FFFD}\u{FFFD}\u{FFFD}\u{FFFD}");
    }
}
