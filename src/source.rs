// Copyright 2015 Ted Mielczarek. See the COPYRIGHT
// file at the top-level directory of this distribution.

//! The read-only view of a dump file that C2–C4 borrow from.
//!
//! A `DumpSource` is the thing the orchestrator owns for the duration of an
//! analysis; everything downstream only ever sees `&[u8]`.

use memmap::Mmap;
use std::fs::File;
use std::io;
use std::path::Path;

/// A memory-mapped (or, for tests, in-memory) view of a dump file.
pub enum DumpSource {
    Mapped { _file: File, map: Mmap },
    Buffer(Vec<u8>),
}

impl DumpSource {
    /// Open `path` and memory-map it for reading.
    ///
    /// Empty files are accepted and map to an empty byte slice rather than
    /// failing `memmap`'s zero-length restriction.
    pub fn open<P: AsRef<Path>>(path: P) -> io::Result<DumpSource> {
        let file = File::open(path.as_ref())?;
        let len = file.metadata()?.len();
        if len == 0 {
            return Ok(DumpSource::Buffer(Vec::new()));
        }
        // Safety: mutation of the backing file while mapped is the usual
        // caveat of memory-mapped I/O; this tool only ever reads.
        let map = unsafe { Mmap::map(&file)? };
        Ok(DumpSource::Mapped { _file: file, map })
    }

    /// Wrap an in-memory buffer, bypassing the filesystem entirely. Used by
    /// tests that build synthetic header bytes with `test-assembler`.
    pub fn from_buffer(buffer: Vec<u8>) -> DumpSource {
        DumpSource::Buffer(buffer)
    }

    pub fn as_bytes(&self) -> &[u8] {
        match self {
            DumpSource::Mapped { map, .. } => &map[..],
            DumpSource::Buffer(buf) => &buf[..],
        }
    }

    pub fn len(&self) -> u64 {
        self.as_bytes().len() as u64
    }
}
