// Copyright 2015 Ted Mielczarek. See the COPYRIGHT
// file at the top-level directory of this distribution.

//! Errors produced while decoding a dump header.

use failure::Fail;
use std::io;

/// The only failure mode that can abort decoding of a dump file's header.
///
/// Every other condition described in the design notes (a short read at a
/// fixed offset, an unrecognized machine type or dump variant, an empty
/// module scan) is not represented here: those recover locally and surface
/// as a parser note instead of an `Err`.
#[derive(Debug, Fail)]
pub enum DumpParseError {
    /// The first 8 bytes of the file matched neither recognized signature.
    #[fail(display = "invalid dump file signature")]
    InvalidSignature,
    /// The underlying source could not be read at all.
    #[fail(display = "I/O error reading dump file: {}", _0)]
    Io(#[cause] io::Error),
}

impl From<io::Error> for DumpParseError {
    fn from(e: io::Error) -> DumpParseError {
        DumpParseError::Io(e)
    }
}
