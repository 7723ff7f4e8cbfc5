// Copyright 2015 Ted Mielczarek. See the COPYRIGHT
// file at the top-level directory of this distribution.

//! A parser for Windows kernel crash dump files.
//!
//! This crate reads the fixed-offset `_DUMP_HEADER`/`_DUMP_HEADER64`
//! structure at the front of a `.dmp` file — the header, the embedded CPU
//! context and exception records, and a best-effort scan for loaded driver
//! names — without requiring symbol files or a live debugger.
//!
//! Start with [`source::DumpSource::open`] to get a byte view of a file,
//! then [`header::parse`] to decode the header. [`context::parse`] and
//! [`modules::scan`] both take that header (or its raw bytes) and fill in
//! the remaining pieces. Higher-level orchestration across these pieces —
//! turning a path into a complete report — lives in the `kdump-processor`
//! crate.

#![warn(missing_debug_implementations)]

pub mod context;
pub mod error;
pub mod header;
pub mod modules;
pub mod reader;
pub mod source;

pub use crate::context::{CpuContext, ExceptionRecord, RawStackFrame, StackTrace};
pub use crate::error::DumpParseError;
pub use crate::header::{CrashSummary, DumpHeader, SystemInfo};
pub use crate::modules::{ModuleReference, ModuleSummary};
pub use crate::reader::ByteWindow;
pub use crate::source::DumpSource;

pub use kdump_common::format;

#[cfg(doctest)]
doc_comment::doctest!("../README.md");
