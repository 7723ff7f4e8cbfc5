//! Shared, dependency-light vocabulary for working with Windows kernel crash
//! dump files: the recognized file signatures, the fixed header offset
//! table, and the small enumerations (`MachineType`, `DumpVariant`,
//! `WellKnownException`) that appear throughout the `kdump` workspace.
//!
//! This crate has no parsing logic of its own; it exists so that the offset
//! table is defined exactly once and shared by `kdump`, `kdump-processor`
//! and `kdump-tools`.

#![warn(missing_debug_implementations)]

pub mod bugcheck_names;
pub mod format;

pub use crate::format::{ContextFlags, DumpVariant, MachineType, WellKnownException};
