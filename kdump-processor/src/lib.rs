// Copyright 2015 Ted Mielczarek. See the COPYRIGHT
// file at the top-level directory of this distribution.

//! Interpreting Windows bug-check codes and orchestrating a complete crash
//! analysis.
//!
//! [`bugcheck::analyze`] is the bug-check catalogue (C5): given a numeric
//! stop code and its four parameters, it produces a [`bugcheck::BugCheckAnalysis`]
//! with a name, category, severity, per-parameter descriptions and
//! remediation advice, falling back to generic text for codes it has never
//! seen.
//!
//! [`analyzer::DumpAnalyzer`] is the orchestrator (C6): it drives the
//! `kdump` crate's header, context and module decoders against a file path
//! and this crate's own catalogue, merging everything — including every
//! recoverable failure along the way — into one [`analyzer::CompleteAnalysis`].

#![warn(missing_debug_implementations)]

pub mod analyzer;
pub mod bugcheck;

pub use crate::analyzer::{AnalysisMetadata, CompleteAnalysis, DumpAnalyzer};
pub use crate::bugcheck::{BugCheckAnalysis, ParameterAnalysis};
