// Copyright 2015 Ted Mielczarek. See the COPYRIGHT
// file at the top-level directory of this distribution.

//! The orchestrator (C6): turns a dump file path into a single
//! [`CompleteAnalysis`], running the header decoder, context/exception
//! decoder, module scavenger and bug-check catalogue in sequence and
//! converting every recoverable failure along the way into a
//! [`parser_notes`](AnalysisMetadata::parser_notes) entry rather than
//! aborting.
//!
//! The only condition that yields `success = false` is an inability to
//! open the dump file at all.

use kdump::context::{self, StackTrace};
use kdump::header::{self, CrashSummary, SystemInfo};
use kdump::modules::{self, ModuleSummary};
use kdump::reader::ByteWindow;
use kdump::source::DumpSource;
use kdump::DumpParseError;
use serde::Serialize;
use std::path::Path;
use std::time::Instant;

use crate::bugcheck::{self, BugCheckAnalysis};

/// Name embedded in [`AnalysisMetadata::tool_name`]; matches the binary
/// produced by `kdump-tools`.
pub const TOOL_NAME: &str = "kdump-analyze";
/// Embedded at compile time from this crate's own `Cargo.toml`.
pub const TOOL_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Everything about the analysis run itself, as opposed to the dump's
/// contents: when it ran, how long it took, and what had to be worked
/// around along the way.
#[derive(Clone, Debug, Serialize)]
pub struct AnalysisMetadata {
    pub tool_name: String,
    pub tool_version: String,
    /// Local time the analysis was performed, in RFC 3339 / ISO-8601 form.
    pub analysis_timestamp: String,
    pub analysis_duration_seconds: f64,
    pub dump_file_path: String,
    pub dump_file_name: String,
    pub dump_file_size_bytes: u64,
    pub dump_file_size_human: String,
    /// Diagnostic strings appended by C2–C5 for conditions that limited
    /// what could be extracted without aborting the analysis. Each entry
    /// here was also logged at `warn` level when it was recorded.
    pub parser_notes: Vec<String>,
}

/// The top-level, fully-owned result of analyzing one dump file.
///
/// Every field below `metadata` is independently optional: a dump with an
/// unrecognized signature still produces a `CompleteAnalysis` with
/// `success = true`, just with `system_info`, `crash_summary` and
/// `bugcheck_analysis` all absent.
#[derive(Clone, Debug, Serialize)]
pub struct CompleteAnalysis {
    pub metadata: AnalysisMetadata,
    pub success: bool,
    pub error: Option<String>,
    pub system_info: Option<SystemInfo>,
    pub crash_summary: Option<CrashSummary>,
    pub bugcheck_analysis: Option<BugCheckAnalysis>,
    pub stack_trace: Option<StackTrace>,
    pub modules: Option<ModuleSummary>,
}

/// Stateless entry point for C6. There is nothing to construct: every
/// call to [`DumpAnalyzer::analyze`] is independent and the bug-check
/// catalogue it consults is immutable, process-wide data.
#[derive(Debug, Default)]
pub struct DumpAnalyzer;

impl DumpAnalyzer {
    /// Run the full analysis pipeline against `path`.
    pub fn analyze<P: AsRef<Path>>(path: P) -> CompleteAnalysis {
        let path = path.as_ref();
        let start = Instant::now();
        let dump_file_path = path.to_string_lossy().into_owned();
        let dump_file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| dump_file_path.clone());

        log::info!("analysis starting for {}", dump_file_path);

        let source = match DumpSource::open(path) {
            Ok(source) => source,
            Err(io_err) => {
                let error = format!("Dump file not found: {}", dump_file_path);
                log::info!("analysis of {} aborted: {} ({})", dump_file_path, error, io_err);
                return CompleteAnalysis {
                    metadata: AnalysisMetadata {
                        tool_name: TOOL_NAME.to_string(),
                        tool_version: TOOL_VERSION.to_string(),
                        analysis_timestamp: now_iso8601(),
                        analysis_duration_seconds: start.elapsed().as_secs_f64(),
                        dump_file_path,
                        dump_file_name,
                        dump_file_size_bytes: 0,
                        dump_file_size_human: header::format_size(0),
                        parser_notes: Vec::new(),
                    },
                    success: false,
                    error: Some(error),
                    system_info: None,
                    crash_summary: None,
                    bugcheck_analysis: None,
                    stack_trace: None,
                    modules: None,
                };
            }
        };

        let file_size = source.len();
        let window = ByteWindow::new(source.as_bytes());
        let mut notes = Vec::new();

        let header = match header::parse(window, file_size) {
            Ok(header) => Some(header),
            Err(DumpParseError::InvalidSignature) => {
                note(&mut notes, "Invalid dump file signature: expected PAGEDU64 or PAGEDUMP".to_string());
                None
            }
            Err(DumpParseError::Io(e)) => {
                note(&mut notes, format!("I/O error reading dump header: {}", e));
                None
            }
        };

        let (system_info, crash_summary, bugcheck_analysis, stack_trace) = match &header {
            Some(h) => {
                let system_info = header::system_info(h, file_size);
                let crash_summary = header::crash_summary(h, &dump_file_path);
                let bugcheck_analysis = bugcheck::analyze(h.bug_check_code, h.bug_check_parameters);
                let stack_trace = context::parse(window, h);
                (Some(system_info), Some(crash_summary), Some(bugcheck_analysis), Some(stack_trace))
            }
            None => (None, None, None, None),
        };

        let modules = modules::scan(source.as_bytes());

        log::info!(
            "analysis finished for {}: bugcheck={}",
            dump_file_path,
            crash_summary
                .as_ref()
                .map(|c| c.bugcheck_name.as_str())
                .unwrap_or("<none>")
        );

        CompleteAnalysis {
            metadata: AnalysisMetadata {
                tool_name: TOOL_NAME.to_string(),
                tool_version: TOOL_VERSION.to_string(),
                analysis_timestamp: now_iso8601(),
                analysis_duration_seconds: start.elapsed().as_secs_f64(),
                dump_file_path,
                dump_file_name,
                dump_file_size_bytes: file_size,
                dump_file_size_human: header::format_size(file_size),
                parser_notes: notes,
            },
            success: true,
            error: None,
            system_info,
            crash_summary,
            bugcheck_analysis,
            stack_trace,
            modules: Some(modules),
        }
    }
}

fn note(notes: &mut Vec<String>, text: String) {
    log::warn!("{}", text);
    notes.push(text);
}

fn now_iso8601() -> String {
    chrono::Local::now().to_rfc3339()
}

#[cfg(test)]
mod tests {
    use super::*;
    use kdump_common::format::offset;

    fn write_header(buf: &mut [u8], bugcheck: u32, params: [u64; 4]) {
        buf[0..8].copy_from_slice(b"PAGEDU64");
        buf[offset::MACHINE_TYPE..offset::MACHINE_TYPE + 4]
            .copy_from_slice(&0x8664u32.to_le_bytes());
        buf[offset::BUGCHECK_CODE..offset::BUGCHECK_CODE + 4]
            .copy_from_slice(&bugcheck.to_le_bytes());
        for (i, o) in offset::BUGCHECK_PARAM_64.iter().enumerate() {
            buf[*o..*o + 8].copy_from_slice(&params[i].to_le_bytes());
        }
        buf[offset::DUMP_VARIANT..offset::DUMP_VARIANT + 4].copy_from_slice(&1u32.to_le_bytes());
    }

    #[test]
    fn missing_file_yields_failure() {
        let analysis = DumpAnalyzer::analyze("/nonexistent/path/to/a.dmp");
        assert!(!analysis.success);
        assert!(analysis.error.unwrap().starts_with("Dump file not found:"));
        assert!(analysis.system_info.is_none());
        assert!(analysis.crash_summary.is_none());
        assert!(analysis.bugcheck_analysis.is_none());
        assert!(analysis.modules.is_none());
    }

    #[test]
    fn invalid_signature_is_reported_as_single_note() {
        let dir = std::env::temp_dir();
        let path = dir.join(format!("kdump-test-badsig-{}.dmp", std::process::id()));
        std::fs::write(&path, b"notadump and some trailing bytes").unwrap();

        let analysis = DumpAnalyzer::analyze(&path);
        let _ = std::fs::remove_file(&path);

        assert!(analysis.success);
        assert!(analysis.system_info.is_none());
        assert!(analysis.crash_summary.is_none());
        assert!(analysis.bugcheck_analysis.is_none());
        assert_eq!(analysis.metadata.parser_notes.len(), 1);
        assert!(analysis.metadata.parser_notes[0].contains("Invalid dump file signature"));
    }

    #[test]
    fn valid_header_produces_full_analysis() {
        let dir = std::env::temp_dir();
        let path = dir.join(format!("kdump-test-valid-{}.dmp", std::process::id()));
        let mut buf = vec![0u8; offset::REQUIRED_DUMP_SPACE + 8];
        write_header(&mut buf, 0xD1, [0x1000, 2, 1, 0]);
        std::fs::write(&path, &buf).unwrap();

        let analysis = DumpAnalyzer::analyze(&path);
        let _ = std::fs::remove_file(&path);

        assert!(analysis.success);
        assert!(analysis.metadata.parser_notes.is_empty());
        assert_eq!(
            analysis.crash_summary.unwrap().bugcheck_name,
            "DRIVER_IRQL_NOT_LESS_OR_EQUAL"
        );
        assert_eq!(analysis.bugcheck_analysis.unwrap().severity, "High");
        assert!(analysis.modules.is_some());
        assert!(analysis.metadata.analysis_duration_seconds >= 0.0);
        assert!(!analysis.metadata.analysis_timestamp.is_empty());
    }
}
