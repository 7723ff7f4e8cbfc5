// Copyright 2015 Ted Mielczarek. See the COPYRIGHT
// file at the top-level directory of this distribution.

//! The human-readable `summary.txt` member of the archive (part of C7),
//! sectioned the same way the archive's JSON documents are split: metadata,
//! system info, crash information, bug-check analysis, parser notes.

use kdump_processor::CompleteAnalysis;
use std::fmt::Write as _;

/// Render the plain-text report for `analysis`. Used both for the
/// `summary.txt` archive member and for the `--no-archive` stdout path, so
/// the two never drift apart.
pub fn render(analysis: &CompleteAnalysis) -> String {
    let mut out = String::new();
    let meta = &analysis.metadata;

    writeln!(out, "=== BSOD Analysis Report ===").ok();
    writeln!(out, "Generated by {} v{}", meta.tool_name, meta.tool_version).ok();
    writeln!(out, "Analysis timestamp: {}", meta.analysis_timestamp).ok();
    writeln!(
        out,
        "Analysis duration: {:.3}s",
        meta.analysis_duration_seconds
    )
    .ok();
    writeln!(out, "Source file: {}", meta.dump_file_path).ok();
    writeln!(
        out,
        "Source size: {} ({} bytes)",
        meta.dump_file_size_human, meta.dump_file_size_bytes
    )
    .ok();
    writeln!(out).ok();

    if let Some(si) = &analysis.system_info {
        writeln!(out, "--- System Information ---").ok();
        writeln!(out, "OS version: {}", si.os_version).ok();
        writeln!(out, "Architecture: {}", si.architecture).ok();
        writeln!(out, "Processor count: {}", si.processor_count).ok();
        writeln!(out, "Dump type: {}", si.dump_type).ok();
        writeln!(out).ok();
    }

    if let Some(cs) = &analysis.crash_summary {
        writeln!(out, "--- Crash Information ---").ok();
        writeln!(out, "Bug check code: {} ({})", cs.bugcheck_code, cs.bugcheck_name).ok();
        writeln!(
            out,
            "Parameters: {}, {}, {}, {}",
            cs.parameter1, cs.parameter2, cs.parameter3, cs.parameter4
        )
        .ok();
        writeln!(out).ok();
    }

    if let Some(bc) = &analysis.bugcheck_analysis {
        writeln!(out, "--- Bug Check Analysis ---").ok();
        writeln!(out, "Category: {}", bc.category).ok();
        writeln!(out, "Severity: {}", bc.severity).ok();
        writeln!(out, "Description: {}", bc.description).ok();
        writeln!(out).ok();
        writeln!(out, "Likely causes:").ok();
        for cause in &bc.likely_causes {
            writeln!(out, "  - {}", cause).ok();
        }
        writeln!(out).ok();
        writeln!(out, "Recommendations:").ok();
        for rec in &bc.recommendations {
            writeln!(out, "  - {}", rec).ok();
        }
        writeln!(out).ok();
        writeln!(out, "Parameters:").ok();
        for p in &bc.parameters {
            match &p.interpretation {
                Some(interp) => writeln!(
                    out,
                    "  [{}] {} = {} ({})",
                    p.parameter_number, p.description, p.hex_value, interp
                )
                .ok(),
                None => writeln!(
                    out,
                    "  [{}] {} = {}",
                    p.parameter_number, p.description, p.hex_value
                )
                .ok(),
            };
        }
        writeln!(out).ok();
    }

    if let Some(modules) = &analysis.modules {
        writeln!(out, "--- Drivers ---").ok();
        writeln!(
            out,
            "Found {} driver reference(s) ({} Microsoft, {} third-party, {} flagged)",
            modules.total, modules.microsoft_count, modules.third_party_count, modules.problematic_count
        )
        .ok();
        for m in &modules.problematic_modules {
            writeln!(
                out,
                "  ! {} - {}",
                m.name,
                m.problematic_reason.as_deref().unwrap_or("")
            )
            .ok();
        }
        writeln!(out, "{}", modules.note).ok();
        writeln!(out).ok();
    }

    if !meta.parser_notes.is_empty() {
        writeln!(out, "--- Parser Notes ---").ok();
        for note in &meta.parser_notes {
            writeln!(out, "  - {}", note).ok();
        }
        writeln!(out).ok();
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use kdump_processor::DumpAnalyzer;

    #[test]
    fn missing_file_summary_still_has_metadata_section() {
        let analysis = DumpAnalyzer::analyze("/nonexistent/whatever.dmp");
        let text = render(&analysis);
        assert!(text.contains("BSOD Analysis Report"));
        assert!(text.contains(&analysis.metadata.tool_version));
    }
}
