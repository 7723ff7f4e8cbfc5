// Copyright 2015 Ted Mielczarek. See the COPYRIGHT
// file at the top-level directory of this distribution.

//! The archive writer (C7): serializes a [`CompleteAnalysis`] into a
//! deterministic `.zip` of JSON documents plus a plain-text summary.
//!
//! JSON documents use `serde_json`'s pretty printer, which indents with
//! two spaces and preserves struct field declaration order — the same
//! canonical field ordering §6 of the design documents.

use kdump_processor::CompleteAnalysis;
use serde::Serialize;
use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

const README_TEXT: &str = "\
This archive was produced by kdump-analyze, a tool for decoding Windows
kernel crash dump (.dmp) files.

Contents:
  analysis.json         - the complete analysis, as one document
  system_info.json      - OS version, architecture, dump type (if decoded)
  crash_summary.json    - bug check code and raw parameters (if decoded)
  bugcheck_analysis.json - category, severity, causes and recommendations
  stack_trace.json      - CPU register snapshot and exception record
  drivers.json          - driver names found via a best-effort string scan
  summary.txt           - a human-readable rendering of the above

Privacy note: this archive contains only what could be read directly from
the dump file's fixed header region - register contents, a stop code and
its parameters, and driver filenames incidentally visible in that region.
No memory contents, user data, or network information are collected or
transmitted anywhere; this tool performs no network I/O.
";

/// `BSOD_Analysis_{basename-without-extension}_{YYYYMMDD_HHMMSS}.zip`
pub fn archive_filename(dump_path: &Path, timestamp: chrono::DateTime<chrono::Local>) -> String {
    let stem = dump_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "dump".to_string());
    format!(
        "BSOD_Analysis_{}_{}.zip",
        stem,
        timestamp.format("%Y%m%d_%H%M%S")
    )
}

/// Write the archive for `analysis` into `output_dir`, returning the path
/// of the file that was written.
pub fn write_archive(
    analysis: &CompleteAnalysis,
    dump_path: &Path,
    output_dir: &Path,
    timestamp: chrono::DateTime<chrono::Local>,
) -> io::Result<PathBuf> {
    let archive_path = output_dir.join(archive_filename(dump_path, timestamp));
    let file = File::create(&archive_path)?;
    let mut zip = ZipWriter::new(file);
    let options = FileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .unix_permissions(0o644);

    write_json(&mut zip, options, "analysis.json", analysis)?;
    if let Some(v) = &analysis.system_info {
        write_json(&mut zip, options, "system_info.json", v)?;
    }
    if let Some(v) = &analysis.crash_summary {
        write_json(&mut zip, options, "crash_summary.json", v)?;
    }
    if let Some(v) = &analysis.bugcheck_analysis {
        write_json(&mut zip, options, "bugcheck_analysis.json", v)?;
    }
    if let Some(v) = &analysis.stack_trace {
        write_json(&mut zip, options, "stack_trace.json", v)?;
    }
    if let Some(v) = &analysis.modules {
        write_json(&mut zip, options, "drivers.json", v)?;
    }

    zip.start_file("summary.txt", options)
        .map_err(zip_err_to_io)?;
    zip.write_all(crate::summary::render(analysis).as_bytes())?;

    zip.start_file("README.txt", options)
        .map_err(zip_err_to_io)?;
    zip.write_all(README_TEXT.as_bytes())?;

    zip.finish().map_err(zip_err_to_io)?;
    log::info!("archive written to {}", archive_path.display());
    Ok(archive_path)
}

fn write_json<T: Serialize>(
    zip: &mut ZipWriter<File>,
    options: FileOptions,
    name: &str,
    value: &T,
) -> io::Result<()> {
    zip.start_file(name, options).map_err(zip_err_to_io)?;
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    zip.write_all(json.as_bytes())
}

fn zip_err_to_io(e: zip::result::ZipError) -> io::Error {
    match e {
        zip::result::ZipError::Io(io_err) => io_err,
        other => io::Error::new(io::ErrorKind::Other, other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use kdump_processor::DumpAnalyzer;

    #[test]
    fn filename_encodes_basename_and_timestamp() {
        let ts = chrono::Local.ymd(2024, 3, 9).and_hms(12, 34, 56);
        let name = archive_filename(Path::new("/tmp/MEMORY.DMP"), ts);
        assert_eq!(name, "BSOD_Analysis_MEMORY_20240309_123456.zip");
    }

    #[test]
    fn archive_round_trips_through_zip() {
        let dir = tempdir::TempDir::new("kdump-archive-test").unwrap();
        let dump_path = dir.path().join("crash.dmp");
        std::fs::write(&dump_path, b"PAGEDU64 not a real header but long enough").unwrap();

        let analysis = DumpAnalyzer::analyze(&dump_path);
        let ts = chrono::Local.ymd(2024, 1, 1).and_hms(0, 0, 0);
        let archive_path = write_archive(&analysis, &dump_path, dir.path(), ts).unwrap();
        assert!(archive_path.exists());

        let file = File::open(&archive_path).unwrap();
        let mut zip = zip::ZipArchive::new(file).unwrap();
        let names: Vec<String> = (0..zip.len())
            .map(|i| zip.by_index(i).unwrap().name().to_string())
            .collect();
        assert!(names.contains(&"analysis.json".to_string()));
        assert!(names.contains(&"summary.txt".to_string()));
        assert!(names.contains(&"README.txt".to_string()));
    }

    #[test]
    fn two_runs_are_byte_identical_except_timestamp() {
        let dir = tempdir::TempDir::new("kdump-archive-determinism").unwrap();
        let dump_path = dir.path().join("crash.dmp");
        std::fs::write(&dump_path, b"PAGEDU64 not a real header but long enough").unwrap();
        let analysis = DumpAnalyzer::analyze(&dump_path);
        let ts = chrono::Local.ymd(2024, 1, 1).and_hms(0, 0, 0);

        let path_a = write_archive(&analysis, &dump_path, dir.path(), ts).unwrap();
        let bytes_a = std::fs::read(&path_a).unwrap();
        std::fs::remove_file(&path_a).unwrap();
        let path_b = write_archive(&analysis, &dump_path, dir.path(), ts).unwrap();
        let bytes_b = std::fs::read(&path_b).unwrap();

        assert_eq!(bytes_a, bytes_b);
    }
}
