// Copyright 2015 Ted Mielczarek. See the COPYRIGHT
// file at the top-level directory of this distribution.

//! Decoding the fixed-offset `_DUMP_HEADER`/`_DUMP_HEADER64` fields (C2).

use crate::error::DumpParseError;
use crate::reader::ByteWindow;
use kdump_common::format::offset;
use kdump_common::{DumpVariant, MachineType};
use serde::Serialize;

/// Raw fields decoded from a dump file's header, plus the handful of values
/// that are fixed once `is_64bit` is known rather than read from disk.
///
/// Not `Serialize`: nothing downstream emits this struct directly, only the
/// [`SystemInfo`]/[`CrashSummary`] views built on top of it, which already
/// render `machine_type`/`dump_variant` as display strings.
#[derive(Clone, Debug)]
pub struct DumpHeader {
    pub signature: String,
    pub valid_marker: String,
    pub major_version: u32,
    pub minor_version: u32,
    pub machine_type: MachineType,
    pub processor_count: u32,
    pub bug_check_code: u32,
    pub bug_check_parameters: [u64; 4],
    pub dump_variant: DumpVariant,
    pub system_time: u64,
    pub required_dump_space: u64,
    pub is_64bit: bool,
    pub physical_memory_block_offset: usize,
    pub exception_record_offset: usize,
    pub context_record_offset: Option<usize>,
}

/// Version string, architecture and size information derived from a
/// [`DumpHeader`] for human consumption.
#[derive(Clone, Debug, Serialize)]
pub struct SystemInfo {
    pub os_version: String,
    pub architecture: String,
    pub processor_count: u32,
    pub dump_type: String,
    pub dump_size_bytes: u64,
    pub dump_size_human: String,
    pub is_64bit: bool,
    pub crash_time_raw: u64,
}

/// The bug-check code and parameters, formatted for a report rather than
/// for further arithmetic.
#[derive(Clone, Debug, Serialize)]
pub struct CrashSummary {
    pub bugcheck_code: String,
    pub bugcheck_code_int: u32,
    pub bugcheck_name: String,
    pub parameter1: String,
    pub parameter2: String,
    pub parameter3: String,
    pub parameter4: String,
    pub file_path: String,
    pub file_name: String,
}

/// Render a byte count as e.g. `"3.14 MB"`, matching the thresholds used
/// throughout the rest of this tool's human-readable output.
pub fn format_size(size_bytes: u64) -> String {
    const KB: f64 = 1024.0;
    const MB: f64 = KB * 1024.0;
    const GB: f64 = MB * 1024.0;
    let bytes = size_bytes as f64;
    if bytes >= GB {
        format!("{:.2} GB", bytes / GB)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes / MB)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes / KB)
    } else {
        format!("{} bytes", size_bytes)
    }
}

/// Decode a dump header out of `window`.
///
/// `file_size` backstops `required_dump_space` when that field's offset
/// can't be read (a short, truncated file), and `file_size` is also what
/// ends up in `SystemInfo::dump_size_bytes`.
pub fn parse(window: ByteWindow, file_size: u64) -> Result<DumpHeader, DumpParseError> {
    let sig_bytes = window
        .read_bytes(0, 8)
        .ok_or(DumpParseError::InvalidSignature)?;
    let is_64bit = if sig_bytes == kdump_common::format::SIGNATURE_64BIT {
        true
    } else if sig_bytes == kdump_common::format::SIGNATURE_32BIT {
        false
    } else {
        log::warn!("dump header signature not recognized: {:02X?}", sig_bytes);
        return Err(DumpParseError::InvalidSignature);
    };
    log::debug!("dump signature recognized, is_64bit={}", is_64bit);

    let signature = window.read_fixed_ascii(offset::SIGNATURE, 4);
    let valid_marker = window.read_fixed_ascii(offset::VALID_MARKER, 4);
    let major_version = window.read_u32(offset::MAJOR_VERSION);
    let minor_version = window.read_u32(offset::MINOR_VERSION);
    let machine_type = MachineType::from_raw(window.read_u32(offset::MACHINE_TYPE));
    let processor_count = window.read_u32(offset::PROCESSOR_COUNT);
    let bug_check_code = window.read_u32(offset::BUGCHECK_CODE);

    let bug_check_parameters = if is_64bit {
        let o = offset::BUGCHECK_PARAM_64;
        [
            window.read_u64(o[0]),
            window.read_u64(o[1]),
            window.read_u64(o[2]),
            window.read_u64(o[3]),
        ]
    } else {
        let o = offset::BUGCHECK_PARAM_32;
        [
            u64::from(window.read_u32(o[0])),
            u64::from(window.read_u32(o[1])),
            u64::from(window.read_u32(o[2])),
            u64::from(window.read_u32(o[3])),
        ]
    };

    let dump_variant = DumpVariant::from_raw(window.read_u32(offset::DUMP_VARIANT));
    let system_time = window.read_u64(offset::SYSTEM_TIME);

    let required_dump_space = if window.len() >= offset::REQUIRED_DUMP_SPACE + 8 {
        window.read_u64(offset::REQUIRED_DUMP_SPACE)
    } else {
        log::trace!(
            "required_dump_space offset unreadable, falling back to file size {}",
            file_size
        );
        file_size
    };

    let physical_memory_block_offset = if is_64bit {
        offset::PHYSICAL_MEMORY_BLOCK_64
    } else {
        offset::PHYSICAL_MEMORY_BLOCK_32
    };
    let exception_record_offset = if is_64bit {
        offset::EXCEPTION_RECORD_64
    } else {
        offset::EXCEPTION_RECORD_32
    };
    let context_record_offset = if is_64bit {
        Some(offset::CONTEXT_RECORD_64)
    } else {
        None
    };

    Ok(DumpHeader {
        signature,
        valid_marker,
        major_version,
        minor_version,
        machine_type,
        processor_count,
        bug_check_code,
        bug_check_parameters,
        dump_variant,
        system_time,
        required_dump_space,
        is_64bit,
        physical_memory_block_offset,
        exception_record_offset,
        context_record_offset,
    })
}

/// Build the [`SystemInfo`] view of a header.
pub fn system_info(header: &DumpHeader, file_size: u64) -> SystemInfo {
    SystemInfo {
        os_version: format!("Windows {}.{}", header.major_version, header.minor_version),
        architecture: header.machine_type.display_name().to_string(),
        processor_count: header.processor_count,
        dump_type: header.dump_variant.display_name().to_string(),
        dump_size_bytes: file_size,
        dump_size_human: format_size(file_size),
        is_64bit: header.is_64bit,
        crash_time_raw: header.system_time,
    }
}

/// Build the [`CrashSummary`] view of a header's bug-check fields.
///
/// The bug-check name is resolved via `kdump_common::bugcheck_names`, the
/// same table `kdump-processor`'s fuller catalogue consults, so the name
/// reported here and the name in `BugCheckAnalysis` never disagree.
pub fn crash_summary(header: &DumpHeader, file_path: &str) -> CrashSummary {
    let file_name = std::path::Path::new(file_path)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| file_path.to_string());
    CrashSummary {
        bugcheck_code: kdump_common::bugcheck_names::format_code(header.bug_check_code),
        bugcheck_code_int: header.bug_check_code,
        bugcheck_name: kdump_common::bugcheck_names::name(header.bug_check_code),
        parameter1: format!("0x{:016X}", header.bug_check_parameters[0]),
        parameter2: format!("0x{:016X}", header.bug_check_parameters[1]),
        parameter3: format!("0x{:016X}", header.bug_check_parameters[2]),
        parameter4: format!("0x{:016X}", header.bug_check_parameters[3]),
        file_path: file_path.to_string(),
        file_name,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header_bytes_64(bugcheck: u32, params: [u64; 4]) -> Vec<u8> {
        let mut buf = vec![0u8; offset::REQUIRED_DUMP_SPACE + 8];
        buf[0..8].copy_from_slice(b"PAGEDU64");
        buf[offset::MAJOR_VERSION..offset::MAJOR_VERSION + 4]
            .copy_from_slice(&15u32.to_le_bytes());
        buf[offset::MINOR_VERSION..offset::MINOR_VERSION + 4]
            .copy_from_slice(&19041u32.to_le_bytes());
        buf[offset::MACHINE_TYPE..offset::MACHINE_TYPE + 4]
            .copy_from_slice(&0x8664u32.to_le_bytes());
        buf[offset::PROCESSOR_COUNT..offset::PROCESSOR_COUNT + 4]
            .copy_from_slice(&4u32.to_le_bytes());
        buf[offset::BUGCHECK_CODE..offset::BUGCHECK_CODE + 4]
            .copy_from_slice(&bugcheck.to_le_bytes());
        for (i, o) in offset::BUGCHECK_PARAM_64.iter().enumerate() {
            buf[*o..*o + 8].copy_from_slice(&params[i].to_le_bytes());
        }
        buf[offset::DUMP_VARIANT..offset::DUMP_VARIANT + 4].copy_from_slice(&1u32.to_le_bytes());
        buf
    }

    #[test]
    fn parses_64bit_header() {
        let buf = header_bytes_64(0xD1, [1, 2, 3, 4]);
        let window = ByteWindow::new(&buf);
        let header = parse(window, buf.len() as u64).unwrap();
        assert!(header.is_64bit);
        assert_eq!(header.machine_type, MachineType::X64);
        assert_eq!(header.processor_count, 4);
        assert_eq!(header.bug_check_code, 0xD1);
        assert_eq!(header.bug_check_parameters, [1, 2, 3, 4]);
        assert_eq!(header.dump_variant, DumpVariant::Full);
        assert_eq!(header.context_record_offset, Some(offset::CONTEXT_RECORD_64));
    }

    #[test]
    fn rejects_bad_signature() {
        let buf = vec![0u8; 64];
        let window = ByteWindow::new(&buf);
        match parse(window, 64) {
            Err(DumpParseError::InvalidSignature) => {}
            other => panic!("expected InvalidSignature, got {:?}", other),
        }
    }

    #[test]
    fn short_file_falls_back_required_dump_space_to_file_size() {
        let mut buf = header_bytes_64(0x1A, [0, 0, 0, 0]);
        buf.truncate(offset::DUMP_VARIANT + 4);
        let window = ByteWindow::new(&buf);
        let header = parse(window, 12345).unwrap();
        assert_eq!(header.required_dump_space, 12345);
    }

    #[test]
    fn crash_summary_formats_parameters_and_name() {
        let buf = header_bytes_64(0xD1, [0xDEAD_BEEF, 0, 0, 0]);
        let window = ByteWindow::new(&buf);
        let header = parse(window, buf.len() as u64).unwrap();
        let summary = crash_summary(&header, "/tmp/example.dmp");
        assert_eq!(summary.bugcheck_code, "0x000000D1");
        assert_eq!(summary.bugcheck_name, "DRIVER_IRQL_NOT_LESS_OR_EQUAL");
        assert_eq!(summary.parameter1, "0x00000000DEADBEEF");
        assert_eq!(summary.file_name, "example.dmp");
    }

    #[test]
    fn format_size_thresholds() {
        assert_eq!(format_size(512), "512 bytes");
        assert_eq!(format_size(2048), "2.00 KB");
        assert_eq!(format_size(5 * 1024 * 1024), "5.00 MB");
        assert_eq!(format_size(3 * 1024 * 1024 * 1024), "3.00 GB");
    }
}
