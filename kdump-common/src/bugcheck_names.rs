//! The one piece of bug-check knowledge shared by both the header decoder
//! (which needs a name for `CrashSummary`) and the bug-check catalogue in
//! `kdump-processor` (which needs the same name plus a great deal more).
//!
//! Splitting this out here — rather than putting it in `kdump-processor`
//! alongside the rest of the catalogue — avoids a dependency cycle: the
//! header decoder in `kdump` needs a bug-check name before `kdump-processor`
//! (which depends on `kdump`) ever runs.

/// Exact lookup table from numeric bug-check code to canonical name.
///
/// Misses are not represented here; callers use [`name`], which supplies
/// the `UNKNOWN_BUGCHECK_0x...` fallback.
fn lookup(code: u32) -> Option<&'static str> {
    Some(match code {
        0x0000_0001 => "APC_INDEX_MISMATCH",
        0x0000_000A => "IRQL_NOT_LESS_OR_EQUAL",
        0x0000_001A => "MEMORY_MANAGEMENT",
        0x0000_001E => "KMODE_EXCEPTION_NOT_HANDLED",
        0x0000_0024 => "NTFS_FILE_SYSTEM",
        0x0000_002E => "DATA_BUS_ERROR",
        0x0000_003B => "SYSTEM_SERVICE_EXCEPTION",
        0x0000_003F => "NO_MORE_SYSTEM_PTES",
        0x0000_0050 => "PAGE_FAULT_IN_NONPAGED_AREA",
        0x0000_007A => "KERNEL_DATA_INPAGE_ERROR",
        0x0000_007E => "SYSTEM_THREAD_EXCEPTION_NOT_HANDLED",
        0x0000_007F => "UNEXPECTED_KERNEL_MODE_TRAP",
        0x0000_008E => "KERNEL_MODE_EXCEPTION_NOT_HANDLED",
        0x0000_009C => "MACHINE_CHECK_EXCEPTION",
        0x0000_009F => "DRIVER_POWER_STATE_FAILURE",
        0x0000_00A0 => "INTERNAL_POWER_ERROR",
        0x0000_00BE => "ATTEMPTED_WRITE_TO_READONLY_MEMORY",
        0x0000_00C2 => "BAD_POOL_CALLER",
        0x0000_00C4 => "DRIVER_VERIFIER_DETECTED_VIOLATION",
        0x0000_00C5 => "DRIVER_CORRUPTED_EXPOOL",
        0x0000_00D1 => "DRIVER_IRQL_NOT_LESS_OR_EQUAL",
        0x0000_00D8 => "DRIVER_USED_EXCESSIVE_PTES",
        0x0000_00EA => "THREAD_STUCK_IN_DEVICE_DRIVER",
        0x0000_00ED => "UNMOUNTABLE_BOOT_VOLUME",
        0x0000_00EF => "CRITICAL_PROCESS_DIED",
        0x0000_00F4 => "CRITICAL_OBJECT_TERMINATION",
        0x0000_00FC => "ATTEMPTED_EXECUTE_OF_NOEXECUTE_MEMORY",
        0x0000_00FE => "BUGCODE_USB_DRIVER",
        0x0000_0101 => "CLOCK_WATCHDOG_TIMEOUT",
        0x0000_0109 => "CRITICAL_STRUCTURE_CORRUPTION",
        0x0000_0116 => "VIDEO_TDR_FAILURE",
        0x0000_0119 => "VIDEO_SCHEDULER_INTERNAL_ERROR",
        0x0000_011A => "VIDEO_SHADOW_DRIVER_FATAL_ERROR",
        0x0000_011B => "DRIVER_RETURNED_HOLDING_CANCEL_LOCK",
        0x0000_0124 => "WHEA_UNCORRECTABLE_ERROR",
        0x0000_0133 => "DPC_WATCHDOG_TIMEOUT",
        0x0000_0139 => "KERNEL_SECURITY_CHECK_FAILURE",
        0x0000_013A => "KERNEL_MODE_HEAP_CORRUPTION",
        0x0000_0154 => "UNEXPECTED_STORE_EXCEPTION",
        0x0000_015F => "CONNECTED_STANDBY_WATCHDOG_TIMEOUT",
        0x0000_0187 => "VIDEO_DWMINIT_TIMEOUT_FALLBACK_BDD",
        0x0000_0189 => "BAD_OBJECT_HEADER",
        0x0000_018B => "SECURE_FAULT_UNHANDLED",
        0x0000_018E => "KERNEL_PARTITION_REFERENCE_VIOLATION",
        0x0000_01C4 => "DRIVER_VERIFIER_DETECTED_VIOLATION_LIVEDUMP",
        0x0000_01C6 => "FAST_ERESOURCE_PRECONDITION_VIOLATION",
        0x0000_01C7 => "STORE_DATA_STRUCTURE_CORRUPTION",
        0x0000_01CA => "SYNTHETIC_WATCHDOG_TIMEOUT",
        0x0000_01CF => "HARDWARE_WATCHDOG_TIMEOUT",
        0x0000_01D2 => "WORKER_THREAD_INVALID_STATE",
        0x0000_01D5 => "DRIVER_PNP_WATCHDOG",
        0x0000_01DB => "IPI_WATCHDOG_TIMEOUT",
        _ => return None,
    })
}

/// Canonical ten-character form: `0x` followed by eight uppercase hex
/// digits, zero-padded. Total for every `u32`, by construction.
pub fn format_code(code: u32) -> String {
    format!("0x{:08X}", code)
}

/// Canonical name for a bug-check code, falling back to
/// `UNKNOWN_BUGCHECK_0xXXXXXXXX` for codes not in the table.
pub fn name(code: u32) -> String {
    match lookup(code) {
        Some(n) => n.to_string(),
        None => format!("UNKNOWN_BUGCHECK_{}", format_code(code)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_code_resolves() {
        assert_eq!(name(0x1A), "MEMORY_MANAGEMENT");
        assert_eq!(name(0xD1), "DRIVER_IRQL_NOT_LESS_OR_EQUAL");
    }

    #[test]
    fn unknown_code_falls_back() {
        assert_eq!(name(0xDEAD_BEEF), "UNKNOWN_BUGCHECK_0xDEADBEEF");
    }

    #[test]
    fn format_code_is_always_ten_chars() {
        for code in [0u32, 1, 0xD1, 0xFFFF_FFFF] {
            let s = format_code(code);
            assert_eq!(s.len(), 10);
            assert!(s.starts_with("0x"));
            assert!(s[2..].chars().all(|c| c.is_ascii_hexdigit()));
        }
    }
}
