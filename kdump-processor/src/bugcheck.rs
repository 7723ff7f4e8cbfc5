// Copyright 2015 Ted Mielczarek. See the COPYRIGHT
// file at the top-level directory of this distribution.

//! The bug-check catalogue (C5): category, severity, likely causes,
//! recommendations and per-parameter interpretation for a numeric stop
//! code.
//!
//! The catalogue always produces a [`BugCheckAnalysis`], even for a code
//! it has never seen before — only the code-specific tables fall back to
//! generic text; the code, its hex form and the four parameters are
//! always echoed back verbatim.

use serde::Serialize;

/// One of the four raw bug-check parameters, with whatever semantic
/// description and value-specific interpretation the catalogue has for it.
#[derive(Clone, Debug, Serialize)]
pub struct ParameterAnalysis {
    pub parameter_number: u32,
    pub raw_value: u64,
    pub hex_value: String,
    pub description: String,
    pub interpretation: Option<String>,
}

/// Complete analysis of a single bug-check code and its parameters.
#[derive(Clone, Debug, Serialize)]
pub struct BugCheckAnalysis {
    pub code: u32,
    pub code_hex: String,
    pub name: String,
    pub category: String,
    pub severity: String,
    pub description: String,
    pub parameters: Vec<ParameterAnalysis>,
    pub likely_causes: Vec<String>,
    pub recommendations: Vec<String>,
}

/// `(category, member codes)`. A code that appears in more than one entry
/// resolves to the first match, same as the table this was ported from.
const CATEGORIES: &[(&str, &[u32])] = &[
    ("Memory Corruption", &[0x1A, 0x50, 0x7A, 0xC2, 0xC5, 0xFC]),
    ("Driver Issues", &[0xD1, 0xD3, 0xD8, 0xC4, 0x9F, 0x116]),
    ("Hardware Failure", &[0x7F, 0x124, 0x9C]),
    ("Process/Thread", &[0xEF, 0x139, 0xF4]),
    ("File System", &[0x24, 0x77]),
    ("Power Management", &[0x9F, 0xA0]),
    ("Security", &[0x139]),
    ("Graphics/Display", &[0x116, 0x119]),
    ("General Exception", &[0x1E, 0x7E, 0x8E]),
];

fn category(code: u32) -> String {
    for (name, codes) in CATEGORIES {
        if codes.contains(&code) {
            return name.to_string();
        }
    }
    "Other".to_string()
}

fn severity(code: u32) -> &'static str {
    const CRITICAL: &[u32] = &[0xEF, 0x139, 0x7F, 0x124, 0x50];
    const HIGH: &[u32] = &[0xD1, 0x1A, 0x7E, 0x1E, 0xC4];
    if CRITICAL.contains(&code) {
        "Critical"
    } else if HIGH.contains(&code) {
        "High"
    } else {
        "Medium"
    }
}

fn description(code: u32) -> String {
    match code {
        0x1A => "The memory manager has detected a memory corruption issue.",
        0x1E => "A kernel-mode program generated an exception that wasn't caught.",
        0x50 => "The system tried to access invalid memory (page fault).",
        0x7E => "A system thread generated an exception that wasn't handled.",
        0x7F => "The CPU generated an unexpected trap (processor exception).",
        0x9F => "A driver is in an inconsistent or invalid power state.",
        0xA0 => "The power policy manager experienced a fatal error.",
        0xD1 => "A driver accessed paged memory at an improper IRQL level.",
        0xEF => "A critical system process died unexpectedly.",
        0x116 => "The display driver failed to respond in the allowed time.",
        0x139 => "The kernel detected security violations (buffer overflow/stack corruption).",
        0x154 => "An unexpected store exception occurred.",
        0xC2 => "A caller with pool responsibility passed bad parameters.",
        0xC4 => "Driver Verifier detected a driver violation.",
        0xFC => "Attempt to execute non-executable memory.",
        other => {
            return format!(
                "System stop error occurred with code {}",
                kdump_common::bugcheck_names::format_code(other)
            )
        }
    }
    .to_string()
}

fn likely_causes(code: u32) -> Vec<String> {
    let causes: &[&str] = match code {
        0x1A => &[
            "Faulty RAM or memory hardware",
            "Corrupted memory due to driver bug",
            "Overclocked memory causing instability",
            "Damaged system files",
        ],
        0x1E => &[
            "Incompatible or buggy driver",
            "Faulty hardware",
            "Software conflict",
        ],
        0x50 => &[
            "Faulty driver accessing invalid memory",
            "Defective RAM",
            "Antivirus software conflict",
            "Corrupted system files",
        ],
        0x7E => &[
            "System thread generated an unhandled exception",
            "Driver compatibility issue",
            "Corrupted system files",
        ],
        0x7F => &[
            "Hardware failure (memory, CPU)",
            "Kernel stack overflow",
            "Driver bug",
        ],
        0x9F => &[
            "Driver failed to complete a power IRP",
            "Incompatible power management driver",
            "Hardware device not responding",
        ],
        0xD1 => &[
            "Driver accessing pageable memory at high IRQL",
            "Driver bug (most common)",
            "Faulty driver installation",
        ],
        0xEF => &[
            "Critical system process terminated unexpectedly",
            "Corrupted system files",
            "Failed system update",
            "Hardware failure",
        ],
        0x116 => &[
            "Graphics driver failed to respond",
            "Overheating GPU",
            "Outdated graphics drivers",
            "Faulty graphics card",
        ],
        0x139 => &[
            "Buffer overflow detected in kernel",
            "Stack corruption",
            "Malware or security compromise",
        ],
        _ => &[
            "Driver compatibility issue",
            "Hardware malfunction",
            "Corrupted system files",
        ],
    };
    causes.iter().map(|s| s.to_string()).collect()
}

fn recommendations(code: u32) -> Vec<String> {
    let recs: &[&str] = match code {
        0x1A => &[
            "Run Windows Memory Diagnostic (mdsched.exe)",
            "Check for driver updates",
            "Run System File Checker (sfc /scannow)",
            "Check for overclocking and reset to defaults",
        ],
        0x50 => &[
            "Run Windows Memory Diagnostic",
            "Update all drivers especially graphics and storage",
            "Temporarily disable antivirus to test",
            "Run chkdsk to check disk health",
        ],
        0xD1 => &[
            "Update the driver mentioned in the crash",
            "Use Driver Verifier to identify problematic driver",
            "Roll back recent driver updates",
        ],
        0xEF => &[
            "Run System File Checker (sfc /scannow)",
            "Run DISM /Online /Cleanup-Image /RestoreHealth",
            "Check disk health with chkdsk",
            "Consider system restore to earlier point",
        ],
        0x116 => &[
            "Update graphics drivers",
            "Check GPU temperature and cooling",
            "Reduce graphics settings in games/apps",
            "Clean GPU and improve ventilation",
        ],
        0x139 => &[
            "Scan for malware with Windows Defender",
            "Run System File Checker",
            "Update Windows to latest version",
        ],
        _ => &[
            "Update all drivers to latest versions",
            "Run System File Checker (sfc /scannow)",
            "Check Windows Event Viewer for more details",
            "Run Windows Memory Diagnostic",
        ],
    };
    recs.iter().map(|s| s.to_string()).collect()
}

/// `(bugcheck code, param number 1-4) -> description`, for the codes this
/// catalogue knows parameter semantics for. Codes absent from this table
/// get a generic `"Bugcheck parameter N"` description.
fn param_description(code: u32, param_num: u32) -> String {
    let table: &[(u32, &str)] = match code {
        0x1A => &[
            (1, "Memory management subtype code"),
            (2, "Address that caused the problem"),
            (3, "PFN of the corrupted page (if applicable)"),
            (4, "Reserved / Additional context"),
        ],
        0x1E => &[
            (1, "Exception code (NTSTATUS)"),
            (2, "Address where exception occurred"),
            (3, "First exception parameter"),
            (4, "Second exception parameter"),
        ],
        0x50 => &[
            (1, "Address referenced causing the fault"),
            (2, "0 = read, 1 = write, 2 = execute, 8 = execute"),
            (3, "Address that referenced the bad memory"),
            (4, "Type of read: 0 = read, 2 = execute"),
        ],
        0x7E => &[
            (1, "Exception code (NTSTATUS)"),
            (2, "Address where exception occurred"),
            (3, "Exception record address"),
            (4, "Context record address"),
        ],
        0x7F => &[
            (1, "Trap number (x86/x64 processor exception)"),
            (2, "Reserved"),
            (3, "Reserved"),
            (4, "Reserved"),
        ],
        0x9F => &[
            (1, "Subtype of power failure"),
            (2, "Address of the device object"),
            (3, "Address of the driver object"),
            (4, "Reserved (depends on subtype)"),
        ],
        0xA0 => &[
            (1, "Subtype of internal power error"),
            (2, "Additional info (subtype-dependent)"),
            (3, "Additional info (subtype-dependent)"),
            (4, "Additional info (subtype-dependent)"),
        ],
        0xD1 => &[
            (1, "Memory address referenced"),
            (2, "IRQL at time of reference"),
            (3, "0 = read, 1 = write"),
            (4, "Address of instruction that referenced memory"),
        ],
        0xEF => &[
            (1, "Process object address"),
            (2, "If 0 = process terminated, if 1 = thread terminated"),
            (3, "Reserved"),
            (4, "Reserved"),
        ],
        0x116 => &[
            (1, "Pointer to internal TDR recovery context"),
            (2, "Pointer to responsible device driver module"),
            (3, "Error code of last failed operation"),
            (4, "Internal context dependent data"),
        ],
        0x139 => &[
            (1, "Security cookie failure type"),
            (2, "Address of trap frame / exception record"),
            (3, "Address of context record"),
            (4, "Reserved"),
        ],
        0x154 => &[
            (1, "Exception record address"),
            (2, "Context record address"),
            (3, "Exception code"),
            (4, "Reserved"),
        ],
        0x1CA => &[
            (1, "Timeout count"),
            (2, "Process object (if applicable)"),
            (3, "Thread object (if applicable)"),
            (4, "Additional context"),
        ],
        0xC2 => &[
            (1, "Type of pool corruption"),
            (2, "Depends on parameter 1"),
            (3, "Depends on parameter 1"),
            (4, "Depends on parameter 1"),
        ],
        0xC4 => &[
            (1, "Subtype of driver verifier violation"),
            (2, "Address of driver with the violation"),
            (3, "Violation-specific parameter"),
            (4, "Violation-specific parameter"),
        ],
        0xFC => &[
            (1, "Address being executed"),
            (2, "PTE contents"),
            (3, "Reserved"),
            (4, "Reserved"),
        ],
        _ => &[],
    };
    table
        .iter()
        .find(|(n, _)| *n == param_num)
        .map(|(_, desc)| desc.to_string())
        .unwrap_or_else(|| format!("Bugcheck parameter {}", param_num))
}

/// Value at `0x00041284` and similar in `MEMORY_MANAGEMENT`'s first
/// parameter: what kind of memory-manager corruption was detected.
fn memory_management_subtype(value: u64) -> Option<&'static str> {
    Some(match value {
        0x0004_1284 => "A page that should have been filled with zeros was not.",
        0x0004_1285 => "A PTE has been corrupted.",
        0x0004_1286 => "A page table page has been corrupted.",
        0x0004_1287 => "A PFN list head has been corrupted.",
        0x0004_1790 => "The page frame number list is corrupt.",
        0x0004_1792 => "A PTE or the PFN is corrupted.",
        0x0004_1793 => "A page table has been corrupted.",
        0x0004_1794 => "An illegal PFN was used.",
        0x0006_1940 => "An allocation that should have been pageable was not.",
        0x0006_1941 => "A free happened on bad pool.",
        0x0006_1946 => "A corrupted page table was detected.",
        _ => return None,
    })
}

/// x86/x64 trap numbers, for `UNEXPECTED_KERNEL_MODE_TRAP`'s first
/// parameter.
fn trap_number(value: u64) -> Option<&'static str> {
    Some(match value {
        0x00 => "Divide Error",
        0x01 => "Debug Exception",
        0x02 => "NMI Interrupt",
        0x03 => "Breakpoint",
        0x04 => "Overflow",
        0x05 => "Bound Range Exceeded",
        0x06 => "Invalid Opcode",
        0x07 => "Device Not Available (No Math Coprocessor)",
        0x08 => "Double Fault",
        0x09 => "Coprocessor Segment Overrun",
        0x0A => "Invalid TSS",
        0x0B => "Segment Not Present",
        0x0C => "Stack Segment Fault",
        0x0D => "General Protection Fault",
        0x0E => "Page Fault",
        0x10 => "x87 Floating-Point Error",
        0x11 => "Alignment Check",
        0x12 => "Machine Check",
        0x13 => "SIMD Floating-Point Exception",
        _ => return None,
    })
}

fn interpret_parameter(code: u32, param_num: u32, value: u64) -> Option<String> {
    match (code, param_num) {
        (0x1A, 1) => memory_management_subtype(value).map(str::to_string),
        (0x7F, 1) => trap_number(value).map(str::to_string),
        (0x50, 2) => match value {
            0 => Some("Read operation".to_string()),
            1 => Some("Write operation".to_string()),
            2 | 8 => Some("Execute operation".to_string()),
            _ => None,
        },
        (0xD1, 3) => match value {
            0 => Some("Read operation".to_string()),
            1 => Some("Write operation".to_string()),
            _ => None,
        },
        _ => None,
    }
}

/// Analyze a bug-check code and its four parameters.
pub fn analyze(code: u32, parameters: [u64; 4]) -> BugCheckAnalysis {
    let analyzed_parameters = parameters
        .iter()
        .enumerate()
        .map(|(i, &value)| {
            let parameter_number = (i + 1) as u32;
            ParameterAnalysis {
                parameter_number,
                raw_value: value,
                hex_value: format!("0x{:016X}", value),
                description: param_description(code, parameter_number),
                interpretation: interpret_parameter(code, parameter_number, value),
            }
        })
        .collect();

    BugCheckAnalysis {
        code,
        code_hex: kdump_common::bugcheck_names::format_code(code),
        name: kdump_common::bugcheck_names::name(code),
        category: category(code),
        severity: severity(code).to_string(),
        description: description(code),
        parameters: analyzed_parameters,
        likely_causes: likely_causes(code),
        recommendations: recommendations(code),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_code_resolves_category_and_severity() {
        let analysis = analyze(0xD1, [0x1000, 2, 1, 0xFFFF_F800_0000_0000]);
        assert_eq!(analysis.name, "DRIVER_IRQL_NOT_LESS_OR_EQUAL");
        assert_eq!(analysis.category, "Driver Issues");
        assert_eq!(analysis.severity, "High");
        assert_eq!(
            analysis.parameters[2].interpretation.as_deref(),
            Some("Write operation")
        );
    }

    #[test]
    fn unknown_code_still_produces_generic_analysis() {
        let analysis = analyze(0xDEAD_BEEF, [1, 2, 3, 4]);
        assert_eq!(analysis.category, "Other");
        assert_eq!(analysis.severity, "Medium");
        assert_eq!(analysis.parameters.len(), 4);
        assert!(analysis.description.contains("0xDEADBEEF"));
    }

    #[test]
    fn memory_management_subtype_interpreted() {
        let analysis = analyze(0x1A, [0x0004_1284, 0, 0, 0]);
        assert_eq!(
            analysis.parameters[0].interpretation.as_deref(),
            Some("A page that should have been filled with zeros was not.")
        );
    }

    #[test]
    fn trap_number_interpreted() {
        let analysis = analyze(0x7F, [0x0D, 0, 0, 0]);
        assert_eq!(
            analysis.parameters[0].interpretation.as_deref(),
            Some("General Protection Fault")
        );
    }

    #[test]
    fn hex_strings_round_trip_to_the_original_values() {
        for (code, params) in [
            (0x1Au32, [0x0004_1790u64, 0, 0, 0]),
            (0xD1, [0x1000, 2, 1, 0xFFFF_F800_0000_0000]),
            (0xDEAD_BEEF, [1, 2, 3, 4]),
        ] {
            let analysis = analyze(code, params);
            let code_back = u32::from_str_radix(analysis.code_hex.trim_start_matches("0x"), 16)
                .expect("code_hex should be valid hex");
            assert_eq!(code_back, code);
            for (param, expected) in analysis.parameters.iter().zip(params.iter()) {
                let value_back =
                    u64::from_str_radix(param.hex_value.trim_start_matches("0x"), 16)
                        .expect("hex_value should be valid hex");
                assert_eq!(value_back, *expected);
            }
        }
    }
}
