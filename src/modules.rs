// Copyright 2015 Ted Mielczarek. See the COPYRIGHT
// file at the top-level directory of this distribution.

//! Best-effort module scavenging (C4).
//!
//! Enumerating the real loaded-module list requires walking
//! `PsLoadedModuleList`, which lives at a virtual address that a kernel
//! dump's physical-memory layout cannot resolve without the PFN database —
//! out of scope here. What this module does instead is scan the fixed
//! header window for `.sys`-suffixed ASCII runs, the same fallback the
//! tool this was ported from uses, and classify whatever it finds against
//! built-in Microsoft/problematic driver tables.

use serde::Serialize;

/// Size of the header window scanned for driver name strings. Loaded
/// module references are sometimes visible here even though the full
/// module list is not.
const SCAN_WINDOW: usize = 8192;

/// A `.sys` name found during the scan.
#[derive(Clone, Debug, Serialize)]
pub struct ModuleReference {
    pub name: String,
    pub base_address: u64,
    pub size: u64,
    pub is_microsoft: bool,
    pub is_problematic: bool,
    pub problematic_reason: Option<String>,
}

/// Aggregated result of the scan.
#[derive(Clone, Debug, Serialize)]
pub struct ModuleSummary {
    pub total: usize,
    pub microsoft_count: usize,
    pub third_party_count: usize,
    pub problematic_count: usize,
    pub modules: Vec<ModuleReference>,
    pub problematic_modules: Vec<ModuleReference>,
    pub extraction_method: String,
    pub note: String,
}

/// Microsoft/Windows system modules that are treated as first-party by
/// name alone, independent of any path.
const KNOWN_SAFE_DRIVERS: &[&str] = &[
    "ntoskrnl.exe",
    "hal.dll",
    "ci.dll",
    "clfs.sys",
    "tm.sys",
    "ntfs.sys",
    "fltmgr.sys",
    "wdf01000.sys",
    "ksecdd.sys",
    "ndis.sys",
    "tcpip.sys",
    "netio.sys",
    "fwpkclnt.sys",
    "storport.sys",
    "spaceport.sys",
    "volmgr.sys",
    "volmgrx.sys",
    "mountmgr.sys",
    "partmgr.sys",
    "disk.sys",
    "classpnp.sys",
    "acpi.sys",
    "wmilib.sys",
    "msrpc.sys",
    "cng.sys",
    "ksecpkg.sys",
];

/// Drivers with a known history of causing or contributing to crashes,
/// and why.
const KNOWN_PROBLEMATIC_DRIVERS: &[(&str, &str)] = &[
    ("aswsp.sys", "Avast Software - may cause memory issues"),
    ("aswsnx.sys", "Avast Software - file system filter"),
    ("avgsp.sys", "AVG Antivirus - may cause conflicts"),
    ("bdvedisk.sys", "Bitdefender - virtual disk driver"),
    ("klif.sys", "Kaspersky Lab - file system filter"),
    ("tmusa.sys", "Trend Micro - may cause performance issues"),
    ("tmcomm.sys", "Trend Micro - communication driver"),
    ("nvlddmkm.sys", "NVIDIA Display Driver - common crash source"),
    ("atikmpag.sys", "AMD Display Driver - may cause TDR failures"),
    ("igdkmd64.sys", "Intel Graphics - may conflict with dedicated GPU"),
    ("amdkmdag.sys", "AMD Graphics - kernel mode driver"),
    ("e1c62x64.sys", "Intel Ethernet - may cause network issues"),
    ("rt640x64.sys", "Realtek Ethernet - may cause BSODs"),
    ("nwifi.sys", "Windows WiFi driver - rarely causes issues"),
    ("iastorv.sys", "Intel Rapid Storage - may cause disk issues"),
    ("storahci.sys", "Standard AHCI driver - check for updates"),
    ("nvme.sys", "NVMe controller driver"),
    ("mrvldev0.sys", "Marvell storage - known for issues"),
    ("cpuz.sys", "CPU-Z driver - can cause issues"),
    ("rtcore64.sys", "MSI Afterburner - known vulnerability"),
    ("asmtxhci.sys", "ASMedia USB 3.0 - may cause USB issues"),
    ("asustp.sys", "ASUS driver - check for updates"),
    ("ene.sys", "MSI/RGB software - known issues"),
    ("wintap.sys", "VPN/Firewall software"),
    ("vboxdrv.sys", "VirtualBox - may conflict with Hyper-V"),
    ("vmci.sys", "VMware - virtualization driver"),
    ("vmx86.sys", "VMware Workstation driver"),
    ("nahimicservice.sys", "Nahimic audio - known for conflicts"),
    ("a2dpsrv.sys", "A-Volute - Sonic Studio, causes issues"),
];

fn classify(name: &str) -> (bool, bool, Option<String>) {
    let lower = name.to_lowercase();
    let is_microsoft = KNOWN_SAFE_DRIVERS.contains(&lower.as_str());
    let reason = KNOWN_PROBLEMATIC_DRIVERS
        .iter()
        .find(|(n, _)| *n == lower)
        .map(|(_, reason)| reason.to_string());
    (is_microsoft, reason.is_some(), reason)
}

fn is_name_char(b: u8) -> bool {
    (0x20..0x7F).contains(&b)
}

/// Scan `data` for ASCII runs ending in `.sys`, deduplicating by name.
fn scan_for_sys_names(data: &[u8]) -> Vec<String> {
    let mut names = Vec::new();
    let mut seen = std::collections::HashSet::new();
    let mut i = 0;
    while i + 4 <= data.len() {
        if &data[i..i + 4] == b".sys" {
            let mut start = i;
            while start > 0 && is_name_char(data[start - 1]) {
                start -= 1;
            }
            if i - start >= 3 {
                if let Ok(name) = std::str::from_utf8(&data[start..i + 4]) {
                    if !name.starts_with('.') && seen.insert(name.to_string()) {
                        names.push(name.to_string());
                    }
                }
            }
        }
        i += 1;
    }
    names
}

/// Scan the first [`SCAN_WINDOW`] bytes of `data` for driver-name strings
/// and classify what is found.
pub fn scan(data: &[u8]) -> ModuleSummary {
    let window = &data[..data.len().min(SCAN_WINDOW)];
    let names = scan_for_sys_names(window);
    log::debug!("module scavenger scanned {} bytes, found {} names", window.len(), names.len());

    if names.is_empty() {
        return ModuleSummary {
            total: 0,
            microsoft_count: 0,
            third_party_count: 0,
            problematic_count: 0,
            modules: Vec::new(),
            problematic_modules: Vec::new(),
            extraction_method: "string_scan".to_string(),
            note: "No drivers found in header. Full driver list requires loading the module \
                   database from the dump, which needs virtual address translation. For \
                   complete driver info, use the 'lm' command in WinDbg."
                .to_string(),
        };
    }

    let modules: Vec<ModuleReference> = names
        .into_iter()
        .map(|name| {
            let (is_microsoft, is_problematic, problematic_reason) = classify(&name);
            ModuleReference {
                name,
                base_address: 0,
                size: 0,
                is_microsoft,
                is_problematic,
                problematic_reason,
            }
        })
        .collect();

    let microsoft_count = modules.iter().filter(|m| m.is_microsoft).count();
    let problematic_modules: Vec<ModuleReference> = modules
        .iter()
        .filter(|m| m.is_problematic)
        .cloned()
        .collect();

    ModuleSummary {
        total: modules.len(),
        microsoft_count,
        third_party_count: modules.len() - microsoft_count,
        problematic_count: problematic_modules.len(),
        note: format!(
            "Found {} driver references. For complete driver listing with addresses and \
             versions, analyze with WinDbg.",
            modules.len()
        ),
        modules,
        problematic_modules,
        extraction_method: "string_scan".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_known_problematic_driver() {
        let mut data = vec![b' '; 64];
        data.extend_from_slice(b"nvlddmkm.sys");
        data.extend_from_slice(&[b' '; 64]);
        let summary = scan(&data);
        assert_eq!(summary.total, 1);
        assert_eq!(summary.modules[0].name, "nvlddmkm.sys");
        assert!(summary.modules[0].is_problematic);
        assert_eq!(summary.problematic_count, 1);
    }

    #[test]
    fn classifies_microsoft_driver_as_safe() {
        let mut data = vec![b' '; 16];
        data.extend_from_slice(b"ntfs.sys");
        let summary = scan(&data);
        assert_eq!(summary.microsoft_count, 1);
        assert_eq!(summary.third_party_count, 0);
        assert!(!summary.modules[0].is_problematic);
    }

    #[test]
    fn empty_scan_reports_string_scan_method_and_note() {
        let data = vec![0u8; 256];
        let summary = scan(&data);
        assert_eq!(summary.total, 0);
        assert_eq!(summary.extraction_method, "string_scan");
        assert!(summary.note.contains("No drivers found"));
    }

    #[test]
    fn deduplicates_repeated_names() {
        let mut data = Vec::new();
        data.extend_from_slice(b"storport.sys");
        data.extend_from_slice(&[0u8; 8]);
        data.extend_from_slice(b"storport.sys");
        let summary = scan(&data);
        assert_eq!(summary.total, 1);
    }

    #[test]
    fn only_scans_first_window() {
        let mut data = vec![0u8; SCAN_WINDOW + 100];
        data.extend_from_slice(b"toolate.sys");
        let summary = scan(&data);
        assert_eq!(summary.total, 0);
    }
}
