// Copyright 2015 Ted Mielczarek. See the COPYRIGHT
// file at the top-level directory of this distribution.

//! Decoding the embedded CPU context and exception records (C3).
//!
//! Full stack walking needs debug symbols this tool never has access to;
//! what's captured here is the raw register snapshot and exception record
//! at the fixed offsets the dump header points to, nothing more.

use crate::header::DumpHeader;
use crate::reader::ByteWindow;
use kdump_common::format::offset;
use serde::Serialize;

/// The 16 general-purpose 64-bit registers plus the instruction pointer and
/// the context-flags word, as found in the embedded `CONTEXT` record.
#[derive(Clone, Debug, Serialize)]
pub struct CpuContext {
    pub context_flags: u32,
    pub rax: u64,
    pub rcx: u64,
    pub rdx: u64,
    pub rbx: u64,
    pub rsp: u64,
    pub rbp: u64,
    pub rsi: u64,
    pub rdi: u64,
    pub r8: u64,
    pub r9: u64,
    pub r10: u64,
    pub r11: u64,
    pub r12: u64,
    pub r13: u64,
    pub r14: u64,
    pub r15: u64,
    pub rip: u64,
}

/// The embedded `EXCEPTION_RECORD`, plus the well-known name resolved from
/// its code.
#[derive(Clone, Debug, Serialize)]
pub struct ExceptionRecord {
    pub code: u32,
    pub name: String,
    pub flags: u32,
    pub address: u64,
    pub parameter_count: u32,
    pub parameters: Vec<u64>,
}

/// A stack frame without symbol resolution. The core never walks the
/// stack, so `raw_frames` in [`StackTrace`] is always empty; the type
/// exists so a future stack walker has somewhere to put its output.
#[derive(Clone, Debug, Serialize)]
pub struct RawStackFrame {
    pub address: u64,
    pub return_address: u64,
    pub offset: u64,
}

/// Envelope over whatever register and exception state could be recovered.
#[derive(Clone, Debug, Serialize)]
pub struct StackTrace {
    pub context: Option<CpuContext>,
    pub exception: Option<ExceptionRecord>,
    pub raw_frames: Vec<RawStackFrame>,
    pub stack_pointer: u64,
    pub instruction_pointer: u64,
    pub note: String,
}

/// Decode the `CONTEXT` record at `header.context_record_offset`, if the
/// header has one and its flags word is non-zero.
fn parse_context(window: ByteWindow, header: &DumpHeader) -> Option<CpuContext> {
    let base = header.context_record_offset?;
    let context_flags = window.read_u32(base + offset::context::FLAGS);
    if context_flags == 0 {
        return None;
    }
    Some(CpuContext {
        context_flags,
        rax: window.read_u64(base + offset::context::RAX),
        rcx: window.read_u64(base + offset::context::RCX),
        rdx: window.read_u64(base + offset::context::RDX),
        rbx: window.read_u64(base + offset::context::RBX),
        rsp: window.read_u64(base + offset::context::RSP),
        rbp: window.read_u64(base + offset::context::RBP),
        rsi: window.read_u64(base + offset::context::RSI),
        rdi: window.read_u64(base + offset::context::RDI),
        r8: window.read_u64(base + offset::context::R8),
        r9: window.read_u64(base + offset::context::R9),
        r10: window.read_u64(base + offset::context::R10),
        r11: window.read_u64(base + offset::context::R11),
        r12: window.read_u64(base + offset::context::R12),
        r13: window.read_u64(base + offset::context::R13),
        r14: window.read_u64(base + offset::context::R14),
        r15: window.read_u64(base + offset::context::R15),
        rip: window.read_u64(base + offset::context::RIP),
    })
}

/// Decode the `EXCEPTION_RECORD` at `header.exception_record_offset`, if
/// its code is non-zero.
fn parse_exception(window: ByteWindow, header: &DumpHeader) -> Option<ExceptionRecord> {
    let base = header.exception_record_offset;
    let code = window.read_u32(base + offset::exception::CODE);
    if code == 0 {
        return None;
    }
    let flags = window.read_u32(base + offset::exception::FLAGS);
    let address = window.read_u64(base + offset::exception::ADDRESS);
    let parameter_count = window
        .read_u32(base + offset::exception::PARAMETER_COUNT)
        .min(offset::exception::MAX_PARAMETERS);
    let parameters = (0..parameter_count)
        .map(|i| window.read_u64(base + offset::exception::PARAMETERS + (i as usize) * 8))
        .collect();
    Some(ExceptionRecord {
        code,
        name: kdump_common::WellKnownException::from_code(code).name(),
        flags,
        address,
        parameter_count,
        parameters,
    })
}

/// Build the [`StackTrace`] for a header, recording in `note` exactly what
/// is and is not present.
pub fn parse(window: ByteWindow, header: &DumpHeader) -> StackTrace {
    let context = parse_context(window, header);
    let exception = parse_exception(window, header);
    log::debug!(
        "context/exception decode: has_context={} has_exception={}",
        context.is_some(),
        exception.is_some()
    );

    let stack_pointer = context.as_ref().map(|c| c.rsp).unwrap_or(0);
    let instruction_pointer = context.as_ref().map(|c| c.rip).unwrap_or(0);

    let mut note = String::new();
    if context.is_none() {
        note.push_str("Context record not found or invalid. ");
    }
    if exception.is_none() {
        note.push_str(
            "No exception record. This may be a live dump or the exception was not captured.",
        );
    } else {
        note.push_str("Full stack trace requires debug symbols (PDBs). Raw register state captured.");
    }

    StackTrace {
        context,
        exception,
        raw_frames: Vec::new(),
        stack_pointer,
        instruction_pointer,
        note,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header;

    fn header_with_context_and_exception() -> (Vec<u8>, DumpHeader) {
        let mut buf = vec![0u8; offset::CONTEXT_RECORD_64 + 0x100];
        buf[0..8].copy_from_slice(b"PAGEDU64");
        buf[offset::MACHINE_TYPE..offset::MACHINE_TYPE + 4]
            .copy_from_slice(&0x8664u32.to_le_bytes());

        let exc = offset::EXCEPTION_RECORD_64;
        buf[exc + offset::exception::CODE..exc + offset::exception::CODE + 4]
            .copy_from_slice(&0xC000_0005u32.to_le_bytes());
        buf[exc + offset::exception::ADDRESS..exc + offset::exception::ADDRESS + 8]
            .copy_from_slice(&0x1000_2000u64.to_le_bytes());
        buf[exc + offset::exception::PARAMETER_COUNT..exc + offset::exception::PARAMETER_COUNT + 4]
            .copy_from_slice(&2u32.to_le_bytes());
        buf[exc + offset::exception::PARAMETERS..exc + offset::exception::PARAMETERS + 8]
            .copy_from_slice(&1u64.to_le_bytes());
        buf[exc + offset::exception::PARAMETERS + 8..exc + offset::exception::PARAMETERS + 16]
            .copy_from_slice(&0xFFFF_0000u64.to_le_bytes());

        let ctx = offset::CONTEXT_RECORD_64;
        buf[ctx + offset::context::FLAGS..ctx + offset::context::FLAGS + 4]
            .copy_from_slice(&0x0010_0001u32.to_le_bytes());
        buf[ctx + offset::context::RIP..ctx + offset::context::RIP + 8]
            .copy_from_slice(&0xFFFF_F800_1234_5678u64.to_le_bytes());
        buf[ctx + offset::context::RSP..ctx + offset::context::RSP + 8]
            .copy_from_slice(&0xFFFF_D000_0000_1000u64.to_le_bytes());

        let window = ByteWindow::new(&buf);
        let header = header::parse(window, buf.len() as u64).unwrap();
        (buf, header)
    }

    #[test]
    fn decodes_context_and_exception() {
        let (buf, header) = header_with_context_and_exception();
        let window = ByteWindow::new(&buf);
        let trace = parse(window, &header);
        let ctx = trace.context.expect("context should be present");
        assert_eq!(ctx.rip, 0xFFFF_F800_1234_5678);
        assert_eq!(trace.stack_pointer, 0xFFFF_D000_0000_1000);

        let exc = trace.exception.expect("exception should be present");
        assert_eq!(exc.code, 0xC000_0005);
        assert_eq!(exc.name, "ACCESS_VIOLATION");
        assert_eq!(exc.parameters, vec![1, 0xFFFF_0000]);
        assert!(trace.raw_frames.is_empty());
    }

    #[test]
    fn exception_parameter_count_is_clamped() {
        let mut buf = vec![0u8; offset::CONTEXT_RECORD_64 + 0x100];
        buf[0..8].copy_from_slice(b"PAGEDU64");
        let exc = offset::EXCEPTION_RECORD_64;
        buf[exc + offset::exception::CODE..exc + offset::exception::CODE + 4]
            .copy_from_slice(&0xC000_0005u32.to_le_bytes());
        buf[exc + offset::exception::PARAMETER_COUNT..exc + offset::exception::PARAMETER_COUNT + 4]
            .copy_from_slice(&255u32.to_le_bytes());

        let window = ByteWindow::new(&buf);
        let header = header::parse(window, buf.len() as u64).unwrap();
        let trace = parse(window, &header);
        let exc = trace.exception.expect("exception should be present");
        assert_eq!(exc.parameter_count, offset::exception::MAX_PARAMETERS);
        assert_eq!(exc.parameters.len(), offset::exception::MAX_PARAMETERS as usize);
    }

    #[test]
    fn absent_context_and_exception_are_noted() {
        let mut buf = vec![0u8; offset::CONTEXT_RECORD_64 + 0x100];
        buf[0..8].copy_from_slice(b"PAGEDU64");
        let window = ByteWindow::new(&buf);
        let header = header::parse(window, buf.len() as u64).unwrap();
        let trace = parse(window, &header);
        assert!(trace.context.is_none());
        assert!(trace.exception.is_none());
        assert!(trace.note.contains("Context record not found"));
        assert!(trace.note.contains("No exception record"));
    }
}
