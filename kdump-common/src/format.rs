//! On-disk constants for the `_DUMP_HEADER`/`_DUMP_HEADER64` layout used by
//! Windows kernel crash dumps, plus the small enumerations decoded from it.
//!
//! Offsets are taken directly from the field table documented for this
//! format; see the crate-level docs of `kdump` for the narrative version.

use enum_primitive_derive::Primitive;
use num_traits::FromPrimitive;

/// First 8 bytes of a 64-bit dump file: ASCII `PAGEDU64`.
pub const SIGNATURE_64BIT: [u8; 8] = *b"PAGEDU64";
/// First 8 bytes of a 32-bit dump file: ASCII `PAGEDUMP`.
pub const SIGNATURE_32BIT: [u8; 8] = *b"PAGEDUMP";

/// Offsets within `_DUMP_HEADER64` (and, where noted, `_DUMP_HEADER`).
pub mod offset {
    /// 4 ASCII bytes, shared by both variants.
    pub const SIGNATURE: usize = 0x000;
    /// 4 ASCII bytes, shared by both variants.
    pub const VALID_MARKER: usize = 0x004;
    pub const MAJOR_VERSION: usize = 0x008;
    pub const MINOR_VERSION: usize = 0x00C;
    pub const MACHINE_TYPE: usize = 0x030;
    pub const PROCESSOR_COUNT: usize = 0x034;
    pub const BUGCHECK_CODE: usize = 0x038;

    /// 64-bit variant: four `u64` bug-check parameters.
    pub const BUGCHECK_PARAM_64: [usize; 4] = [0x040, 0x048, 0x050, 0x058];
    /// 32-bit variant: four `u32` bug-check parameters.
    pub const BUGCHECK_PARAM_32: [usize; 4] = [0x001C, 0x0020, 0x0024, 0x0028];

    pub const EXCEPTION_RECORD_64: usize = 0x348;
    pub const CONTEXT_RECORD_64: usize = 0x408;
    pub const EXCEPTION_RECORD_32: usize = 0x07D0;
    pub const PHYSICAL_MEMORY_BLOCK_64: usize = 0x0088;
    pub const PHYSICAL_MEMORY_BLOCK_32: usize = 0x0064;

    pub const DUMP_VARIANT: usize = 0xF98;
    pub const SYSTEM_TIME: usize = 0xFA0;
    pub const REQUIRED_DUMP_SPACE: usize = 0x1028;

    /// Offsets relative to the start of the embedded CPU context record.
    pub mod context {
        pub const FLAGS: usize = 0x30;
        pub const RAX: usize = 0x78;
        pub const RCX: usize = 0x80;
        pub const RDX: usize = 0x88;
        pub const RBX: usize = 0x90;
        pub const RSP: usize = 0x98;
        pub const RBP: usize = 0xA0;
        pub const RSI: usize = 0xA8;
        pub const RDI: usize = 0xB0;
        pub const R8: usize = 0xB8;
        pub const R9: usize = 0xC0;
        pub const R10: usize = 0xC8;
        pub const R11: usize = 0xD0;
        pub const R12: usize = 0xD8;
        pub const R13: usize = 0xE0;
        pub const R14: usize = 0xE8;
        pub const R15: usize = 0xF0;
        pub const RIP: usize = 0xF8;
    }

    /// Offsets relative to the start of the embedded exception record.
    pub mod exception {
        pub const CODE: usize = 0x00;
        pub const FLAGS: usize = 0x04;
        pub const RECORD_PTR: usize = 0x08;
        pub const ADDRESS: usize = 0x10;
        pub const PARAMETER_COUNT: usize = 0x18;
        pub const PARAMETERS: usize = 0x20;
        /// Maximum number of exception parameters the on-disk format allows.
        pub const MAX_PARAMETERS: u32 = 15;
    }
}

/// Processor architecture the dump was taken on.
///
/// Unrecognized values decode to `Unknown` rather than failing the parse;
/// the raw word is not otherwise retained.
#[derive(Primitive, Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum MachineType {
    X86 = 0x014C,
    X64 = 0x8664,
    Arm32 = 0x01C0,
    Arm64 = 0xAA64,
    Unknown = 0xFFFF_FFFF,
}

impl MachineType {
    pub fn from_raw(raw: u32) -> MachineType {
        MachineType::from_u32(raw).unwrap_or(MachineType::Unknown)
    }

    /// Human-readable name used in `SystemInfo`.
    pub fn display_name(self) -> &'static str {
        match self {
            MachineType::X86 => "x86 (32-bit)",
            MachineType::X64 => "x64 (64-bit)",
            MachineType::Arm32 => "ARM (32-bit)",
            MachineType::Arm64 => "ARM64 (64-bit)",
            MachineType::Unknown => "Unknown",
        }
    }
}

/// Shape of the on-disk crash artifact.
#[derive(Primitive, Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum DumpVariant {
    Full = 1,
    Kernel = 2,
    Bitmap = 3,
    Mini = 4,
    Live = 5,
    Unknown = 0xFFFF_FFFF,
}

impl DumpVariant {
    pub fn from_raw(raw: u32) -> DumpVariant {
        DumpVariant::from_u32(raw).unwrap_or(DumpVariant::Unknown)
    }

    pub fn display_name(self) -> &'static str {
        match self {
            DumpVariant::Full => "Full Memory Dump",
            DumpVariant::Kernel => "Kernel Memory Dump",
            DumpVariant::Bitmap => "Bitmap Dump",
            DumpVariant::Mini => "Small Memory Dump (Minidump)",
            DumpVariant::Live => "Live Dump",
            DumpVariant::Unknown => "Unknown",
        }
    }
}

bitflags::bitflags! {
    /// The `ContextFlags` word of the embedded `CONTEXT` record.
    ///
    /// The decoder only cares whether this word is zero (context absent) or
    /// not, but the individual bits are real Windows `CONTEXT` flag values
    /// and are exposed for callers that want finer detail.
    pub struct ContextFlags: u32 {
        const CONTROL          = 0x0010_0001;
        const INTEGER          = 0x0010_0002;
        const SEGMENTS         = 0x0010_0004;
        const FLOATING_POINT   = 0x0010_0008;
        const DEBUG_REGISTERS  = 0x0010_0010;
    }
}

/// Well-known NTSTATUS exception codes that may appear in the embedded
/// exception record. Anything else decodes to `Unknown`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum WellKnownException {
    AccessViolation,
    IllegalInstruction,
    NoncontinuableException,
    InvalidDisposition,
    ArrayBoundsExceeded,
    FloatDenormalOperand,
    FloatDivideByZero,
    FloatInexactResult,
    FloatInvalidOperation,
    FloatOverflow,
    FloatStackCheck,
    FloatUnderflow,
    IntegerDivideByZero,
    IntegerOverflow,
    PrivilegedInstruction,
    StackOverflow,
    StackBufferOverrun,
    AssertionFailure,
    Breakpoint,
    SingleStep,
    Unknown(u32),
}

impl WellKnownException {
    pub fn from_code(code: u32) -> WellKnownException {
        use WellKnownException::*;
        match code {
            0xC0000005 => AccessViolation,
            0xC000001D => IllegalInstruction,
            0xC0000025 => NoncontinuableException,
            0xC0000026 => InvalidDisposition,
            0xC000008C => ArrayBoundsExceeded,
            0xC000008D => FloatDenormalOperand,
            0xC000008E => FloatDivideByZero,
            0xC000008F => FloatInexactResult,
            0xC0000090 => FloatInvalidOperation,
            0xC0000091 => FloatOverflow,
            0xC0000092 => FloatStackCheck,
            0xC0000093 => FloatUnderflow,
            0xC0000094 => IntegerDivideByZero,
            0xC0000095 => IntegerOverflow,
            0xC0000096 => PrivilegedInstruction,
            0xC00000FD => StackOverflow,
            0xC0000409 => StackBufferOverrun,
            0xC0000420 => AssertionFailure,
            0x80000003 => Breakpoint,
            0x80000004 => SingleStep,
            other => Unknown(other),
        }
    }

    pub fn name(self) -> String {
        use WellKnownException::*;
        match self {
            AccessViolation => "ACCESS_VIOLATION".to_string(),
            IllegalInstruction => "ILLEGAL_INSTRUCTION".to_string(),
            NoncontinuableException => "NONCONTINUABLE_EXCEPTION".to_string(),
            InvalidDisposition => "INVALID_DISPOSITION".to_string(),
            ArrayBoundsExceeded => "ARRAY_BOUNDS_EXCEEDED".to_string(),
            FloatDenormalOperand => "FLOAT_DENORMAL_OPERAND".to_string(),
            FloatDivideByZero => "FLOAT_DIVIDE_BY_ZERO".to_string(),
            FloatInexactResult => "FLOAT_INEXACT_RESULT".to_string(),
            FloatInvalidOperation => "FLOAT_INVALID_OPERATION".to_string(),
            FloatOverflow => "FLOAT_OVERFLOW".to_string(),
            FloatStackCheck => "FLOAT_STACK_CHECK".to_string(),
            FloatUnderflow => "FLOAT_UNDERFLOW".to_string(),
            IntegerDivideByZero => "INTEGER_DIVIDE_BY_ZERO".to_string(),
            IntegerOverflow => "INTEGER_OVERFLOW".to_string(),
            PrivilegedInstruction => "PRIVILEGED_INSTRUCTION".to_string(),
            StackOverflow => "STACK_OVERFLOW".to_string(),
            StackBufferOverrun => "STACK_BUFFER_OVERRUN".to_string(),
            AssertionFailure => "ASSERTION_FAILURE".to_string(),
            Breakpoint => "BREAKPOINT".to_string(),
            SingleStep => "SINGLE_STEP".to_string(),
            Unknown(code) => format!("UNKNOWN_0x{:08X}", code),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn machine_type_round_trips_known_values() {
        assert_eq!(MachineType::from_raw(0x014C), MachineType::X86);
        assert_eq!(MachineType::from_raw(0x8664), MachineType::X64);
        assert_eq!(MachineType::from_raw(0x01C0), MachineType::Arm32);
        assert_eq!(MachineType::from_raw(0xAA64), MachineType::Arm64);
    }

    #[test]
    fn machine_type_unknown_for_garbage() {
        assert_eq!(MachineType::from_raw(0x1234), MachineType::Unknown);
    }

    #[test]
    fn dump_variant_round_trips_known_values() {
        assert_eq!(DumpVariant::from_raw(1), DumpVariant::Full);
        assert_eq!(DumpVariant::from_raw(5), DumpVariant::Live);
        assert_eq!(DumpVariant::from_raw(99), DumpVariant::Unknown);
    }

    #[test]
    fn well_known_exception_names() {
        assert_eq!(
            WellKnownException::from_code(0xC0000005).name(),
            "ACCESS_VIOLATION"
        );
        assert_eq!(
            WellKnownException::from_code(0x1234_5678).name(),
            "UNKNOWN_0x12345678"
        );
    }
}
