//! Synchronous exception model
//!
//! Exception kinds follow an exception-syndrome layout: a small set
//! of classes, two of which carry payloads. An exception
//! short-circuits the execute loop; the VM records it and moves to
//! the faulted state.

use legv8_isa::diagnostics::SourceMap;
use legv8_isa::Program;
use std::fmt;
use thiserror::Error;

/// Whether a data abort came from a load or a store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessKind {
    Load,
    Store,
}

impl fmt::Display for AccessKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccessKind::Load => write!(f, "load"),
            AccessKind::Store => write!(f, "store"),
        }
    }
}

/// Floating-point exception causes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FpeCause {
    DivisionByZero,
}

impl fmt::Display for FpeCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FpeCause::DivisionByZero => write!(f, "division by zero"),
        }
    }
}

/// What raised a breakpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakpointCause {
    Halt,
    Dump,
    Debugger,
}

impl fmt::Display for BreakpointCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BreakpointCause::Halt => write!(f, "reached halt"),
            BreakpointCause::Dump => write!(f, "reached dump"),
            BreakpointCause::Debugger => write!(f, "debugger break"),
        }
    }
}

/// A synchronous VM exception.
#[derive(Debug, Error, Clone, Copy, PartialEq)]
pub enum Exception {
    #[error("unknown exception")]
    Unknown,

    /// FP register file disabled. Unused in this dialect.
    #[error("SIMD/floating-point access exception")]
    SimdDisabled,

    #[error("illegal execution state exception")]
    IllegalState,

    #[error("supervisor call exception")]
    Supervisor,

    /// Undecodable word, illegal operand, or a mis-formed register
    /// index inside an instruction.
    #[error("instruction exception")]
    Instruction,

    /// PC left the text segment on a branch.
    #[error("program counter exception")]
    Pc,

    /// Memory access to a reserved region or out of range within one.
    #[error("data exception: {kind} at address {addr:#x}")]
    Data { kind: AccessKind, addr: u64 },

    #[error("floating-point exception: {0}")]
    FloatingPoint(FpeCause),

    /// Unused in the core; the debugger may raise it.
    #[error("watchpoint exception")]
    Watchpoint,

    #[error("breakpoint exception: {0}")]
    Breakpoint(BreakpointCause),
}

impl Exception {
    /// A debugger-raised breakpoint is resumable; everything else is
    /// reported and not resumed.
    pub fn is_resumable(&self) -> bool {
        matches!(self, Exception::Breakpoint(BreakpointCause::Debugger))
    }

    /// Render this exception with the faulting instruction's source
    /// line and the nearest preceding label, when debug info exists.
    pub fn render_with_context(
        &self,
        program: &Program,
        map: &SourceMap<'_>,
        pc: usize,
        use_color: bool,
    ) -> String {
        match program.annotations.get(pc) {
            Some(annotation) => {
                let mut message = self.to_string();
                if let Some(label) = program.label_before(pc) {
                    message.push_str(&format!(" (in {label})"));
                }
                let offset = annotation.source_offset;
                map.render(offset..offset + 1, &message, use_color)
            }
            None => format!("{self}\n"),
        }
    }
}

pub type Result<T> = std::result::Result<T, Exception>;
