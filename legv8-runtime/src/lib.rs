//! LEGv8 Virtual Machine
//!
//! Interprets packed 32-bit LEGv8 instruction streams against a
//! virtual CPU: 32 general-purpose, 32 single-precision, and 32
//! double-precision registers, NZCV condition flags, and a paged
//! three-region address space. Synchronous exceptions follow a
//! syndrome-style classification.
//!
//! ## Example
//!
//! ```rust
//! use legv8_assembler::assemble;
//! use legv8_runtime::{OutputSink, Vm, VmConfig};
//!
//! let program = assemble("MOVZ X0, #42\nPRNT X0\nHALT\n").unwrap();
//! let mut vm = Vm::with_sink(program, VmConfig::default(), OutputSink::capture());
//! vm.run();
//! assert_eq!(vm.output(), Some("X0: 0x000000000000002A (42)\n"));
//! ```

pub mod exception;
pub mod execute;
pub mod memory;
pub mod output;
pub mod state;
pub mod vm;

pub use exception::{AccessKind, BreakpointCause, Exception, FpeCause};
pub use memory::Memory;
pub use output::OutputSink;
pub use state::{Status, VmState};
pub use vm::{Vm, VmConfig};
