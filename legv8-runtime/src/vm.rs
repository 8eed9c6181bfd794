//! Virtual machine
//!
//! Fetch-decode-execute over an assembled program. Codec tags are
//! resolved once at load time (or taken from the assembler's
//! annotations), so the run loop never re-pays decode cost: each
//! cycle is an array read plus a jump-table dispatch.
//!
//! `step` is the debugger's single-step interface and is atomic from
//! the caller's perspective: it either advances the PC by one
//! instruction or records an exception. `run` just loops it.

use crate::exception::Exception;
use crate::execute::execute_one;
use crate::memory::Memory;
use crate::output::OutputSink;
use crate::state::{Status, VmState};
use legv8_disassembler::decode;
use legv8_isa::diagnostics::SourceMap;
use legv8_isa::{Codec, Program};

/// VM configuration.
#[derive(Debug, Clone, Default)]
pub struct VmConfig {
    /// Map a 4096-byte zero page at address 0.
    pub zero_page: bool,

    /// Print one line per cycle to stderr.
    pub trace: bool,
}

/// The LEGv8 virtual machine.
pub struct Vm {
    program: Program,
    /// Cached decode of every text word; `None` marks an undecodable
    /// word that faults when fetched.
    tags: Vec<Option<Codec>>,
    state: VmState,
    memory: Memory,
    sink: OutputSink,
    config: VmConfig,
}

impl Vm {
    /// Build a VM writing output to stdout.
    pub fn new(program: Program, config: VmConfig) -> Self {
        Self::with_sink(program, config, OutputSink::stdout())
    }

    /// Build a VM with an explicit output sink.
    pub fn with_sink(program: Program, config: VmConfig, sink: OutputSink) -> Self {
        let tags = if program.annotations.len() == program.code.len() {
            program
                .annotations
                .iter()
                .map(|annotation| Some(annotation.tag))
                .collect()
        } else {
            program.code.iter().map(|&word| decode(word).ok()).collect()
        };
        let memory = Memory::new(program.code.clone(), config.zero_page);
        Self {
            program,
            tags,
            state: VmState::new(),
            memory,
            sink,
            config,
        }
    }

    /// Execute one instruction. Fetching past the end of the text
    /// segment is a clean halt.
    pub fn step(&mut self) -> Status {
        if !self.state.is_running() {
            return self.state.status();
        }

        let pc = self.state.pc;
        if pc >= self.memory.text_len() {
            self.sink.flush();
            self.state.halt();
            return self.state.status();
        }

        let word = self.program.code[pc];
        let Some(tag) = self.tags[pc] else {
            self.sink.flush();
            self.state.fault(Exception::Instruction);
            return self.state.status();
        };

        if self.config.trace {
            eprintln!(
                "[{:6}] pc={:#010x} {}",
                self.state.cycles,
                self.program.address_of(pc),
                tag.mnemonic()
            );
        }

        match execute_one(tag, word, &mut self.state, &mut self.memory, &mut self.sink) {
            Ok(()) => self.state.cycles += 1,
            Err(exception) => {
                self.sink.flush();
                self.state.fault(exception);
            }
        }
        self.state.status()
    }

    /// Run to halt or fault.
    pub fn run(&mut self) -> Status {
        while self.state.is_running() {
            self.step();
        }
        self.state.status()
    }

    pub fn status(&self) -> Status {
        self.state.status()
    }

    pub fn state(&self) -> &VmState {
        &self.state
    }

    pub fn memory(&self) -> &Memory {
        &self.memory
    }

    pub fn program(&self) -> &Program {
        &self.program
    }

    /// Current PC, the breakpoint key for the debugger.
    pub fn pc(&self) -> usize {
        self.state.pc
    }

    pub fn exception(&self) -> Option<&Exception> {
        self.state.exception()
    }

    /// Captured output, when built with a capturing sink.
    pub fn output(&self) -> Option<&str> {
        self.sink.captured()
    }

    /// Render the recorded exception with source context.
    pub fn render_exception(&self, map: &SourceMap<'_>, use_color: bool) -> Option<String> {
        self.state
            .exception()
            .map(|exception| exception.render_with_context(&self.program, map, self.state.pc, use_color))
    }
}
