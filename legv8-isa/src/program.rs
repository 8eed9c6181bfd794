//! Assembled program container
//!
//! A program is the packed instruction vector plus the side tables
//! the rest of the toolchain consumes: per-instruction annotations
//! (source offset, cached codec tag, branch-target back-reference),
//! the insertion-ordered label table, and the relocation flag.

use crate::codec::Codec;
use crate::error::IsaError;
use crate::{Word, TEXT_START};
use serde::{Deserialize, Serialize};

/// Which patchable field a pending label reference occupies.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BranchKind {
    /// Signed 26-bit offset.
    B,
    /// Signed 19-bit offset.
    Cb,
    /// MOVZ/MOVK pair loading an absolute address.
    Lda,
}

/// Sidecar record for one emitted instruction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Annotation {
    /// Byte offset of the mnemonic in the source text.
    pub source_offset: usize,
    /// Cached codec tag; the VM dispatches on this without re-decoding.
    pub tag: Codec,
    /// Index into the label table for branch targets.
    pub label_ref: Option<usize>,
}

/// An assembled program.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Program {
    /// Packed 32-bit instruction words in program order.
    pub code: Vec<Word>,
    /// One annotation per word.
    pub annotations: Vec<Annotation>,
    /// Label table in definition order: name and the instruction
    /// index it precedes.
    pub labels: Vec<(String, usize)>,
    /// Set when a branch exceeded its native immediate range.
    pub needs_relocations: bool,
}

impl Program {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of instructions.
    #[inline]
    pub fn len(&self) -> usize {
        self.code.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.code.is_empty()
    }

    /// Byte address of the instruction at `index`.
    #[inline]
    pub fn address_of(&self, index: usize) -> u64 {
        TEXT_START + (index as u64) * 4
    }

    /// Instruction index a label points at.
    pub fn label_index(&self, name: &str) -> Option<usize> {
        self.labels
            .iter()
            .find(|(label, _)| label == name)
            .map(|&(_, index)| index)
    }

    /// The nearest label at or before `index`, for diagnostics.
    pub fn label_before(&self, index: usize) -> Option<&str> {
        self.labels
            .iter()
            .filter(|&&(_, at)| at <= index)
            .max_by_key(|&&(_, at)| at)
            .map(|(name, _)| name.as_str())
    }

    /// Serialize the instruction stream as big-endian words.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.code.len() * 4);
        for &word in &self.code {
            bytes.extend_from_slice(&word.to_be_bytes());
        }
        bytes
    }

    /// Rebuild the instruction stream from big-endian words. The side
    /// tables are not part of the binary image and come back empty.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, IsaError> {
        if bytes.len() % 4 != 0 {
            return Err(IsaError::TruncatedImage { len: bytes.len() });
        }
        let code: Vec<Word> = bytes
            .chunks_exact(4)
            .map(|chunk| Word::from_be_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
            .collect();
        let annotations = Vec::new();
        Ok(Self {
            code,
            annotations,
            labels: Vec::new(),
            needs_relocations: false,
        })
    }
}
