//! Instruction decoder
//!
//! Maps any 32-bit word to its codec tag in O(1):
//!
//! 1. Take the top 11 bits.
//! 2. Index the 2048-slot fast table. A unique slot is the answer.
//! 3. An ambiguous slot falls back to scanning the catalogue for the
//!    first entry whose opcode range covers the prefix and whose
//!    discriminator (`shamt` for R, `rt` for CB) matches the word.
//! 4. Nothing matching is an undecodable word.
//!
//! Ambiguous slots exist only for the FP single/double families and
//! the conditional-branch family, so the scan is the cold path.

use crate::error::{DisassemblerError, Result};
use legv8_isa::codec::{opcode_lookup, Slot, CODECS};
use legv8_isa::{encoding, Codec};

/// Decode a 32-bit word to its codec tag.
pub fn decode(word: u32) -> Result<Codec> {
    let prefix = encoding::prefix(word);
    match opcode_lookup()[prefix as usize] {
        Slot::Unique(tag) => Ok(tag),
        Slot::Empty => Err(DisassemblerError::UnknownOpcode(prefix)),
        Slot::Ambiguous => CODECS
            .iter()
            .find(|info| info.covers(prefix) && info.matches_discriminant(word))
            .map(|info| info.tag)
            .ok_or(DisassemblerError::UnmatchedDiscriminator(prefix)),
    }
}
