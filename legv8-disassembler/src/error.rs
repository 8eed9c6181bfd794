//! # Error Types for the LEGv8 Disassembler

use thiserror::Error;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum DisassemblerError {
    /// No codec claims this 11-bit prefix.
    #[error("unknown opcode prefix {0:#05x}")]
    UnknownOpcode(u16),

    /// The prefix is shared, but no codec's discriminator matches.
    #[error("no codec matches discriminator for opcode prefix {0:#05x}")]
    UnmatchedDiscriminator(u16),
}

pub type Result<T> = std::result::Result<T, DisassemblerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(
            DisassemblerError::UnknownOpcode(0x000).to_string(),
            "unknown opcode prefix 0x000"
        );
        assert_eq!(
            DisassemblerError::UnmatchedDiscriminator(0x2A0).to_string(),
            "no codec matches discriminator for opcode prefix 0x2a0"
        );
    }
}
