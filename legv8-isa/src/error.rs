//! # Error Types for the ISA Catalogue

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IsaError {
    #[error("invalid register index: {0} (valid range: 0-31)")]
    InvalidRegister(u8),

    #[error("invalid condition code: {0:#x}")]
    InvalidCondition(u8),

    #[error("binary image length {len} is not a whole number of words")]
    TruncatedImage { len: usize },
}
