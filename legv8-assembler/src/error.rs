//! # Error Types for the LEGv8 Assembler
//!
//! Errors are accumulated, never thrown eagerly: a bad line recovers
//! to its newline and the rest of the file still assembles. The whole
//! run fails if anything was recorded.

use legv8_isa::diagnostics::SourceMap;
use std::ops::Range;
use thiserror::Error;

/// The category of one diagnostic.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    #[error("expected {expected}, got {got}")]
    ExpectedToken {
        expected: &'static str,
        got: &'static str,
    },

    #[error("unknown instruction mnemonic")]
    UnknownMnemonic,

    #[error("shift amount does not fit in 6 bits")]
    ShiftAmountOverflow,

    #[error("immediate does not fit in a signed 12-bit field")]
    ImmediateOverflow,

    #[error("move immediate does not fit in 16 bits")]
    MovImmediateOverflow,

    #[error("move shift must be 0, 16, 32, or 48")]
    MovShiftOverflow,

    #[error("expected LSL before a move shift")]
    MovNoLsl,

    #[error("load/store offset does not fit in 9 bits")]
    LoadStoreOffsetOverflow,

    #[error("branch target out of range; relocations are not implemented")]
    UnimplementedFarJump,

    #[error("label cannot contain '.'")]
    DotLabel,

    #[error("unexpected token")]
    UnexpectedToken,

    #[error("duplicate label name")]
    DuplicateLabelName,

    #[error("undefined label")]
    UndefinedLabel,

    #[error("label is empty")]
    EmptyLabel,
}

/// One diagnostic, anchored to a byte range of the source.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{kind}")]
pub struct AssembleError {
    pub kind: ErrorKind,
    pub span: Range<usize>,
}

impl AssembleError {
    pub fn new(kind: ErrorKind, span: Range<usize>) -> Self {
        Self { kind, span }
    }
}

/// Everything that went wrong in one assembly run.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("assembly failed with {} error(s)", .errors.len())]
pub struct AssembleFailure {
    pub errors: Vec<AssembleError>,
}

impl AssembleFailure {
    /// Render every diagnostic with source context, optionally capped
    /// (the cap is the interface behind the `--limit-errors` flag).
    pub fn render(&self, map: &SourceMap<'_>, limit: Option<usize>, use_color: bool) -> String {
        let diagnostics: Vec<_> = self
            .errors
            .iter()
            .map(|error| (error.span.clone(), error.kind.to_string()))
            .collect();
        map.render_all(&diagnostics, limit, use_color)
    }
}

pub type Result<T> = std::result::Result<T, AssembleError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_display() {
        assert_eq!(
            ErrorKind::UnknownMnemonic.to_string(),
            "unknown instruction mnemonic"
        );
        assert_eq!(
            ErrorKind::ExpectedToken {
                expected: "newline",
                got: "integer"
            }
            .to_string(),
            "expected newline, got integer"
        );
        assert_eq!(
            ErrorKind::UnimplementedFarJump.to_string(),
            "branch target out of range; relocations are not implemented"
        );
    }

    #[test]
    fn test_failure_display() {
        let failure = AssembleFailure {
            errors: vec![AssembleError::new(ErrorKind::UndefinedLabel, 3..7)],
        };
        assert_eq!(failure.to_string(), "assembly failed with 1 error(s)");
    }

    #[test]
    fn test_render_with_context() {
        let source = "BOGUS X0, X0\n";
        let map = SourceMap::new("prog.s", source);
        let failure = AssembleFailure {
            errors: vec![AssembleError::new(ErrorKind::UnknownMnemonic, 0..5)],
        };
        let rendered = failure.render(&map, None, false);
        assert!(rendered.starts_with("prog.s:1:1: error: unknown instruction mnemonic"));
        assert!(rendered.contains("BOGUS X0, X0"));
    }
}
