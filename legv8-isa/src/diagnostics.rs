//! Diagnostic rendering with source-line context
//!
//! Both assembler errors and VM exceptions render the same way:
//!
//! ```text
//! name:line:col: error: message
//! <the offending source line>
//!     ^~~~
//! ```
//!
//! Color is plain ANSI red on the marker, suppressed when the
//! `NO_COLOR` environment variable is set.

use std::ops::Range;

const RED: &str = "\x1b[31m";
const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";

/// Whether diagnostics should use ANSI color.
pub fn color_enabled() -> bool {
    std::env::var_os("NO_COLOR").is_none()
}

/// Resolves byte offsets to line/column positions in one source text.
#[derive(Debug, Clone)]
pub struct SourceMap<'a> {
    name: &'a str,
    text: &'a str,
    line_starts: Vec<usize>,
}

impl<'a> SourceMap<'a> {
    pub fn new(name: &'a str, text: &'a str) -> Self {
        let mut line_starts = vec![0];
        for (offset, byte) in text.bytes().enumerate() {
            if byte == b'\n' {
                line_starts.push(offset + 1);
            }
        }
        Self {
            name,
            text,
            line_starts,
        }
    }

    pub fn name(&self) -> &'a str {
        self.name
    }

    /// 1-based line and column of a byte offset.
    pub fn line_col(&self, offset: usize) -> (usize, usize) {
        let line = match self.line_starts.binary_search(&offset) {
            Ok(exact) => exact,
            Err(insertion) => insertion - 1,
        };
        (line + 1, offset - self.line_starts[line] + 1)
    }

    /// The text of a 1-based line, without its terminator.
    pub fn line_text(&self, line: usize) -> &'a str {
        let start = self.line_starts[line - 1];
        let end = self
            .line_starts
            .get(line)
            .map(|&next| next - 1)
            .unwrap_or(self.text.len());
        self.text[start..end].trim_end_matches('\r')
    }

    /// Render one diagnostic with its source line and an underline
    /// covering `span` (clamped to the line).
    pub fn render(&self, span: Range<usize>, message: &str, use_color: bool) -> String {
        let (line, col) = self.line_col(span.start);
        let line_text = self.line_text(line);

        let available = line_text.len().saturating_sub(col - 1);
        let width = span.len().clamp(1, available.max(1));
        let mut underline = String::new();
        for _ in 0..col - 1 {
            underline.push(' ');
        }
        underline.push('^');
        for _ in 1..width {
            underline.push('~');
        }

        if use_color {
            format!(
                "{BOLD}{}:{}:{}:{RESET} {RED}error:{RESET} {}\n{}\n{RED}{}{RESET}\n",
                self.name, line, col, message, line_text, underline
            )
        } else {
            format!(
                "{}:{}:{}: error: {}\n{}\n{}\n",
                self.name, line, col, message, line_text, underline
            )
        }
    }

    /// Render a batch of diagnostics in order, optionally capped. When
    /// capped, the omitted count is appended.
    pub fn render_all(
        &self,
        diagnostics: &[(Range<usize>, String)],
        limit: Option<usize>,
        use_color: bool,
    ) -> String {
        let shown = limit.unwrap_or(diagnostics.len()).min(diagnostics.len());
        let mut out = String::new();
        for (span, message) in &diagnostics[..shown] {
            out.push_str(&self.render(span.clone(), message, use_color));
        }
        let omitted = diagnostics.len() - shown;
        if omitted > 0 {
            out.push_str(&format!("({omitted} errors omitted)\n"));
        }
        out
    }
}
