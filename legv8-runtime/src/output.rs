//! VM output handling
//!
//! PRNT/PRNL/DUMP write into a buffer that is flushed on every print
//! and when the VM faults or halts. The sink either forwards to
//! stdout or captures into a string the embedder can read back.

use std::io::Write;

#[derive(Debug)]
enum Target {
    Stdout,
    Capture(String),
}

/// Buffered write sink for the VM's user-visible output.
#[derive(Debug)]
pub struct OutputSink {
    buf: String,
    target: Target,
}

impl OutputSink {
    /// Forward flushed output to stdout.
    pub fn stdout() -> Self {
        Self {
            buf: String::new(),
            target: Target::Stdout,
        }
    }

    /// Collect flushed output for the embedder.
    pub fn capture() -> Self {
        Self {
            buf: String::new(),
            target: Target::Capture(String::new()),
        }
    }

    pub fn write(&mut self, text: &str) {
        self.buf.push_str(text);
    }

    pub fn flush(&mut self) {
        if self.buf.is_empty() {
            return;
        }
        match &mut self.target {
            Target::Stdout => {
                let mut stdout = std::io::stdout().lock();
                let _ = stdout.write_all(self.buf.as_bytes());
                let _ = stdout.flush();
            }
            Target::Capture(captured) => captured.push_str(&self.buf),
        }
        self.buf.clear();
    }

    /// Everything flushed so far, when capturing.
    pub fn captured(&self) -> Option<&str> {
        match &self.target {
            Target::Stdout => None,
            Target::Capture(captured) => Some(captured),
        }
    }
}

impl Default for OutputSink {
    fn default() -> Self {
        Self::stdout()
    }
}
