//! Output handling for the `print()` builtin.
//!
//! `print` is the interpreter's only host I/O; everything it emits flows
//! through the [`PrintWriter`] trait, so embedders can capture or discard
//! script output.

use std::{
    borrow::Cow,
    io::{self, Write as _},
};

/// Trait for handling output from the `print()` builtin function.
pub trait PrintWriter {
    /// Writes the formatted text of a single `print()` argument. Separators
    /// and the trailing newline are emitted via [`PrintWriter::stdout_push`].
    fn stdout_write(&mut self, output: Cow<'_, str>);

    /// Writes a single separator or terminator character.
    fn stdout_push(&mut self, end: char);
}

/// Default writer: buffers per line and flushes whole lines to stdout.
#[derive(Debug, Default)]
pub struct StdPrint {
    buffer: String,
}

impl StdPrint {
    pub fn new() -> Self {
        Self::default()
    }

    fn flush(&mut self) {
        if self.buffer.is_empty() {
            return;
        }
        let _ = io::stdout().write_all(self.buffer.as_bytes());
        let _ = io::stdout().flush();
        self.buffer.clear();
    }
}

impl PrintWriter for StdPrint {
    fn stdout_write(&mut self, output: Cow<'_, str>) {
        self.buffer.push_str(&output);
    }

    fn stdout_push(&mut self, end: char) {
        self.buffer.push(end);
        if end == '\n' {
            self.flush();
        }
    }
}

impl Drop for StdPrint {
    fn drop(&mut self) {
        self.flush();
    }
}

/// A `PrintWriter` that collects all output into a string. Useful for tests
/// and for capturing output programmatically.
#[derive(Debug, Default)]
pub struct CollectStringPrint(String);

impl CollectStringPrint {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn output(&self) -> &str {
        &self.0
    }

    pub fn into_output(self) -> String {
        self.0
    }
}

impl PrintWriter for CollectStringPrint {
    fn stdout_write(&mut self, output: Cow<'_, str>) {
        self.0.push_str(&output);
    }

    fn stdout_push(&mut self, end: char) {
        self.0.push(end);
    }
}

/// A `PrintWriter` that discards all output.
#[derive(Debug, Default)]
pub struct NoPrint;

impl PrintWriter for NoPrint {
    fn stdout_write(&mut self, _output: Cow<'_, str>) {}

    fn stdout_push(&mut self, _end: char) {}
}
