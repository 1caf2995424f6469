//! Line-buffered console output.
//!
//! Guest writes arrive in arbitrarily small chunks (vectored I/O may split a
//! line across many calls), so program output is grouped at line granularity
//! before it reaches the console. The filesystem module's diagnostic channel
//! bypasses this buffer and prints through the sink directly.

use std::sync::Arc;

use parking_lot::Mutex;

/// A line-oriented text sink for console output.
pub trait ConsoleSink: Send + Sync {
    /// Emit one line, without its trailing newline.
    fn print(&self, line: &str);
}

/// Sink that prints each line to the process's stdout.
#[derive(Debug, Default)]
pub struct StdoutSink;

impl ConsoleSink for StdoutSink {
    fn print(&self, line: &str) {
        println!("{line}");
    }
}

/// Sink that captures lines in memory, for tests and embedders.
#[derive(Debug, Default)]
pub struct CaptureSink {
    lines: Mutex<Vec<String>>,
}

impl CaptureSink {
    /// Create an empty capture sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// All lines printed so far.
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().clone()
    }

    /// All lines printed so far, joined with newlines.
    pub fn text(&self) -> String {
        self.lines.lock().join("\n")
    }
}

impl ConsoleSink for CaptureSink {
    fn print(&self, line: &str) {
        self.lines.lock().push(line.to_string());
    }
}

/// Accumulates guest output and flushes it to the sink on line boundaries.
pub struct OutputBuffer {
    /// Text accumulated since the last newline.
    pending: String,
    /// Where complete lines go.
    sink: Arc<dyn ConsoleSink>,
}

impl OutputBuffer {
    /// Create an empty buffer writing to `sink`.
    pub fn new(sink: Arc<dyn ConsoleSink>) -> Self {
        Self {
            pending: String::new(),
            sink,
        }
    }

    /// Append `text`, emitting every complete line it closes.
    pub fn write(&mut self, text: &str) {
        self.pending.push_str(text);
        while let Some(newline) = self.pending.find('\n') {
            let line = self.pending[..newline].to_string();
            self.pending.drain(..=newline);
            self.sink.print(&line);
        }
    }

    /// Emit whatever remains, even if it is empty.
    ///
    /// Called exactly once, at orchestrated shutdown, so a partial final line
    /// is never lost.
    pub fn flush(&mut self) {
        let rest = std::mem::take(&mut self.pending);
        self.sink.print(&rest);
    }

    /// Text accumulated but not yet emitted.
    pub fn pending(&self) -> &str {
        &self.pending
    }
}

impl std::fmt::Debug for OutputBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OutputBuffer")
            .field("pending", &self.pending.len())
            .finish()
    }
}
