//! Line-oriented output channel for streamed runner output.

use std::io::Write;
use std::sync::Arc;

use parking_lot::Mutex;

/// Destination for text shown to the user.
pub trait OutputSink: Send + Sync {
    /// Appends text without a line break.
    fn append(&self, text: &str);

    /// Appends text followed by a line break.
    fn append_line(&self, line: &str);
}

/// Shared handle to an [`OutputSink`].
#[derive(Clone)]
pub struct OutputChannel {
    sink: Arc<dyn OutputSink>,
}

impl OutputChannel {
    pub fn new(sink: Arc<dyn OutputSink>) -> Self {
        Self { sink }
    }

    pub fn append(&self, text: &str) {
        self.sink.append(text);
    }

    pub fn append_line(&self, line: &str) {
        self.sink.append_line(line);
    }

    /// Writes one chunk of streamed process output.
    ///
    /// The chunk is split on `\r?\n`. A single fragment is appended as-is so
    /// the next chunk continues the same line; in a multi-line chunk every
    /// fragment but the last ends its line, and the last is left open.
    pub fn std_out(&self, output: &str) {
        let lines = split_lines(output);
        let last = lines.len() - 1;

        for (index, line) in lines.iter().enumerate() {
            if index == 0 {
                if lines.len() > 1 {
                    self.sink.append_line(line);
                } else {
                    self.sink.append(line);
                }
                continue;
            }

            if index == last {
                self.sink.append(line);
            } else {
                self.sink.append_line(line);
            }
        }
    }
}

impl Default for OutputChannel {
    fn default() -> Self {
        Self::new(Arc::new(BufferedOutput::new()))
    }
}

fn split_lines(output: &str) -> Vec<&str> {
    let pieces: Vec<&str> = output.split('\n').collect();
    let last = pieces.len() - 1;
    pieces
        .into_iter()
        .enumerate()
        .map(|(index, piece)| {
            if index < last {
                piece.strip_suffix('\r').unwrap_or(piece)
            } else {
                piece
            }
        })
        .collect()
}

/// Keeps everything written in memory.
#[derive(Debug, Default)]
pub struct BufferedOutput {
    buffer: Mutex<String>,
}

impl BufferedOutput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything written so far.
    pub fn contents(&self) -> String {
        self.buffer.lock().clone()
    }

    pub fn clear(&self) {
        self.buffer.lock().clear();
    }
}

impl OutputSink for BufferedOutput {
    fn append(&self, text: &str) {
        self.buffer.lock().push_str(text);
    }

    fn append_line(&self, line: &str) {
        let mut buffer = self.buffer.lock();
        buffer.push_str(line);
        buffer.push('\n');
    }
}

/// Writes straight to the process's stdout.
#[derive(Debug, Default)]
pub struct StdoutSink;

impl OutputSink for StdoutSink {
    fn append(&self, text: &str) {
        let mut stdout = std::io::stdout().lock();
        let _ = stdout.write_all(text.as_bytes());
        let _ = stdout.flush();
    }

    fn append_line(&self, line: &str) {
        let mut stdout = std::io::stdout().lock();
        let _ = writeln!(stdout, "{}", line);
    }
}
