//! Sink trait: where rendered trace lines go.
//!
//! The tracer pushes one call per logical line. A logical line may itself
//! contain embedded newlines (a multi-line entity rendering, for instance).

use crate::error::SinkError;
use std::io::Write;

/// An append-only consumer of trace lines.
pub trait TraceSink {
    /// Append one logical line.
    fn write_line(&mut self, line: &str) -> Result<(), SinkError>;
}

impl<T: TraceSink + ?Sized> TraceSink for &mut T {
    fn write_line(&mut self, line: &str) -> Result<(), SinkError> {
        (**self).write_line(line)
    }
}

impl<T: TraceSink + ?Sized> TraceSink for Box<T> {
    fn write_line(&mut self, line: &str) -> Result<(), SinkError> {
        (**self).write_line(line)
    }
}

/// Collects lines in memory.
impl TraceSink for Vec<String> {
    fn write_line(&mut self, line: &str) -> Result<(), SinkError> {
        self.push(line.to_string());
        Ok(())
    }
}

/// Writes each line, newline-terminated, to any `io::Write`.
pub struct WriterSink<W: Write> {
    writer: W,
}

impl<W: Write> WriterSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> TraceSink for WriterSink<W> {
    fn write_line(&mut self, line: &str) -> Result<(), SinkError> {
        writeln!(self.writer, "{line}")?;
        Ok(())
    }
}
