//! A sink that forwards trace lines to the `tracing` subscriber.

use canary_core::{SinkError, TraceSink};

/// Emits every line as an `info` event on the `canary::trace` target.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl TraceSink for TracingSink {
    fn write_line(&mut self, line: &str) -> Result<(), SinkError> {
        tracing::info!(target: "canary::trace", "{line}");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn never_rejects_lines() {
        let mut sink = TracingSink;
        assert!(sink.write_line("--- Context 1 Trace Start ---").is_ok());
        assert!(sink.write_line("").is_ok());
    }
}
