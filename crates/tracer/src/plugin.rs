//! Host entry point: what a registered pipeline step runs.
//!
//! Wraps a context walk in `Trace enter` / `Trace exit` lines, echoes the
//! step configuration, and makes sure nothing escapes to the host.

use crate::guard;
use crate::walker::ContextWalker;
use canary_config::TraceOptions;
use canary_core::{ExecutionContext, QueryTranslator, SinkError, TraceSink};
use chrono::{Local, SecondsFormat};

/// Written when the step fails before or around the context walk.
pub const DEAD_CANARY: &str = "††† Canary is dead †††";

/// A configured tracing step.
#[derive(Debug, Clone, Default)]
pub struct CanaryPlugin {
    unsecure_config: String,
    options: TraceOptions,
}

impl CanaryPlugin {
    /// Create from the step's unsecure configuration string.
    pub fn new(unsecure_config: impl Into<String>) -> Self {
        let unsecure_config = unsecure_config.into();
        let options = TraceOptions::parse(&unsecure_config);
        Self {
            unsecure_config,
            options,
        }
    }

    /// Create from already-resolved options, with no configuration echo.
    pub fn with_options(options: TraceOptions) -> Self {
        Self {
            unsecure_config: String::new(),
            options,
        }
    }

    pub fn options(&self) -> &TraceOptions {
        &self.options
    }

    /// Trace `context` into `sink`. Without a sink this does nothing.
    pub fn execute(
        &self,
        sink: Option<&mut dyn TraceSink>,
        context: Option<&ExecutionContext>,
        translator: Option<&dyn QueryTranslator>,
    ) {
        let Some(sink) = sink else {
            tracing::debug!("No trace sink available, skipping trace");
            return;
        };

        let walker = ContextWalker::new(&self.options, translator);
        let outcome = guard::catch(|| {
            emit(&mut *sink, &format!("Trace enter: {}", timestamp()));
            if !self.unsecure_config.is_empty() {
                emit(&mut *sink, &format!("Configuration: {}", self.unsecure_config));
            }
            walker.trace(&mut *sink, context);
        });
        if let Err(message) = outcome {
            tracing::error!(error = %message, "Trace failed outside the context walk");
            emit_guarded(sink, &format!("{DEAD_CANARY}\n{message}"));
        }

        emit_guarded(sink, &format!("Trace exit: {}", timestamp()));
    }
}

/// Write `text` prefixed with the local wall-clock time (`HH:MM:SS.mmm  `).
pub fn write_timestamped(sink: &mut dyn TraceSink, text: &str) -> Result<(), SinkError> {
    sink.write_line(&format!("{}  {text}", Local::now().format("%H:%M:%S%.3f")))
}

fn timestamp() -> String {
    Local::now().to_rfc3339_opts(SecondsFormat::Millis, false)
}

fn emit(sink: &mut dyn TraceSink, line: &str) {
    if let Err(e) = sink.write_line(line) {
        tracing::warn!(error = %e, "Trace sink rejected line");
    }
}

fn emit_guarded(sink: &mut dyn TraceSink, line: &str) {
    if let Err(message) = guard::catch(|| emit(&mut *sink, line)) {
        tracing::warn!(error = %message, "Trace sink panicked");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use canary_core::ParameterCollection;

    /// A sink that panics on a chosen line.
    struct TrippingSink {
        lines: Vec<String>,
        trip_on: &'static str,
    }

    impl TraceSink for TrippingSink {
        fn write_line(&mut self, line: &str) -> Result<(), SinkError> {
            if line == self.trip_on {
                panic!("sink tripped");
            }
            self.lines.push(line.to_string());
            Ok(())
        }
    }

    #[test]
    fn new_parses_configuration() {
        let plugin = CanaryPlugin::new("PARENTCONTEXT=true;MAXITEMLENGTH=80");
        assert!(plugin.options().parent_context);
        assert_eq!(plugin.options().max_item_length, 80);
    }

    #[test]
    fn execute_brackets_the_walk() {
        let plugin = CanaryPlugin::new("ATTRIBUTETYPES=true");
        let ctx = ExecutionContext::new("Create", "contact")
            .with_stage(40)
            .with_input(ParameterCollection::new().with("Flag", true));
        let mut lines: Vec<String> = Vec::new();
        plugin.execute(Some(&mut lines), Some(&ctx), None);

        assert!(lines[0].starts_with("Trace enter: "));
        assert_eq!(lines[1], "Configuration: ATTRIBUTETYPES=true");
        assert_eq!(lines[2], "--- Context 1 Trace Start ---");
        assert!(lines.contains(&"  Flag = true \t(bool)".to_string()));
        assert!(lines.last().unwrap().starts_with("Trace exit: "));
    }

    #[test]
    fn empty_configuration_is_not_echoed() {
        let plugin = CanaryPlugin::with_options(TraceOptions::default());
        let mut lines: Vec<String> = Vec::new();
        plugin.execute(Some(&mut lines), None, None);
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[1], "No Context available.");
    }

    #[test]
    fn missing_sink_is_a_no_op() {
        let plugin = CanaryPlugin::default();
        plugin.execute(None, Some(&ExecutionContext::default()), None);
    }

    #[test]
    fn panic_in_sink_is_reported_and_exit_still_written() {
        let plugin = CanaryPlugin::new("PARENTCONTEXT=true");
        let mut sink = TrippingSink {
            lines: Vec::new(),
            trip_on: "Configuration: PARENTCONTEXT=true",
        };
        plugin.execute(Some(&mut sink), None, None);

        assert_eq!(sink.lines.len(), 3);
        assert!(sink.lines[0].starts_with("Trace enter: "));
        assert_eq!(sink.lines[1], format!("{DEAD_CANARY}\nsink tripped"));
        assert!(sink.lines[2].starts_with("Trace exit: "));
    }

    #[test]
    fn panic_inside_walk_is_contained_by_the_walker() {
        let plugin = CanaryPlugin::default();
        let mut sink = TrippingSink {
            lines: Vec::new(),
            trip_on: "No Context available.",
        };
        plugin.execute(Some(&mut sink), None, None);

        assert_eq!(sink.lines.len(), 2);
        assert!(!sink.lines.iter().any(|l| l.contains(DEAD_CANARY)));
        assert!(sink.lines[1].starts_with("Trace exit: "));
    }

    #[test]
    fn sink_panicking_on_every_line_does_not_escape() {
        struct BrokenSink;
        impl TraceSink for BrokenSink {
            fn write_line(&mut self, _line: &str) -> Result<(), SinkError> {
                panic!("sink gone")
            }
        }

        let plugin = CanaryPlugin::new("PARENTCONTEXT=true");
        let ctx = ExecutionContext::new("Create", "contact");
        let escaped = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            plugin.execute(Some(&mut BrokenSink), Some(&ctx), None);
        }));
        assert!(escaped.is_ok());
    }

    #[test]
    fn timestamped_lines_have_clock_prefix() {
        let mut lines: Vec<String> = Vec::new();
        write_timestamped(&mut lines, "checkpoint").unwrap();
        let line = &lines[0];
        assert!(line.ends_with("  checkpoint"));
        // HH:MM:SS.mmm
        assert_eq!(line.find("  checkpoint"), Some(12));
        assert_eq!(&line[2..3], ":");
        assert_eq!(&line[8..9], ".");
    }
}
