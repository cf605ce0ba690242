//! `canary render`: Trace a JSON-described execution context.

use crate::RenderArgs;
use canary_config::CanaryConfig;
use canary_core::{ExecutionContext, QueryTranslator, WriterSink};
use canary_tracer::{CanaryPlugin, FetchXmlTranslator, trace_context};
use std::io::{self, Read};

pub fn run(args: RenderArgs, config: CanaryConfig) -> Result<(), Box<dyn std::error::Error>> {
    let mut options = config.trace;
    if let Some(flags) = &args.options {
        options.apply(flags);
    }
    tracing::debug!(options = %options.to_flag_string(), "Effective trace options");

    let json = match &args.file {
        Some(path) => std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read {}: {e}", path.display()))?,
        None => {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };
    let context: ExecutionContext =
        serde_json::from_str(&json).map_err(|e| format!("Invalid context JSON: {e}"))?;

    let fetchxml = FetchXmlTranslator;
    let translator: Option<&dyn QueryTranslator> = if args.no_translator {
        None
    } else {
        Some(&fetchxml)
    };

    let stdout = io::stdout();
    let mut sink = WriterSink::new(stdout.lock());
    if args.bracket {
        CanaryPlugin::with_options(options).execute(Some(&mut sink), Some(&context), translator);
    } else {
        trace_context(&mut sink, Some(&context), translator, &options);
    }

    Ok(())
}
