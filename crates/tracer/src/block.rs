//! Parameter block printer: one topic header plus an aligned `key = value`
//! line per parameter.

use crate::format::ValueFormatter;
use canary_core::{ParameterCollection, SinkError, TraceSink};

/// Indent level at which parameter values are formatted.
pub const PARAMETER_INDENT: usize = 2;

/// Print one parameter group. Absent or empty groups print nothing.
///
/// Parameters keep their source order; keys are padded to the longest key so
/// every `=` lands in the same column.
pub fn print_block(
    sink: &mut dyn TraceSink,
    topic: &str,
    params: Option<&ParameterCollection>,
    formatter: &ValueFormatter<'_>,
) -> Result<(), SinkError> {
    let Some(params) = params.filter(|p| !p.is_empty()) else {
        return Ok(());
    };

    sink.write_line(topic)?;
    let keylen = params.longest_key().unwrap_or(0);
    for (key, value) in params.iter() {
        let rendered = formatter.format(value, PARAMETER_INDENT);
        sink.write_line(&format!("  {key:<keylen$} = {rendered}"))?;
    }
    Ok(())
}

/// Print a per-step collection of image maps.
///
/// A single map prints like a normal block; several maps are summarized as
/// `<topic> : <count>`.
pub fn print_block_collection(
    sink: &mut dyn TraceSink,
    topic: &str,
    blocks: Option<&[ParameterCollection]>,
    formatter: &ValueFormatter<'_>,
) -> Result<(), SinkError> {
    match blocks {
        Some([single]) => print_block(sink, topic, Some(single), formatter),
        Some(many) if many.len() > 1 => sink.write_line(&format!("{topic} : {}", many.len())),
        _ => Ok(()),
    }
}
