//! Context walker: renders an execution context and, optionally, its chain
//! of parent contexts.
//!
//! Each context is visited once. Contexts in the internal stage are skipped
//! unless asked for, but the walk still continues through them to their
//! parents. A trailing blank line is written after every level returns.

use crate::block::{print_block, print_block_collection};
use crate::format::{FormatOptions, ValueFormatter, format_reference};
use crate::guard;
use canary_config::TraceOptions;
use canary_core::{ExecutionContext, QueryTranslator, SinkError, TraceSink};
use std::fmt::Display;
use uuid::Uuid;

/// Written instead of a walk when the host supplied no context.
pub const NO_CONTEXT: &str = "No Context available.";

/// Label column width of the fixed context fields (`Message`, `Stage`, ...).
const FIELD_WIDTH: usize = 7;

/// First line of the diagnostic written when a walk is aborted.
pub const EXCEPTION_HEADER: &str = "--- Exception while trying to TraceContext ---";

/// Walks contexts with one set of options and an optional query translator.
pub struct ContextWalker<'a> {
    options: &'a TraceOptions,
    formatter: ValueFormatter<'a>,
}

impl<'a> ContextWalker<'a> {
    pub fn new(options: &'a TraceOptions, translator: Option<&'a dyn QueryTranslator>) -> Self {
        Self {
            options,
            formatter: ValueFormatter::new(FormatOptions::from(options), translator),
        }
    }

    /// Trace `context` and, per the options, its ancestors.
    ///
    /// Never fails: a sink error or a panic inside a host collaborator stops
    /// the walk and is reported to the sink as a two-line diagnostic. Lines
    /// written before the failure stay written.
    pub fn trace(&self, sink: &mut dyn TraceSink, context: Option<&ExecutionContext>) {
        let Some(context) = context else {
            write_guarded(sink, NO_CONTEXT);
            return;
        };

        let message = match guard::catch(|| self.walk(&mut *sink, context, 1)) {
            Ok(Ok(())) => return,
            Ok(Err(e)) => e.to_string(),
            Err(panic) => panic,
        };

        tracing::warn!(error = %message, "Context trace aborted");
        let diagnostic = [EXCEPTION_HEADER.to_string(), format!("Message : {message}")];
        for line in &diagnostic {
            if !write_guarded(sink, line) {
                break;
            }
        }
    }

    fn walk(
        &self,
        sink: &mut dyn TraceSink,
        context: &ExecutionContext,
        depth: usize,
    ) -> Result<(), SinkError> {
        if context.is_internal_stage() && !self.options.include_stage30 {
            tracing::debug!(
                depth,
                message = %context.message_name,
                "Skipping internal-stage context"
            );
        } else {
            tracing::debug!(
                depth,
                message = %context.message_name,
                stage = ?context.stage,
                "Tracing context"
            );
            self.render(sink, context, depth)?;
        }

        if self.options.parent_context {
            if let Some(parent) = context.parent() {
                self.walk(sink, parent, depth + 1)?;
            }
        }

        sink.write_line("")
    }

    fn render(
        &self,
        sink: &mut dyn TraceSink,
        context: &ExecutionContext,
        depth: usize,
    ) -> Result<(), SinkError> {
        sink.write_line(&format!("--- Context {depth} Trace Start ---"))?;

        for line in capability_lines(context) {
            sink.write_line(&line)?;
        }

        sink.write_line(&field("Message", &context.message_name))?;
        if let Some(stage) = context.stage {
            sink.write_line(&field("Stage", stage))?;
        }
        sink.write_line(&field("Mode", context.mode))?;
        sink.write_line(&field("Depth", context.depth))?;
        sink.write_line(&field("Entity", &context.primary_entity_name))?;
        if !context.primary_entity_id.is_nil() {
            sink.write_line(&field("Id", context.primary_entity_id))?;
        }
        sink.write_line("")?;

        let f = &self.formatter;
        print_block(sink, "InputParameters", context.input_parameters.as_ref(), f)?;
        print_block(sink, "OutputParameters", context.output_parameters.as_ref(), f)?;
        print_block(sink, "SharedVariables", context.shared_variables.as_ref(), f)?;
        print_block(sink, "PreEntityImages", context.pre_entity_images.as_ref(), f)?;
        print_block(sink, "PostEntityImages", context.post_entity_images.as_ref(), f)?;

        let pre_images = context.pre_entity_images_collection.as_deref();
        if context.pre_entity_images.is_none() || pre_images.is_some_and(|c| c.len() > 1) {
            print_block_collection(sink, "PreEntityImagesCollection", pre_images, f)?;
        }
        let post_images = context.post_entity_images_collection.as_deref();
        if context.post_entity_images.is_none() || post_images.is_some_and(|c| c.len() > 1) {
            print_block_collection(sink, "PostEntityImagesCollection", post_images, f)?;
        }

        sink.write_line(&format!("--- Context {depth} Trace End ---"))
    }
}

/// Convenience entry: build a walker and trace once.
pub fn trace_context(
    sink: &mut dyn TraceSink,
    context: Option<&ExecutionContext>,
    translator: Option<&dyn QueryTranslator>,
    options: &TraceOptions,
) {
    ContextWalker::new(options, translator).trace(sink, context);
}

/// Write one line outside the walk. Sink errors and sink panics are logged
/// and reported as `false`.
fn write_guarded(sink: &mut dyn TraceSink, line: &str) -> bool {
    let error = match guard::catch(|| sink.write_line(line)) {
        Ok(Ok(())) => return true,
        Ok(Err(e)) => e.to_string(),
        Err(panic) => panic,
    };
    tracing::warn!(error = %error, "Trace sink rejected line");
    false
}

fn field(label: &str, value: impl Display) -> String {
    format!("{label:<FIELD_WIDTH$} : {value}")
}

fn present(id: Option<Uuid>) -> Option<Uuid> {
    id.filter(|id| !id.is_nil())
}

/// Identity and client fields, most useful first. Only fields the context
/// actually carries (and that add information) produce a line. Labels are
/// padded to the longest one in the group, never narrower than the fixed
/// fields.
fn capability_lines(context: &ExecutionContext) -> Vec<String> {
    let mut fields: Vec<(&str, String)> = Vec::new();

    if let Some(agent) = context.user_agent.as_deref().filter(|a| !a.is_empty()) {
        fields.push(("UserAgent", agent.to_string()));
    }

    let user = present(context.user_id);
    if let Some(id) = user {
        fields.push(("User", id.to_string()));
    }
    let initiating = present(context.initiating_user_id);
    if let Some(id) = initiating.filter(|id| Some(*id) != user) {
        fields.push(("Initiating User", id.to_string()));
    }
    if let Some(id) = present(context.authenticated_user_id)
        .filter(|id| Some(*id) != user && Some(*id) != initiating)
    {
        fields.push(("Authenticated User", id.to_string()));
    }

    let user_aad = present(context.user_azure_active_directory_object_id);
    if let Some(id) = user_aad {
        fields.push(("User AAD Object", id.to_string()));
    }
    if let Some(id) = present(context.initiating_user_azure_active_directory_object_id)
        .filter(|id| Some(*id) != user_aad)
    {
        fields.push(("Initiating AAD Object", id.to_string()));
    }

    if let Some(id) = present(context.initiating_user_application_id) {
        fields.push(("Application", id.to_string()));
    }
    if context.is_portals_client_call == Some(true) {
        fields.push(("Portal Call", true.to_string()));
    }
    if let Some(id) = present(context.portals_contact_id) {
        fields.push(("Portal Contact", id.to_string()));
    }
    if let Some(extension) = &context.owning_extension {
        fields.push(("Extension", format_reference(extension)));
    }

    let width = fields
        .iter()
        .map(|(label, _)| label.len())
        .max()
        .unwrap_or(0)
        .max(FIELD_WIDTH);
    fields
        .into_iter()
        .map(|(label, value)| format!("{label:<width$} : {value}"))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use canary_core::{Entity, EntityReference, ParameterCollection, Value};
    use rust_decimal::Decimal;

    fn options(flags: &str) -> TraceOptions {
        TraceOptions::parse(flags)
    }

    fn render(context: Option<&ExecutionContext>, flags: &str) -> Vec<String> {
        let mut lines = Vec::new();
        trace_context(&mut lines, context, None, &options(flags));
        lines
    }

    fn update_account(id: Uuid) -> ExecutionContext {
        let target = Entity::new("account", id)
            .with("revenue", Value::money(Decimal::from(500)))
            .with("name", "Acme");
        let mut ctx = ExecutionContext::new("Update", "account")
            .with_stage(20)
            .with_entity_id(id)
            .with_input(ParameterCollection::new().with("Target", target));
        ctx.depth = 1;
        ctx
    }

    /// A sink that fails after a fixed number of lines.
    struct FailingSink {
        lines: Vec<String>,
        budget: usize,
    }

    impl TraceSink for FailingSink {
        fn write_line(&mut self, line: &str) -> Result<(), SinkError> {
            if self.lines.len() >= self.budget {
                return Err(SinkError::Closed);
            }
            self.lines.push(line.to_string());
            Ok(())
        }
    }

    /// A sink that rejects exactly one line, then accepts again.
    struct RejectOnceSink {
        lines: Vec<String>,
        reject_at: usize,
        rejected: bool,
    }

    impl TraceSink for RejectOnceSink {
        fn write_line(&mut self, line: &str) -> Result<(), SinkError> {
            if !self.rejected && self.lines.len() == self.reject_at {
                self.rejected = true;
                return Err(SinkError::Closed);
            }
            self.lines.push(line.to_string());
            Ok(())
        }
    }

    /// A sink that panics on every line.
    struct PanickingSink;

    impl TraceSink for PanickingSink {
        fn write_line(&mut self, _line: &str) -> Result<(), SinkError> {
            panic!("sink tripped")
        }
    }

    #[test]
    fn absent_context_prints_notice() {
        assert_eq!(render(None, ""), vec![NO_CONTEXT]);
    }

    #[test]
    fn panicking_sink_on_absent_context_does_not_escape() {
        let escaped = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            trace_context(&mut PanickingSink, None, None, &options(""));
        }));
        assert!(escaped.is_ok());
    }

    #[test]
    fn panicking_sink_during_diagnostic_does_not_escape() {
        let ctx = update_account(Uuid::from_u128(1));
        let escaped = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            trace_context(&mut PanickingSink, Some(&ctx), None, &options(""));
        }));
        assert!(escaped.is_ok());
    }

    #[test]
    fn update_scenario_renders_full_block() {
        let id = Uuid::from_u128(0x1234);
        let ctx = update_account(id);
        let lines = render(Some(&ctx), "");
        assert_eq!(
            lines,
            vec![
                "--- Context 1 Trace Start ---".to_string(),
                "Message : Update".to_string(),
                "Stage   : 20".to_string(),
                "Mode    : Synchronous".to_string(),
                "Depth   : 1".to_string(),
                "Entity  : account".to_string(),
                format!("Id      : {id}"),
                String::new(),
                "InputParameters".to_string(),
                format!("  Target = account {id}\n    name    = Acme\n    revenue = 500"),
                "--- Context 1 Trace End ---".to_string(),
                String::new(),
            ]
        );
    }

    #[test]
    fn stage_and_id_lines_are_optional() {
        let ctx = ExecutionContext::new("WhoAmI", "");
        let lines = render(Some(&ctx), "");
        assert!(!lines.iter().any(|l| l.starts_with("Stage")));
        assert!(!lines.iter().any(|l| l.starts_with("Id ")));
    }

    #[test]
    fn internal_stage_parent_is_skipped_but_walk_ends_cleanly() {
        let parent = ExecutionContext::new("Update", "account").with_stage(30);
        let ctx = update_account(Uuid::from_u128(1)).with_parent(parent);
        let lines = render(Some(&ctx), "PARENTCONTEXT=true;INCLUDESTAGE30=false");

        assert_eq!(lines.iter().filter(|l| l.contains("Trace Start")).count(), 1);
        assert!(!lines.iter().any(|l| l.contains("Context 2")));
        assert!(!lines.iter().any(|l| l.starts_with(EXCEPTION_HEADER)));
        // one blank line per level after the whole walk
        assert_eq!(&lines[lines.len() - 2..], &[String::new(), String::new()]);
    }

    #[test]
    fn internal_stage_included_on_request() {
        let parent = ExecutionContext::new("Update", "account").with_stage(30);
        let ctx = update_account(Uuid::from_u128(1)).with_parent(parent);
        let lines = render(Some(&ctx), "PARENTCONTEXT=true;INCLUDESTAGE30=true");
        assert!(lines.contains(&"--- Context 2 Trace Start ---".to_string()));
        assert!(lines.contains(&"Stage   : 30".to_string()));
    }

    #[test]
    fn skipped_context_still_leads_to_grandparent() {
        let grandparent = ExecutionContext::new("Create", "contact").with_stage(40);
        let parent = ExecutionContext::new("Update", "account")
            .with_stage(30)
            .with_parent(grandparent);
        let ctx = ExecutionContext::new("Update", "account")
            .with_stage(20)
            .with_parent(parent);
        let lines = render(Some(&ctx), "PARENTCONTEXT=true");
        assert!(lines.contains(&"--- Context 1 Trace Start ---".to_string()));
        assert!(!lines.contains(&"--- Context 2 Trace Start ---".to_string()));
        assert!(lines.contains(&"--- Context 3 Trace Start ---".to_string()));
        assert!(lines.contains(&"Message : Create".to_string()));
    }

    #[test]
    fn parents_ignored_without_flag() {
        let parent = ExecutionContext::new("Create", "contact").with_stage(40);
        let ctx = ExecutionContext::new("Update", "account").with_stage(20).with_parent(parent);
        let lines = render(Some(&ctx), "");
        assert!(!lines.contains(&"Message : Create".to_string()));
        assert_eq!(lines.last(), Some(&String::new()));
    }

    #[test]
    fn internal_stage_root_without_parents_prints_only_blank() {
        let ctx = ExecutionContext::new("Update", "account").with_stage(30);
        assert_eq!(render(Some(&ctx), ""), vec![String::new()]);
    }

    #[test]
    fn capability_fields_in_priority_order() {
        let user = Uuid::from_u128(1);
        let other = Uuid::from_u128(2);
        let mut ctx = ExecutionContext::new("Update", "account");
        ctx.user_agent = Some("Mozilla/5.0".into());
        ctx.user_id = Some(user);
        ctx.initiating_user_id = Some(user);
        ctx.authenticated_user_id = Some(other);
        ctx.user_azure_active_directory_object_id = Some(other);
        ctx.initiating_user_azure_active_directory_object_id = Some(other);
        ctx.initiating_user_application_id = Some(Uuid::nil());
        ctx.is_portals_client_call = Some(true);
        ctx.portals_contact_id = Some(Uuid::from_u128(3));
        ctx.owning_extension = Some(
            EntityReference::new("sdkmessageprocessingstep", Uuid::from_u128(4))
                .with_name("Canary"),
        );

        let lines = capability_lines(&ctx);
        assert_eq!(
            lines,
            vec![
                "UserAgent          : Mozilla/5.0".to_string(),
                format!("User               : {user}"),
                format!("Authenticated User : {other}"),
                format!("User AAD Object    : {other}"),
                "Portal Call        : true".to_string(),
                format!("Portal Contact     : {}", Uuid::from_u128(3)),
                format!(
                    "Extension          : sdkmessageprocessingstep {} Canary",
                    Uuid::from_u128(4)
                ),
            ]
        );
        let separators: Vec<_> = lines.iter().map(|l| l.find(" : ")).collect();
        assert!(separators.iter().all(|&col| col == Some(18)));
    }

    #[test]
    fn short_capability_labels_align_with_fixed_fields() {
        let mut ctx = ExecutionContext::new("Update", "account");
        ctx.user_id = Some(Uuid::from_u128(1));
        let lines = render(Some(&ctx), "");
        assert_eq!(lines[1], format!("User    : {}", Uuid::from_u128(1)));
        assert_eq!(lines[2], "Message : Update");
    }

    #[test]
    fn older_context_has_no_capability_lines() {
        let ctx = ExecutionContext::new("Update", "account");
        assert!(capability_lines(&ctx).is_empty());
    }

    #[test]
    fn image_collections_print_only_when_informative() {
        let image =
            ParameterCollection::new().with("PreImage", Entity::new("account", Uuid::nil()));
        let mut ctx = ExecutionContext::new("Update", "account");
        ctx.pre_entity_images = Some(image.clone());
        ctx.pre_entity_images_collection = Some(vec![image.clone()]);
        ctx.post_entity_images_collection = Some(vec![image.clone(), image.clone()]);

        let lines = render(Some(&ctx), "");
        assert!(lines.contains(&"PreEntityImages".to_string()));
        assert!(!lines.contains(&"PreEntityImagesCollection".to_string()));
        assert!(lines.contains(&"PostEntityImagesCollection : 2".to_string()));
    }

    #[test]
    fn closed_sink_keeps_partial_walk() {
        let ctx = update_account(Uuid::from_u128(1));
        let mut sink = FailingSink {
            lines: Vec::new(),
            budget: 3,
        };
        ContextWalker::new(&options(""), None).trace(&mut sink, Some(&ctx));
        // the sink stays closed, so only the partial walk survives
        assert_eq!(sink.lines.len(), 3);
        assert_eq!(sink.lines[0], "--- Context 1 Trace Start ---");
    }

    #[test]
    fn rejected_line_is_reported_and_walk_abandoned() {
        let parent = ExecutionContext::new("Create", "contact").with_stage(40);
        let ctx = update_account(Uuid::from_u128(1)).with_parent(parent);
        let mut sink = RejectOnceSink {
            lines: Vec::new(),
            reject_at: 1,
            rejected: false,
        };
        ContextWalker::new(&options("PARENTCONTEXT=true"), None).trace(&mut sink, Some(&ctx));

        assert_eq!(
            sink.lines,
            vec![
                "--- Context 1 Trace Start ---".to_string(),
                EXCEPTION_HEADER.to_string(),
                "Message : Sink is closed".to_string(),
            ]
        );
        assert!(!sink.lines.iter().any(|l| l.contains("Trace End")));
        assert!(!sink.lines.iter().any(|l| l.contains("Context 2")));
    }

    #[test]
    fn panicking_translator_is_contained() {
        struct PanickingTranslator;
        impl QueryTranslator for PanickingTranslator {
            fn translate(
                &self,
                _query: &canary_core::QueryExpression,
            ) -> Result<String, canary_core::TranslateError> {
                panic!("organization service unreachable")
            }
        }

        let ctx = ExecutionContext::new("RetrieveMultiple", "account").with_input(
            ParameterCollection::new().with("Query", canary_core::QueryExpression::new("account")),
        );
        let translator = PanickingTranslator;
        let opts = options("CONVERTQUERIES=true");
        let mut lines = Vec::new();
        ContextWalker::new(&opts, Some(&translator)).trace(&mut lines, Some(&ctx));

        let n = lines.len();
        assert_eq!(lines[n - 2], EXCEPTION_HEADER);
        assert_eq!(lines[n - 1], "Message : organization service unreachable");
        assert!(lines.contains(&"InputParameters".to_string()));
        assert!(!lines.iter().any(|l| l.contains("Trace End")));
    }
}
