//! Value formatter: renders any [`Value`] as trace text.
//!
//! Formatting is total: every value produces text. A value whose text form
//! cannot be produced is rendered as an inline `*** Cannot stringify` marker
//! instead of failing the trace.

use canary_config::{DEFAULT_MAX_ITEM_LENGTH, TraceOptions};
use canary_core::{
    ColumnSet, Entity, EntityCollection, EntityReference, FormatError, QueryExpression,
    QueryTranslator, Value,
};

/// Options that shape how individual values render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatOptions {
    /// Append ` \t(<type>)` to scalar-like values and collection headers
    pub include_type_suffix: bool,
    /// Translate structured queries when a translator is available
    pub convert_queries: bool,
    /// Render every member of an entity collection
    pub expand_collections: bool,
    /// Truncate scalar text beyond this many chars; 0 disables
    pub max_item_length: usize,
}

impl Default for FormatOptions {
    fn default() -> Self {
        Self {
            include_type_suffix: false,
            convert_queries: false,
            expand_collections: false,
            max_item_length: DEFAULT_MAX_ITEM_LENGTH,
        }
    }
}

impl From<&TraceOptions> for FormatOptions {
    fn from(options: &TraceOptions) -> Self {
        Self {
            include_type_suffix: options.attribute_types,
            convert_queries: options.convert_queries,
            expand_collections: options.expand_collections,
            max_item_length: options.max_item_length,
        }
    }
}

/// Two spaces per indent level.
pub fn indent_string(indent: usize) -> String {
    " ".repeat(indent * 2)
}

/// Renders values with fixed options and an optional query translator.
pub struct ValueFormatter<'a> {
    options: FormatOptions,
    translator: Option<&'a dyn QueryTranslator>,
}

impl<'a> ValueFormatter<'a> {
    pub fn new(options: FormatOptions, translator: Option<&'a dyn QueryTranslator>) -> Self {
        Self {
            options,
            translator,
        }
    }

    pub fn options(&self) -> &FormatOptions {
        &self.options
    }

    /// Render `value` at the given indent level.
    pub fn format(&self, value: &Value, indent: usize) -> String {
        let pad = indent_string(indent);
        match value {
            Value::Null => format!("{pad}<null>"),
            Value::Entity(entity) => self.format_entity(entity, indent),
            Value::ColumnSet(columns) => format_columns(columns, &pad),
            Value::EntityCollection(collection) => self.format_collection(collection, indent),
            Value::QueryExpression(query) => self.format_query(query, &pad),
            Value::FetchExpression(fetch) => {
                format!("{}\n{pad}{}", value.type_name(), fetch.query)
            }
            Value::EntityReference(reference) => format_reference(reference),
            Value::AliasedValue(aliased) => self.format(&aliased.value, indent),
            _ => self.format_scalar(value, &pad),
        }
    }

    fn format_entity(&self, entity: &Entity, indent: usize) -> String {
        let pad = indent_string(indent);
        let keylen = entity.attributes.longest_key().unwrap_or(0);
        let lines: Vec<String> = entity
            .attributes
            .sorted()
            .into_iter()
            .map(|(key, value)| format!("{key:<keylen$} = {}", self.format(value, indent + 1)))
            .collect();
        format!(
            "{} {}\n{pad}{}",
            entity.logical_name,
            entity.id,
            lines.join(&format!("\n{pad}"))
        )
    }

    fn format_collection(&self, collection: &EntityCollection, indent: usize) -> String {
        let pad = indent_string(indent);
        let count = collection.entities.len();
        let mut result = format!("{count} {}(s)", collection.entity_name);
        result.push_str(&self.type_suffix("EntityCollection"));

        if collection.total_record_count > 0 {
            result.push_str(&format!("\n{pad}TotalRecordCount: {}", collection.total_record_count));
        }
        if collection.more_records {
            result.push_str(&format!("\n{pad}MoreRecords: true"));
        }
        if let Some(cookie) = collection.paging_cookie.as_deref() {
            if !cookie.trim().is_empty() {
                result.push_str(&format!("\n{pad}PagingCookie: {cookie}"));
            }
        }

        if self.options.expand_collections && count > 0 {
            let members: Vec<String> = collection
                .entities
                .iter()
                .map(|entity| self.format_entity(entity, indent))
                .collect();
            result.push_str(&format!("\n{pad}{}", members.join(&format!("\n{pad}"))));
        } else if !self.options.expand_collections && count == 1 {
            let member = self.format_entity(&collection.entities[0], indent + 1);
            result.push_str(&format!("\n{pad}{member}"));
        }
        result
    }

    fn format_query(&self, query: &QueryExpression, pad: &str) -> String {
        let object_form = "QueryExpression".to_string();
        if !self.options.convert_queries {
            return object_form;
        }
        let Some(translator) = self.translator else {
            return object_form;
        };
        match translator.translate(query) {
            Ok(text) => format!("{object_form}\n{pad}{text}"),
            Err(e) => {
                tracing::warn!(
                    entity = %query.entity_name,
                    error = %e,
                    "Query translation failed, tracing the query object instead"
                );
                object_form
            }
        }
    }

    fn format_scalar(&self, value: &Value, pad: &str) -> String {
        let text = match value {
            Value::OptionSetValue(_) | Value::OptionSetValueCollection(_) | Value::Money(_) => {
                value.text_form()
            }
            _ => value
                .text_form()
                .map(|text| self.truncate(&text.replace('\n', &format!("\n  {pad}")))),
        };
        match text {
            Ok(text) => text + &self.type_suffix(value.type_name()),
            Err(e) => cannot_stringify(value, &e),
        }
    }

    fn truncate(&self, text: &str) -> String {
        let max = self.options.max_item_length;
        let len = text.chars().count();
        if max == 0 || len <= max {
            return text.to_string();
        }
        let head: String = text.chars().take(max).collect();
        format!("{head}... ({len})")
    }

    fn type_suffix(&self, type_name: &str) -> String {
        if self.options.include_type_suffix {
            format!(" \t({type_name})")
        } else {
            String::new()
        }
    }
}

/// `<logical name> <id> <display name>`.
pub fn format_reference(reference: &EntityReference) -> String {
    format!(
        "{} {} {}",
        reference.logical_name,
        reference.id,
        reference.name.as_deref().unwrap_or_default()
    )
}

fn format_columns(columns: &ColumnSet, pad: &str) -> String {
    format!("\n{pad}{}", columns.sorted().join(&format!("\n{pad}")))
}

fn cannot_stringify(value: &Value, error: &FormatError) -> String {
    let described = match value {
        Value::Unknown(unknown) => unknown.type_name.as_str(),
        other => other.type_name(),
    };
    format!("*** Cannot stringify value:{described}\n*** {error}")
}
