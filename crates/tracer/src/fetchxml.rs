//! Local query translator: converts a [`QueryExpression`] into FetchXML
//! without a round trip to the platform.

use canary_core::{
    ConditionOperator, FilterExpression, QueryExpression, QueryTranslator, TranslateError,
};

/// Builds single-line FetchXML from a query object graph.
#[derive(Debug, Default, Clone, Copy)]
pub struct FetchXmlTranslator;

impl QueryTranslator for FetchXmlTranslator {
    fn translate(&self, query: &QueryExpression) -> Result<String, TranslateError> {
        if query.entity_name.trim().is_empty() {
            return Err(TranslateError::MissingEntity);
        }

        let mut xml = String::from("<fetch");
        if let Some(top) = query.top_count {
            xml.push_str(&format!(" top=\"{top}\""));
        }
        if query.distinct {
            xml.push_str(" distinct=\"true\"");
        }
        xml.push('>');

        xml.push_str(&format!("<entity name=\"{}\">", escape(&query.entity_name)));
        if query.column_set.all_columns {
            xml.push_str("<all-attributes />");
        } else {
            for column in &query.column_set.columns {
                xml.push_str(&format!("<attribute name=\"{}\" />", escape(column)));
            }
        }
        for order in &query.orders {
            xml.push_str(&format!("<order attribute=\"{}\"", escape(&order.attribute_name)));
            if order.descending {
                xml.push_str(" descending=\"true\"");
            }
            xml.push_str(" />");
        }
        write_filter(&mut xml, &query.criteria)?;
        xml.push_str("</entity></fetch>");
        Ok(xml)
    }
}

fn write_filter(xml: &mut String, filter: &FilterExpression) -> Result<(), TranslateError> {
    if filter.is_empty() {
        return Ok(());
    }

    xml.push_str(&format!("<filter type=\"{}\">", filter.filter_operator.as_str()));
    for condition in &filter.conditions {
        let values = condition
            .values
            .iter()
            .map(|v| v.text_form().map(|t| escape(&t)))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| {
                TranslateError::Failed(format!("condition on {}: {e}", condition.attribute_name))
            })?;

        xml.push_str(&format!(
            "<condition attribute=\"{}\" operator=\"{}\"",
            escape(&condition.attribute_name),
            condition.operator.fetch_name()
        ));
        match (condition.operator, values.as_slice()) {
            (ConditionOperator::Null | ConditionOperator::NotNull, _) | (_, []) => {
                xml.push_str(" />");
            }
            (ConditionOperator::In | ConditionOperator::NotIn, many) => {
                xml.push('>');
                for value in many {
                    xml.push_str(&format!("<value>{value}</value>"));
                }
                xml.push_str("</condition>");
            }
            (_, [single]) => xml.push_str(&format!(" value=\"{single}\" />")),
            (_, [first, ..]) => {
                tracing::debug!(
                    attribute = %condition.attribute_name,
                    "Multiple values on a single-value operator, using the first"
                );
                xml.push_str(&format!(" value=\"{first}\" />"));
            }
        }
    }
    for nested in &filter.filters {
        write_filter(xml, nested)?;
    }
    xml.push_str("</filter>");
    Ok(())
}

fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            other => escaped.push(other),
        }
    }
    escaped
}
