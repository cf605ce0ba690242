//! Structured query model: column selections, query expressions, and
//! pre-serialized FetchXML.

use crate::value::Value;
use serde::{Deserialize, Serialize};

/// A requested-attributes specification.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ColumnSet {
    #[serde(default)]
    pub columns: Vec<String>,
    #[serde(default)]
    pub all_columns: bool,
}

impl ColumnSet {
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            all_columns: false,
        }
    }

    pub fn all() -> Self {
        Self {
            columns: Vec::new(),
            all_columns: true,
        }
    }

    /// Column names in ascending order.
    pub fn sorted(&self) -> Vec<&str> {
        let mut columns: Vec<&str> = self.columns.iter().map(String::as_str).collect();
        columns.sort_unstable();
        columns
    }
}

/// A query expressed as an object graph.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryExpression {
    pub entity_name: String,
    #[serde(default)]
    pub column_set: ColumnSet,
    #[serde(default)]
    pub criteria: FilterExpression,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub orders: Vec<OrderExpression>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_count: Option<u32>,
    #[serde(default)]
    pub distinct: bool,
}

impl QueryExpression {
    pub fn new(entity_name: impl Into<String>) -> Self {
        Self {
            entity_name: entity_name.into(),
            ..Default::default()
        }
    }

    pub fn with_columns(mut self, columns: ColumnSet) -> Self {
        self.column_set = columns;
        self
    }

    pub fn with_condition(mut self, condition: ConditionExpression) -> Self {
        self.criteria.conditions.push(condition);
        self
    }

    pub fn with_order(mut self, attribute: impl Into<String>, descending: bool) -> Self {
        self.orders.push(OrderExpression {
            attribute_name: attribute.into(),
            descending,
        });
        self
    }

    pub fn with_top(mut self, count: u32) -> Self {
        self.top_count = Some(count);
        self
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogicalOperator {
    #[default]
    And,
    Or,
}

impl LogicalOperator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::And => "and",
            Self::Or => "or",
        }
    }
}

/// A group of conditions joined by one logical operator, with nested groups.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterExpression {
    #[serde(default)]
    pub filter_operator: LogicalOperator,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<ConditionExpression>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub filters: Vec<FilterExpression>,
}

impl FilterExpression {
    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty() && self.filters.iter().all(FilterExpression::is_empty)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionExpression {
    pub attribute_name: String,
    pub operator: ConditionOperator,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub values: Vec<Value>,
}

impl ConditionExpression {
    pub fn new(
        attribute_name: impl Into<String>,
        operator: ConditionOperator,
        values: Vec<Value>,
    ) -> Self {
        Self {
            attribute_name: attribute_name.into(),
            operator,
            values,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionOperator {
    Equal,
    NotEqual,
    GreaterThan,
    GreaterEqual,
    LessThan,
    LessEqual,
    Like,
    NotLike,
    In,
    NotIn,
    Null,
    NotNull,
    BeginsWith,
    EndsWith,
}

impl ConditionOperator {
    /// The operator's FetchXML spelling.
    pub fn fetch_name(&self) -> &'static str {
        match self {
            Self::Equal => "eq",
            Self::NotEqual => "ne",
            Self::GreaterThan => "gt",
            Self::GreaterEqual => "ge",
            Self::LessThan => "lt",
            Self::LessEqual => "le",
            Self::Like => "like",
            Self::NotLike => "not-like",
            Self::In => "in",
            Self::NotIn => "not-in",
            Self::Null => "null",
            Self::NotNull => "not-null",
            Self::BeginsWith => "begins-with",
            Self::EndsWith => "ends-with",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderExpression {
    pub attribute_name: String,
    #[serde(default)]
    pub descending: bool,
}

/// A query already serialized as FetchXML.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchExpression {
    pub query: String,
}

impl FetchExpression {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
        }
    }
}
