//! The value domain carried by parameter groups and entity attributes.
//!
//! A closed set of platform value kinds plus an [`UnknownValue`] fallback for
//! runtime types the tracer has no dedicated rendering for.

use crate::error::FormatError;
use crate::parameters::ParameterCollection;
use crate::query::{ColumnSet, FetchExpression, QueryExpression};
use base64::Engine;
use chrono::{DateTime, SecondsFormat, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Any value that can appear in an execution context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Value {
    /// Absent value.
    Null,
    Entity(Entity),
    EntityReference(EntityReference),
    EntityCollection(EntityCollection),
    ColumnSet(ColumnSet),
    QueryExpression(QueryExpression),
    FetchExpression(FetchExpression),
    OptionSetValue(i32),
    OptionSetValueCollection(Vec<i32>),
    Money(Decimal),
    AliasedValue(AliasedValue),
    String(String),
    Int(i32),
    Long(i64),
    Double(f64),
    Decimal(Decimal),
    Boolean(bool),
    DateTime(DateTime<Utc>),
    Guid(Uuid),
    Binary(Vec<u8>),
    /// A runtime type with no dedicated case.
    Unknown(UnknownValue),
}

impl Value {
    /// Wrap a decimal as a currency amount.
    pub fn money(amount: impl Into<Decimal>) -> Self {
        Self::Money(amount.into())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Short runtime type name, last path segment only.
    pub fn type_name(&self) -> &str {
        match self {
            Self::Null => "null",
            Self::Entity(_) => "Entity",
            Self::EntityReference(_) => "EntityReference",
            Self::EntityCollection(_) => "EntityCollection",
            Self::ColumnSet(_) => "ColumnSet",
            Self::QueryExpression(_) => "QueryExpression",
            Self::FetchExpression(_) => "FetchExpression",
            Self::OptionSetValue(_) => "OptionSetValue",
            Self::OptionSetValueCollection(_) => "OptionSetValueCollection",
            Self::Money(_) => "Money",
            Self::AliasedValue(_) => "AliasedValue",
            Self::String(_) => "string",
            Self::Int(_) => "int",
            Self::Long(_) => "long",
            Self::Double(_) => "double",
            Self::Decimal(_) => "decimal",
            Self::Boolean(_) => "bool",
            Self::DateTime(_) => "DateTime",
            Self::Guid(_) => "Guid",
            Self::Binary(_) => "byte[]",
            Self::Unknown(u) => u.short_type_name(),
        }
    }

    /// The value's own text form.
    ///
    /// Composite kinds (entities, collections, queries) answer with their type
    /// name; scalars answer with their natural representation.
    pub fn text_form(&self) -> Result<String, FormatError> {
        Ok(match self {
            Self::Null => String::new(),
            Self::Entity(_)
            | Self::EntityReference(_)
            | Self::EntityCollection(_)
            | Self::ColumnSet(_)
            | Self::QueryExpression(_)
            | Self::FetchExpression(_) => self.type_name().to_string(),
            Self::OptionSetValue(code) => code.to_string(),
            Self::OptionSetValueCollection(codes) => codes
                .iter()
                .map(|c| c.to_string())
                .collect::<Vec<_>>()
                .join(";"),
            Self::Money(amount) | Self::Decimal(amount) => amount.to_string(),
            Self::AliasedValue(aliased) => return aliased.value.text_form(),
            Self::String(s) => s.clone(),
            Self::Int(n) => n.to_string(),
            Self::Long(n) => n.to_string(),
            Self::Double(n) => n.to_string(),
            Self::Boolean(b) => b.to_string(),
            Self::DateTime(dt) => dt.to_rfc3339_opts(SecondsFormat::Secs, true),
            Self::Guid(id) => id.to_string(),
            Self::Binary(bytes) => base64::engine::general_purpose::STANDARD.encode(bytes),
            Self::Unknown(u) => return u.to_text(),
        })
    }
}

/// A typed, identified data row.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub logical_name: String,
    #[serde(default)]
    pub id: Uuid,
    #[serde(default)]
    pub attributes: ParameterCollection,
}

impl Entity {
    pub fn new(logical_name: impl Into<String>, id: Uuid) -> Self {
        Self {
            logical_name: logical_name.into(),
            id,
            attributes: ParameterCollection::new(),
        }
    }

    /// Builder-style attribute setter.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(key, value);
        self
    }
}

/// A pointer to an entity, optionally carrying its display name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntityReference {
    pub logical_name: String,
    #[serde(default)]
    pub id: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl EntityReference {
    pub fn new(logical_name: impl Into<String>, id: Uuid) -> Self {
        Self {
            logical_name: logical_name.into(),
            id,
            name: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

/// A page of entities returned by a retrieve.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntityCollection {
    pub entity_name: String,
    #[serde(default)]
    pub entities: Vec<Entity>,
    /// Total count when the query asked for it, otherwise `-1` or `0`.
    #[serde(default)]
    pub total_record_count: i32,
    #[serde(default)]
    pub more_records: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paging_cookie: Option<String>,
}

impl EntityCollection {
    pub fn new(entity_name: impl Into<String>, entities: Vec<Entity>) -> Self {
        Self {
            entity_name: entity_name.into(),
            entities,
            ..Default::default()
        }
    }
}

/// A value fetched through a linked entity alias.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AliasedValue {
    #[serde(default)]
    pub entity_logical_name: String,
    #[serde(default)]
    pub attribute_logical_name: String,
    pub value: Box<Value>,
}

impl AliasedValue {
    pub fn new(
        entity_logical_name: impl Into<String>,
        attribute_logical_name: impl Into<String>,
        value: impl Into<Value>,
    ) -> Self {
        Self {
            entity_logical_name: entity_logical_name.into(),
            attribute_logical_name: attribute_logical_name.into(),
            value: Box::new(value.into()),
        }
    }
}

/// A value of a runtime type the domain does not model.
///
/// `text` is `None` when the host could not produce a text form for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnknownValue {
    pub type_name: String,
    #[serde(default)]
    pub text: Option<String>,
}

impl UnknownValue {
    pub fn new(type_name: impl Into<String>, text: Option<String>) -> Self {
        Self {
            type_name: type_name.into(),
            text,
        }
    }

    /// `Microsoft.Xrm.Sdk.Relationship` → `Relationship`, `a::b::C` → `C`.
    pub fn short_type_name(&self) -> &str {
        self.type_name
            .rsplit(['.', ':'])
            .find(|segment| !segment.is_empty())
            .unwrap_or(&self.type_name)
    }

    pub fn to_text(&self) -> Result<String, FormatError> {
        self.text.clone().ok_or_else(|| FormatError::NoTextForm {
            type_name: self.type_name.clone(),
        })
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Self::Int(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Self::Long(n)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Self::Double(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Boolean(b)
    }
}

impl From<Decimal> for Value {
    fn from(d: Decimal) -> Self {
        Self::Decimal(d)
    }
}

impl From<Uuid> for Value {
    fn from(id: Uuid) -> Self {
        Self::Guid(id)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(dt: DateTime<Utc>) -> Self {
        Self::DateTime(dt)
    }
}

impl From<Vec<u8>> for Value {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Binary(bytes)
    }
}

impl From<Entity> for Value {
    fn from(e: Entity) -> Self {
        Self::Entity(e)
    }
}

impl From<EntityReference> for Value {
    fn from(r: EntityReference) -> Self {
        Self::EntityReference(r)
    }
}

impl From<EntityCollection> for Value {
    fn from(c: EntityCollection) -> Self {
        Self::EntityCollection(c)
    }
}

impl From<ColumnSet> for Value {
    fn from(c: ColumnSet) -> Self {
        Self::ColumnSet(c)
    }
}

impl From<QueryExpression> for Value {
    fn from(q: QueryExpression) -> Self {
        Self::QueryExpression(q)
    }
}

impl From<FetchExpression> for Value {
    fn from(f: FetchExpression) -> Self {
        Self::FetchExpression(f)
    }
}

impl From<AliasedValue> for Value {
    fn from(a: AliasedValue) -> Self {
        Self::AliasedValue(a)
    }
}

impl From<UnknownValue> for Value {
    fn from(u: UnknownValue) -> Self {
        Self::Unknown(u)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}
