//! # Canary Core
//!
//! Domain types, traits, and error definitions for the Canary execution
//! context tracer. This crate knows nothing about rendering; it defines the
//! model that the tracer walks.
//!
//! ## Design Philosophy
//!
//! The host owns the context tree; the tracer only borrows it. Collaborators
//! the host supplies (the line sink and the optional query translator) are
//! traits defined here, so tests can use in-memory stand-ins.

pub mod context;
pub mod error;
pub mod parameters;
pub mod query;
pub mod sink;
pub mod translator;
pub mod value;

// Re-export key types at crate root for ergonomics
pub use context::{ExecutionContext, ExecutionMode, INTERNAL_STAGE};
pub use error::{FormatError, SinkError, TranslateError};
pub use parameters::ParameterCollection;
pub use query::{
    ColumnSet, ConditionExpression, ConditionOperator, FetchExpression, FilterExpression,
    LogicalOperator, OrderExpression, QueryExpression,
};
pub use sink::{TraceSink, WriterSink};
pub use translator::QueryTranslator;
pub use value::{AliasedValue, Entity, EntityCollection, EntityReference, UnknownValue, Value};
