//! Execution context tracing for Canary.
//!
//! Renders an [`ExecutionContext`](canary_core::ExecutionContext), its
//! parameter groups, and optionally its parent chain into aligned,
//! deterministic trace lines. Output goes to any
//! [`TraceSink`](canary_core::TraceSink); structured queries can be expanded
//! through a [`QueryTranslator`](canary_core::QueryTranslator).

pub mod block;
pub mod fetchxml;
pub mod format;
mod guard;
pub mod plugin;
pub mod sink;
pub mod walker;

pub use block::{print_block, print_block_collection};
pub use fetchxml::FetchXmlTranslator;
pub use format::{FormatOptions, ValueFormatter};
pub use plugin::{CanaryPlugin, write_timestamped};
pub use sink::TracingSink;
pub use walker::{ContextWalker, trace_context};
