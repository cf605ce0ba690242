//! Execution context: one invocation step in the extension pipeline.
//!
//! Newer pipeline versions expose more fields. Every such field is an
//! `Option`, so a context built by an older host simply leaves them `None`.

use crate::parameters::ParameterCollection;
use crate::value::EntityReference;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The platform's reserved internal pipeline stage.
pub const INTERNAL_STAGE: i32 = 30;

/// How the step was registered to run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionMode {
    #[default]
    Synchronous,
    Asynchronous,
}

impl std::fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Synchronous => write!(f, "Synchronous"),
            Self::Asynchronous => write!(f, "Asynchronous"),
        }
    }
}

/// Immutable view over one invocation step, possibly chained to the step
/// that triggered it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutionContext {
    /// Operation name (e.g. `Create`, `Update`)
    pub message_name: String,

    /// Pipeline stage; `None` on contexts outside the plugin pipeline
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage: Option<i32>,

    pub mode: ExecutionMode,

    /// Nesting depth reported by the host
    pub depth: i32,

    pub primary_entity_name: String,

    /// Nil means "no primary entity"
    pub primary_entity_id: Uuid,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_parameters: Option<ParameterCollection>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_parameters: Option<ParameterCollection>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shared_variables: Option<ParameterCollection>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pre_entity_images: Option<ParameterCollection>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post_entity_images: Option<ParameterCollection>,

    // --- Capability extensions ---
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub initiating_user_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authenticated_user_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_azure_active_directory_object_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub initiating_user_azure_active_directory_object_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub initiating_user_application_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_portals_client_call: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub portals_contact_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owning_extension: Option<EntityReference>,

    /// One image map per registered step (newest capability level)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pre_entity_images_collection: Option<Vec<ParameterCollection>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post_entity_images_collection: Option<Vec<ParameterCollection>>,

    /// The context that triggered this one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_context: Option<Box<ExecutionContext>>,
}

impl ExecutionContext {
    pub fn new(message_name: impl Into<String>, primary_entity_name: impl Into<String>) -> Self {
        Self {
            message_name: message_name.into(),
            primary_entity_name: primary_entity_name.into(),
            ..Default::default()
        }
    }

    pub fn with_stage(mut self, stage: i32) -> Self {
        self.stage = Some(stage);
        self
    }

    pub fn with_entity_id(mut self, id: Uuid) -> Self {
        self.primary_entity_id = id;
        self
    }

    pub fn with_input(mut self, params: ParameterCollection) -> Self {
        self.input_parameters = Some(params);
        self
    }

    pub fn with_parent(mut self, parent: ExecutionContext) -> Self {
        self.parent_context = Some(Box::new(parent));
        self
    }

    pub fn parent(&self) -> Option<&ExecutionContext> {
        self.parent_context.as_deref()
    }

    /// Whether this context runs in the platform's internal stage.
    pub fn is_internal_stage(&self) -> bool {
        self.stage == Some(INTERNAL_STAGE)
    }

    /// This context followed by each ancestor, nearest first.
    pub fn chain(&self) -> impl Iterator<Item = &ExecutionContext> {
        std::iter::successors(Some(self), |ctx| ctx.parent())
    }
}
