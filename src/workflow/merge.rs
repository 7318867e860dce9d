//! Building a fresh state or reconciling a persisted one with new input.
//!
//! Persisted state arrives as loosely-shaped JSON. [`PersistedState::from_value`]
//! decodes it field by field so a single malformed field falls back to its
//! default instead of discarding the whole record.

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::debug;

use super::state::{CodeScaffold, DocumentationEntry, Phase, TechStack, WorkflowState};
use crate::langbase::{Message, MessageRole};

/// A partially-populated workflow state recovered from persistence.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PersistedState {
    pub current_phase: Option<Phase>,
    pub message_history: Option<Vec<Message>>,
    pub requirements: Option<String>,
    pub architecture: Option<String>,
    pub tech_stack: Option<TechStack>,
    pub identified_technologies: Option<Vec<String>>,
    pub documentation_entries: Option<Vec<DocumentationEntry>>,
    pub code_scaffolds: Option<Vec<CodeScaffold>>,
    pub implementation_hints: Option<Vec<String>>,
    pub first_steps: Option<String>,
    pub needs_clarification: Option<bool>,
    pub workflow_complete: Option<bool>,
    pub metadata: Option<Map<String, Value>>,
}

impl PersistedState {
    /// Decode a persisted record. Never fails: anything unreadable is `None`.
    pub fn from_value(value: &Value) -> Self {
        let Some(object) = value.as_object() else {
            debug!("Persisted state is not an object, using defaults");
            return Self::default();
        };

        Self {
            current_phase: field::<String>(object, &["current_phase"])
                .and_then(|s| s.parse().ok()),
            message_history: list(object, &["message_history", "messages"]).map(|messages| {
                messages
                    .into_iter()
                    .filter(|m: &Message| m.role != MessageRole::System)
                    .collect()
            }),
            requirements: field(object, &["requirements"]),
            architecture: field(object, &["architecture"]),
            tech_stack: field(object, &["tech_stack"]),
            identified_technologies: list(object, &["identified_technologies"]),
            documentation_entries: list(object, &["documentation_entries", "documentation_links"]),
            code_scaffolds: list(object, &["code_scaffolds"]),
            implementation_hints: list(object, &["implementation_hints"]),
            first_steps: field(object, &["first_steps"]),
            needs_clarification: field(object, &["needs_clarification"]),
            workflow_complete: field(object, &["workflow_complete"]),
            metadata: field(object, &["metadata"]),
        }
    }
}

/// Decode the first present, well-formed key.
fn field<T: DeserializeOwned>(object: &Map<String, Value>, keys: &[&str]) -> Option<T> {
    keys.iter()
        .filter_map(|key| object.get(*key))
        .filter(|value| !value.is_null())
        .find_map(|value| serde_json::from_value(value.clone()).ok())
}

/// Decode a list element by element, dropping malformed elements.
fn list<T: DeserializeOwned>(object: &Map<String, Value>, keys: &[&str]) -> Option<Vec<T>> {
    let items = keys
        .iter()
        .filter_map(|key| object.get(*key))
        .find_map(Value::as_array)?;

    Some(
        items
            .iter()
            .filter_map(|item| serde_json::from_value(item.clone()).ok())
            .collect(),
    )
}

/// Create the state for the first message of a session.
pub fn create_initial(session_id: impl Into<String>, input: impl Into<String>) -> WorkflowState {
    WorkflowState {
        session_id: session_id.into(),
        current_phase: Phase::Planner,
        message_history: Vec::new(),
        latest_user_input: input.into(),
        requirements: None,
        architecture: None,
        tech_stack: TechStack::new(),
        identified_technologies: Vec::new(),
        documentation_entries: Vec::new(),
        code_scaffolds: Vec::new(),
        implementation_hints: Vec::new(),
        first_steps: None,
        error: None,
        needs_clarification: false,
        workflow_complete: false,
        metadata: Map::new(),
    }
}

/// Rebuild the state for a continuing session.
///
/// Every field takes the persisted value when present and its default
/// otherwise. `latest_user_input` is always the new input and `error` is
/// always cleared, so errors never survive into the next turn.
pub fn resume(
    session_id: impl Into<String>,
    persisted: &PersistedState,
    input: impl Into<String>,
) -> WorkflowState {
    let persisted = persisted.clone();
    WorkflowState {
        session_id: session_id.into(),
        current_phase: persisted.current_phase.unwrap_or_default(),
        message_history: persisted.message_history.unwrap_or_default(),
        latest_user_input: input.into(),
        requirements: persisted.requirements,
        architecture: persisted.architecture,
        tech_stack: persisted.tech_stack.unwrap_or_default(),
        identified_technologies: persisted.identified_technologies.unwrap_or_default(),
        documentation_entries: persisted.documentation_entries.unwrap_or_default(),
        code_scaffolds: persisted.code_scaffolds.unwrap_or_default(),
        implementation_hints: persisted.implementation_hints.unwrap_or_default(),
        first_steps: persisted.first_steps,
        error: None,
        needs_clarification: persisted.needs_clarification.unwrap_or(false),
        workflow_complete: persisted.workflow_complete.unwrap_or(false),
        metadata: persisted.metadata.unwrap_or_default(),
    }
}
