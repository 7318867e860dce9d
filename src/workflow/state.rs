//! The workflow state schema shared by every phase, the predicates and the merger.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use tracing::{info, warn};

use crate::langbase::Message;

/// Technologies grouped by category, e.g. `backend -> [FastAPI]`.
pub type TechStack = BTreeMap<String, Vec<String>>;

/// Workflow phase.
///
/// Variants are declared in execution order so that `Ord` reflects forward
/// progress through the workflow.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Requirements interview.
    #[default]
    Planner,
    /// Documentation research.
    Librarian,
    /// Scaffold generation.
    Mentor,
}

impl Phase {
    /// Get the phase name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Planner => "planner",
            Phase::Librarian => "librarian",
            Phase::Mentor => "mentor",
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Phase {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "planner" => Ok(Phase::Planner),
            "librarian" => Ok(Phase::Librarian),
            "mentor" => Ok(Phase::Mentor),
            _ => Err(format!("Unknown phase: {}", s)),
        }
    }
}

/// One retrieved unit of documentation with its source attribution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentationEntry {
    /// Technology the section documents.
    #[serde(alias = "tech_name")]
    pub technology: String,
    /// Page (or anchor) the section was taken from.
    #[serde(alias = "doc_url")]
    pub source_url: String,
    /// Section heading.
    #[serde(alias = "section")]
    pub section_title: String,
    /// Extracted section text.
    #[serde(default, alias = "scraped_content")]
    pub content: String,
    /// Relevance score (0.0-1.0).
    #[serde(default = "default_relevance", alias = "relevance_score")]
    pub relevance: f64,
    /// True for the placeholder produced when no documentation site is known.
    #[serde(default)]
    pub is_fallback: bool,
}

fn default_relevance() -> f64 {
    1.0
}

impl DocumentationEntry {
    /// Create an entry with full relevance.
    pub fn new(
        technology: impl Into<String>,
        source_url: impl Into<String>,
        section_title: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            technology: technology.into(),
            source_url: source_url.into(),
            section_title: section_title.into(),
            content: content.into(),
            relevance: default_relevance(),
            is_fallback: false,
        }
    }

    /// Placeholder entry for a technology without a known documentation site.
    pub fn fallback(technology: &str) -> Self {
        let query = technology.split_whitespace().collect::<Vec<_>>().join("+");
        Self {
            technology: technology.to_string(),
            source_url: format!("https://www.google.com/search?q={}+documentation", query),
            section_title: format!("{} Documentation", technology),
            content: format!(
                "Documentation for {} is not indexed. Search online for the official docs.",
                technology
            ),
            relevance: 0.5,
            is_fallback: true,
        }
    }

    /// Set the relevance score, clamped to 0.0-1.0.
    pub fn with_relevance(mut self, relevance: f64) -> Self {
        self.relevance = relevance.clamp(0.0, 1.0);
        self
    }
}

/// A generated skeletal file with deliberate gaps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeScaffold {
    pub file_path: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub hints: Vec<String>,
    /// Whether the user has filled the gaps in.
    #[serde(default)]
    pub completed: bool,
}

/// The record threaded through every node of the workflow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowState {
    pub session_id: String,
    pub current_phase: Phase,
    pub message_history: Vec<Message>,
    pub latest_user_input: String,
    pub requirements: Option<String>,
    pub architecture: Option<String>,
    pub tech_stack: TechStack,
    pub identified_technologies: Vec<String>,
    pub documentation_entries: Vec<DocumentationEntry>,
    pub code_scaffolds: Vec<CodeScaffold>,
    pub implementation_hints: Vec<String>,
    /// Recommended implementation order produced by the Mentor.
    pub first_steps: Option<String>,
    pub error: Option<String>,
    pub needs_clarification: bool,
    pub workflow_complete: bool,
    pub metadata: Map<String, Value>,
}

/// Partial update returned by a phase handler.
///
/// `messages` are appended to the history and `metadata` is merged key by
/// key; every other field replaces the state's value when present.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StateDelta {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_phase: Option<Phase>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requirements: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub architecture: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tech_stack: Option<TechStack>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identified_technologies: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub documentation_entries: Option<Vec<DocumentationEntry>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code_scaffolds: Option<Vec<CodeScaffold>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub implementation_hints: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_steps: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub needs_clarification: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workflow_complete: Option<bool>,
    #[serde(skip_serializing_if = "Map::is_empty")]
    pub metadata: Map<String, Value>,
    /// Allow `current_phase` to move backwards. Set by the Planner when a new
    /// specification re-opens research on a session that was further along.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub reopen: bool,
}

impl StateDelta {
    /// Insert a metadata entry.
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

impl WorkflowState {
    /// Fold a handler delta into the state.
    ///
    /// The phase never moves backwards: a delta carrying an earlier phase
    /// than the current one leaves `current_phase` untouched, unless the
    /// delta is marked `reopen`.
    pub fn apply(&mut self, delta: StateDelta) {
        self.message_history.extend(delta.messages);

        if let Some(phase) = delta.current_phase {
            if phase >= self.current_phase || delta.reopen {
                if phase < self.current_phase {
                    info!(
                        session_id = %self.session_id,
                        from = %self.current_phase,
                        to = %phase,
                        "Re-opening earlier phase"
                    );
                }
                self.current_phase = phase;
            } else {
                warn!(
                    session_id = %self.session_id,
                    current = %self.current_phase,
                    requested = %phase,
                    "Ignoring backward phase transition"
                );
            }
        }

        if let Some(requirements) = delta.requirements {
            self.requirements = Some(requirements);
        }
        if let Some(architecture) = delta.architecture {
            self.architecture = Some(architecture);
        }
        if let Some(tech_stack) = delta.tech_stack {
            self.tech_stack = tech_stack;
        }
        if let Some(techs) = delta.identified_technologies {
            self.identified_technologies = techs;
        }
        if let Some(entries) = delta.documentation_entries {
            self.documentation_entries = entries;
        }
        if let Some(scaffolds) = delta.code_scaffolds {
            self.code_scaffolds = scaffolds;
        }
        if let Some(hints) = delta.implementation_hints {
            self.implementation_hints = hints;
        }
        if let Some(first_steps) = delta.first_steps {
            self.first_steps = Some(first_steps);
        }
        if let Some(error) = delta.error {
            self.error = Some(error);
        }
        if let Some(flag) = delta.needs_clarification {
            self.needs_clarification = flag;
        }
        if let Some(flag) = delta.workflow_complete {
            self.workflow_complete = flag;
        }

        self.metadata.extend(delta.metadata);
    }

    /// Every technology in the tech stack, in category order.
    pub fn flattened_tech_stack(&self) -> Vec<String> {
        flatten_tech_stack(&self.tech_stack)
    }
}

/// Flatten a tech stack into its technologies, dropping repeats.
pub fn flatten_tech_stack(tech_stack: &TechStack) -> Vec<String> {
    let mut flat: Vec<String> = Vec::new();
    for tech in tech_stack.values().flatten() {
        if !flat.iter().any(|seen| seen.eq_ignore_ascii_case(tech)) {
            flat.push(tech.clone());
        }
    }
    flat
}
