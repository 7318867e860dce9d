//! Tolerant parsing of generation replies into the per-phase reply variants.
//!
//! Models wrap JSON in prose or code fences more often than not. Every parse
//! here tries, in order: the whole reply, the first fenced block, then the
//! outermost `{...}` or `[...]` span. When all of them fail the caller gets a
//! defined fallback, never an error.

use serde::de::{self, DeserializeOwned, Deserializer};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use super::state::{CodeScaffold, TechStack};

/// Candidate JSON slices of a completion, most specific first.
fn json_candidates(completion: &str) -> Vec<&str> {
    let mut candidates = Vec::with_capacity(3);

    let trimmed = completion.trim();
    if !trimmed.is_empty() {
        candidates.push(trimmed);
    }

    if let Some(block) = fenced_block(completion) {
        candidates.push(block);
    }

    for (open, close) in [('{', '}'), ('[', ']')] {
        if let (Some(start), Some(end)) = (completion.find(open), completion.rfind(close)) {
            if start < end {
                candidates.push(completion[start..=end].trim());
            }
        }
    }

    candidates
}

/// Contents of the first ```json or bare ``` block.
fn fenced_block(completion: &str) -> Option<&str> {
    let body = if completion.contains("```json") {
        completion.split("```json").nth(1)?
    } else {
        completion.split("```").nth(1)?
    };

    body.split("```")
        .next()
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// Parse a completion into `T`, returning `None` when every strategy fails.
pub fn parse_tolerant<T: DeserializeOwned>(completion: &str) -> Option<T> {
    parse_tolerant_where(completion, |_: &T| true)
}

/// Like [`parse_tolerant`], but a candidate only counts when `accept` holds.
fn parse_tolerant_where<T, F>(completion: &str, accept: F) -> Option<T>
where
    T: DeserializeOwned,
    F: Fn(&T) -> bool,
{
    let parsed = json_candidates(completion).into_iter().find_map(|candidate| {
        serde_json::from_str(candidate)
            .ok()
            .filter(|value| accept(value))
    });

    if parsed.is_none() {
        debug!(
            preview = %completion.chars().take(100).collect::<String>(),
            "No parseable JSON in completion"
        );
    }
    parsed
}

// ============================================================================
// Planner
// ============================================================================

/// What the Planner's generation call decided.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PlannerReply {
    /// More information is needed from the user.
    Gathering {
        #[serde(default)]
        response: String,
    },
    /// The interview is over.
    SpecReady {
        #[serde(default)]
        requirements: String,
        #[serde(default)]
        architecture: String,
        #[serde(default, deserialize_with = "lenient_tech_stack")]
        tech_stack: TechStack,
    },
}

impl PlannerReply {
    /// Parse a Planner reply. Unparseable text becomes `Gathering` with the
    /// raw text as the response.
    pub fn parse(completion: &str) -> Self {
        parse_tolerant(completion).unwrap_or_else(|| PlannerReply::Gathering {
            response: completion.trim().to_string(),
        })
    }
}

/// Accept `{"backend": ["FastAPI"]}` as well as `{"backend": "FastAPI"}`.
/// Blank names and categories left empty are dropped.
fn lenient_tech_stack<'de, D>(deserializer: D) -> Result<TechStack, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<serde_json::Map<String, Value>>::deserialize(deserializer)?;
    let mut stack = TechStack::new();

    for (category, value) in raw.unwrap_or_default() {
        let techs: Vec<String> = match value {
            Value::String(s) => vec![s],
            Value::Array(items) => items
                .into_iter()
                .filter_map(|item| match item {
                    Value::String(s) => Some(s),
                    _ => None,
                })
                .collect(),
            Value::Null => Vec::new(),
            other => {
                return Err(de::Error::custom(format!(
                    "tech_stack.{} must be a string or list, got {}",
                    category, other
                )))
            }
        };

        let techs: Vec<String> = techs
            .into_iter()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect();

        if !techs.is_empty() {
            stack.insert(category, techs);
        }
    }

    Ok(stack)
}

// ============================================================================
// Librarian
// ============================================================================

/// Parse the technology identification reply: a JSON array of names.
///
/// Blank names and case-insensitive duplicates are dropped, keeping the first
/// spelling. Returns `None` when no array can be found or it ends up empty.
pub fn parse_technology_list(completion: &str) -> Option<Vec<String>> {
    let names: Vec<Value> = parse_tolerant(completion)?;

    let mut techs: Vec<String> = Vec::new();
    for name in names.iter().filter_map(Value::as_str).map(str::trim) {
        if !name.is_empty() && !techs.iter().any(|t| t.eq_ignore_ascii_case(name)) {
            techs.push(name.to_string());
        }
    }

    (!techs.is_empty()).then_some(techs)
}

// ============================================================================
// Mentor
// ============================================================================

/// Structured Mentor output.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct MentorPlan {
    #[serde(default)]
    pub scaffolds: Vec<CodeScaffold>,
    #[serde(default)]
    pub implementation_hints: Vec<String>,
    #[serde(default)]
    pub first_steps: String,
}

/// Mentor JSON as received; a plan needs at least one of these keys.
#[derive(Deserialize)]
struct MentorPlanFields {
    scaffolds: Option<Vec<CodeScaffold>>,
    implementation_hints: Option<Vec<String>>,
    first_steps: Option<String>,
}

impl MentorPlanFields {
    fn is_plan(&self) -> bool {
        self.scaffolds.is_some() || self.implementation_hints.is_some() || self.first_steps.is_some()
    }
}

impl From<MentorPlanFields> for MentorPlan {
    fn from(fields: MentorPlanFields) -> Self {
        Self {
            scaffolds: fields.scaffolds.unwrap_or_default(),
            implementation_hints: fields.implementation_hints.unwrap_or_default(),
            first_steps: fields.first_steps.unwrap_or_default(),
        }
    }
}

/// What the Mentor's generation call produced.
#[derive(Debug, Clone, PartialEq)]
pub enum MentorReply {
    Structured(MentorPlan),
    /// No structure could be recovered; the prose is kept as-is.
    RawText(String),
}

impl MentorReply {
    pub fn parse(completion: &str) -> Self {
        let fields =
            parse_tolerant_where::<MentorPlanFields, _>(completion, MentorPlanFields::is_plan);
        match fields {
            Some(fields) => MentorReply::Structured(fields.into()),
            None => MentorReply::RawText(completion.to_string()),
        }
    }

    /// Collapse into a plan; raw text becomes `first_steps`.
    pub fn into_plan(self) -> MentorPlan {
        match self {
            MentorReply::Structured(plan) => plan,
            MentorReply::RawText(text) => MentorPlan {
                first_steps: text,
                ..MentorPlan::default()
            },
        }
    }
}
