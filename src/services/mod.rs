//! Collaborator contracts consumed by the workflow.
//!
//! The phase handlers only ever see these traits, held behind `Arc<dyn …>`:
//! - [`GenerationService`]: LLM chat and single-prompt completion
//! - [`DocumentationSource`]: per-technology documentation retrieval
//! - [`SemanticIndex`]: best-effort indexing and pattern lookup
//!
//! Concrete implementations live in [`crate::langbase`], [`crate::docs`] and
//! [`crate::storage`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{DocsResult, LangbaseResult, StorageResult};
use crate::langbase::Message;
use crate::workflow::DocumentationEntry;

/// Text generation. Failures propagate once; retries are the implementor's concern.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GenerationService: Send + Sync {
    /// Continue a conversation under the given system instructions.
    async fn chat(
        &self,
        history: &[Message],
        system_instructions: &str,
        temperature: f64,
    ) -> LangbaseResult<String>;

    /// Answer a single prompt under the given system instructions.
    async fn complete(
        &self,
        prompt: &str,
        system_instructions: &str,
        temperature: f64,
    ) -> LangbaseResult<String>;
}

/// Documentation retrieval for one technology at a time.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DocumentationSource: Send + Sync {
    /// Fetch documentation for `technology`. `context` is the project
    /// requirements and may be used to focus the search. An empty list is a
    /// valid answer.
    async fn fetch(&self, technology: &str, context: &str) -> DocsResult<Vec<DocumentationEntry>>;
}

/// Best-effort store of documentation and reusable code patterns.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SemanticIndex: Send + Sync {
    /// Store a documentation entry, returning its id.
    async fn index(&self, entry: &DocumentationEntry) -> StorageResult<String>;

    /// Store a reusable code pattern, returning its id.
    async fn store_pattern(&self, pattern: &CodePattern) -> StorageResult<String>;

    /// The `top_k` patterns most relevant to `query`.
    async fn search(&self, query: &str, top_k: usize) -> StorageResult<Vec<CodePattern>>;
}

/// A reusable snippet the Mentor can draw on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodePattern {
    #[serde(default)]
    pub id: String,
    pub pattern_name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub use_case: String,
    #[serde(default)]
    pub technologies: Vec<String>,
    pub code_snippet: String,
}

impl CodePattern {
    pub fn new(pattern_name: impl Into<String>, code_snippet: impl Into<String>) -> Self {
        Self {
            id: String::new(),
            pattern_name: pattern_name.into(),
            description: String::new(),
            use_case: String::new(),
            technologies: Vec::new(),
            code_snippet: code_snippet.into(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_use_case(mut self, use_case: impl Into<String>) -> Self {
        self.use_case = use_case.into();
        self
    }

    pub fn with_technologies(mut self, technologies: Vec<String>) -> Self {
        self.technologies = technologies;
        self
    }

    /// Lower-cased words describing the pattern.
    fn keywords(&self) -> Vec<String> {
        let mut words = tokenize(&self.pattern_name);
        words.extend(tokenize(&self.description));
        words.extend(tokenize(&self.use_case));
        for tech in &self.technologies {
            words.extend(tokenize(tech));
        }
        words
    }
}

/// Split text into lower-cased alphanumeric words of two or more characters.
fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric() && c != '+' && c != '#')
        .filter(|w| w.chars().count() > 1)
        .map(str::to_lowercase)
        .collect()
}

/// Rank patterns by how many distinct query words they mention.
///
/// Patterns sharing no word with the query are dropped. Ties keep the input
/// order, so callers pass patterns oldest first.
pub fn rank_patterns(query: &str, patterns: Vec<CodePattern>, top_k: usize) -> Vec<CodePattern> {
    let mut query_words = tokenize(query);
    query_words.sort();
    query_words.dedup();

    let mut scored: Vec<(usize, CodePattern)> = patterns
        .into_iter()
        .map(|pattern| {
            let keywords = pattern.keywords();
            let score = query_words
                .iter()
                .filter(|w| keywords.contains(w))
                .count();
            (score, pattern)
        })
        .filter(|(score, _)| *score > 0)
        .collect();

    // stable sort keeps insertion order among equal scores
    scored.sort_by(|a, b| b.0.cmp(&a.0));
    scored.into_iter().take(top_k).map(|(_, p)| p).collect()
}
