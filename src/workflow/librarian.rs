//! Librarian phase: documentation research.
//!
//! Every step after the precondition check is fault-tolerant:
//! 1. Normalize the tech stack (fast model), falling back to flattening it
//! 2. Fetch documentation for each technology concurrently; a failed fetch
//!    only loses that technology's entries
//! 3. Index the entries, best effort
//! 4. Synthesize a cited briefing, falling back to raw citations

use futures::future::join_all;
use std::time::Instant;
use tracing::{debug, info, warn};

use super::core::PhaseCore;
use super::outcome::{Outcome, TaskLedger};
use super::parse::parse_technology_list;
use super::render::{self, truncate_chars};
use super::state::{flatten_tech_stack, DocumentationEntry, Phase, StateDelta, WorkflowState};
use super::failure_delta;
use crate::config::WorkflowConfig;
use crate::error::{LangbaseError, PhaseError};
use crate::langbase::Message;
use crate::prompts::{system_prompt_for, TECH_IDENTIFIER_PROMPT};

const IDENTIFY_TEMPERATURE: f64 = 0.1;
const SYNTHESIS_TEMPERATURE: f64 = 0.3;
/// Characters of each entry quoted in the synthesis prompt.
const SYNTHESIS_SNIPPET_CHARS: usize = 600;
/// Characters of each entry shown by the citation fallback.
const CITATION_SNIPPET_CHARS: usize = 800;

const NO_DOCS_MESSAGE: &str = "No documentation was found for the identified technologies.";

/// Gathers and summarizes documentation for the planned stack.
#[derive(Clone)]
pub struct LibrarianPhase {
    core: PhaseCore,
    synthesis_entry_cap: usize,
}

impl LibrarianPhase {
    pub fn new(core: PhaseCore, config: &WorkflowConfig) -> Self {
        Self {
            core,
            synthesis_entry_cap: config.synthesis_entry_cap,
        }
    }

    pub async fn process(&self, state: &WorkflowState) -> StateDelta {
        let start = Instant::now();
        info!(session_id = %state.session_id, "Librarian processing");

        if state.tech_stack.is_empty() {
            warn!(session_id = %state.session_id, "Librarian invoked without a tech stack");
            let err = PhaseError::Precondition {
                message: "Planner phase incomplete: no tech stack available".to_string(),
            };
            return failure_delta(Phase::Librarian, None, &err);
        }

        let context = format!(
            "{}\n{}",
            state.requirements.as_deref().unwrap_or_default(),
            state.architecture.as_deref().unwrap_or_default()
        );
        let mut ledger = TaskLedger::new();

        let identify = self.identify_technologies(state).await;
        let technologies = ledger.record("identify_technologies", identify);

        let fetch = self.fetch_all(&technologies, context.trim()).await;
        let entries = ledger.record("fetch_documentation", fetch);

        let indexing = self.index_entries(&entries).await;
        ledger.record("index_documentation", indexing);

        let synthesis = self.synthesize(&entries, context.trim(), &technologies).await;
        let synthesis = ledger.record("synthesize", synthesis);

        info!(
            session_id = %state.session_id,
            technologies = technologies.len(),
            docs_count = entries.len(),
            degraded = ledger.degraded_count(),
            latency_ms = start.elapsed().as_millis(),
            "Librarian finished"
        );

        let response = render::librarian_response(&technologies, &synthesis, &entries);
        let docs_count = entries.len();

        StateDelta {
            messages: vec![Message::assistant(response)],
            current_phase: Some(Phase::Mentor),
            identified_technologies: Some(technologies),
            documentation_entries: Some(entries),
            needs_clarification: Some(false),
            ..Default::default()
        }
        .with_metadata("librarian_status", "complete")
        .with_metadata("docs_count", docs_count)
        .with_metadata("librarian_tasks", ledger.to_metadata())
    }

    /// Ask the fast model for canonical technology names.
    async fn identify_technologies(&self, state: &WorkflowState) -> Outcome<Vec<String>> {
        let stack_json = serde_json::to_string_pretty(&state.tech_stack).unwrap_or_default();
        let prompt = format!(
            "Tech stack from the project specification:\n{}\n\n\
             Return a JSON array of every technology that needs a documentation lookup.",
            stack_json
        );

        let result = self
            .core
            .fast()
            .complete(&prompt, TECH_IDENTIFIER_PROMPT, IDENTIFY_TEMPERATURE)
            .await
            .map_err(|e| e.to_string())
            .and_then(|completion| {
                parse_technology_list(&completion)
                    .ok_or_else(|| "reply contained no technology list".to_string())
            });

        Outcome::from_result(result, || flatten_tech_stack(&state.tech_stack))
    }

    /// Fetch every technology concurrently, keeping whatever succeeds.
    async fn fetch_all(
        &self,
        technologies: &[String],
        context: &str,
    ) -> Outcome<Vec<DocumentationEntry>> {
        let fetches = technologies.iter().map(|tech| async move {
            let result = self.core.docs().fetch(tech, context).await;
            (tech, result)
        });

        let mut entries = Vec::new();
        let mut failures = Vec::new();

        for (tech, result) in join_all(fetches).await {
            match result {
                Ok(found) => {
                    debug!(technology = %tech, entries = found.len(), "Documentation fetched");
                    entries.extend(found);
                }
                Err(e) => {
                    warn!(technology = %tech, error = %e, "Documentation fetch failed");
                    failures.push(format!("{}: {}", tech, e));
                }
            }
        }

        if failures.is_empty() {
            Outcome::Ok(entries)
        } else {
            Outcome::Degraded {
                value: entries,
                reason: failures.join("; "),
            }
        }
    }

    /// Store entries in the semantic index. Failures are only reported.
    async fn index_entries(&self, entries: &[DocumentationEntry]) -> Outcome<usize> {
        let results = join_all(entries.iter().map(|entry| self.core.index().index(entry))).await;

        let failed: Vec<String> = results
            .into_iter()
            .filter_map(Result::err)
            .map(|e| e.to_string())
            .collect();
        let stored = entries.len() - failed.len();

        match failed.first() {
            None => Outcome::Ok(stored),
            Some(first) => Outcome::Degraded {
                value: stored,
                reason: format!("{} of {} entries not indexed: {}", failed.len(), entries.len(), first),
            },
        }
    }

    /// Cited briefing from the fast model, or raw citations if it fails.
    async fn synthesize(
        &self,
        entries: &[DocumentationEntry],
        context: &str,
        technologies: &[String],
    ) -> Outcome<String> {
        if entries.is_empty() {
            return Outcome::Ok(NO_DOCS_MESSAGE.to_string());
        }

        let citations: String = entries
            .iter()
            .take(self.synthesis_entry_cap)
            .enumerate()
            .map(|(i, entry)| {
                format!(
                    "[{}] {}: {}\nURL: {}\n{}\n---\n",
                    i + 1,
                    entry.technology,
                    entry.section_title,
                    entry.source_url,
                    truncate_chars(&entry.content, SYNTHESIS_SNIPPET_CHARS)
                )
            })
            .collect();

        let prompt = format!(
            "Project context:\n{}\n\nTechnologies: {}\n\nDocumentation sources:\n{}\n\
             Synthesize this documentation into a practical guide for building the project. \
             Cite sources inline with their [n] numbers.",
            context,
            technologies.join(", "),
            citations
        );

        let result: Result<String, LangbaseError> = self
            .core
            .fast()
            .chat(
                &[Message::user(prompt)],
                system_prompt_for(Phase::Librarian),
                SYNTHESIS_TEMPERATURE,
            )
            .await;

        Outcome::from_result(result, || {
            render::format_citations(entries, CITATION_SNIPPET_CHARS)
        })
    }
}
