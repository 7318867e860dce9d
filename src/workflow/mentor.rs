//! Mentor phase: scaffold generation. Terminal.

use std::time::Instant;
use tracing::{error, info, warn};

use super::core::PhaseCore;
use super::failure_delta;
use super::outcome::{Outcome, TaskLedger};
use super::parse::MentorReply;
use super::render::{self, truncate_chars};
use super::state::{Phase, StateDelta, WorkflowState};
use crate::config::WorkflowConfig;
use crate::error::PhaseError;
use crate::langbase::Message;
use crate::prompts::system_prompt_for;
use crate::services::CodePattern;

const MENTOR_TEMPERATURE: f64 = 0.4;
const DOC_SNIPPET_CHARS: usize = 400;
const PATTERN_SNIPPET_CHARS: usize = 300;

/// Turns the specification and research into teaching scaffolds.
#[derive(Clone)]
pub struct MentorPhase {
    core: PhaseCore,
    entry_cap: usize,
    pattern_top_k: usize,
}

impl MentorPhase {
    pub fn new(core: PhaseCore, config: &WorkflowConfig) -> Self {
        Self {
            core,
            entry_cap: config.mentor_entry_cap,
            pattern_top_k: config.pattern_top_k,
        }
    }

    pub async fn process(&self, state: &WorkflowState) -> StateDelta {
        let start = Instant::now();
        info!(session_id = %state.session_id, "Mentor processing");

        let Some(requirements) = state.requirements.as_deref().filter(|r| !r.trim().is_empty())
        else {
            warn!(session_id = %state.session_id, "Mentor invoked without requirements");
            let err = PhaseError::Precondition {
                message: "No requirements found. Please complete the Planner phase.".to_string(),
            };
            return failure_delta(Phase::Mentor, None, &err);
        };

        let mut ledger = TaskLedger::new();
        let patterns = self.relevant_patterns(requirements, state).await;
        let patterns = ledger.record("pattern_search", patterns);

        let prompt = self.build_prompt(requirements, state, &patterns);

        let completion = match self
            .core
            .deep()
            .complete(&prompt, system_prompt_for(Phase::Mentor), MENTOR_TEMPERATURE)
            .await
        {
            Ok(completion) => completion,
            Err(e) => {
                error!(
                    session_id = %state.session_id,
                    error = %e,
                    "Mentor generation failed"
                );
                return failure_delta(Phase::Mentor, None, &e.into());
            }
        };

        let reply = MentorReply::parse(&completion);
        if matches!(reply, MentorReply::RawText(_)) {
            warn!(session_id = %state.session_id, "Mentor reply was not structured, keeping prose");
        }
        let plan = reply.into_plan();

        let response =
            render::mentor_response(&plan.scaffolds, &plan.implementation_hints, &plan.first_steps);
        let scaffold_count = plan.scaffolds.len();

        info!(
            session_id = %state.session_id,
            scaffolds = scaffold_count,
            patterns = patterns.len(),
            latency_ms = start.elapsed().as_millis(),
            "Mentor finished"
        );

        StateDelta {
            messages: vec![Message::assistant(response)],
            current_phase: Some(Phase::Mentor),
            code_scaffolds: Some(plan.scaffolds),
            implementation_hints: Some(plan.implementation_hints),
            first_steps: Some(plan.first_steps),
            needs_clarification: Some(false),
            workflow_complete: Some(true),
            ..Default::default()
        }
        .with_metadata("mentor_status", "complete")
        .with_metadata("scaffold_count", scaffold_count)
        .with_metadata("mentor_tasks", ledger.to_metadata())
    }

    /// Patterns matching the requirements and stack; empty on failure.
    async fn relevant_patterns(
        &self,
        requirements: &str,
        state: &WorkflowState,
    ) -> Outcome<Vec<CodePattern>> {
        let query = format!("{} {}", requirements, state.flattened_tech_stack().join(" "));
        let result = self.core.index().search(&query, self.pattern_top_k).await;
        Outcome::from_result(result, Vec::new)
    }

    fn build_prompt(
        &self,
        requirements: &str,
        state: &WorkflowState,
        patterns: &[CodePattern],
    ) -> String {
        let stack = state
            .tech_stack
            .iter()
            .filter(|(_, techs)| !techs.is_empty())
            .map(|(category, techs)| format!("  {}: {}", category, techs.join(", ")))
            .collect::<Vec<_>>()
            .join("\n");

        let docs: String = state
            .documentation_entries
            .iter()
            .take(self.entry_cap)
            .map(|entry| {
                format!(
                    "\n### {}: {}\n{}\n",
                    entry.technology,
                    entry.section_title,
                    truncate_chars(&entry.content, DOC_SNIPPET_CHARS)
                )
            })
            .collect();

        let pattern_text: String = patterns
            .iter()
            .map(|p| {
                format!(
                    "\n### Pattern: {}\nUse case: {}\n```\n{}\n```\n",
                    p.pattern_name,
                    p.use_case,
                    truncate_chars(&p.code_snippet, PATTERN_SNIPPET_CHARS)
                )
            })
            .collect();

        format!(
            "## Project Requirements\n{}\n\n\
             ## Architecture\n{}\n\n\
             ## Tech Stack\n{}\n\n\
             ## Relevant Documentation\n{}\n\n\
             ## Code Patterns to Consider\n{}\n\n\
             ---\n\
             Generate the project scaffold following your instructions. \
             Start with the core infrastructure files: configuration, models and entry points.",
            requirements,
            state.architecture.as_deref().unwrap_or_default(),
            stack,
            if docs.is_empty() {
                "No documentation context available."
            } else {
                docs.as_str()
            },
            if pattern_text.is_empty() {
                "No patterns available."
            } else {
                pattern_text.as_str()
            }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{LangbaseError, StorageError};
    use crate::workflow::core::test_support::Mocks;
    use crate::workflow::create_initial;
    use crate::workflow::state::{DocumentationEntry, TechStack};
    use pretty_assertions::assert_eq;

    fn researched_state() -> WorkflowState {
        let mut state = create_initial("s1", "go");
        state.current_phase = Phase::Mentor;
        state.requirements = Some("A todo app".into());
        state.architecture = Some("SPA + API".into());
        let mut stack = TechStack::new();
        stack.insert("backend".into(), vec!["FastAPI".into()]);
        state.tech_stack = stack;
        state.documentation_entries = (1..=10)
            .map(|n| {
                DocumentationEntry::new(
                    "FastAPI",
                    format!("https://fastapi.tiangolo.com/#s{}", n),
                    format!("Section {}", n),
                    "y".repeat(1000),
                )
            })
            .collect();
        state
    }

    fn mentor(mocks: Mocks) -> MentorPhase {
        MentorPhase::new(mocks.into_core(), &WorkflowConfig::default())
    }

    #[tokio::test]
    async fn test_structured_reply() {
        let mut mocks = Mocks::new();
        mocks.index.expect_search().returning(|_, _| {
            Ok(vec![CodePattern::new("Router", "app = FastAPI()").with_use_case("routing")])
        });
        mocks.deep.expect_complete().times(1).returning(|_, _, _| {
            Ok(r##"{"scaffolds": [{"file_path": "main.py", "content": "# TODO", "hints": ["h"]}],
                  "implementation_hints": ["start with models"],
                  "first_steps": "models, then routes"}"##
                .into())
        });

        let delta = mentor(mocks).process(&researched_state()).await;

        assert!(delta.error.is_none());
        assert_eq!(delta.workflow_complete, Some(true));
        assert_eq!(delta.current_phase, Some(Phase::Mentor));
        let scaffolds = delta.code_scaffolds.unwrap();
        assert_eq!(scaffolds.len(), 1);
        assert_eq!(scaffolds[0].file_path, "main.py");
        assert_eq!(
            delta.implementation_hints.unwrap(),
            vec!["start with models".to_string()]
        );
        assert_eq!(delta.metadata["scaffold_count"], 1);
        assert_eq!(delta.metadata["mentor_status"], "complete");
        assert!(delta.messages[0].content.contains("```python"));
    }

    #[tokio::test]
    async fn test_prose_reply_falls_back() {
        let prose = "First, set up a virtualenv. Then build the models.";
        let mut mocks = Mocks::new();
        mocks.index.expect_search().returning(|_, _| Ok(vec![]));
        mocks
            .deep
            .expect_complete()
            .returning(move |_, _, _| Ok(prose.to_string()));

        let delta = mentor(mocks).process(&researched_state()).await;

        assert_eq!(delta.code_scaffolds, Some(vec![]));
        assert_eq!(delta.implementation_hints, Some(vec![]));
        assert_eq!(delta.first_steps.as_deref(), Some(prose));
        assert_eq!(delta.workflow_complete, Some(true));
        assert!(delta.error.is_none());
    }

    #[tokio::test]
    async fn test_missing_requirements_is_precondition_error() {
        let phase = mentor(Mocks::new());
        let mut state = researched_state();
        state.requirements = None;

        let delta = phase.process(&state).await;

        assert_eq!(
            delta.error.as_deref(),
            Some("No requirements found. Please complete the Planner phase.")
        );
        assert!(delta.workflow_complete.is_none());
        assert!(delta.code_scaffolds.is_none());
    }

    #[tokio::test]
    async fn test_pattern_search_failure_is_not_fatal() {
        let mut mocks = Mocks::new();
        mocks.index.expect_search().returning(|_, _| {
            Err(StorageError::Query {
                message: "locked".into(),
            })
        });
        mocks
            .deep
            .expect_complete()
            .withf(|prompt, _, _| prompt.contains("No patterns available."))
            .returning(|_, _, _| Ok(r#"{"scaffolds": []}"#.into()));

        let delta = mentor(mocks).process(&researched_state()).await;

        assert!(delta.error.is_none());
        assert!(delta.metadata["mentor_tasks"]["pattern_search"]["degraded"].is_string());
    }

    #[tokio::test]
    async fn test_prompt_is_bounded() {
        let mut mocks = Mocks::new();
        mocks
            .index
            .expect_search()
            .withf(|query, top_k| query.contains("A todo app") && query.contains("FastAPI") && *top_k == 3)
            .returning(|_, _| Ok(vec![]));
        mocks
            .deep
            .expect_complete()
            .withf(|prompt, _, temperature| {
                prompt.contains("Section 8")
                    && !prompt.contains("Section 9")
                    && prompt.contains(&"y".repeat(400))
                    && !prompt.contains(&"y".repeat(401))
                    && (*temperature - MENTOR_TEMPERATURE).abs() < f64::EPSILON
            })
            .times(1)
            .returning(|_, _, _| Ok("{}".into()));

        mentor(mocks).process(&researched_state()).await;
    }

    #[tokio::test]
    async fn test_generation_failure() {
        let mut mocks = Mocks::new();
        mocks.index.expect_search().returning(|_, _| Ok(vec![]));
        mocks.deep.expect_complete().returning(|_, _, _| {
            Err(LangbaseError::Unavailable {
                message: "down".into(),
                retries: 3,
            })
        });

        let delta = mentor(mocks).process(&researched_state()).await;

        assert!(delta.error.unwrap().contains("down"));
        assert!(delta.workflow_complete.is_none());
        assert_eq!(delta.messages.len(), 1);
        assert!(delta.messages[0]
            .content
            .starts_with("The mentor phase encountered an error:"));
    }
}
