//! Planner phase: requirements interview.

use std::time::Instant;
use tracing::{error, info};

use super::core::PhaseCore;
use super::parse::PlannerReply;
use super::render;
use super::state::{Phase, StateDelta, WorkflowState};
use super::failure_delta;
use crate::langbase::Message;
use crate::prompts::system_prompt_for;

const PLANNER_TEMPERATURE: f64 = 0.7;

/// Interviews the user until a specification can be produced.
#[derive(Clone)]
pub struct PlannerPhase {
    core: PhaseCore,
}

impl PlannerPhase {
    pub fn new(core: PhaseCore) -> Self {
        Self { core }
    }

    /// Run one interview turn against `state.latest_user_input`.
    pub async fn process(&self, state: &WorkflowState) -> StateDelta {
        let start = Instant::now();
        info!(session_id = %state.session_id, "Planner processing");

        let user_turn = Message::user(&state.latest_user_input);
        let mut history = state.message_history.clone();
        history.push(user_turn.clone());

        let completion = match self
            .core
            .deep()
            .chat(&history, system_prompt_for(Phase::Planner), PLANNER_TEMPERATURE)
            .await
        {
            Ok(completion) => completion,
            Err(e) => {
                error!(
                    session_id = %state.session_id,
                    error = %e,
                    "Planner generation failed"
                );
                return failure_delta(Phase::Planner, Some(user_turn), &e.into());
            }
        };

        let delta = match PlannerReply::parse(&completion) {
            PlannerReply::Gathering { response } => {
                info!(session_id = %state.session_id, "Planner still gathering requirements");
                StateDelta {
                    messages: vec![user_turn, Message::assistant(response)],
                    current_phase: Some(Phase::Planner),
                    needs_clarification: Some(true),
                    ..Default::default()
                }
                .with_metadata("planner_status", "gathering")
            }
            PlannerReply::SpecReady {
                requirements,
                architecture,
                tech_stack,
            } => {
                info!(
                    session_id = %state.session_id,
                    categories = tech_stack.len(),
                    "Planner specification ready"
                );
                let summary = render::spec_summary(&requirements, &architecture, &tech_stack);
                StateDelta {
                    messages: vec![user_turn, Message::assistant(summary)],
                    current_phase: Some(Phase::Librarian),
                    requirements: Some(requirements),
                    architecture: Some(architecture),
                    tech_stack: Some(tech_stack),
                    needs_clarification: Some(false),
                    workflow_complete: Some(false),
                    reopen: true,
                    ..Default::default()
                }
                .with_metadata("planner_status", "complete")
            }
        };

        info!(
            session_id = %state.session_id,
            latency_ms = start.elapsed().as_millis(),
            "Planner finished"
        );
        delta
    }
}
