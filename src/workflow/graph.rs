//! Orchestrator: routes between the phase handlers until the workflow halts.
//!
//! ```text
//! planner ──(spec ready)──▶ librarian ──(docs found)──▶ mentor ──▶ halt
//!    │                          │
//!    └──(gathering / error)──▶ halt ◀──(no docs / error)
//! ```
//!
//! Every invocation enters at the Planner. A ready specification re-opens
//! research even on a session that already reached the Mentor, so a later
//! turn can retry documentation that was not found before.

use futures::stream::{self, Stream};
use serde::Serialize;
use tracing::{info, warn};

use super::core::PhaseCore;
use super::librarian::LibrarianPhase;
use super::merge::{create_initial, resume, PersistedState};
use super::mentor::MentorPhase;
use super::planner::PlannerPhase;
use super::state::{StateDelta, WorkflowState};
use super::transitions::{can_advance_to_librarian, can_advance_to_mentor, has_error};
use crate::config::WorkflowConfig;

/// A node of the workflow graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Node {
    Planner,
    Librarian,
    Mentor,
}

impl Node {
    /// Get the node name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            Node::Planner => "planner",
            Node::Librarian => "librarian",
            Node::Mentor => "mentor",
        }
    }
}

impl std::fmt::Display for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Where control goes after a node has run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Next(Node),
    /// Return control to the caller.
    Halt,
}

/// Routing decision after `node` ran and its delta was applied to `state`.
pub fn route_after(node: Node, state: &WorkflowState) -> Route {
    if has_error(state) {
        warn!(
            node = %node,
            error = state.error.as_deref().unwrap_or_default(),
            "Node reported an error, halting"
        );
        return Route::Halt;
    }

    match node {
        Node::Planner if can_advance_to_librarian(state) => {
            info!("Planner complete, routing to librarian");
            Route::Next(Node::Librarian)
        }
        Node::Planner => {
            info!("Planner awaiting user input, halting");
            Route::Halt
        }
        Node::Librarian if can_advance_to_mentor(state) => {
            info!("Librarian complete, routing to mentor");
            Route::Next(Node::Mentor)
        }
        Node::Librarian => {
            info!("Librarian found no documentation, halting");
            Route::Halt
        }
        Node::Mentor => {
            info!("Mentor complete, workflow done");
            Route::Halt
        }
    }
}

/// One completed node and the delta it produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeUpdate {
    pub node: Node,
    pub delta: StateDelta,
}

/// Sequences the phase handlers for one session turn.
#[derive(Clone)]
pub struct Orchestrator {
    planner: PlannerPhase,
    librarian: LibrarianPhase,
    mentor: MentorPhase,
}

impl Orchestrator {
    pub fn new(core: PhaseCore, config: &WorkflowConfig) -> Self {
        Self {
            planner: PlannerPhase::new(core.clone()),
            librarian: LibrarianPhase::new(core.clone(), config),
            mentor: MentorPhase::new(core, config),
        }
    }

    /// Build the state a turn starts from.
    pub fn prepare_state(
        session_id: &str,
        input: &str,
        persisted: Option<&PersistedState>,
    ) -> WorkflowState {
        match persisted {
            Some(persisted) => resume(session_id, persisted, input),
            None => create_initial(session_id, input),
        }
    }

    async fn run_node(&self, node: Node, state: &WorkflowState) -> StateDelta {
        match node {
            Node::Planner => self.planner.process(state).await,
            Node::Librarian => self.librarian.process(state).await,
            Node::Mentor => self.mentor.process(state).await,
        }
    }

    /// Run the turn to completion and return the final state.
    pub async fn run(
        &self,
        session_id: &str,
        input: &str,
        persisted: Option<&PersistedState>,
    ) -> WorkflowState {
        let mut state = Self::prepare_state(session_id, input, persisted);
        let mut next = Some(Node::Planner);

        while let Some(node) = next {
            let delta = self.run_node(node, &state).await;
            state.apply(delta);
            next = match route_after(node, &state) {
                Route::Next(node) => Some(node),
                Route::Halt => None,
            };
        }

        info!(
            session_id = %state.session_id,
            phase = %state.current_phase,
            complete = state.workflow_complete,
            "Workflow halted"
        );
        state
    }

    /// Run the turn, yielding each node's delta as soon as it completes.
    ///
    /// The stream is finite and ends when the workflow halts.
    pub fn run_streaming(
        &self,
        session_id: &str,
        input: &str,
        persisted: Option<&PersistedState>,
    ) -> impl Stream<Item = NodeUpdate> + '_ {
        let state = Self::prepare_state(session_id, input, persisted);

        stream::unfold(
            (state, Some(Node::Planner)),
            move |(mut state, next)| async move {
                let node = next?;
                let delta = self.run_node(node, &state).await;
                state.apply(delta.clone());
                let next = match route_after(node, &state) {
                    Route::Next(node) => Some(node),
                    Route::Halt => None,
                };
                Some((NodeUpdate { node, delta }, (state, next)))
            },
        )
    }
}
