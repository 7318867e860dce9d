//! The Planner → Librarian → Mentor workflow.
//!
//! - [`state`]: the shared [`WorkflowState`] schema and [`StateDelta`] updates
//! - [`merge`]: fresh-session initialization and persisted-state reconciliation
//! - [`transitions`]: pure phase predicates
//! - [`PlannerPhase`], [`LibrarianPhase`], [`MentorPhase`]: the phase handlers
//! - [`Orchestrator`]: routing between handlers, batch and streaming
//!
//! Handlers share their collaborators through [`PhaseCore`] composition.

pub(crate) mod core;
mod graph;
mod librarian;
mod mentor;
mod planner;

pub mod merge;
pub mod outcome;
pub mod parse;
pub mod render;
pub mod state;
pub mod transitions;

pub use core::*;
pub use graph::*;
pub use librarian::*;
pub use merge::{create_initial, resume, PersistedState};
pub use mentor::*;
pub use outcome::{Outcome, TaskLedger};
pub use parse::{MentorPlan, MentorReply, PlannerReply};
pub use planner::*;
pub use state::*;
pub use transitions::*;

use crate::error::PhaseError;
use crate::langbase::Message;

/// Delta recording a phase failure.
///
/// Sets `error` and appends one assistant message explaining it, preceded by
/// `user_turn` when the phase consumed the user's input. The phase is left
/// untouched.
pub(crate) fn failure_delta(
    phase: Phase,
    user_turn: Option<Message>,
    err: &PhaseError,
) -> StateDelta {
    let message = err.to_string();

    let mut messages: Vec<Message> = user_turn.into_iter().collect();
    messages.push(Message::assistant(render::phase_error(phase, &message)));

    StateDelta {
        messages,
        error: Some(message),
        ..Default::default()
    }
}
