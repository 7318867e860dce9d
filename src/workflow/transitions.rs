//! Phase transition predicates.
//!
//! Pure functions over [`WorkflowState`], evaluated after every handler run.

use super::state::{Phase, WorkflowState};

/// Planner has produced a tech stack and is no longer interviewing.
pub fn can_advance_to_librarian(state: &WorkflowState) -> bool {
    matches!(state.current_phase, Phase::Planner | Phase::Librarian)
        && !state.tech_stack.is_empty()
        && !state.needs_clarification
}

/// Librarian has gathered at least one documentation entry.
pub fn can_advance_to_mentor(state: &WorkflowState) -> bool {
    matches!(state.current_phase, Phase::Librarian | Phase::Mentor)
        && !state.documentation_entries.is_empty()
        && !state.needs_clarification
}

/// Mentor has delivered scaffolds.
pub fn is_complete(state: &WorkflowState) -> bool {
    state.current_phase == Phase::Mentor
        && !state.code_scaffolds.is_empty()
        && !state.needs_clarification
}

/// A handler recorded an error during this run.
pub fn has_error(state: &WorkflowState) -> bool {
    state.error.is_some()
}
