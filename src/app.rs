//! Application state: one workflow turn per call, persisted between turns.

use futures::StreamExt;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

use crate::config::Config;
use crate::error::{AppResult, StorageError};
use crate::langbase::MessageRole;
use crate::storage::{SessionSummary, Storage};
use crate::workflow::{Node, NodeUpdate, Orchestrator, PersistedState, WorkflowState};

/// Application state shared by the CLI commands.
pub struct AppState {
    /// Application configuration.
    pub config: Config,
    /// Session persistence.
    pub storage: Arc<dyn Storage>,
    /// Phase routing.
    pub orchestrator: Orchestrator,
}

/// Result of one chat turn.
#[derive(Debug, Clone, Serialize)]
pub struct ChatOutcome {
    /// State after the turn, as saved.
    pub state: WorkflowState,
    /// Assistant messages produced during this turn, in order.
    pub replies: Vec<String>,
    /// Nodes that ran, in order.
    pub nodes: Vec<Node>,
}

impl AppState {
    /// Create new application state
    pub fn new(config: Config, storage: Arc<dyn Storage>, orchestrator: Orchestrator) -> Self {
        Self {
            config,
            storage,
            orchestrator,
        }
    }

    async fn load(&self, session_id: &str) -> AppResult<Option<PersistedState>> {
        let value = self.storage.load_state(session_id).await?;
        debug!(session_id = %session_id, found = value.is_some(), "Loaded session state");
        Ok(value.as_ref().map(PersistedState::from_value))
    }

    /// Run one turn for `session_id` and save the resulting state.
    pub async fn chat(&self, session_id: &str, message: &str) -> AppResult<ChatOutcome> {
        self.chat_streaming(session_id, message, |_| {}).await
    }

    /// Run one turn, calling `on_update` as each node completes.
    pub async fn chat_streaming<F>(
        &self,
        session_id: &str,
        message: &str,
        mut on_update: F,
    ) -> AppResult<ChatOutcome>
    where
        F: FnMut(&NodeUpdate),
    {
        let start = Instant::now();
        let persisted = self.load(session_id).await?;
        let mut state = Orchestrator::prepare_state(session_id, message, persisted.as_ref());

        let mut replies = Vec::new();
        let mut nodes = Vec::new();

        let mut updates =
            std::pin::pin!(self
                .orchestrator
                .run_streaming(session_id, message, persisted.as_ref()));

        while let Some(update) = updates.next().await {
            on_update(&update);
            replies.extend(
                update
                    .delta
                    .messages
                    .iter()
                    .filter(|m| m.role == MessageRole::Assistant)
                    .map(|m| m.content.clone()),
            );
            nodes.push(update.node);
            state.apply(update.delta);
        }

        self.storage.save_state(&state).await?;

        info!(
            session_id = %session_id,
            phase = %state.current_phase,
            nodes = nodes.len(),
            complete = state.workflow_complete,
            latency_ms = start.elapsed().as_millis(),
            "Chat turn finished"
        );

        Ok(ChatOutcome {
            state,
            replies,
            nodes,
        })
    }

    /// The persisted state of a session, decoded.
    pub async fn show(&self, session_id: &str) -> AppResult<WorkflowState> {
        let persisted = self
            .load(session_id)
            .await?
            .ok_or_else(|| StorageError::SessionNotFound {
                session_id: session_id.to_string(),
            })?;

        let mut state = Orchestrator::prepare_state(session_id, "", Some(&persisted));
        state.latest_user_input.clear();
        Ok(state)
    }

    /// Most recently updated sessions.
    pub async fn sessions(&self, limit: usize) -> AppResult<Vec<SessionSummary>> {
        Ok(self.storage.list_sessions(limit).await?)
    }

    /// Delete a session.
    pub async fn reset(&self, session_id: &str) -> AppResult<()> {
        self.storage.delete_state(session_id).await?;
        info!(session_id = %session_id, "Session deleted");
        Ok(())
    }
}
