//! Storage layer for workflow sessions, documentation and code patterns.
//!
//! [`SqliteStorage`] implements both [`Storage`] (session persistence) and
//! [`crate::services::SemanticIndex`] (documentation and pattern index).

mod sqlite;

#[cfg(test)]
#[path = "types_tests.rs"]
mod types_tests;

pub use sqlite::SqliteStorage;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::StorageResult;
use crate::workflow::{Phase, WorkflowState};

/// Listing entry for a persisted session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub session_id: String,
    /// Phase the session was in when last saved.
    pub current_phase: Phase,
    pub workflow_complete: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Persistence of workflow state between turns.
///
/// State is handed back as raw JSON: decoding it is the workflow's job, so a
/// record written by an older schema still loads.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Storage: Send + Sync {
    /// The persisted state for a session, if any. An unreadable record is
    /// logged and reported as absent.
    async fn load_state(&self, session_id: &str) -> StorageResult<Option<serde_json::Value>>;
    /// Insert or replace a session's state.
    async fn save_state(&self, state: &WorkflowState) -> StorageResult<()>;
    /// Delete a session. Fails with `SessionNotFound` if it does not exist.
    async fn delete_state(&self, session_id: &str) -> StorageResult<()>;
    /// Most recently updated sessions first.
    async fn list_sessions(&self, limit: usize) -> StorageResult<Vec<SessionSummary>>;
}

/// Parse an RFC 3339 timestamp column, falling back to now.
pub(crate) fn parse_timestamp(value: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}
