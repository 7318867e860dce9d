use async_trait::async_trait;
use chrono::Utc;
use sqlx::migrate::Migrator;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::{parse_timestamp, SessionSummary, Storage};
use crate::config::DatabaseConfig;
use crate::error::{StorageError, StorageResult};
use crate::services::{rank_patterns, CodePattern, SemanticIndex};
use crate::workflow::{DocumentationEntry, WorkflowState};

/// Static migrator that embeds migrations at compile time
static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// SQLite-backed storage implementation
#[derive(Clone)]
pub struct SqliteStorage {
    pool: SqlitePool,
}

impl SqliteStorage {
    /// Create a new SQLite storage instance
    pub async fn new(config: &DatabaseConfig) -> StorageResult<Self> {
        // Ensure parent directory exists
        if let Some(parent) = config.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| StorageError::Connection {
                message: format!("Failed to create database directory: {}", e),
            })?;
        }

        let database_url = format!("sqlite://{}?mode=rwc", config.path.display());

        let options = SqliteConnectOptions::from_str(&database_url)
            .map_err(|e| StorageError::Connection {
                message: format!("Invalid database URL: {}", e),
            })?
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .connect_with(options)
            .await
            .map_err(|e| StorageError::Connection {
                message: format!("Failed to connect to database: {}", e),
            })?;

        let storage = Self { pool };
        storage.run_migrations().await?;

        Ok(storage)
    }

    /// Private in-memory database, for tests and throwaway sessions.
    ///
    /// A single connection that never expires, since each SQLite in-memory
    /// connection is its own database.
    pub async fn new_in_memory() -> StorageResult<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None::<Duration>)
            .max_lifetime(None::<Duration>)
            .connect("sqlite::memory:")
            .await
            .map_err(|e| StorageError::Connection {
                message: format!("Failed to open in-memory database: {}", e),
            })?;

        let storage = Self { pool };
        storage.run_migrations().await?;

        Ok(storage)
    }

    /// Run database migrations using embedded sqlx migrations
    async fn run_migrations(&self) -> StorageResult<()> {
        info!("Running database migrations...");

        MIGRATOR.run(&self.pool).await.map_err(|e| StorageError::Migration {
            message: format!("Failed to run migrations: {}", e),
        })?;

        info!("Database migrations completed successfully");
        Ok(())
    }

    /// Get the underlying pool for advanced queries
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Documentation entries indexed for a technology, oldest first.
    pub async fn indexed_documentation(
        &self,
        technology: &str,
    ) -> StorageResult<Vec<DocumentationEntry>> {
        let rows: Vec<DocumentationRow> = sqlx::query_as(
            r#"
            SELECT technology, source_url, section_title, content, relevance, is_fallback
            FROM documentation_index
            WHERE technology = ? COLLATE NOCASE
            ORDER BY rowid ASC
            "#,
        )
        .bind(technology)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|r| r.into()).collect())
    }
}

#[async_trait]
impl Storage for SqliteStorage {
    async fn load_state(&self, session_id: &str) -> StorageResult<Option<serde_json::Value>> {
        let state: Option<String> =
            sqlx::query_scalar("SELECT state FROM workflow_sessions WHERE session_id = ?")
                .bind(session_id)
                .fetch_optional(&self.pool)
                .await?;

        let Some(raw) = state else {
            return Ok(None);
        };

        match serde_json::from_str(&raw) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                warn!(
                    session_id = %session_id,
                    error = %e,
                    "Stored session state is unreadable, starting fresh"
                );
                Ok(None)
            }
        }
    }

    async fn save_state(&self, state: &WorkflowState) -> StorageResult<()> {
        let body = serde_json::to_string(state)?;
        let now = Utc::now().to_rfc3339();

        sqlx::query(
            r#"
            INSERT INTO workflow_sessions (session_id, current_phase, workflow_complete, state, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT(session_id) DO UPDATE SET
                current_phase = excluded.current_phase,
                workflow_complete = excluded.workflow_complete,
                state = excluded.state,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&state.session_id)
        .bind(state.current_phase.as_str())
        .bind(state.workflow_complete)
        .bind(&body)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        debug!(
            session_id = %state.session_id,
            phase = %state.current_phase,
            bytes = body.len(),
            "Workflow state saved"
        );
        Ok(())
    }

    async fn delete_state(&self, session_id: &str) -> StorageResult<()> {
        let result = sqlx::query("DELETE FROM workflow_sessions WHERE session_id = ?")
            .bind(session_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::SessionNotFound {
                session_id: session_id.to_string(),
            });
        }

        Ok(())
    }

    async fn list_sessions(&self, limit: usize) -> StorageResult<Vec<SessionSummary>> {
        let rows: Vec<SessionRow> = sqlx::query_as(
            r#"
            SELECT session_id, current_phase, workflow_complete, created_at, updated_at
            FROM workflow_sessions
            ORDER BY updated_at DESC, rowid DESC
            LIMIT ?
            "#,
        )
        .bind(i64::try_from(limit).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|r| r.into()).collect())
    }
}

#[async_trait]
impl SemanticIndex for SqliteStorage {
    async fn index(&self, entry: &DocumentationEntry) -> StorageResult<String> {
        let id = Uuid::new_v4().to_string();

        sqlx::query(
            r#"
            INSERT INTO documentation_index (id, technology, source_url, section_title, content, relevance, is_fallback, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(&entry.technology)
        .bind(&entry.source_url)
        .bind(&entry.section_title)
        .bind(&entry.content)
        .bind(entry.relevance)
        .bind(entry.is_fallback)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(id)
    }

    async fn store_pattern(&self, pattern: &CodePattern) -> StorageResult<String> {
        let id = if pattern.id.is_empty() {
            Uuid::new_v4().to_string()
        } else {
            pattern.id.clone()
        };
        let technologies = serde_json::to_string(&pattern.technologies)?;

        sqlx::query(
            r#"
            INSERT INTO code_patterns (id, pattern_name, description, use_case, technologies, code_snippet, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(&pattern.pattern_name)
        .bind(&pattern.description)
        .bind(&pattern.use_case)
        .bind(&technologies)
        .bind(&pattern.code_snippet)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(id)
    }

    async fn search(&self, query: &str, top_k: usize) -> StorageResult<Vec<CodePattern>> {
        let rows: Vec<PatternRow> = sqlx::query_as(
            r#"
            SELECT id, pattern_name, description, use_case, technologies, code_snippet
            FROM code_patterns
            ORDER BY rowid ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let patterns = rows.into_iter().map(|r| r.into()).collect();
        Ok(rank_patterns(query, patterns, top_k))
    }
}

// Internal row types for SQLx mapping
#[derive(sqlx::FromRow)]
struct SessionRow {
    session_id: String,
    current_phase: String,
    workflow_complete: bool,
    created_at: String,
    updated_at: String,
}

impl From<SessionRow> for SessionSummary {
    fn from(row: SessionRow) -> Self {
        Self {
            session_id: row.session_id,
            current_phase: row.current_phase.parse().unwrap_or_default(),
            workflow_complete: row.workflow_complete,
            created_at: parse_timestamp(&row.created_at),
            updated_at: parse_timestamp(&row.updated_at),
        }
    }
}

#[derive(sqlx::FromRow)]
struct DocumentationRow {
    technology: String,
    source_url: String,
    section_title: String,
    content: String,
    relevance: f64,
    is_fallback: bool,
}

impl From<DocumentationRow> for DocumentationEntry {
    fn from(row: DocumentationRow) -> Self {
        Self {
            technology: row.technology,
            source_url: row.source_url,
            section_title: row.section_title,
            content: row.content,
            relevance: row.relevance,
            is_fallback: row.is_fallback,
        }
    }
}

#[derive(sqlx::FromRow)]
struct PatternRow {
    id: String,
    pattern_name: String,
    description: String,
    use_case: String,
    technologies: String,
    code_snippet: String,
}

impl From<PatternRow> for CodePattern {
    fn from(row: PatternRow) -> Self {
        Self {
            id: row.id,
            pattern_name: row.pattern_name,
            description: row.description,
            use_case: row.use_case,
            technologies: serde_json::from_str(&row.technologies).unwrap_or_default(),
            code_snippet: row.code_snippet,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::{create_initial, Phase, PersistedState};
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_state_round_trips_through_persisted_state() {
        let storage = SqliteStorage::new_in_memory().await.unwrap();
        let mut state = create_initial("sess-1", "hello");
        state.current_phase = Phase::Librarian;
        state
            .tech_stack
            .insert("backend".into(), vec!["FastAPI".into()]);
        state.error = Some("transient".into());

        storage.save_state(&state).await.unwrap();
        let raw = storage.load_state("sess-1").await.unwrap().unwrap();
        let persisted = PersistedState::from_value(&raw);

        assert_eq!(persisted.current_phase, Some(Phase::Librarian));
        assert_eq!(persisted.tech_stack, Some(state.tech_stack.clone()));
    }

    #[tokio::test]
    async fn test_save_state_upserts() {
        let storage = SqliteStorage::new_in_memory().await.unwrap();
        let mut state = create_initial("sess-1", "hello");
        storage.save_state(&state).await.unwrap();

        state.workflow_complete = true;
        state.current_phase = Phase::Mentor;
        storage.save_state(&state).await.unwrap();

        let sessions = storage.list_sessions(10).await.unwrap();
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].current_phase, Phase::Mentor);
        assert!(sessions[0].workflow_complete);
    }

    #[tokio::test]
    async fn test_load_missing_session() {
        let storage = SqliteStorage::new_in_memory().await.unwrap();
        assert!(storage.load_state("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_state() {
        let storage = SqliteStorage::new_in_memory().await.unwrap();
        storage
            .save_state(&create_initial("sess-1", "x"))
            .await
            .unwrap();

        storage.delete_state("sess-1").await.unwrap();
        assert!(storage.load_state("sess-1").await.unwrap().is_none());

        let err = storage.delete_state("sess-1").await.unwrap_err();
        assert!(matches!(err, StorageError::SessionNotFound { .. }));
    }

    #[tokio::test]
    async fn test_index_documentation() {
        let storage = SqliteStorage::new_in_memory().await.unwrap();
        let entry = DocumentationEntry::new("FastAPI", "https://f", "Intro", "content");

        let id = storage.index(&entry).await.unwrap();
        assert!(!id.is_empty());

        let stored = storage.indexed_documentation("fastapi").await.unwrap();
        assert_eq!(stored, vec![entry]);
    }

    #[tokio::test]
    async fn test_pattern_search() {
        let storage = SqliteStorage::new_in_memory().await.unwrap();
        storage
            .store_pattern(
                &CodePattern::new("JWT auth dependency", "def auth(): ...")
                    .with_technologies(vec!["FastAPI".into()]),
            )
            .await
            .unwrap();
        storage
            .store_pattern(
                &CodePattern::new("Cache decorator", "@cache")
                    .with_technologies(vec!["Redis".into()]),
            )
            .await
            .unwrap();

        let found = storage.search("fastapi auth service", 3).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].pattern_name, "JWT auth dependency");
        assert_eq!(found[0].technologies, vec!["FastAPI".to_string()]);
        assert!(!found[0].id.is_empty());
    }
}
