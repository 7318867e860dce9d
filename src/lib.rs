//! # Architect Workflow
//!
//! A three-phase conversational workflow that turns a project idea into a
//! specification, a curated set of documentation references, and a set of
//! skeletal code files for the user to complete.
//!
//! ## Phases
//!
//! - **Planner**: interviews the user until requirements, architecture and a
//!   categorized tech stack are settled
//! - **Librarian**: identifies the core technologies and gathers cited
//!   documentation for each
//! - **Mentor**: produces code scaffolds with deliberate gaps, hints and a
//!   recommended implementation order
//!
//! ## Architecture
//!
//! ```text
//! CLI → AppState → Orchestrator → Planner / Librarian / Mentor
//!          ↓                            ↓
//!    SQLite (sessions,          Langbase Pipes (HTTP),
//!     docs, patterns)           documentation sites (HTTP)
//! ```
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use architect_workflow::{Config, AppState};
//! use architect_workflow::docs::HttpDocsSource;
//! use architect_workflow::langbase::{LangbaseClient, PipeGenerator};
//! use architect_workflow::storage::SqliteStorage;
//! use architect_workflow::workflow::{Orchestrator, PhaseCore};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::from_env()?;
//!     let storage = Arc::new(SqliteStorage::new(&config.database).await?);
//!     let langbase = LangbaseClient::new(&config.langbase, config.request.clone())?;
//!     let core = PhaseCore::new(
//!         Arc::new(PipeGenerator::new(langbase.clone(), &config.pipes.deep)),
//!         Arc::new(PipeGenerator::new(langbase, &config.pipes.fast)),
//!         Arc::new(HttpDocsSource::new(&config.docs)?),
//!         storage.clone(),
//!     );
//!     let orchestrator = Orchestrator::new(core, &config.workflow);
//!     let app = AppState::new(config, storage, orchestrator);
//!     let outcome = app.chat("session-1", "I want to build a recipe app").await?;
//!     println!("{}", outcome.replies.join("\n\n"));
//!     Ok(())
//! }
//! ```

/// Application state: persisted chat turns.
pub mod app;
/// CLI subcommands and output formatting.
pub mod cli;
/// Configuration management.
pub mod config;
/// Documentation retrieval from official documentation sites.
pub mod docs;
/// Error types and result aliases for the application.
pub mod error;
/// Langbase API client and types for pipe communication.
pub mod langbase;
/// System prompts for the workflow phases.
pub mod prompts;
/// Collaborator traits consumed by the workflow.
pub mod services;
/// SQLite storage layer for persistence.
pub mod storage;
/// Phase handlers, state schema and orchestration.
pub mod workflow;

pub use app::{AppState, ChatOutcome};
pub use config::Config;
pub use error::{AppError, AppResult};
