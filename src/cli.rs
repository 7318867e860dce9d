//! CLI commands for driving workflow sessions.

use clap::Subcommand;

use crate::app::{AppState, ChatOutcome};
use crate::storage::SessionSummary;
use crate::workflow::{NodeUpdate, WorkflowState};

const RULE: &str =
    "═══════════════════════════════════════════════════════════════════════════════";

/// Workflow CLI subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Send a message to a session and run the workflow
    Chat {
        /// Session identifier (created on first use)
        #[arg(long)]
        session: String,

        /// Print each phase as soon as it completes
        #[arg(long)]
        stream: bool,

        /// The message to send
        message: String,
    },

    /// Show the persisted state of a session
    Show {
        /// Session identifier
        #[arg(long)]
        session: String,
    },

    /// List recent sessions
    Sessions {
        /// Maximum number of sessions to show
        #[arg(long, default_value = "20")]
        limit: usize,
    },

    /// Delete a session
    Reset {
        /// Session identifier
        #[arg(long)]
        session: String,
    },
}

/// Result of CLI command execution.
#[derive(Debug)]
pub struct CliResult {
    /// Exit code (0 = success)
    pub exit_code: i32,
    /// Output message
    pub message: String,
}

impl CliResult {
    /// Create a success result with the given message.
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            exit_code: 0,
            message: message.into(),
        }
    }

    /// Create an error result with the given message.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            exit_code: 1,
            message: message.into(),
        }
    }
}

/// Execute a CLI command.
pub async fn execute_command(command: Commands, app: &AppState) -> CliResult {
    match command {
        Commands::Chat {
            session,
            stream,
            message,
        } => execute_chat(app, &session, &message, stream).await,
        Commands::Show { session } => execute_show(app, &session).await,
        Commands::Sessions { limit } => execute_sessions(app, limit).await,
        Commands::Reset { session } => execute_reset(app, &session).await,
    }
}

async fn execute_chat(app: &AppState, session_id: &str, message: &str, stream: bool) -> CliResult {
    let result = if stream {
        app.chat_streaming(session_id, message, |update| {
            println!("{}", format_update(update));
        })
        .await
    } else {
        app.chat(session_id, message).await
    };

    match result {
        Ok(outcome) => CliResult::success(format_chat(&outcome)),
        Err(e) => CliResult::error(format!("Chat failed: {}", e)),
    }
}

async fn execute_show(app: &AppState, session_id: &str) -> CliResult {
    match app.show(session_id).await {
        Ok(state) => CliResult::success(format_state(&state)),
        Err(e) => CliResult::error(format!("Failed to load session: {}", e)),
    }
}

async fn execute_sessions(app: &AppState, limit: usize) -> CliResult {
    match app.sessions(limit).await {
        Ok(sessions) => CliResult::success(format_sessions(&sessions)),
        Err(e) => CliResult::error(format!("Failed to list sessions: {}", e)),
    }
}

async fn execute_reset(app: &AppState, session_id: &str) -> CliResult {
    match app.reset(session_id).await {
        Ok(()) => CliResult::success(format!("Session {} deleted.", session_id)),
        Err(e) => CliResult::error(format!("Failed to delete session: {}", e)),
    }
}

/// One line per completed node.
pub fn format_update(update: &NodeUpdate) -> String {
    let mut line = format!("[{}] completed", update.node);
    if let Some(phase) = update.delta.current_phase {
        line.push_str(&format!(" -> phase {}", phase));
    }
    if let Some(error) = &update.delta.error {
        line.push_str(&format!(" (error: {})", error));
    }
    line
}

/// Assistant replies followed by a one-line status.
pub fn format_chat(outcome: &ChatOutcome) -> String {
    let mut output = String::new();

    for reply in &outcome.replies {
        output.push_str(reply);
        output.push_str("\n\n");
    }

    let status = if outcome.state.workflow_complete {
        "complete"
    } else if outcome.state.error.is_some() {
        "error"
    } else if outcome.state.needs_clarification {
        "awaiting input"
    } else {
        "halted"
    };

    output.push_str(&format!(
        "── phase: {} | status: {} ──",
        outcome.state.current_phase, status
    ));
    output
}

/// Summary of a session's persisted state.
pub fn format_state(state: &WorkflowState) -> String {
    let mut output = String::new();

    output.push_str(&format!("\nSession {}\n", state.session_id));
    output.push_str(RULE);
    output.push_str("\n\n");

    output.push_str(&format!("Phase:               {}\n", state.current_phase));
    output.push_str(&format!("Needs clarification: {}\n", state.needs_clarification));
    output.push_str(&format!("Workflow complete:   {}\n", state.workflow_complete));
    output.push_str(&format!("Messages:            {}\n", state.message_history.len()));
    output.push_str(&format!(
        "Requirements:        {}\n",
        if state.requirements.is_some() { "yes" } else { "no" }
    ));
    output.push_str(&format!(
        "Technologies:        {}\n",
        if state.identified_technologies.is_empty() {
            "-".to_string()
        } else {
            state.identified_technologies.join(", ")
        }
    ));
    output.push_str(&format!(
        "Documentation:       {} entries\n",
        state.documentation_entries.len()
    ));
    output.push_str(&format!("Scaffolds:           {}\n", state.code_scaffolds.len()));

    for scaffold in &state.code_scaffolds {
        output.push_str(&format!("  - {}\n", scaffold.file_path));
    }

    output
}

/// Table of sessions, most recent first.
pub fn format_sessions(sessions: &[SessionSummary]) -> String {
    if sessions.is_empty() {
        return "No sessions found.".to_string();
    }

    let mut output = String::new();
    output.push_str(&format!(
        "{:<38} {:<10} {:<9} {}\n",
        "SESSION", "PHASE", "COMPLETE", "UPDATED"
    ));

    for session in sessions {
        output.push_str(&format!(
            "{:<38} {:<10} {:<9} {}\n",
            session.session_id,
            session.current_phase.as_str(),
            if session.workflow_complete { "yes" } else { "no" },
            session.updated_at.format("%Y-%m-%d %H:%M:%S")
        ));
    }

    output
}
