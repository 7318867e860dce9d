//! End-to-end workflow tests
//!
//! Real Langbase client, documentation source and SQLite storage, with the
//! Langbase API and the documentation site served by wiremock.

use pretty_assertions::assert_eq;
use serde_json::json;
use std::sync::Arc;
use wiremock::{
    matchers::{body_string_contains, method, path},
    Mock, MockServer, ResponseTemplate,
};

use architect_workflow::config::{
    Config, DatabaseConfig, DocsConfig, LangbaseConfig, LogFormat, LoggingConfig, PipeConfig,
    RequestConfig, WorkflowConfig,
};
use architect_workflow::docs::HttpDocsSource;
use architect_workflow::langbase::{LangbaseClient, MessageRole, PipeGenerator};
use architect_workflow::storage::SqliteStorage;
use architect_workflow::workflow::{Node, Orchestrator, Phase, PhaseCore};
use architect_workflow::AppState;

const SPEC_READY: &str = r#"Here is the spec:
```json
{"status": "spec_ready", "requirements": "Share and rate recipes",
 "architecture": "REST API with a relational database",
 "tech_stack": {"backend": ["FastAPI"], "database": ["Obscure DB"]}}
```"#;

const GATHERING: &str = r#"{"status": "gathering", "response": "Who will use the app?"}"#;

const MENTOR_PLAN: &str = r##"{"scaffolds": [{"file_path": "app/main.py", "content": "# TODO: create the app", "hints": ["Use APIRouter"]}],
 "implementation_hints": ["Start with the data model"], "first_steps": "1. Create a virtualenv"}"##;

const DOCS_PAGE: &str = r#"<html><body>
<h1>FastAPI</h1>
<p>FastAPI is a modern, fast (high-performance) web framework for building APIs with Python based on standard type hints.</p>
<h2>First Steps</h2>
<p>The simplest FastAPI file could look like this: create an app instance, declare a path operation and run it with a server.</p>
</body></html>"#;

fn completion(text: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "success": true,
        "completion": text
    }))
}

/// Mount a pipe run whose request body contains `marker`.
async fn mount_pipe(server: &MockServer, marker: &str, reply: ResponseTemplate) {
    Mock::given(method("POST"))
        .and(path("/v1/pipes/run"))
        .and(body_string_contains(marker))
        .respond_with(reply)
        .mount(server)
        .await;
}

async fn mount_happy_path(server: &MockServer) {
    mount_pipe(server, "You are the Planner", completion(SPEC_READY)).await;
    mount_pipe(
        server,
        "You normalize technology names",
        completion(r#"["FastAPI", "Obscure DB"]"#),
    )
    .await;
    mount_pipe(
        server,
        "You are the Librarian",
        completion("Start with the FastAPI tutorial [1]."),
    )
    .await;
    mount_pipe(server, "You are the Mentor", completion(MENTOR_PLAN)).await;

    Mock::given(method("GET"))
        .and(path("/docs/fastapi"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(DOCS_PAGE, "text/html"))
        .mount(server)
        .await;
}

fn test_config(server: &MockServer) -> Config {
    Config {
        langbase: LangbaseConfig {
            api_key: "test-api-key".to_string(),
            base_url: server.uri(),
        },
        database: DatabaseConfig {
            path: ":memory:".into(),
            max_connections: 1,
        },
        logging: LoggingConfig {
            level: "debug".to_string(),
            format: LogFormat::Pretty,
        },
        request: RequestConfig {
            timeout_ms: 2_000,
            max_retries: 0,
            retry_delay_ms: 10,
        },
        pipes: PipeConfig {
            deep: "architect-deep-v1".to_string(),
            fast: "architect-fast-v1".to_string(),
        },
        docs: DocsConfig {
            user_agent: "Architect-Test/1.0".to_string(),
            timeout_ms: 2_000,
            max_sections_per_tech: 5,
        },
        workflow: WorkflowConfig::default(),
    }
}

async fn build_app(server: &MockServer) -> AppState {
    let config = test_config(server);
    let storage = Arc::new(SqliteStorage::new_in_memory().await.unwrap());
    let langbase = LangbaseClient::new(&config.langbase, config.request.clone()).unwrap();
    let docs = HttpDocsSource::new(&config.docs)
        .unwrap()
        .with_site("fastapi", format!("{}/docs/fastapi", server.uri()));

    let core = PhaseCore::new(
        Arc::new(PipeGenerator::new(langbase.clone(), &config.pipes.deep)),
        Arc::new(PipeGenerator::new(langbase, &config.pipes.fast)),
        Arc::new(docs),
        storage.clone(),
    );
    let orchestrator = Orchestrator::new(core, &config.workflow);
    AppState::new(config, storage, orchestrator)
}

#[tokio::test]
async fn test_single_turn_runs_all_phases() {
    let server = MockServer::start().await;
    mount_happy_path(&server).await;
    let app = build_app(&server).await;

    let outcome = app.chat("s1", "A recipe sharing site").await.unwrap();

    assert_eq!(outcome.nodes, vec![Node::Planner, Node::Librarian, Node::Mentor]);
    assert_eq!(outcome.replies.len(), 3);

    let state = outcome.state;
    assert_eq!(state.current_phase, Phase::Mentor);
    assert!(state.workflow_complete);
    assert!(state.error.is_none());
    assert_eq!(state.requirements.as_deref(), Some("Share and rate recipes"));
    assert_eq!(
        state.identified_technologies,
        vec!["FastAPI".to_string(), "Obscure DB".to_string()]
    );
    assert!(state
        .documentation_entries
        .iter()
        .any(|e| e.technology == "FastAPI" && !e.is_fallback));
    assert!(state
        .documentation_entries
        .iter()
        .any(|e| e.technology == "Obscure DB" && e.is_fallback));
    assert_eq!(state.code_scaffolds.len(), 1);
    assert_eq!(state.code_scaffolds[0].file_path, "app/main.py");
    assert_eq!(state.first_steps.as_deref(), Some("1. Create a virtualenv"));

    // user, planner summary, librarian synthesis, mentor plan
    assert_eq!(state.message_history.len(), 4);
    assert_eq!(state.message_history[0].role, MessageRole::User);

    let indexed = app.sessions(10).await.unwrap();
    assert_eq!(indexed.len(), 1);
    assert!(indexed[0].workflow_complete);
}

#[tokio::test]
async fn test_gathering_halts_and_resumes() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/pipes/run"))
        .and(body_string_contains("You are the Planner"))
        .respond_with(completion(GATHERING))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    mount_happy_path(&server).await;
    let app = build_app(&server).await;

    let first = app.chat("s1", "A recipe app").await.unwrap();
    assert_eq!(first.nodes, vec![Node::Planner]);
    assert_eq!(first.replies, vec!["Who will use the app?".to_string()]);
    assert!(first.state.needs_clarification);
    assert_eq!(first.state.current_phase, Phase::Planner);

    let second = app.chat("s1", "Home cooks").await.unwrap();
    assert_eq!(
        second.nodes,
        vec![Node::Planner, Node::Librarian, Node::Mentor]
    );
    assert!(second.state.workflow_complete);
    assert!(!second.state.needs_clarification);
    // two turns of user + assistant, then librarian and mentor replies
    assert_eq!(second.state.message_history.len(), 6);
}

#[tokio::test]
async fn test_generation_outage_records_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/pipes/run"))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .mount(&server)
        .await;
    let app = build_app(&server).await;

    let outcome = app.chat("s1", "A recipe app").await.unwrap();

    assert_eq!(outcome.nodes, vec![Node::Planner]);
    assert_eq!(outcome.replies.len(), 1);
    assert!(outcome.state.error.is_some());
    assert_eq!(outcome.state.current_phase, Phase::Planner);

    // the error is not carried into the next turn
    server.reset().await;
    Mock::given(method("POST"))
        .and(path("/v1/pipes/run"))
        .respond_with(completion(GATHERING))
        .mount(&server)
        .await;

    let retry = app.chat("s1", "A recipe app").await.unwrap();
    assert!(retry.state.error.is_none());
    assert!(retry.state.needs_clarification);
}

#[tokio::test]
async fn test_streaming_matches_batch() {
    let server = MockServer::start().await;
    mount_happy_path(&server).await;
    let app = build_app(&server).await;

    let mut streamed = Vec::new();
    let outcome = app
        .chat_streaming("s-stream", "A recipe sharing site", |update| {
            streamed.push((update.node, update.delta.current_phase));
        })
        .await
        .unwrap();

    assert_eq!(
        streamed,
        vec![
            (Node::Planner, Some(Phase::Librarian)),
            (Node::Librarian, Some(Phase::Mentor)),
            (Node::Mentor, Some(Phase::Mentor)),
        ]
    );

    let batch = app.chat("s-batch", "A recipe sharing site").await.unwrap();
    assert_eq!(batch.nodes, outcome.nodes);
    assert_eq!(batch.state.current_phase, outcome.state.current_phase);
    assert_eq!(batch.state.code_scaffolds, outcome.state.code_scaffolds);
}
