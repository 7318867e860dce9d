//! Integration tests for the HTTP documentation source
//!
//! Documentation sites are served by wiremock.

use pretty_assertions::assert_eq;
use std::time::Duration;
use wiremock::{
    matchers::{header, method, path},
    Mock, MockServer, ResponseTemplate,
};

use architect_workflow::config::DocsConfig;
use architect_workflow::docs::HttpDocsSource;
use architect_workflow::error::DocsError;
use architect_workflow::services::DocumentationSource;

const PAGE: &str = r#"
<html>
  <head><title>FastAPI</title></head>
  <body>
    <h1>FastAPI</h1>
    <p>FastAPI is a modern, fast (high-performance) web framework for building APIs with Python based on standard type hints.</p>
    <h2>First Steps</h2>
    <p>The simplest FastAPI file could look like this: create an app instance, declare a path operation and run it with a server.</p>
    <h2>Tiny</h2>
    <p>Too short.</p>
    <h3>Path Parameters</h3>
    <p>You can declare path parameters or variables with the same syntax used by Python format strings, and they are passed as arguments.</p>
  </body>
</html>
"#;

fn config(max_sections: usize) -> DocsConfig {
    DocsConfig {
        user_agent: "Architect-Test/1.0".to_string(),
        timeout_ms: 500,
        max_sections_per_tech: max_sections,
    }
}

async fn serve(server: &MockServer, template: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path("/docs"))
        .respond_with(template)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_fetch_splits_page_into_cited_sections() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/docs"))
        .and(header("User-Agent", "Architect-Test/1.0"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(PAGE, "text/html"))
        .expect(1)
        .mount(&server)
        .await;

    let base = format!("{}/docs", server.uri());
    let source = HttpDocsSource::new(&config(5))
        .unwrap()
        .with_site("FastAPI", base.clone());

    let entries = source.fetch("FastAPI", "a recipe API").await.unwrap();
    let titles: Vec<&str> = entries.iter().map(|e| e.section_title.as_str()).collect();

    assert!(titles.contains(&"First Steps"));
    assert!(titles.contains(&"Path Parameters"));
    assert!(!titles.contains(&"Tiny"));

    let first_steps = entries
        .iter()
        .find(|e| e.section_title == "First Steps")
        .unwrap();
    assert_eq!(first_steps.source_url, format!("{}#first-steps", base));
    assert!(first_steps.content.contains("path operation"));
    assert!(entries.iter().all(|e| e.technology == "FastAPI"));
    assert!(entries.iter().all(|e| e.relevance == 1.0 && !e.is_fallback));
}

#[tokio::test]
async fn test_fetch_caps_sections() {
    let server = MockServer::start().await;
    serve(&server, ResponseTemplate::new(200).set_body_raw(PAGE, "text/html")).await;

    let source = HttpDocsSource::new(&config(1))
        .unwrap()
        .with_site("fastapi", format!("{}/docs", server.uri()));

    let entries = source.fetch("FastAPI", "").await.unwrap();
    assert_eq!(entries.len(), 1);
}

#[tokio::test]
async fn test_fetch_status_error() {
    let server = MockServer::start().await;
    serve(&server, ResponseTemplate::new(404)).await;

    let source = HttpDocsSource::new(&config(5))
        .unwrap()
        .with_site("fastapi", format!("{}/docs", server.uri()));

    let result = source.fetch("FastAPI", "").await;
    assert!(matches!(result, Err(DocsError::Status { status: 404, .. })));
}

#[tokio::test]
async fn test_fetch_timeout() {
    let server = MockServer::start().await;
    serve(
        &server,
        ResponseTemplate::new(200)
            .set_body_raw(PAGE, "text/html")
            .set_delay(Duration::from_secs(2)),
    )
    .await;

    let source = HttpDocsSource::new(&config(5))
        .unwrap()
        .with_site("fastapi", format!("{}/docs", server.uri()));

    let result = source.fetch("FastAPI", "").await;
    assert!(matches!(result, Err(DocsError::Timeout { .. })));
}

#[tokio::test]
async fn test_page_without_long_sections_yields_nothing() {
    let server = MockServer::start().await;
    serve(
        &server,
        ResponseTemplate::new(200).set_body_raw("<h1>Docs</h1><p>Soon.</p>", "text/html"),
    )
    .await;

    let source = HttpDocsSource::new(&config(5))
        .unwrap()
        .with_site("fastapi", format!("{}/docs", server.uri()));

    assert!(source.fetch("FastAPI", "").await.unwrap().is_empty());
}
