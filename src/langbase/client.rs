use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

use super::types::{CreatePipeRequest, CreatePipeResponse, PipeRequest, PipeResponse};
use crate::config::{LangbaseConfig, RequestConfig};
use crate::error::{LangbaseError, LangbaseResult};

/// Client for interacting with Langbase Pipes API
#[derive(Clone)]
pub struct LangbaseClient {
    client: Client,
    base_url: String,
    api_key: String,
    request_config: RequestConfig,
}

/// Provisioning parameters for one pipe.
#[derive(Debug, Clone)]
pub struct PipeSpec {
    pub name: String,
    pub description: String,
    pub model: String,
    pub temperature: f64,
    pub max_tokens: u32,
}

impl LangbaseClient {
    /// Create a new Langbase client
    pub fn new(config: &LangbaseConfig, request_config: RequestConfig) -> LangbaseResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(request_config.timeout_ms))
            .build()
            .map_err(LangbaseError::Http)?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            request_config,
        })
    }

    /// Run a pipe, retrying transient failures with exponential backoff.
    pub async fn call_pipe(&self, request: PipeRequest) -> LangbaseResult<PipeResponse> {
        let url = format!("{}/v1/pipes/run", self.base_url);
        let pipe_name = request.name.clone();

        let mut last_error = None;
        let mut retries = 0;

        while retries <= self.request_config.max_retries {
            if retries > 0 {
                let delay = Duration::from_millis(
                    self.request_config.retry_delay_ms * (2_u64.pow(retries - 1)),
                );
                warn!(
                    pipe = %pipe_name,
                    retry = retries,
                    delay_ms = delay.as_millis(),
                    "Retrying Langbase request"
                );
                tokio::time::sleep(delay).await;
            }

            let start = Instant::now();

            match self.post_json::<_, PipeResponse>(&url, &request).await {
                Ok(response) => {
                    info!(
                        pipe = %pipe_name,
                        latency_ms = start.elapsed().as_millis(),
                        "Langbase pipe call succeeded"
                    );
                    return Ok(response);
                }
                Err(e) => {
                    error!(
                        pipe = %pipe_name,
                        error = %e,
                        latency_ms = start.elapsed().as_millis(),
                        retry = retries,
                        "Langbase pipe call failed"
                    );
                    if !is_retryable(&e) {
                        return Err(e);
                    }
                    last_error = Some(e);
                    retries += 1;
                }
            }
        }

        Err(LangbaseError::Unavailable {
            message: last_error
                .map(|e| e.to_string())
                .unwrap_or_else(|| "Unknown error".to_string()),
            retries,
        })
    }

    /// POST a JSON body and decode a JSON reply (internal)
    async fn post_json<B: Serialize, R: DeserializeOwned>(
        &self,
        url: &str,
        body: &B,
    ) -> LangbaseResult<R> {
        debug!(url = %url, "Sending Langbase request");

        let response = self
            .client
            .post(url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LangbaseError::Timeout {
                        timeout_ms: self.request_config.timeout_ms,
                    }
                } else {
                    LangbaseError::Http(e)
                }
            })?;

        let status = response.status();

        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            return Err(LangbaseError::Api {
                status: status.as_u16(),
                message: error_body,
            });
        }

        response
            .json()
            .await
            .map_err(|e| LangbaseError::InvalidResponse {
                message: format!("Failed to parse response: {}", e),
            })
    }

    /// Get the base URL (for testing)
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Create (or upsert) a pipe
    pub async fn create_pipe(
        &self,
        request: CreatePipeRequest,
    ) -> LangbaseResult<CreatePipeResponse> {
        let url = format!("{}/v1/pipes", self.base_url);

        info!(pipe = %request.name, "Creating Langbase pipe");

        let pipe_response: CreatePipeResponse = self.post_json(&url, &request).await?;

        info!(
            pipe = %pipe_response.name,
            url = %pipe_response.url,
            "Pipe created successfully"
        );

        Ok(pipe_response)
    }

    /// Ensure a pipe exists. An existing pipe (HTTP 409) counts as success.
    pub async fn ensure_pipe(&self, spec: &PipeSpec) -> LangbaseResult<()> {
        let request = CreatePipeRequest::new(&spec.name)
            .with_description(&spec.description)
            .with_model(&spec.model)
            .with_upsert(true)
            .with_temperature(spec.temperature)
            .with_max_tokens(spec.max_tokens);

        match self.create_pipe(request).await {
            Ok(_) => {
                info!(pipe = %spec.name, "Pipe ready");
                Ok(())
            }
            Err(LangbaseError::Api { status: 409, .. }) => {
                info!(pipe = %spec.name, "Pipe already exists");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }
}

/// Client errors other than rate limiting will not improve on retry.
fn is_retryable(err: &LangbaseError) -> bool {
    match err {
        LangbaseError::Api { status, .. } => {
            let status = StatusCode::from_u16(*status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS
        }
        LangbaseError::InvalidResponse { .. } => false,
        _ => true,
    }
}

impl PipeSpec {
    /// Pipe backing the Planner and Mentor phases.
    pub fn deep(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: "Architect requirements interview and scaffold generation".to_string(),
            model: "openai:gpt-4o".to_string(),
            temperature: 0.7,
            max_tokens: 4096,
        }
    }

    /// Pipe backing the Librarian phase.
    pub fn fast(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: "Architect technology identification and documentation synthesis"
                .to_string(),
            model: "openai:gpt-4o-mini".to_string(),
            temperature: 0.3,
            max_tokens: 2048,
        }
    }
}
