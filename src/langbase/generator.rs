//! [`GenerationService`] backed by a Langbase pipe.

use async_trait::async_trait;
use tracing::debug;

use super::client::LangbaseClient;
use super::types::{Message, MessageRole, PipeRequest};
use crate::error::{LangbaseError, LangbaseResult};
use crate::services::GenerationService;

/// Generation through one named pipe.
///
/// Langbase pipes fix their sampling parameters when provisioned, so the
/// per-call temperature is only recorded, not forwarded.
#[derive(Clone)]
pub struct PipeGenerator {
    client: LangbaseClient,
    pipe_name: String,
}

impl PipeGenerator {
    pub fn new(client: LangbaseClient, pipe_name: impl Into<String>) -> Self {
        Self {
            client,
            pipe_name: pipe_name.into(),
        }
    }

    pub fn pipe_name(&self) -> &str {
        &self.pipe_name
    }
}

/// System instructions first, then the conversation without any stale
/// system turns.
fn build_messages(history: &[Message], system_instructions: &str) -> Vec<Message> {
    let mut messages = Vec::with_capacity(history.len() + 1);
    messages.push(Message::system(system_instructions));
    messages.extend(
        history
            .iter()
            .filter(|m| m.role != MessageRole::System)
            .cloned(),
    );
    messages
}

#[async_trait]
impl GenerationService for PipeGenerator {
    async fn chat(
        &self,
        history: &[Message],
        system_instructions: &str,
        temperature: f64,
    ) -> LangbaseResult<String> {
        debug!(
            pipe = %self.pipe_name,
            turns = history.len(),
            temperature,
            "Running generation"
        );

        let request = PipeRequest::new(&self.pipe_name, build_messages(history, system_instructions));
        let response = self.client.call_pipe(request).await?;

        if !response.success {
            return Err(LangbaseError::InvalidResponse {
                message: format!("Pipe {} reported an unsuccessful run", self.pipe_name),
            });
        }

        Ok(response.completion)
    }

    async fn complete(
        &self,
        prompt: &str,
        system_instructions: &str,
        temperature: f64,
    ) -> LangbaseResult<String> {
        self.chat(&[Message::user(prompt)], system_instructions, temperature)
            .await
    }
}
