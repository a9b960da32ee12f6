
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use crate::config::Config;

/// Fallback reply when the API returns no usable choice text.
pub const NO_RESPONSE: &str = "No response";

/// Client for an OpenAI-compatible chat completion API.
#[derive(Debug, Clone)]
pub struct ChatClient {
    endpoint: String,
    api_key: String,
    model: String,
    agent: ureq::Agent,
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: Vec<RequestMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

impl ChatClient {
    #[inline]
    pub fn new(config: &Config) -> Self {
        let agent = ureq::Agent::config_builder().build().into();

        Self {
            endpoint: completion_endpoint(&config.base_url),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            agent,
        }
    }

    /// Send one user message and return the first reply text.
    ///
    /// A single round trip: no retries, no timeout beyond the agent defaults.
    #[inline]
    pub fn complete(&self, content: &str) -> Result<String> {
        let request = CompletionRequest {
            model: &self.model,
            messages: vec![RequestMessage {
                role: "user",
                content,
            }],
        };

        let request_json = serde_json::to_string(&request)
            .context("Failed to serialize chat completion request")?;

        debug!("Requesting chat completion from {}", self.endpoint);

        let response_text = self
            .agent
            .post(&self.endpoint)
            .header("Content-Type", "application/json")
            .header("Authorization", &format!("Bearer {}", self.api_key))
            .send(&request_json)
            .and_then(|mut resp| resp.body_mut().read_to_string())
            .context("Chat completion request failed")?;

        let response: CompletionResponse = serde_json::from_str(&response_text)
            .context("Failed to parse chat completion response")?;

        Ok(extract_reply(response))
    }
}

/// `POST <base>/chat/completions`, tolerating a trailing slash on the base.
fn completion_endpoint(base_url: &Url) -> String {
    format!(
        "{}/chat/completions",
        base_url.as_str().trim_end_matches('/')
    )
}

fn extract_reply(response: CompletionResponse) -> String {
    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .unwrap_or_else(|| NO_RESPONSE.to_string())
}
