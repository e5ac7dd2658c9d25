use std::time::Duration;

use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::PipelineError;
use crate::llm::transcript::{ChatMessage, Transcript};

/// Anything that can answer a chat transcript with one reply.
pub trait ChatBackend {
    fn complete(&self, transcript: &Transcript) -> Result<String, PipelineError>;
}

/// Connection settings for an OpenAI-compatible chat completions endpoint.
#[derive(Clone)]
pub struct ChatSettings {
    pub endpoint: String,
    pub model: String,
    pub api_key: String,
    pub timeout: Duration,
    pub temperature: Option<f32>,
    pub top_p: Option<f32>,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    stream: bool,
    model: &'a str,
    messages: &'a [ChatMessage],
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

/// Blocking client; every call is bounded by the configured timeout.
pub struct HttpChatClient {
    http: Client,
    endpoint: Url,
    model: String,
    api_key: String,
    temperature: Option<f32>,
    top_p: Option<f32>,
}

impl HttpChatClient {
    pub fn new(settings: ChatSettings) -> Result<Self, PipelineError> {
        let endpoint = Url::parse(&settings.endpoint).map_err(|e| {
            PipelineError::Transport(format!("invalid endpoint '{}': {e}", settings.endpoint))
        })?;
        let http = Client::builder().timeout(settings.timeout).build()?;
        Ok(Self {
            http,
            endpoint,
            model: settings.model,
            api_key: settings.api_key,
            temperature: settings.temperature,
            top_p: settings.top_p,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

impl ChatBackend for HttpChatClient {
    fn complete(&self, transcript: &Transcript) -> Result<String, PipelineError> {
        let body = ChatRequest {
            stream: false,
            model: &self.model,
            messages: transcript.messages(),
            temperature: self.temperature,
            top_p: self.top_p,
        };
        log::debug!(
            "POST {} model={} messages={}",
            self.endpoint,
            self.model,
            transcript.len()
        );

        let resp = self
            .http
            .post(self.endpoint.clone())
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()?
            .error_for_status()?;

        let parsed: ChatResponse = resp
            .json()
            .map_err(|e| PipelineError::Transport(format!("malformed response: {e}")))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|s| s.trim().to_string())
            .ok_or_else(|| {
                PipelineError::Transport("response has no choices[0].message.content".into())
            })
    }
}
