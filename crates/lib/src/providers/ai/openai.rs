use crate::{errors::PromptError, providers::ai::AiProvider};
use async_trait::async_trait;
use reqwest::Client as ReqwestClient;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Debug};
use tracing::debug;

// --- OpenAI chat completions request and response structures ---

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    temperature: f32,
    stream: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Deserialize, Debug)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize, Debug)]
struct ChatChoice {
    message: ChatMessage,
}

// --- OpenAI Provider implementation ---

/// A provider for the OpenAI chat completions API, or any compatible endpoint.
#[derive(Clone)]
pub struct OpenAiProvider {
    client: ReqwestClient,
    api_url: String,
    api_key: String,
    model: String,
    temperature: f32,
}

impl OpenAiProvider {
    /// Creates a new `OpenAiProvider`.
    ///
    /// An empty `api_key` sends the request without an `Authorization` header;
    /// the endpoint then decides whether to reject it.
    pub fn new(
        api_url: String,
        api_key: String,
        model: String,
        temperature: f32,
    ) -> Result<Self, PromptError> {
        let client = ReqwestClient::builder()
            .build()
            .map_err(PromptError::ReqwestClientBuild)?;
        Ok(Self {
            client,
            api_url,
            api_key,
            model,
            temperature,
        })
    }
}

impl Debug for OpenAiProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAiProvider")
            .field("api_url", &self.api_url)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl AiProvider for OpenAiProvider {
    async fn generate(
        &self,
        system_prompt: &str,
        user_prompt: &str,
    ) -> Result<String, PromptError> {
        let messages = vec![
            ChatMessage {
                role: "system".to_string(),
                content: system_prompt.to_string(),
            },
            ChatMessage {
                role: "user".to_string(),
                content: user_prompt.to_string(),
            },
        ];

        let request_body = ChatRequest {
            model: &self.model,
            messages,
            temperature: self.temperature,
            stream: false,
        };

        debug!(model = %self.model, "--> Sending chat completion request");

        let mut request_builder = self.client.post(&self.api_url);
        if !self.api_key.is_empty() {
            request_builder = request_builder.bearer_auth(&self.api_key);
        }

        let response = request_builder
            .json(&request_body)
            .send()
            .await
            .map_err(PromptError::AiRequest)?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(PromptError::AiApi(format!("{status}: {error_text}")));
        }

        let chat_response: ChatResponse = response
            .json()
            .await
            .map_err(PromptError::AiDeserialization)?;

        let raw_response = chat_response
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .unwrap_or_default();

        debug!("<-- Reply from AI: {}", &raw_response);

        Ok(raw_response)
    }
}
