//! `POST /chat/completions` for OpenAI-compatible gateways.

use serde::{Deserialize, Serialize};

use crate::ai::{AiError, error_for_status};

pub const TEMPERATURE: f64 = 0.7;

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_format: Option<ResponseFormat>,
}

impl ChatRequest {
    pub fn user(model: &str, content: String, json: bool) -> Self {
        Self {
            model: model.to_string(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: Some(content),
            }],
            temperature: TEMPERATURE,
            response_format: json.then(|| ResponseFormat {
                kind: "json_object".to_string(),
            }),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ChatMessage {
    pub role: String,
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct ResponseFormat {
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct ChatResponse {
    #[serde(default)]
    pub choices: Vec<Choice>,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct Choice {
    pub message: ChatMessage,
}

impl ChatResponse {
    pub fn text(self) -> Result<String, AiError> {
        self.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or(AiError::EmptyResponse)
    }
}

pub async fn chat_completion(
    http: &reqwest::Client,
    url: &str,
    api_key: &str,
    request: &ChatRequest,
) -> Result<ChatResponse, AiError> {
    log::debug!("chat completion request to {url} ({})", request.model);
    let response = http
        .post(url)
        .bearer_auth(api_key)
        .json(request)
        .send()
        .await?;
    let response = error_for_status(response).await?;
    Ok(response.json().await?)
}
