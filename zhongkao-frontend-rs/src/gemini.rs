//! Google's native `generateContent` endpoint.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ai::{AiError, error_for_status};

/// Listens to recordings, so it must accept audio input.
pub const EVALUATION_MODEL: &str = "gemini-3-flash-preview";
pub const IMAGE_MODEL: &str = "gemini-2.5-flash-image";
pub const TTS_MODEL: &str = "gemini-2.5-flash-preview-tts";
pub const TTS_VOICE: &str = "Kore";
pub const RECORDING_MIME_TYPE: &str = "audio/pcm;rate=16000";

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation_config: Option<GenerationConfig>,
}

impl GenerateContentRequest {
    pub fn new(parts: Vec<Part>) -> Self {
        Self {
            contents: vec![Content { parts }],
            generation_config: None,
        }
    }

    pub fn with_config(mut self, config: GenerationConfig) -> Self {
        self.generation_config = Some(config);
        self
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct Content {
    #[serde(default)]
    pub parts: Vec<Part>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inline_data: Option<InlineData>,
}

impl Part {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            inline_data: None,
        }
    }

    pub fn inline(mime_type: &str, data: impl Into<String>) -> Self {
        Self {
            text: None,
            inline_data: Some(InlineData {
                mime_type: mime_type.to_string(),
                data: data.into(),
            }),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InlineData {
    pub mime_type: String,
    /// base64
    pub data: String,
}

impl InlineData {
    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.data)
    }
}

#[derive(Serialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_mime_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_schema: Option<Value>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub response_modalities: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speech_config: Option<SpeechConfig>,
}

impl GenerationConfig {
    pub fn json(schema: &Value) -> Self {
        Self {
            response_mime_type: Some("application/json".to_string()),
            response_schema: Some(schema.clone()),
            ..Default::default()
        }
    }

    pub fn speech(voice: &str) -> Self {
        Self {
            response_modalities: vec!["AUDIO".to_string()],
            speech_config: Some(SpeechConfig {
                voice_config: VoiceConfig {
                    prebuilt_voice_config: PrebuiltVoiceConfig {
                        voice_name: voice.to_string(),
                    },
                },
            }),
            ..Default::default()
        }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SpeechConfig {
    pub voice_config: VoiceConfig,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VoiceConfig {
    pub prebuilt_voice_config: PrebuiltVoiceConfig,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PrebuiltVoiceConfig {
    pub voice_name: String,
}

#[derive(Deserialize, Debug, Clone, PartialEq, Default)]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

#[derive(Deserialize, Debug, Clone, PartialEq, Default)]
pub struct Candidate {
    #[serde(default)]
    pub content: Content,
}

impl GenerateContentResponse {
    fn first_parts(&self) -> Result<&[Part], AiError> {
        self.candidates
            .first()
            .map(|candidate| candidate.content.parts.as_slice())
            .ok_or(AiError::EmptyResponse)
    }

    /// All text parts of the first candidate, joined.
    pub fn text(&self) -> Result<String, AiError> {
        Ok(self
            .first_parts()?
            .iter()
            .filter_map(|part| part.text.as_deref())
            .collect())
    }

    pub fn first_inline_data(&self) -> Option<&InlineData> {
        self.first_parts()
            .ok()?
            .iter()
            .find_map(|part| part.inline_data.as_ref())
    }
}

pub fn endpoint(base_url: &str, model: &str) -> String {
    format!("{base_url}/v1beta/models/{model}:generateContent")
}

pub async fn generate_content(
    http: &reqwest::Client,
    base_url: &str,
    model: &str,
    api_key: &str,
    request: &GenerateContentRequest,
) -> Result<GenerateContentResponse, AiError> {
    log::debug!("gemini request to {model}");
    let response = http
        .post(endpoint(base_url, model))
        .header("x-goog-api-key", api_key)
        .json(request)
        .send()
        .await?;
    let response = error_for_status(response).await?;
    Ok(response.json().await?)
}
