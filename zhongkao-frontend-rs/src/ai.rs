//! The AI request helper.
//!
//! Every generator builds an [`ExerciseRequest`] in `zhongkao_utils::prompts`
//! and sends it to whichever provider the settings select.

use serde::de::DeserializeOwned;
use zhongkao_utils::prompts::{self, ExerciseRequest};
use zhongkao_utils::settings::SettingsError;
use zhongkao_utils::text_cleanup::strip_json_fences;
use zhongkao_utils::{
    AiProvider, AiSettings, ClozeExerciseData, ClozeTestData, McqData, MimicFeedback,
    MimicPassage, RawClozeExercise, RawClozeTest, WordData,
};

use crate::gemini::{self, GenerateContentRequest, GenerationConfig, Part};
use crate::openai::{self, ChatRequest};

/// Shown instead of a comparison the model left empty.
pub const EMPTY_DETAIL_TEXT: &str = "无法加载详情";

#[derive(Debug, thiserror::Error)]
pub enum AiError {
    #[error(transparent)]
    Settings(#[from] SettingsError),
    #[error("AI 请求失败 ({status}): {body}")]
    Status { status: u16, body: String },
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("AI 没有返回内容")]
    EmptyResponse,
    #[error("AI 返回的 JSON 无法解析: {0}")]
    MalformedJson(#[from] serde_json::Error),
    #[error("{0} does not support this feature")]
    UnsupportedProvider(AiProvider),
}

pub(crate) async fn error_for_status(
    response: reqwest::Response,
) -> Result<reqwest::Response, AiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    log::error!("AI provider answered {status}: {body}");
    Err(AiError::Status {
        status: status.as_u16(),
        body,
    })
}

#[derive(Clone, Debug)]
pub struct AiClient {
    http: reqwest::Client,
    settings: AiSettings,
    fallback_key: Option<&'static str>,
}

impl AiClient {
    /// Uses the key baked in at build time when the settings have none.
    pub fn new(settings: AiSettings) -> Self {
        Self::with_fallback_key(settings, option_env!("API_KEY"))
    }

    pub fn with_fallback_key(settings: AiSettings, fallback_key: Option<&'static str>) -> Self {
        Self {
            http: reqwest::Client::new(),
            settings,
            fallback_key,
        }
    }

    pub fn settings(&self) -> &AiSettings {
        &self.settings
    }

    pub fn fallback_key(&self) -> Option<&'static str> {
        self.fallback_key
    }

    fn api_key(&self) -> Result<&str, AiError> {
        Ok(self.settings.effective_api_key(self.fallback_key)?)
    }

    fn require_gemini(&self) -> Result<(), AiError> {
        match self.settings.provider {
            AiProvider::Gemini => Ok(()),
            other => Err(AiError::UnsupportedProvider(other)),
        }
    }

    async fn gemini(
        &self,
        model: &str,
        request: &GenerateContentRequest,
    ) -> Result<gemini::GenerateContentResponse, AiError> {
        gemini::generate_content(
            &self.http,
            self.settings.gemini_base_url(),
            model,
            self.api_key()?,
            request,
        )
        .await
    }

    pub async fn request_text(&self, request: &ExerciseRequest) -> Result<String, AiError> {
        match self.settings.provider {
            AiProvider::Gemini => {
                let mut body = GenerateContentRequest::new(vec![Part::text(&request.prompt)]);
                if let Some(schema) = request.schema() {
                    body = body.with_config(GenerationConfig::json(schema));
                }
                self.gemini(self.settings.model(), &body).await?.text()
            }
            AiProvider::OpenAiCompatible => {
                let prompt = if request.wants_json() {
                    prompts::with_json_hint(&request.prompt)
                } else {
                    request.prompt.clone()
                };
                let body = ChatRequest::user(self.settings.model(), prompt, request.wants_json());
                openai::chat_completion(
                    &self.http,
                    &self.settings.chat_completions_url(),
                    self.api_key()?,
                    &body,
                )
                .await?
                .text()
            }
        }
    }

    pub async fn request_json<T: DeserializeOwned>(
        &self,
        request: &ExerciseRequest,
    ) -> Result<T, AiError> {
        let text = self.request_text(request).await?;
        parse_json(&text)
    }

    pub async fn generate_vocabulary_word(
        &self,
        specific_word: Option<&str>,
    ) -> Result<WordData, AiError> {
        let word: WordData = self
            .request_json(&prompts::vocabulary_word(specific_word))
            .await?;
        log::info!("generated vocabulary word {}", word.word);
        Ok(word)
    }

    pub async fn generate_confusing_detail(
        &self,
        word: &str,
        snippet: &str,
    ) -> Result<String, AiError> {
        match self
            .request_text(&prompts::confusing_detail(word, snippet))
            .await
        {
            Ok(text) if !text.trim().is_empty() => Ok(text),
            Ok(_) | Err(AiError::EmptyResponse) => Ok(EMPTY_DETAIL_TEXT.to_string()),
            Err(e) => Err(e),
        }
    }

    /// A `data:` URL, or `None` if the provider can't draw or the attempt
    /// failed.
    pub async fn generate_vocabulary_image(
        &self,
        word: &str,
        sentence: &str,
    ) -> Result<Option<String>, AiError> {
        if self.settings.provider != AiProvider::Gemini {
            return Ok(None);
        }
        // Surface a missing key instead of quietly showing no picture.
        self.api_key()?;

        let body = GenerateContentRequest::new(vec![Part::text(prompts::vocabulary_image(
            word, sentence,
        ))]);
        match self.gemini(gemini::IMAGE_MODEL, &body).await {
            Ok(response) => {
                let url = response.first_inline_data().map(|inline| inline.data_url());
                if url.is_none() {
                    log::warn!("image response for {word} had no inline data");
                }
                Ok(url)
            }
            Err(e) => {
                log::warn!("image generation for {word} failed: {e}");
                Ok(None)
            }
        }
    }

    pub async fn generate_multiple_choice(&self) -> Result<McqData, AiError> {
        self.request_json(&prompts::multiple_choice()).await
    }

    pub async fn generate_cloze_test(&self) -> Result<ClozeTestData, AiError> {
        let raw: RawClozeTest = self.request_json(&prompts::cloze_test()).await?;
        let data = ClozeTestData::from_raw(raw);
        let dangling = data.dangling_blanks();
        if !dangling.is_empty() {
            log::warn!("cloze test passage refers to blanks without options: {dangling:?}");
        }
        Ok(data)
    }

    pub async fn generate_cloze_exercise(&self) -> Result<ClozeExerciseData, AiError> {
        let raw: RawClozeExercise = self.request_json(&prompts::cloze_exercise()).await?;
        Ok(ClozeExerciseData::from_raw(raw))
    }

    pub async fn generate_mimic_passage(&self) -> Result<MimicPassage, AiError> {
        self.request_json(&prompts::mimic_passage()).await
    }

    /// Base64 PCM (24 kHz mono, 16-bit little-endian).
    pub async fn synthesize_speech(&self, text: &str) -> Result<String, AiError> {
        self.require_gemini()?;
        let body = GenerateContentRequest::new(vec![Part::text(prompts::speech(text))])
            .with_config(GenerationConfig::speech(gemini::TTS_VOICE));
        let response = self.gemini(gemini::TTS_MODEL, &body).await?;
        response
            .first_inline_data()
            .map(|inline| inline.data.clone())
            .ok_or(AiError::EmptyResponse)
    }

    pub async fn evaluate_mimic(
        &self,
        passage: &str,
        audio_base64: &str,
    ) -> Result<MimicFeedback, AiError> {
        self.require_gemini()?;
        let request = prompts::mimic_evaluation(passage);
        let mut body = GenerateContentRequest::new(vec![
            Part::text(&request.prompt),
            Part::inline(gemini::RECORDING_MIME_TYPE, audio_base64),
        ]);
        if let Some(schema) = request.schema() {
            body = body.with_config(GenerationConfig::json(schema));
        }
        let text = self.gemini(gemini::EVALUATION_MODEL, &body).await?.text()?;
        let feedback: MimicFeedback = parse_json(&text)?;
        log::info!("reading scored {}", feedback.score);
        Ok(feedback)
    }
}

fn parse_json<T: DeserializeOwned>(text: &str) -> Result<T, AiError> {
    serde_json::from_str(strip_json_fences(text)).map_err(|e| {
        log::error!("could not parse AI response as JSON: {e}");
        AiError::MalformedJson(e)
    })
}
