//! AI connection settings and the provider preset table.

use serde::{Deserialize, Serialize};

pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-3-flash-preview";
pub const DEFAULT_PRESET_NAME: &str = "Google Gemini (原生)";

#[derive(
    Copy,
    Clone,
    Debug,
    Serialize,
    Deserialize,
    PartialEq,
    Eq,
    Hash,
    tsify::Tsify,
    schemars::JsonSchema,
)]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub enum AiProvider {
    /// Google's native `generateContent` API.
    #[serde(rename = "gemini")]
    Gemini,
    /// Anything that speaks `POST /chat/completions`.
    #[serde(rename = "openai-compatible")]
    OpenAiCompatible,
}

impl std::fmt::Display for AiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            AiProvider::Gemini => "gemini",
            AiProvider::OpenAiCompatible => "openai-compatible",
        };
        write!(f, "{name}")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SettingsError {
    /// Raised when saving the settings form.
    #[error("请填写 API Key")]
    MissingApiKey,
    /// Raised when a request is about to be sent and no key can be found.
    #[error("API Key 未配置。请在设置页面右上角输入您的 API Key。")]
    NoEffectiveApiKey,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, tsify::Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
#[serde(rename_all = "camelCase")]
pub struct AiSettings {
    pub provider: AiProvider,
    #[serde(default)]
    pub base_url: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub model_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preset_name: Option<String>,
}

impl Default for AiSettings {
    fn default() -> Self {
        Self {
            provider: AiProvider::Gemini,
            base_url: String::new(),
            api_key: String::new(),
            model_name: DEFAULT_GEMINI_MODEL.to_string(),
            preset_name: Some(DEFAULT_PRESET_NAME.to_string()),
        }
    }
}

impl AiSettings {
    /// Fill provider, base URL and model from a named preset. The API key is
    /// left alone. Returns `false` if there is no preset with that name.
    pub fn apply_preset(&mut self, name: &str) -> bool {
        let Some(preset) = AiPreset::find(name) else {
            return false;
        };
        self.provider = preset.provider;
        self.base_url = preset.base_url.to_string();
        self.model_name = preset.model_name.to_string();
        self.preset_name = Some(preset.name.to_string());
        true
    }

    pub fn validate_for_save(&self) -> Result<(), SettingsError> {
        if self.api_key.trim().is_empty() {
            return Err(SettingsError::MissingApiKey);
        }
        Ok(())
    }

    /// The user's key wins; otherwise a key baked in at build time.
    pub fn effective_api_key<'a>(
        &'a self,
        fallback: Option<&'a str>,
    ) -> Result<&'a str, SettingsError> {
        if !self.api_key.is_empty() {
            return Ok(&self.api_key);
        }
        fallback
            .filter(|key| !key.is_empty())
            .ok_or(SettingsError::NoEffectiveApiKey)
    }

    pub fn chat_completions_url(&self) -> String {
        let base = if self.base_url.is_empty() {
            DEFAULT_OPENAI_BASE_URL
        } else {
            self.base_url.strip_suffix('/').unwrap_or(&self.base_url)
        };
        format!("{base}/chat/completions")
    }

    pub fn gemini_base_url(&self) -> &str {
        let trimmed = self.base_url.trim_end_matches('/');
        if trimmed.is_empty() {
            DEFAULT_GEMINI_BASE_URL
        } else {
            trimmed
        }
    }

    /// The configured model, or the Gemini default when Gemini is selected
    /// and the field was left blank.
    pub fn model(&self) -> &str {
        if self.model_name.is_empty() && self.provider == AiProvider::Gemini {
            DEFAULT_GEMINI_MODEL
        } else {
            &self.model_name
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, tsify::Tsify)]
#[tsify(into_wasm_abi)]
#[serde(rename_all = "camelCase")]
pub struct AiPreset {
    pub name: &'static str,
    pub provider: AiProvider,
    pub base_url: &'static str,
    pub model_name: &'static str,
}

impl AiPreset {
    pub fn find(name: &str) -> Option<&'static AiPreset> {
        AI_PRESETS.iter().find(|preset| preset.name == name)
    }
}

pub const AI_PRESETS: &[AiPreset] = &[
    AiPreset {
        name: "DeepSeek (中国)",
        provider: AiProvider::OpenAiCompatible,
        base_url: "https://api.deepseek.com",
        model_name: "deepseek-chat",
    },
    AiPreset {
        name: "Moonshot Kimi (中国)",
        provider: AiProvider::OpenAiCompatible,
        base_url: "https://api.moonshot.cn/v1",
        model_name: "moonshot-v1-8k",
    },
    AiPreset {
        name: "通义千问 Qwen (中国)",
        provider: AiProvider::OpenAiCompatible,
        base_url: "https://dashscope.aliyuncs.com/compatible-mode/v1",
        model_name: "qwen-turbo",
    },
    AiPreset {
        name: "智谱 GLM (中国)",
        provider: AiProvider::OpenAiCompatible,
        base_url: "https://open.bigmodel.cn/api/paas/v4/",
        model_name: "glm-4",
    },
    AiPreset {
        name: DEFAULT_PRESET_NAME,
        provider: AiProvider::Gemini,
        base_url: "",
        model_name: DEFAULT_GEMINI_MODEL,
    },
    AiPreset {
        name: "OpenAI GPT-4o",
        provider: AiProvider::OpenAiCompatible,
        base_url: "https://api.openai.com/v1",
        model_name: "gpt-4o",
    },
    AiPreset {
        name: "Groq (极速推理)",
        provider: AiProvider::OpenAiCompatible,
        base_url: "https://api.groq.com/openai/v1",
        model_name: "llama-3.1-70b-versatile",
    },
    AiPreset {
        name: "自定义代理/其他",
        provider: AiProvider::OpenAiCompatible,
        base_url: "",
        model_name: "",
    },
];
