#![deny(clippy::string_slice)]

pub mod ai;
pub mod audio;
pub mod gemini;
pub mod openai;
pub mod storage;
mod utils;

use std::cell::RefCell;
use std::sync::LazyLock;

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;
use zhongkao_utils::view::ConfusingTarget;
use zhongkao_utils::{
    AI_PRESETS, AiPreset, AiSettings, AppView, ClozeExerciseData, ClozeTestData, McqData,
    MimicFeedback, MimicPassage, ViewRouter, WordData,
};

pub use ai::{AiClient, AiError};
use audio::{AudioError, SPEECH_CHANNELS, SPEECH_SAMPLE_RATE, SpeechAudio, SpeechCache};
use storage::{KeyValueStore, StorageError};

pub const SETTINGS_SAVED_TEXT: &str = "设置已保存";

/// Something the user asked the tutor to do. Its `Display` is the message
/// shown when that action fails.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Operation {
    LoadWord,
    GenerateImage,
    GenerateExercise,
    LoadPassage,
    Speak,
    Evaluate,
    AddWord,
    LoadDetail,
    OpenMicrophone,
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            Operation::LoadWord => "加载单词失败，请检查 AI 配置",
            Operation::GenerateImage => "生成图片失败，该模型可能不支持图像生成",
            Operation::GenerateExercise => "出题失败，请检查 AI 配置",
            Operation::LoadPassage => "加载失败，请检查 AI 配置",
            Operation::Speak => "朗读失败，请检查 AI 配置",
            Operation::Evaluate => "评分失败",
            Operation::AddWord => "添加失败，请检查 AI 配置",
            Operation::LoadDetail => "详情加载失败，请检查 AI 配置",
            Operation::OpenMicrophone => "无法访问麦克风",
        };
        write!(f, "{text}")
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TutorError {
    #[error("{operation}")]
    Failed {
        operation: Operation,
        #[source]
        source: AiError,
    },
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("{}", Operation::Speak)]
    Speech(#[from] AudioError),
    #[error("请选择简短的英文单词或短语")]
    InvalidSelection,
}

impl TutorError {
    fn failed(operation: Operation) -> impl FnOnce(AiError) -> TutorError {
        move |source| {
            log::error!("{operation:?} failed: {source}");
            TutorError::Failed { operation, source }
        }
    }
}

#[cfg(target_arch = "wasm32")]
impl From<TutorError> for JsValue {
    fn from(error: TutorError) -> Self {
        JsValue::from_str(&error.to_string())
    }
}

// static, so every Tutor shares one initialization
static LOGGER: LazyLock<()> = LazyLock::new(utils::init_logging);

#[cfg_attr(target_arch = "wasm32", wasm_bindgen)]
pub fn get_app_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

/// Shown when recording can't start because the microphone was refused.
#[cfg_attr(target_arch = "wasm32", wasm_bindgen)]
pub fn microphone_unavailable_text() -> String {
    Operation::OpenMicrophone.to_string()
}

#[cfg_attr(target_arch = "wasm32", wasm_bindgen)]
pub fn is_addable_selection(text: String) -> bool {
    zhongkao_utils::text_cleanup::is_addable_selection(&text)
}

/// One per page. Holds the persisted settings, the AI client built from them
/// and the current screen.
// we never hold a borrow across an .await, so none of these RefCells can panic
#[cfg_attr(target_arch = "wasm32", wasm_bindgen)]
pub struct Tutor {
    store: Box<dyn KeyValueStore>,
    client: RefCell<AiClient>,
    router: RefCell<ViewRouter>,
    speech: RefCell<SpeechCache>,
}

#[cfg_attr(target_arch = "wasm32", wasm_bindgen)]
impl Tutor {
    #[cfg_attr(target_arch = "wasm32", wasm_bindgen(constructor))]
    pub fn new() -> Result<Tutor, TutorError> {
        LazyLock::force(&LOGGER);

        #[cfg(target_arch = "wasm32")]
        let store = storage::LocalStorage::open().inspect_err(|e| {
            log::error!("Error opening localStorage: {e:?}");
        })?;
        #[cfg(not(target_arch = "wasm32"))]
        let store = storage::MemoryStore::default();

        Ok(Self::with_store(Box::new(store)))
    }

    pub fn settings(&self) -> AiSettings {
        self.client.borrow().settings().clone()
    }

    pub fn presets(&self) -> Vec<AiPreset> {
        AI_PRESETS.to_vec()
    }

    /// Fill the settings form from a preset. Nothing is saved.
    pub fn apply_preset(&self, settings: AiSettings, name: String) -> AiSettings {
        let mut settings = settings;
        if !settings.apply_preset(&name) {
            log::warn!("unknown preset {name}");
        }
        settings
    }

    /// Persist the settings and use them for every request from now on.
    pub fn save_settings(&self, settings: AiSettings) -> Result<String, TutorError> {
        storage::save_settings(self.store.as_ref(), &settings).inspect_err(|e| {
            log::warn!("settings not saved: {e}");
        })?;
        log::info!(
            "using {} with model {}",
            settings.provider,
            settings.model()
        );
        *self.client.borrow_mut() = self.build_client(settings);
        Ok(SETTINGS_SAVED_TEXT.to_string())
    }

    pub fn current_view(&self) -> AppView {
        self.router.borrow().current()
    }

    pub fn view_title(&self) -> String {
        self.current_view().title().to_string()
    }

    pub fn loading_text(&self) -> Option<String> {
        self.current_view().loading_text().map(str::to_string)
    }

    pub fn select_mode(&self, view: AppView) -> bool {
        self.router.borrow_mut().select_mode(view)
    }

    pub fn open_confusing(&self, word: String, snippet: String) {
        self.router.borrow_mut().open_confusing(word, snippet);
    }

    pub fn confusing_target(&self) -> Option<ConfusingTarget> {
        self.router.borrow().confusing_target().cloned()
    }

    pub fn back(&self) -> AppView {
        self.router.borrow_mut().back()
    }

    pub async fn generate_vocabulary_word(
        &self,
        specific_word: Option<String>,
    ) -> Result<WordData, TutorError> {
        self.client()
            .generate_vocabulary_word(specific_word.as_deref())
            .await
            .map_err(TutorError::failed(Operation::LoadWord))
    }

    pub async fn generate_vocabulary_image(
        &self,
        word: String,
        sentence: String,
    ) -> Result<Option<String>, TutorError> {
        self.client()
            .generate_vocabulary_image(&word, &sentence)
            .await
            .map_err(TutorError::failed(Operation::GenerateImage))
    }

    pub async fn generate_confusing_detail(
        &self,
        word: String,
        snippet: String,
    ) -> Result<String, TutorError> {
        self.client()
            .generate_confusing_detail(&word, &snippet)
            .await
            .map_err(TutorError::failed(Operation::LoadDetail))
    }

    pub async fn generate_multiple_choice(&self) -> Result<McqData, TutorError> {
        self.client()
            .generate_multiple_choice()
            .await
            .map_err(TutorError::failed(Operation::GenerateExercise))
    }

    pub async fn generate_cloze_test(&self) -> Result<ClozeTestData, TutorError> {
        self.client()
            .generate_cloze_test()
            .await
            .map_err(TutorError::failed(Operation::GenerateExercise))
    }

    pub async fn generate_cloze_exercise(&self) -> Result<ClozeExerciseData, TutorError> {
        self.client()
            .generate_cloze_exercise()
            .await
            .map_err(TutorError::failed(Operation::GenerateExercise))
    }

    pub async fn generate_mimic_passage(&self) -> Result<MimicPassage, TutorError> {
        self.client()
            .generate_mimic_passage()
            .await
            .map_err(TutorError::failed(Operation::LoadPassage))
    }

    /// Speech for `text`, synthesized once and then served from memory.
    pub async fn speak(&self, text: String) -> Result<SpeechAudio, TutorError> {
        if let Some(cached) = self.speech.borrow().get(&text) {
            return Ok(cached);
        }
        let pcm = self
            .client()
            .synthesize_speech(&text)
            .await
            .map_err(TutorError::failed(Operation::Speak))?;
        let audio = audio::decode_pcm16(&pcm, SPEECH_SAMPLE_RATE, SPEECH_CHANNELS)
            .inspect_err(|e| log::error!("undecodable speech: {e}"))?;
        self.speech.borrow_mut().insert(&text, audio.clone());
        Ok(audio)
    }

    pub async fn evaluate_mimic(
        &self,
        passage: String,
        recording: Vec<u8>,
    ) -> Result<MimicFeedback, TutorError> {
        let audio = audio::encode_recording(&recording);
        self.client()
            .evaluate_mimic(&passage, &audio)
            .await
            .map_err(TutorError::failed(Operation::Evaluate))
    }

    /// Look up the selected text and save it. Returns the toast to show.
    pub async fn add_selection_to_word_book(
        &self,
        selection: String,
    ) -> Result<String, TutorError> {
        if !zhongkao_utils::text_cleanup::is_addable_selection(&selection) {
            return Err(TutorError::InvalidSelection);
        }
        let selection = selection.trim().to_string();
        let details = self
            .client()
            .generate_vocabulary_word(Some(&selection))
            .await
            .map_err(TutorError::failed(Operation::AddWord))?;
        if !storage::add_to_word_book(self.store.as_ref(), details)? {
            log::info!("{selection} is already in the word book");
        }
        Ok(format!("已添加: {selection}"))
    }

    pub fn saved_words(&self) -> Vec<WordData> {
        storage::load_word_book(self.store.as_ref()).into_words()
    }

    pub fn clear_saved_words(&self) -> Result<(), TutorError> {
        Ok(storage::clear_word_book(self.store.as_ref())?)
    }
}

impl Tutor {
    pub fn with_store(store: Box<dyn KeyValueStore>) -> Self {
        let settings = storage::load_settings(store.as_ref());
        Self::from_parts(store, AiClient::new(settings))
    }

    /// Like [`Tutor::with_store`], but with an explicit build-time key
    /// fallback instead of `API_KEY`.
    pub fn with_store_and_fallback_key(
        store: Box<dyn KeyValueStore>,
        fallback_key: Option<&'static str>,
    ) -> Self {
        let settings = storage::load_settings(store.as_ref());
        Self::from_parts(store, AiClient::with_fallback_key(settings, fallback_key))
    }

    fn from_parts(store: Box<dyn KeyValueStore>, client: AiClient) -> Self {
        Self {
            store,
            client: RefCell::new(client),
            router: RefCell::new(ViewRouter::default()),
            speech: RefCell::new(SpeechCache::default()),
        }
    }

    fn build_client(&self, settings: AiSettings) -> AiClient {
        let fallback_key = self.client.borrow().fallback_key();
        AiClient::with_fallback_key(settings, fallback_key)
    }

    /// A snapshot of the client, so no borrow is held across an await.
    fn client(&self) -> AiClient {
        self.client.borrow().clone()
    }
}
