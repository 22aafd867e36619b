pub mod cloze;
pub mod prompts;
pub mod schema;
pub mod session;
pub mod settings;
pub mod text_cleanup;
pub mod view;
pub mod word_book;

use std::collections::BTreeMap;

pub use settings::{AI_PRESETS, AiPreset, AiProvider, AiSettings};
pub use view::{AppView, ViewRouter};
pub use word_book::WordBook;

/// A vocabulary card, as the model is asked to produce it.
#[derive(
    Clone,
    Debug,
    serde::Serialize,
    serde::Deserialize,
    schemars::JsonSchema,
    tsify::Tsify,
    PartialEq,
    Eq,
)]
#[tsify(into_wasm_abi, from_wasm_abi)]
#[serde(rename_all = "camelCase")]
pub struct WordData {
    pub word: String,
    pub phonetic: String,
    #[serde(rename = "definitionCN")]
    pub definition_cn: String,
    #[serde(rename = "definitionEN")]
    pub definition_en: String,
    pub example_sentence: String,
    pub example_translation: String,
    pub mnemonics: String,
    pub collocations: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confusing_words_snippet: Option<String>,
}

#[derive(
    Clone,
    Debug,
    serde::Serialize,
    serde::Deserialize,
    schemars::JsonSchema,
    tsify::Tsify,
    PartialEq,
    Eq,
)]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub struct McqQuestion {
    pub question: String,
    pub options: Vec<String>,
    pub answer: String,
    pub analysis: String,
}

#[derive(
    Clone,
    Debug,
    serde::Serialize,
    serde::Deserialize,
    schemars::JsonSchema,
    tsify::Tsify,
    PartialEq,
    Eq,
)]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub struct McqData {
    pub questions: Vec<McqQuestion>,
}

#[derive(
    Clone,
    Debug,
    serde::Serialize,
    serde::Deserialize,
    schemars::JsonSchema,
    tsify::Tsify,
    PartialEq,
    Eq,
)]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub struct ClozeTestBlank {
    pub id: u32,
    pub options: Vec<String>,
    pub answer: String,
    pub analysis: String,
}

/// What the model returns for a cloze test: the passage still carries its
/// `{{n}}` markers.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize, schemars::JsonSchema, PartialEq)]
pub struct RawClozeTest {
    pub title: String,
    pub passage: String,
    pub blanks: Vec<ClozeTestBlank>,
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize, tsify::Tsify, PartialEq, Eq)]
#[tsify(into_wasm_abi, from_wasm_abi)]
#[serde(untagged)]
pub enum ClozeTestSegment {
    Text(String),
    Blank {
        #[serde(rename = "blankId")]
        blank_id: u32,
    },
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize, tsify::Tsify, PartialEq, Eq)]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub struct ClozeTestData {
    pub title: String,
    pub segments: Vec<ClozeTestSegment>,
    pub blanks: BTreeMap<u32, ClozeTestBlank>,
}

/// One blank of a first-letter cloze exercise.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize, tsify::Tsify, PartialEq, Eq)]
#[tsify(into_wasm_abi, from_wasm_abi)]
#[serde(rename_all = "camelCase")]
pub struct ClozeItem {
    pub id: u32,
    pub word: String,
    /// First letter followed by one underscore per hidden letter.
    pub display: String,
    pub prefix: String,
    pub suffix: String,
    pub context_before: String,
    pub context_after: String,
    pub user_answer: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_correct: Option<bool>,
}

/// What the model returns for a first-letter cloze: hidden words are wrapped
/// in `[[...]]`.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize, schemars::JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RawClozeExercise {
    pub title: String,
    pub tagged_content: String,
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize, tsify::Tsify, PartialEq, Eq)]
#[tsify(into_wasm_abi, from_wasm_abi)]
#[serde(untagged)]
pub enum ClozeSegment {
    Text(String),
    Item(ClozeItem),
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize, tsify::Tsify, PartialEq, Eq)]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub struct ClozeExerciseData {
    pub title: String,
    /// The passage with all markers removed.
    pub content: String,
    pub segments: Vec<ClozeSegment>,
}

#[derive(
    Clone,
    Debug,
    serde::Serialize,
    serde::Deserialize,
    schemars::JsonSchema,
    tsify::Tsify,
    PartialEq,
    Eq,
)]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub struct MimicPassage {
    pub title: String,
    #[serde(rename = "contentEN")]
    pub content_en: String,
    #[serde(rename = "contentCN")]
    pub content_cn: String,
    pub keywords: Vec<String>,
}

#[derive(
    Clone, Debug, serde::Serialize, serde::Deserialize, schemars::JsonSchema, tsify::Tsify, PartialEq,
)]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub struct MimicFeedback {
    /// 0-100
    pub score: f64,
    pub fluency: String,
    pub accuracy: String,
    pub suggestions: String,
}
