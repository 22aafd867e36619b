//! One request builder per exercise type.
//!
//! Each builder pairs the prompt with the shape of the answer it expects, so
//! the request helper knows whether to ask the provider for JSON.

use serde_json::Value;

use crate::schema::{response_schema, with_required};
use crate::{McqData, MimicFeedback, MimicPassage, RawClozeExercise, RawClozeTest, WordData};

pub const JSON_HINT: &str = " (Please output strictly in valid JSON format)";

#[derive(Clone, Debug, PartialEq)]
pub enum ResponseFormat {
    Text,
    Json(Value),
}

#[derive(Clone, Debug, PartialEq)]
pub struct ExerciseRequest {
    pub prompt: String,
    pub response: ResponseFormat,
}

impl ExerciseRequest {
    fn text(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            response: ResponseFormat::Text,
        }
    }

    fn json(prompt: impl Into<String>, schema: Value) -> Self {
        Self {
            prompt: prompt.into(),
            response: ResponseFormat::Json(schema),
        }
    }

    pub fn wants_json(&self) -> bool {
        matches!(self.response, ResponseFormat::Json(_))
    }

    pub fn schema(&self) -> Option<&Value> {
        match &self.response {
            ResponseFormat::Json(schema) => Some(schema),
            ResponseFormat::Text => None,
        }
    }
}

/// Providers without schema support only get JSON mode, which most of them
/// refuse unless the prompt itself mentions JSON.
pub fn with_json_hint(prompt: &str) -> String {
    if prompt.to_lowercase().contains("json") {
        prompt.to_string()
    } else {
        format!("{prompt}{JSON_HINT}")
    }
}

pub fn vocabulary_word(specific_word: Option<&str>) -> ExerciseRequest {
    let prompt = match specific_word {
        Some(word) => format!(
            "Generate detailed dictionary info for the specific English word: \"{word}\". Suitable for Chinese middle school students. Return JSON."
        ),
        None => "Generate a random English vocabulary word suitable for a Chinese student preparing for the Tianjin Zhongkao. Return JSON.".to_string(),
    };
    ExerciseRequest::json(
        prompt,
        with_required(response_schema::<WordData>(), "confusingWordsSnippet"),
    )
}

pub fn confusing_detail(word: &str, snippet: &str) -> ExerciseRequest {
    ExerciseRequest::text(format!(
        "Compare \"{word}\" based on: \"{snippet}\". Use Markdown. Language: Chinese."
    ))
}

pub fn multiple_choice() -> ExerciseRequest {
    ExerciseRequest::json(
        "Generate 5 English multiple choice questions for Tianjin Zhongkao students. Return JSON.",
        response_schema::<McqData>(),
    )
}

pub fn cloze_test() -> ExerciseRequest {
    ExerciseRequest::json(
        "Generate a 10-blank English cloze test for Tianjin Zhongkao. Mark each blank in the passage as {{n}}, where n is the blank id. Return JSON.",
        response_schema::<RawClozeTest>(),
    )
}

pub fn cloze_exercise() -> ExerciseRequest {
    ExerciseRequest::json(
        "Generate a short English passage for Tianjin Zhongkao \"First Letter Fill in the Blanks\". Wrap every word the student must complete in double square brackets, like [[word]]. Return JSON.",
        response_schema::<RawClozeExercise>(),
    )
}

pub fn mimic_passage() -> ExerciseRequest {
    ExerciseRequest::json(
        "Generate an English passage for \"Mimicking/Reading Aloud\" (80-100 words). Topic: School life, travel, or festivals. Suitable for Tianjin Zhongkao. Return JSON.",
        response_schema::<MimicPassage>(),
    )
}

pub fn mimic_evaluation(passage: &str) -> ExerciseRequest {
    ExerciseRequest::json(
        format!(
            "Evaluate the user's reading of this passage: \"{passage}\". Compare the audio with the text. Provide score (0-100), fluency, accuracy, and suggestions in Chinese. Return JSON."
        ),
        response_schema::<MimicFeedback>(),
    )
}

pub fn vocabulary_image(word: &str, sentence: &str) -> String {
    format!("Cute vector educational illustration for \"{word}\". Context: {sentence}.")
}

pub fn speech(text: &str) -> String {
    format!("Say clearly: {text}")
}
