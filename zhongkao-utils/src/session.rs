//! Interaction state for the exercise screens.
//!
//! A session is created from freshly generated content and lives until the
//! user asks for the next batch. Once results are revealed, answers are
//! frozen.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

use crate::view::ConfusingTarget;
use crate::{
    ClozeExerciseData, ClozeItem, ClozeSegment, ClozeTestData, McqData, MimicFeedback,
    MimicPassage, WordData,
};

pub const PERFECT_VERDICT: &str = "太棒了！全对！";
pub const KEEP_GOING_VERDICT: &str = "再接再厉，查漏补缺！";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("请先完成所有题目")]
    Incomplete { answered: usize, total: usize },
    #[error("not allowed while {0:?}")]
    InvalidPhase(MimicPhase),
}

#[cfg(target_arch = "wasm32")]
impl From<SessionError> for JsValue {
    fn from(error: SessionError) -> Self {
        JsValue::from_str(&error.to_string())
    }
}

/// How an answer option should be drawn.
#[derive(Copy, Clone, Debug, Serialize, Deserialize, PartialEq, Eq, tsify::Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub enum OptionState {
    Idle,
    Selected,
    Correct,
    Wrong,
}

impl OptionState {
    fn resolve(revealed: bool, is_selected: bool, is_answer: bool) -> Self {
        match (revealed, is_selected, is_answer) {
            (true, _, true) => OptionState::Correct,
            (true, true, false) => OptionState::Wrong,
            (false, true, _) => OptionState::Selected,
            _ => OptionState::Idle,
        }
    }
}

#[cfg_attr(target_arch = "wasm32", wasm_bindgen)]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct McqSession {
    data: McqData,
    answers: BTreeMap<usize, String>,
    revealed: bool,
}

#[cfg_attr(target_arch = "wasm32", wasm_bindgen)]
impl McqSession {
    #[cfg_attr(target_arch = "wasm32", wasm_bindgen(constructor))]
    pub fn new(data: McqData) -> Self {
        Self {
            data,
            answers: BTreeMap::new(),
            revealed: false,
        }
    }

    pub fn data(&self) -> McqData {
        self.data.clone()
    }

    pub fn select(&mut self, question: usize, option: String) {
        if self.revealed || question >= self.data.questions.len() {
            return;
        }
        self.answers.insert(question, option);
    }

    pub fn answer(&self, question: usize) -> Option<String> {
        self.answers.get(&question).cloned()
    }

    pub fn can_submit(&self) -> bool {
        !self.revealed && self.answers.len() >= self.data.questions.len()
    }

    pub fn submit(&mut self) -> Result<usize, SessionError> {
        if self.answers.len() < self.data.questions.len() {
            return Err(SessionError::Incomplete {
                answered: self.answers.len(),
                total: self.data.questions.len(),
            });
        }
        self.revealed = true;
        Ok(self.score())
    }

    pub fn revealed(&self) -> bool {
        self.revealed
    }

    pub fn score(&self) -> usize {
        self.data
            .questions
            .iter()
            .enumerate()
            .filter(|(i, q)| self.answers.get(i) == Some(&q.answer))
            .count()
    }

    pub fn total(&self) -> usize {
        self.data.questions.len()
    }

    pub fn is_perfect(&self) -> bool {
        self.score() == self.total()
    }

    pub fn verdict(&self) -> String {
        if self.is_perfect() {
            PERFECT_VERDICT.to_string()
        } else {
            KEEP_GOING_VERDICT.to_string()
        }
    }

    pub fn option_state(&self, question: usize, option: String) -> OptionState {
        let Some(q) = self.data.questions.get(question) else {
            return OptionState::Idle;
        };
        let is_selected = self.answers.get(&question) == Some(&option);
        OptionState::resolve(self.revealed, is_selected, q.answer == option)
    }
}

#[cfg_attr(target_arch = "wasm32", wasm_bindgen)]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClozeTestSession {
    data: ClozeTestData,
    answers: BTreeMap<u32, String>,
    revealed: bool,
}

#[cfg_attr(target_arch = "wasm32", wasm_bindgen)]
impl ClozeTestSession {
    #[cfg_attr(target_arch = "wasm32", wasm_bindgen(constructor))]
    pub fn new(data: ClozeTestData) -> Self {
        Self {
            data,
            answers: BTreeMap::new(),
            revealed: false,
        }
    }

    pub fn data(&self) -> ClozeTestData {
        self.data.clone()
    }

    pub fn select(&mut self, blank_id: u32, option: String) {
        if self.revealed || !self.data.blanks.contains_key(&blank_id) {
            return;
        }
        self.answers.insert(blank_id, option);
    }

    pub fn answer(&self, blank_id: u32) -> Option<String> {
        self.answers.get(&blank_id).cloned()
    }

    /// Unanswered blanks simply count as wrong.
    pub fn submit(&mut self) -> usize {
        self.revealed = true;
        self.score()
    }

    pub fn revealed(&self) -> bool {
        self.revealed
    }

    pub fn is_correct(&self, blank_id: u32) -> bool {
        match (self.data.blanks.get(&blank_id), self.answers.get(&blank_id)) {
            (Some(blank), Some(answer)) => *answer == blank.answer,
            _ => false,
        }
    }

    pub fn score(&self) -> usize {
        self.data
            .blanks
            .keys()
            .filter(|id| self.is_correct(**id))
            .count()
    }

    pub fn total(&self) -> usize {
        self.data.blanks.len()
    }

    pub fn option_state(&self, blank_id: u32, option: String) -> OptionState {
        let Some(blank) = self.data.blanks.get(&blank_id) else {
            return OptionState::Idle;
        };
        let is_selected = self.answers.get(&blank_id) == Some(&option);
        OptionState::resolve(self.revealed, is_selected, blank.answer == option)
    }
}

#[cfg_attr(target_arch = "wasm32", wasm_bindgen)]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClozeSession {
    data: ClozeExerciseData,
    inputs: BTreeMap<u32, String>,
    revealed: bool,
}

#[cfg_attr(target_arch = "wasm32", wasm_bindgen)]
impl ClozeSession {
    #[cfg_attr(target_arch = "wasm32", wasm_bindgen(constructor))]
    pub fn new(data: ClozeExerciseData) -> Self {
        Self {
            data,
            inputs: BTreeMap::new(),
            revealed: false,
        }
    }

    pub fn data(&self) -> ClozeExerciseData {
        self.data.clone()
    }

    pub fn input(&mut self, item_id: u32, text: String) {
        if self.revealed {
            return;
        }
        self.inputs.insert(item_id, text);
    }

    pub fn submit(&mut self) -> usize {
        self.revealed = true;
        self.score()
    }

    pub fn revealed(&self) -> bool {
        self.revealed
    }

    pub fn is_correct(&self, item_id: u32) -> bool {
        let Some(item) = self.data.items().find(|item| item.id == item_id) else {
            return false;
        };
        self.inputs
            .get(&item_id)
            .is_some_and(|input| item.is_correct(input))
    }

    pub fn score(&self) -> usize {
        self.data
            .items()
            .filter(|item| self.is_correct(item.id))
            .count()
    }

    pub fn total(&self) -> usize {
        self.data.items().count()
    }

    /// The exercise with every item's answer and verdict filled in.
    pub fn graded(&self) -> ClozeExerciseData {
        let mut graded = self.data.clone();
        for segment in &mut graded.segments {
            if let ClozeSegment::Item(item) = segment {
                self.grade_item(item);
            }
        }
        graded
    }
}

impl ClozeSession {
    fn grade_item(&self, item: &mut ClozeItem) {
        item.user_answer = self.inputs.get(&item.id).cloned().unwrap_or_default();
        item.is_correct = self
            .revealed
            .then(|| item.is_correct(&item.user_answer));
    }
}

#[derive(Copy, Clone, Debug, Serialize, Deserialize, PartialEq, Eq, tsify::Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub enum MimicPhase {
    Ready,
    Recording,
    Evaluating,
    Scored,
}

#[cfg_attr(target_arch = "wasm32", wasm_bindgen)]
#[derive(Clone, Debug, PartialEq)]
pub struct MimicSession {
    passage: MimicPassage,
    phase: MimicPhase,
    feedback: Option<MimicFeedback>,
}

#[cfg_attr(target_arch = "wasm32", wasm_bindgen)]
impl MimicSession {
    #[cfg_attr(target_arch = "wasm32", wasm_bindgen(constructor))]
    pub fn new(passage: MimicPassage) -> Self {
        Self {
            passage,
            phase: MimicPhase::Ready,
            feedback: None,
        }
    }

    pub fn passage(&self) -> MimicPassage {
        self.passage.clone()
    }

    pub fn phase(&self) -> MimicPhase {
        self.phase
    }

    pub fn feedback(&self) -> Option<MimicFeedback> {
        self.feedback.clone()
    }

    /// Starting a new take discards the previous score.
    pub fn start_recording(&mut self) -> Result<(), SessionError> {
        match self.phase {
            MimicPhase::Ready | MimicPhase::Scored => {
                self.feedback = None;
                self.phase = MimicPhase::Recording;
                Ok(())
            }
            phase => Err(SessionError::InvalidPhase(phase)),
        }
    }

    pub fn stop_recording(&mut self) -> Result<(), SessionError> {
        if self.phase != MimicPhase::Recording {
            return Err(SessionError::InvalidPhase(self.phase));
        }
        self.phase = MimicPhase::Evaluating;
        Ok(())
    }

    /// The microphone could not be opened; nothing was recorded.
    pub fn abort_recording(&mut self) {
        if self.phase == MimicPhase::Recording {
            self.phase = MimicPhase::Ready;
        }
    }

    pub fn finish_evaluation(&mut self, feedback: MimicFeedback) -> Result<(), SessionError> {
        if self.phase != MimicPhase::Evaluating {
            return Err(SessionError::InvalidPhase(self.phase));
        }
        self.feedback = Some(feedback);
        self.phase = MimicPhase::Scored;
        Ok(())
    }

    pub fn fail_evaluation(&mut self) {
        if self.phase == MimicPhase::Evaluating {
            self.phase = MimicPhase::Ready;
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, tsify::Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub enum ImageState {
    NotRequested,
    Loading,
    Ready(String),
    /// The provider can't draw, or drawing failed. The user may try again.
    Unavailable,
}

#[cfg_attr(target_arch = "wasm32", wasm_bindgen)]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VocabularyCard {
    word: WordData,
    image: ImageState,
}

#[cfg_attr(target_arch = "wasm32", wasm_bindgen)]
impl VocabularyCard {
    #[cfg_attr(target_arch = "wasm32", wasm_bindgen(constructor))]
    pub fn new(word: WordData) -> Self {
        Self {
            word,
            image: ImageState::NotRequested,
        }
    }

    pub fn word(&self) -> WordData {
        self.word.clone()
    }

    pub fn image(&self) -> ImageState {
        self.image.clone()
    }

    pub fn can_request_image(&self) -> bool {
        matches!(
            self.image,
            ImageState::NotRequested | ImageState::Unavailable
        )
    }

    /// Returns `false` if an image is already loading or loaded.
    pub fn begin_image(&mut self) -> bool {
        if !self.can_request_image() {
            return false;
        }
        self.image = ImageState::Loading;
        true
    }

    pub fn finish_image(&mut self, url: Option<String>) {
        self.image = match url {
            Some(url) => ImageState::Ready(url),
            None => ImageState::Unavailable,
        };
    }

    pub fn confusing_target(&self) -> Option<ConfusingTarget> {
        let snippet = self.word.confusing_words_snippet.as_deref()?.trim();
        if snippet.is_empty() {
            return None;
        }
        Some(ConfusingTarget {
            word: self.word.word.clone(),
            snippet: snippet.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cloze::parse_cloze_content;
    use crate::{ClozeTestBlank, McqQuestion, RawClozeTest};

    fn question(answer: &str) -> McqQuestion {
        McqQuestion {
            question: "He ___ to school every day.".into(),
            options: vec!["go".into(), "goes".into(), "went".into(), "going".into()],
            answer: answer.into(),
            analysis: "第三人称单数".into(),
        }
    }

    fn mcq(n: usize) -> McqSession {
        McqSession::new(McqData {
            questions: (0..n).map(|_| question("goes")).collect(),
        })
    }

    #[test]
    fn mcq_cannot_submit_until_all_answered() {
        let mut session = mcq(3);
        assert!(!session.can_submit());
        session.select(0, "goes".into());
        session.select(1, "go".into());
        assert!(!session.can_submit());
        assert_eq!(
            session.submit(),
            Err(SessionError::Incomplete {
                answered: 2,
                total: 3
            })
        );
        assert!(!session.revealed());

        session.select(2, "goes".into());
        assert!(session.can_submit());
        assert_eq!(session.submit(), Ok(2));
        assert!(session.revealed());
        assert!(!session.can_submit());
        assert_eq!(session.verdict(), KEEP_GOING_VERDICT);
    }

    #[test]
    fn mcq_ignores_out_of_range_and_post_reveal_selections() {
        let mut session = mcq(1);
        session.select(5, "goes".into());
        assert!(!session.can_submit());
        session.select(0, "goes".into());
        session.submit().unwrap();
        session.select(0, "went".into());
        assert_eq!(session.answer(0).as_deref(), Some("goes"));
        assert!(session.is_perfect());
        assert_eq!(session.verdict(), PERFECT_VERDICT);
    }

    #[test]
    fn mcq_option_states() {
        let mut session = mcq(1);
        assert_eq!(session.option_state(0, "goes".into()), OptionState::Idle);
        session.select(0, "went".into());
        assert_eq!(session.option_state(0, "went".into()), OptionState::Selected);
        assert_eq!(session.option_state(0, "goes".into()), OptionState::Idle);
        session.submit().unwrap();
        assert_eq!(session.option_state(0, "went".into()), OptionState::Wrong);
        assert_eq!(session.option_state(0, "goes".into()), OptionState::Correct);
        assert_eq!(session.option_state(0, "go".into()), OptionState::Idle);
        assert_eq!(session.option_state(9, "go".into()), OptionState::Idle);
    }

    #[test]
    fn empty_quiz_is_trivially_submittable() {
        let mut session = mcq(0);
        assert!(session.can_submit());
        assert_eq!(session.submit(), Ok(0));
        assert!(session.is_perfect());
    }

    fn cloze_test() -> ClozeTestSession {
        let blank = |id, answer: &str| ClozeTestBlank {
            id,
            options: vec!["A".into(), "B".into(), "C".into(), "D".into()],
            answer: answer.into(),
            analysis: String::new(),
        };
        ClozeTestSession::new(ClozeTestData::from_raw(RawClozeTest {
            title: "t".into(),
            passage: "{{1}} and {{2}}".into(),
            blanks: vec![blank(1, "A"), blank(2, "C")],
        }))
    }

    #[test]
    fn cloze_test_can_be_submitted_with_gaps() {
        let mut session = cloze_test();
        session.select(1, "A".into());
        assert_eq!(session.submit(), 1);
        assert!(session.is_correct(1));
        assert!(!session.is_correct(2));
        assert_eq!(session.total(), 2);
    }

    #[test]
    fn cloze_test_ignores_unknown_blanks_and_frozen_answers() {
        let mut session = cloze_test();
        session.select(7, "A".into());
        assert_eq!(session.answer(7), None);
        session.select(2, "B".into());
        session.submit();
        session.select(2, "C".into());
        assert_eq!(session.answer(2).as_deref(), Some("B"));
        assert_eq!(session.option_state(2, "B".into()), OptionState::Wrong);
        assert_eq!(session.option_state(2, "C".into()), OptionState::Correct);
    }

    #[test]
    fn cloze_session_grades_inputs() {
        let data = parse_cloze_content("t".into(), "I [[like]] [[Music]] very [[much]].");
        let mut session = ClozeSession::new(data);
        session.input(1, " LIKE ".into());
        session.input(2, "music".into());
        session.input(3, "many".into());

        let before = session.graded();
        let first = before.items().next().unwrap();
        assert_eq!(first.user_answer, " LIKE ");
        assert_eq!(first.is_correct, None);

        assert_eq!(session.submit(), 2);
        session.input(3, "much".into());
        assert!(!session.is_correct(3));

        let graded = session.graded();
        let verdicts: Vec<_> = graded.items().map(|item| item.is_correct).collect();
        assert_eq!(verdicts, vec![Some(true), Some(true), Some(false)]);
        assert_eq!(session.total(), 3);
        assert!(!session.is_correct(42));
    }

    fn passage() -> MimicPassage {
        MimicPassage {
            title: "Spring Festival".into(),
            content_en: "The Spring Festival is the most important festival in China.".into(),
            content_cn: "春节是中国最重要的节日。".into(),
            keywords: vec!["festival".into()],
        }
    }

    fn feedback(score: f64) -> MimicFeedback {
        MimicFeedback {
            score,
            fluency: "流畅".into(),
            accuracy: "准确".into(),
            suggestions: "注意重音".into(),
        }
    }

    #[test]
    fn mimic_walks_through_its_phases() {
        let mut session = MimicSession::new(passage());
        assert_eq!(session.phase(), MimicPhase::Ready);
        assert_eq!(
            session.stop_recording(),
            Err(SessionError::InvalidPhase(MimicPhase::Ready))
        );

        session.start_recording().unwrap();
        session.stop_recording().unwrap();
        assert_eq!(session.phase(), MimicPhase::Evaluating);
        assert_eq!(
            session.start_recording(),
            Err(SessionError::InvalidPhase(MimicPhase::Evaluating))
        );

        session.finish_evaluation(feedback(88.0)).unwrap();
        assert_eq!(session.phase(), MimicPhase::Scored);
        assert_eq!(session.feedback().unwrap().score, 88.0);

        session.start_recording().unwrap();
        assert_eq!(session.feedback(), None);
    }

    #[test]
    fn failed_evaluation_returns_to_ready() {
        let mut session = MimicSession::new(passage());
        session.start_recording().unwrap();
        session.stop_recording().unwrap();
        session.fail_evaluation();
        assert_eq!(session.phase(), MimicPhase::Ready);
        assert_eq!(session.feedback(), None);
        assert!(session.finish_evaluation(feedback(1.0)).is_err());
    }

    #[test]
    fn aborted_recording_returns_to_ready() {
        let mut session = MimicSession::new(passage());
        session.start_recording().unwrap();
        session.abort_recording();
        assert_eq!(session.phase(), MimicPhase::Ready);
    }

    fn word(snippet: Option<&str>) -> WordData {
        WordData {
            word: "affect".into(),
            phonetic: "/əˈfekt/".into(),
            definition_cn: "影响".into(),
            definition_en: "to have an influence on".into(),
            example_sentence: "Noise affects sleep.".into(),
            example_translation: "噪音影响睡眠。".into(),
            mnemonics: String::new(),
            collocations: vec![],
            confusing_words_snippet: snippet.map(str::to_string),
        }
    }

    #[test]
    fn vocabulary_image_lifecycle() {
        let mut card = VocabularyCard::new(word(None));
        assert!(card.can_request_image());
        assert!(card.begin_image());
        assert!(!card.begin_image());
        card.finish_image(None);
        assert_eq!(card.image(), ImageState::Unavailable);
        assert!(card.begin_image());
        card.finish_image(Some("data:image/png;base64,AAAA".into()));
        assert_eq!(
            card.image(),
            ImageState::Ready("data:image/png;base64,AAAA".into())
        );
        assert!(!card.can_request_image());
    }

    #[test]
    fn confusing_target_needs_a_snippet() {
        assert_eq!(VocabularyCard::new(word(None)).confusing_target(), None);
        assert_eq!(VocabularyCard::new(word(Some("  "))).confusing_target(), None);
        let target = VocabularyCard::new(word(Some("affect vs. effect")))
            .confusing_target()
            .unwrap();
        assert_eq!(target.word, "affect");
        assert_eq!(target.snippet, "affect vs. effect");
    }
}
