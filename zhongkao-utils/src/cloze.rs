//! Turning marker-tagged passages into renderable segments.
//!
//! Cloze tests number their blanks with `{{n}}`; first-letter exercises wrap
//! the hidden word in `[[word]]`. Both are split into alternating literal and
//! blank segments so the shell can render inputs in place.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;

use crate::{
    ClozeExerciseData, ClozeItem, ClozeSegment, ClozeTestBlank, ClozeTestData, ClozeTestSegment,
    RawClozeExercise, RawClozeTest,
};

static BLANK_MARKER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\{\{(\d+)\}\}").unwrap());
static WORD_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[\[([a-zA-Z]+)\]\]").unwrap());
static BRACKETS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\[\[|\]\]").unwrap());

pub fn parse_cloze_test_passage(passage: &str) -> Vec<ClozeTestSegment> {
    let mut segments = Vec::new();
    let mut last_end = 0;

    for captures in BLANK_MARKER.captures_iter(passage) {
        let (Some(whole), Some(number)) = (captures.get(0), captures.get(1)) else {
            continue;
        };
        // A number too large for u32 can't refer to a real blank; leave it as text.
        let Ok(blank_id) = number.as_str().parse::<u32>() else {
            continue;
        };
        if whole.start() > last_end {
            segments.push(ClozeTestSegment::Text(
                passage[last_end..whole.start()].to_string(),
            ));
        }
        segments.push(ClozeTestSegment::Blank { blank_id });
        last_end = whole.end();
    }

    if last_end < passage.len() {
        segments.push(ClozeTestSegment::Text(passage[last_end..].to_string()));
    }
    segments
}

impl ClozeTestData {
    pub fn from_raw(raw: RawClozeTest) -> Self {
        let segments = parse_cloze_test_passage(&raw.passage);
        let blanks: BTreeMap<u32, ClozeTestBlank> = raw
            .blanks
            .into_iter()
            .map(|blank| (blank.id, blank))
            .collect();
        Self {
            title: raw.title,
            segments,
            blanks,
        }
    }

    /// Blank ids referenced in the passage that have no options. The shell
    /// can't render these as choices.
    pub fn dangling_blanks(&self) -> Vec<u32> {
        self.segments
            .iter()
            .filter_map(|segment| match segment {
                ClozeTestSegment::Blank { blank_id } if !self.blanks.contains_key(blank_id) => {
                    Some(*blank_id)
                }
                _ => None,
            })
            .collect()
    }
}

pub fn parse_cloze_content(title: String, tagged_content: &str) -> ClozeExerciseData {
    let mut segments = Vec::new();
    let mut last_end = 0;
    let mut next_id = 1;

    for captures in WORD_MARKER.captures_iter(tagged_content) {
        let (Some(whole), Some(word)) = (captures.get(0), captures.get(1)) else {
            continue;
        };
        if whole.start() > last_end {
            segments.push(ClozeSegment::Text(
                tagged_content[last_end..whole.start()].to_string(),
            ));
        }
        segments.push(ClozeSegment::Item(ClozeItem::new(next_id, word.as_str())));
        next_id += 1;
        last_end = whole.end();
    }

    if last_end < tagged_content.len() {
        segments.push(ClozeSegment::Text(tagged_content[last_end..].to_string()));
    }

    ClozeExerciseData {
        title,
        content: BRACKETS.replace_all(tagged_content, "").into_owned(),
        segments,
    }
}

impl ClozeExerciseData {
    pub fn from_raw(raw: RawClozeExercise) -> Self {
        parse_cloze_content(raw.title, &raw.tagged_content)
    }

    pub fn items(&self) -> impl Iterator<Item = &ClozeItem> {
        self.segments.iter().filter_map(|segment| match segment {
            ClozeSegment::Item(item) => Some(item),
            ClozeSegment::Text(_) => None,
        })
    }
}

impl ClozeItem {
    /// `word` is ASCII letters only, which the marker pattern guarantees.
    pub fn new(id: u32, word: &str) -> Self {
        let (prefix, suffix) = word.split_at(1.min(word.len()));
        Self {
            id,
            word: word.to_string(),
            display: format!("{prefix}{}", "_".repeat(suffix.len())),
            prefix: prefix.to_string(),
            suffix: suffix.to_string(),
            context_before: String::new(),
            context_after: String::new(),
            user_answer: String::new(),
            is_correct: None,
        }
    }

    pub fn is_correct(&self, input: &str) -> bool {
        input.trim().to_lowercase() == self.word.to_lowercase()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blank(id: u32, answer: &str) -> ClozeTestBlank {
        ClozeTestBlank {
            id,
            options: vec!["A".into(), "B".into(), "C".into(), "D".into()],
            answer: answer.to_string(),
            analysis: String::new(),
        }
    }

    #[test]
    fn splits_numbered_blanks() {
        let segments = parse_cloze_test_passage("Tom {{1}} to school {{2}} day.");
        assert_eq!(
            segments,
            vec![
                ClozeTestSegment::Text("Tom ".into()),
                ClozeTestSegment::Blank { blank_id: 1 },
                ClozeTestSegment::Text(" to school ".into()),
                ClozeTestSegment::Blank { blank_id: 2 },
                ClozeTestSegment::Text(" day.".into()),
            ]
        );
    }

    #[test]
    fn adjacent_and_edge_markers_produce_no_empty_literals() {
        let segments = parse_cloze_test_passage("{{1}}{{2}} end");
        assert_eq!(
            segments,
            vec![
                ClozeTestSegment::Blank { blank_id: 1 },
                ClozeTestSegment::Blank { blank_id: 2 },
                ClozeTestSegment::Text(" end".into()),
            ]
        );
        assert_eq!(
            parse_cloze_test_passage("start {{3}}"),
            vec![
                ClozeTestSegment::Text("start ".into()),
                ClozeTestSegment::Blank { blank_id: 3 },
            ]
        );
    }

    #[test]
    fn passage_without_markers_is_one_literal() {
        assert_eq!(
            parse_cloze_test_passage("No blanks here."),
            vec![ClozeTestSegment::Text("No blanks here.".into())]
        );
        assert!(parse_cloze_test_passage("").is_empty());
    }

    #[test]
    fn malformed_markers_stay_literal() {
        assert_eq!(
            parse_cloze_test_passage("a {{x}} b {1}"),
            vec![ClozeTestSegment::Text("a {{x}} b {1}".into())]
        );
    }

    #[test]
    fn blanks_are_keyed_by_id_and_later_duplicates_win() {
        let raw = RawClozeTest {
            title: "A Day".into(),
            passage: "I {{1}} and {{2}} and {{3}}.".into(),
            blanks: vec![blank(2, "B"), blank(1, "A"), blank(2, "C")],
        };
        let data = ClozeTestData::from_raw(raw);
        assert_eq!(data.blanks.len(), 2);
        assert_eq!(data.blanks[&1].answer, "A");
        assert_eq!(data.blanks[&2].answer, "C");
        assert_eq!(data.blanks.keys().copied().collect::<Vec<_>>(), vec![1, 2]);
        assert_eq!(data.dangling_blanks(), vec![3]);
    }

    #[test]
    fn tagged_words_become_items() {
        let data = parse_cloze_content(
            "Spring".into(),
            "It is [[warm]] in [[spring]]. We [[Love]] it",
        );
        assert_eq!(data.content, "It is warm in spring. We Love it");

        let items: Vec<_> = data.items().collect();
        assert_eq!(items.len(), 3);
        assert_eq!(items[0].id, 1);
        assert_eq!(items[0].display, "w___");
        assert_eq!(items[0].prefix, "w");
        assert_eq!(items[0].suffix, "arm");
        assert_eq!(items[1].id, 2);
        assert_eq!(items[1].display, "s_____");
        assert_eq!(items[2].prefix, "L");
        assert_eq!(items[2].user_answer, "");
        assert_eq!(items[2].is_correct, None);

        assert_eq!(data.segments[0], ClozeSegment::Text("It is ".into()));
        assert_eq!(data.segments.last(), Some(&ClozeSegment::Text(" it".into())));
    }

    #[test]
    fn non_letter_markers_are_not_blanks_but_lose_brackets_in_content() {
        let data = parse_cloze_content("T".into(), "an [[ice-cream]] and [[cake]]");
        assert_eq!(data.items().count(), 1);
        assert_eq!(
            data.segments[0],
            ClozeSegment::Text("an [[ice-cream]] and ".into())
        );
        assert_eq!(data.content, "an ice-cream and cake");
    }

    #[test]
    fn single_letter_word_has_no_underscores() {
        let item = ClozeItem::new(1, "a");
        assert_eq!(item.display, "a");
        assert_eq!(item.suffix, "");
    }

    #[test]
    fn answers_are_checked_case_insensitively_after_trimming() {
        let item = ClozeItem::new(1, "Library");
        assert!(item.is_correct("library"));
        assert!(item.is_correct("  LIBRARY "));
        assert!(!item.is_correct("librar"));
        assert!(!item.is_correct(""));
    }
}
