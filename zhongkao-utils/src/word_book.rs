use serde::{Deserialize, Serialize};

use crate::WordData;

/// The user's saved words, in the order they were added. Stored as a bare
/// JSON array.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq, tsify::Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
#[serde(transparent)]
pub struct WordBook(Vec<WordData>);

impl WordBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, word: &str) -> bool {
        let word = word.to_lowercase();
        self.0.iter().any(|saved| saved.word.to_lowercase() == word)
    }

    /// Append unless a word with the same spelling (ignoring case) is
    /// already saved. Returns whether it was added.
    pub fn add(&mut self, entry: WordData) -> bool {
        if self.contains(&entry.word) {
            return false;
        }
        self.0.push(entry);
        true
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, WordData> {
        self.0.iter()
    }

    pub fn into_words(self) -> Vec<WordData> {
        self.0
    }
}

impl From<Vec<WordData>> for WordBook {
    fn from(words: Vec<WordData>) -> Self {
        Self(words)
    }
}

impl<'a> IntoIterator for &'a WordBook {
    type Item = &'a WordData;
    type IntoIter = std::slice::Iter<'a, WordData>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(word: &str) -> WordData {
        WordData {
            word: word.to_string(),
            phonetic: String::new(),
            definition_cn: String::new(),
            definition_en: String::new(),
            example_sentence: String::new(),
            example_translation: String::new(),
            mnemonics: String::new(),
            collocations: vec![],
            confusing_words_snippet: None,
        }
    }

    #[test]
    fn duplicates_are_ignored_regardless_of_case() {
        let mut book = WordBook::new();
        assert!(book.add(entry("Apple")));
        assert!(!book.add(entry("apple")));
        assert!(!book.add(entry("APPLE")));
        assert!(book.add(entry("banana")));
        assert_eq!(book.len(), 2);
        assert_eq!(book.iter().next().unwrap().word, "Apple");
    }

    #[test]
    fn order_is_insertion_order() {
        let mut book = WordBook::new();
        for word in ["cat", "ant", "bee"] {
            book.add(entry(word));
        }
        let words: Vec<_> = book.iter().map(|w| w.word.as_str()).collect();
        assert_eq!(words, vec!["cat", "ant", "bee"]);
    }

    #[test]
    fn serializes_as_a_plain_array() {
        let mut book = WordBook::new();
        book.add(entry("cat"));
        let value = serde_json::to_value(&book).unwrap();
        assert!(value.is_array());
        assert_eq!(value[0]["word"], "cat");

        let parsed: WordBook = serde_json::from_value(value).unwrap();
        assert_eq!(parsed, book);
    }

    #[test]
    fn clear_empties_the_book() {
        let mut book = WordBook::from(vec![entry("a"), entry("b")]);
        book.clear();
        assert!(book.is_empty());
    }
}
