//! Persisted settings and word book.
//!
//! Everything lives under two keys as JSON: the settings blob and the word
//! book array. In the browser that is `localStorage`; natively and in tests
//! it is an in-memory map.

use std::cell::RefCell;
use std::collections::BTreeMap;

use zhongkao_utils::settings::SettingsError;
use zhongkao_utils::{AiSettings, WordBook, WordData};

pub const SETTINGS_KEY: &str = "ai_settings";
pub const WORD_BOOK_KEY: &str = "new_words";

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("localStorage is not available")]
    Unavailable,
    #[error("storage error: {0}")]
    Backend(String),
    #[error(transparent)]
    Serialize(#[from] serde_json::Error),
    #[error(transparent)]
    Invalid(#[from] SettingsError),
}

pub trait KeyValueStore {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove_item(&self, key: &str) -> Result<(), StorageError>;
}

#[derive(Default, Debug)]
pub struct MemoryStore {
    items: RefCell<BTreeMap<String, String>>,
}

impl KeyValueStore for MemoryStore {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.items.borrow().get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.items
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        self.items.borrow_mut().remove(key);
        Ok(())
    }
}

#[cfg(target_arch = "wasm32")]
pub struct LocalStorage {
    storage: web_sys::Storage,
}

#[cfg(target_arch = "wasm32")]
impl LocalStorage {
    pub fn open() -> Result<Self, StorageError> {
        let storage = web_sys::window()
            .ok_or(StorageError::Unavailable)?
            .local_storage()
            .map_err(|e| StorageError::Backend(format!("{e:?}")))?
            .ok_or(StorageError::Unavailable)?;
        Ok(Self { storage })
    }
}

#[cfg(target_arch = "wasm32")]
impl KeyValueStore for LocalStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.storage
            .get_item(key)
            .map_err(|e| StorageError::Backend(format!("{e:?}")))
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.storage
            .set_item(key, value)
            .map_err(|e| StorageError::Backend(format!("{e:?}")))
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        self.storage
            .remove_item(key)
            .map_err(|e| StorageError::Backend(format!("{e:?}")))
    }
}

pub fn load_settings(store: &dyn KeyValueStore) -> AiSettings {
    let saved = match store.get_item(SETTINGS_KEY) {
        Ok(Some(saved)) => saved,
        Ok(None) => return AiSettings::default(),
        Err(e) => {
            log::warn!("could not read settings: {e}");
            return AiSettings::default();
        }
    };
    serde_json::from_str(&saved).unwrap_or_else(|e| {
        log::warn!("ignoring malformed settings: {e}");
        AiSettings::default()
    })
}

/// Nothing is written unless the settings pass validation.
pub fn save_settings(store: &dyn KeyValueStore, settings: &AiSettings) -> Result<(), StorageError> {
    settings.validate_for_save()?;
    store.set_item(SETTINGS_KEY, &serde_json::to_string(settings)?)
}

pub fn load_word_book(store: &dyn KeyValueStore) -> WordBook {
    let saved = match store.get_item(WORD_BOOK_KEY) {
        Ok(Some(saved)) => saved,
        Ok(None) => return WordBook::new(),
        Err(e) => {
            log::warn!("could not read word book: {e}");
            return WordBook::new();
        }
    };
    serde_json::from_str(&saved).unwrap_or_else(|e| {
        log::warn!("ignoring malformed word book: {e}");
        WordBook::new()
    })
}

/// Returns whether the word was new.
pub fn add_to_word_book(store: &dyn KeyValueStore, word: WordData) -> Result<bool, StorageError> {
    let mut book = load_word_book(store);
    if !book.add(word) {
        return Ok(false);
    }
    store.set_item(WORD_BOOK_KEY, &serde_json::to_string(&book)?)?;
    Ok(true)
}

pub fn clear_word_book(store: &dyn KeyValueStore) -> Result<(), StorageError> {
    store.remove_item(WORD_BOOK_KEY)
}

#[cfg(test)]
mod tests {
    use super::*;
    use zhongkao_utils::AiProvider;

    fn word(word: &str) -> WordData {
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
    fn missing_settings_are_the_defaults() {
        let store = MemoryStore::default();
        assert_eq!(load_settings(&store), AiSettings::default());
    }

    #[test]
    fn malformed_settings_fall_back_to_defaults() {
        let store = MemoryStore::default();
        store.set_item(SETTINGS_KEY, "{not json").unwrap();
        assert_eq!(load_settings(&store), AiSettings::default());
    }

    #[test]
    fn settings_round_trip_through_the_store() {
        let store = MemoryStore::default();
        let mut settings = AiSettings::default();
        settings.apply_preset("DeepSeek (中国)");
        settings.api_key = "sk-test".to_string();
        save_settings(&store, &settings).unwrap();

        let raw = store.get_item(SETTINGS_KEY).unwrap().unwrap();
        assert!(raw.contains("\"provider\":\"openai-compatible\""));
        assert!(raw.contains("\"apiKey\":\"sk-test\""));

        let loaded = load_settings(&store);
        assert_eq!(loaded.provider, AiProvider::OpenAiCompatible);
        assert_eq!(loaded, settings);
    }

    #[test]
    fn settings_without_key_are_not_saved() {
        let store = MemoryStore::default();
        let result = save_settings(&store, &AiSettings::default());
        assert!(matches!(
            result,
            Err(StorageError::Invalid(SettingsError::MissingApiKey))
        ));
        assert_eq!(store.get_item(SETTINGS_KEY).unwrap(), None);
    }

    #[test]
    fn word_book_dedups_and_persists() {
        let store = MemoryStore::default();
        assert!(load_word_book(&store).is_empty());
        assert!(add_to_word_book(&store, word("Apple")).unwrap());
        assert!(!add_to_word_book(&store, word("apple")).unwrap());
        assert!(add_to_word_book(&store, word("pear")).unwrap());

        let book = load_word_book(&store);
        let words: Vec<_> = book.iter().map(|w| w.word.as_str()).collect();
        assert_eq!(words, vec!["Apple", "pear"]);

        clear_word_book(&store).unwrap();
        assert!(load_word_book(&store).is_empty());
        assert_eq!(store.get_item(WORD_BOOK_KEY).unwrap(), None);
    }

    #[test]
    fn malformed_word_book_reads_as_empty() {
        let store = MemoryStore::default();
        store.set_item(WORD_BOOK_KEY, "{\"oops\": true}").unwrap();
        assert!(load_word_book(&store).is_empty());
        assert!(add_to_word_book(&store, word("kite")).unwrap());
        assert_eq!(load_word_book(&store).len(), 1);
    }
}
