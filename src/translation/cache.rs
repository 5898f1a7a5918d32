use super::Translation;
use std::cell::RefCell;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub word: String,
    pub language: String,
}

impl CacheKey {
    pub fn new(word: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            word: word.into(),
            language: language.into(),
        }
    }
}

/// Injected into the resolver so callers decide the cache's lifetime.
pub trait TranslationCache {
    fn get(&self, key: &CacheKey) -> Option<Translation>;
    fn insert(&self, key: CacheKey, translation: Translation);
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Unbounded process-local cache. Misses are never stored.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: RefCell<HashMap<CacheKey, Translation>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TranslationCache for MemoryCache {
    fn get(&self, key: &CacheKey) -> Option<Translation> {
        self.entries.borrow().get(key).cloned()
    }

    fn insert(&self, key: CacheKey, translation: Translation) {
        self.entries.borrow_mut().insert(key, translation);
    }

    fn len(&self) -> usize {
        self.entries.borrow().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn language_is_part_of_the_key() {
        let cache = MemoryCache::new();
        cache.insert(
            CacheKey::new("chat", "en"),
            Translation {
                word: "chat".into(),
                translation: "cat".into(),
                part_of_speech: None,
                phonetic: None,
            },
        );

        assert!(cache.get(&CacheKey::new("chat", "en")).is_some());
        assert!(cache.get(&CacheKey::new("chat", "de")).is_none());
        assert_eq!(cache.len(), 1);
    }
}
