//! Word lookup: a cached cascade over independent dictionary providers.

mod cache;
mod clean;
mod providers;
mod resolver;

pub use cache::{CacheKey, MemoryCache, TranslationCache};
pub use clean::clean_gloss;
pub use providers::{
    DictionaryProvider, FreeDictionaryProvider, LibreTranslateProvider, RawGloss,
    WiktionaryProvider, default_providers, http_client,
};
pub use resolver::TranslationResolver;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Translation {
    pub word: String,
    pub translation: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub part_of_speech: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phonetic: Option<String>,
}

/// Every provider exhausted is a definitive miss, not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupOutcome {
    Found(Translation),
    NotFound,
}

impl LookupOutcome {
    pub fn translation(&self) -> Option<&Translation> {
        match self {
            LookupOutcome::Found(translation) => Some(translation),
            LookupOutcome::NotFound => None,
        }
    }
}
