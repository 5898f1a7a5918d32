use super::cache::{CacheKey, TranslationCache};
use super::clean::clean_gloss;
use super::providers::{DictionaryProvider, default_providers};
use super::{LookupOutcome, Translation};
use crate::config::AppConfig;
use crate::error::ProviderError;
use std::rc::Rc;
use tracing::{debug, info, warn};

/// Tries each provider in order until one returns usable content.
pub struct TranslationResolver {
    providers: Vec<Box<dyn DictionaryProvider>>,
    cache: Rc<dyn TranslationCache>,
    target_language: String,
    max_gloss_chars: usize,
}

impl TranslationResolver {
    pub fn new(
        providers: Vec<Box<dyn DictionaryProvider>>,
        cache: Rc<dyn TranslationCache>,
        target_language: impl Into<String>,
        max_gloss_chars: usize,
    ) -> Self {
        Self {
            providers,
            cache,
            target_language: target_language.into(),
            max_gloss_chars,
        }
    }

    pub fn from_config(
        config: &AppConfig,
        cache: Rc<dyn TranslationCache>,
    ) -> Result<Self, ProviderError> {
        Ok(Self::new(
            default_providers(config)?,
            cache,
            config.target_language.clone(),
            config.max_gloss_chars,
        ))
    }

    pub fn target_language(&self) -> &str {
        &self.target_language
    }

    pub async fn translate(&self, word: &str) -> LookupOutcome {
        let language = self.target_language.clone();
        self.translate_to(word, &language).await
    }

    pub async fn translate_to(&self, word: &str, language: &str) -> LookupOutcome {
        let key = CacheKey::new(word, language);
        if let Some(hit) = self.cache.get(&key) {
            debug!(word, language, "Translation cache hit");
            return LookupOutcome::Found(hit);
        }

        for provider in &self.providers {
            match provider.lookup(word, language).await {
                Ok(Some(raw)) => {
                    let text = clean_gloss(&raw.text, self.max_gloss_chars);
                    if text.is_empty() {
                        debug!(provider = provider.name(), word, "Provider gloss empty after cleanup");
                        continue;
                    }
                    let translation = Translation {
                        word: word.to_string(),
                        translation: text,
                        part_of_speech: raw.part_of_speech,
                        phonetic: raw.phonetic,
                    };
                    info!(provider = provider.name(), word, language, "Translation resolved");
                    self.cache.insert(key, translation.clone());
                    return LookupOutcome::Found(translation);
                }
                Ok(None) => {
                    debug!(provider = provider.name(), word, "Provider has no entry");
                }
                Err(err) => {
                    warn!(provider = provider.name(), word, "Provider lookup failed: {err}");
                }
            }
        }

        info!(word, language, "No translation found");
        LookupOutcome::NotFound
    }
}
