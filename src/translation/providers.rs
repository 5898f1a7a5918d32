//! HTTP dictionary providers.
//!
//! Each provider owns its payload format. Fetching and parsing are split so
//! the parsers can be exercised on captured bodies without a network.

use crate::config::AppConfig;
use crate::error::ProviderError;
use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Uncleaned provider answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawGloss {
    pub text: String,
    pub part_of_speech: Option<String>,
    pub phonetic: Option<String>,
}

impl RawGloss {
    fn text_only(text: String) -> Self {
        Self {
            text,
            part_of_speech: None,
            phonetic: None,
        }
    }
}

#[async_trait(?Send)]
pub trait DictionaryProvider {
    fn name(&self) -> &'static str;

    /// `Ok(None)` when the provider answered but had nothing for `word`.
    async fn lookup(
        &self,
        word: &str,
        target_language: &str,
    ) -> Result<Option<RawGloss>, ProviderError>;
}

pub fn http_client(timeout: Duration) -> Result<Client, ProviderError> {
    Ok(Client::builder().timeout(timeout).build()?)
}

/// Wiktionary, then Free Dictionary, then LibreTranslate.
pub fn default_providers(
    config: &AppConfig,
) -> Result<Vec<Box<dyn DictionaryProvider>>, ProviderError> {
    let client = http_client(Duration::from_secs(config.request_timeout_secs))?;
    Ok(vec![
        Box::new(WiktionaryProvider::new(
            client.clone(),
            config.wiktionary_url.clone(),
        )),
        Box::new(FreeDictionaryProvider::new(
            client.clone(),
            config.free_dictionary_url.clone(),
        )),
        Box::new(LibreTranslateProvider::new(
            client,
            config.libretranslate_url.clone(),
        )),
    ])
}

fn word_url(base: &str, word: &str) -> Result<Url, ProviderError> {
    let mut url =
        Url::parse(base).map_err(|err| ProviderError::Malformed(format!("{base}: {err}")))?;
    url.path_segments_mut()
        .map_err(|_| ProviderError::Malformed(format!("{base} cannot take a path")))?
        .pop_if_empty()
        .push(word);
    Ok(url)
}

async fn fetch_text(request: reqwest::RequestBuilder) -> Result<String, ProviderError> {
    let response = request.send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(ProviderError::Status(status.as_u16()));
    }
    Ok(response.text().await?)
}

fn decode<'a, T: Deserialize<'a>>(body: &'a str) -> Result<T, ProviderError> {
    serde_json::from_str(body).map_err(|err| ProviderError::Malformed(err.to_string()))
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

// Wiktionary REST: GET {base}/{word}

#[derive(Debug, Clone)]
pub struct WiktionaryProvider {
    client: Client,
    base_url: String,
}

impl WiktionaryProvider {
    pub fn new(client: Client, base_url: String) -> Self {
        Self { client, base_url }
    }
}

#[derive(Debug, Deserialize)]
struct WiktionaryPayload {
    #[serde(default)]
    en: Vec<WiktionaryUsage>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WiktionaryUsage {
    part_of_speech: Option<String>,
    #[serde(default)]
    definitions: Vec<DefinitionEntry>,
}

#[derive(Debug, Deserialize)]
struct DefinitionEntry {
    definition: Option<String>,
}

pub(crate) fn parse_wiktionary(body: &str) -> Result<Option<RawGloss>, ProviderError> {
    let payload: WiktionaryPayload = decode(body)?;
    let Some(usage) = payload.en.into_iter().next() else {
        return Ok(None);
    };
    let Some(text) = non_blank(usage.definitions.into_iter().next().and_then(|d| d.definition))
    else {
        return Ok(None);
    };
    Ok(Some(RawGloss {
        text,
        part_of_speech: non_blank(usage.part_of_speech),
        phonetic: None,
    }))
}

#[async_trait(?Send)]
impl DictionaryProvider for WiktionaryProvider {
    fn name(&self) -> &'static str {
        "wiktionary"
    }

    async fn lookup(
        &self,
        word: &str,
        _target_language: &str,
    ) -> Result<Option<RawGloss>, ProviderError> {
        let url = word_url(&self.base_url, word)?;
        debug!(provider = self.name(), %url, "Dictionary request");
        let body = fetch_text(self.client.get(url)).await?;
        parse_wiktionary(&body)
    }
}

// Free Dictionary API: GET {base}/{word}

#[derive(Debug, Clone)]
pub struct FreeDictionaryProvider {
    client: Client,
    base_url: String,
}

impl FreeDictionaryProvider {
    pub fn new(client: Client, base_url: String) -> Self {
        Self { client, base_url }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FreeDictionaryEntry {
    phonetic: Option<String>,
    #[serde(default)]
    phonetics: Vec<Phonetic>,
    #[serde(default)]
    meanings: Vec<FreeDictionaryMeaning>,
}

#[derive(Debug, Deserialize)]
struct Phonetic {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FreeDictionaryMeaning {
    part_of_speech: Option<String>,
    #[serde(default)]
    definitions: Vec<DefinitionEntry>,
}

pub(crate) fn parse_free_dictionary(body: &str) -> Result<Option<RawGloss>, ProviderError> {
    let entries: Vec<FreeDictionaryEntry> = decode(body)?;
    let Some(entry) = entries.into_iter().next() else {
        return Ok(None);
    };
    let phonetic = non_blank(entry.phonetic).or_else(|| {
        entry
            .phonetics
            .into_iter()
            .find_map(|p| non_blank(p.text))
    });
    let Some(meaning) = entry.meanings.into_iter().next() else {
        return Ok(None);
    };
    let Some(text) = non_blank(
        meaning
            .definitions
            .into_iter()
            .next()
            .and_then(|d| d.definition),
    ) else {
        return Ok(None);
    };
    Ok(Some(RawGloss {
        text,
        part_of_speech: non_blank(meaning.part_of_speech),
        phonetic,
    }))
}

#[async_trait(?Send)]
impl DictionaryProvider for FreeDictionaryProvider {
    fn name(&self) -> &'static str {
        "free-dictionary"
    }

    async fn lookup(
        &self,
        word: &str,
        _target_language: &str,
    ) -> Result<Option<RawGloss>, ProviderError> {
        let url = word_url(&self.base_url, word)?;
        debug!(provider = self.name(), %url, "Dictionary request");
        let body = fetch_text(self.client.get(url)).await?;
        parse_free_dictionary(&body)
    }
}

// LibreTranslate: POST {url} with a JSON body

#[derive(Debug, Clone)]
pub struct LibreTranslateProvider {
    client: Client,
    url: String,
}

impl LibreTranslateProvider {
    pub fn new(client: Client, url: String) -> Self {
        Self { client, url }
    }
}

#[derive(Debug, Serialize)]
struct LibreTranslateRequest<'a> {
    q: &'a str,
    source: &'a str,
    target: &'a str,
    format: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LibreTranslateResponse {
    translated_text: Option<String>,
}

pub(crate) fn parse_libretranslate(body: &str) -> Result<Option<RawGloss>, ProviderError> {
    let response: LibreTranslateResponse = decode(body)?;
    Ok(non_blank(response.translated_text).map(RawGloss::text_only))
}

#[async_trait(?Send)]
impl DictionaryProvider for LibreTranslateProvider {
    fn name(&self) -> &'static str {
        "libretranslate"
    }

    async fn lookup(
        &self,
        word: &str,
        target_language: &str,
    ) -> Result<Option<RawGloss>, ProviderError> {
        let request = LibreTranslateRequest {
            q: word,
            source: "auto",
            target: target_language,
            format: "text",
        };
        debug!(provider = self.name(), url = %self.url, target_language, "Translation request");
        let body = fetch_text(self.client.post(&self.url).json(&request)).await?;
        parse_libretranslate(&body)
    }
}
