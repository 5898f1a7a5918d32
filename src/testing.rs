//! Deterministic collaborators for unit tests.

use crate::engine::{
    DisplayTarget, DocumentMetadata, EngineCommand, EngineEvent, EventStream, LocationPoint,
    Locator, NavPoint, Point, Rect, Relocation, Rendition, RenditionFactory, SelectionContents,
    SpineItem,
};
use crate::error::{EngineError, ProviderError, StoreError};
use crate::store::{
    Book, BookId, BookStore, BookUpdate, NewBook, NewVocabularyWord, VocabularyWord, WordId,
};
use crate::translation::{
    CacheKey, DictionaryProvider, MemoryCache, RawGloss, Translation, TranslationCache,
};
use async_trait::async_trait;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;
use std::time::Duration;
use tokio::sync::mpsc;

/// In-memory engine. Section `s` is `chapterS.xhtml`; every location inside
/// it is `chapterS.xhtml#locN` with `N` the document-wide ordinal.
#[derive(Debug)]
pub struct FakeRendition {
    sections: Vec<String>,
    locators: Vec<(Locator, usize)>,
    built: Cell<bool>,
    fail_locations: Cell<bool>,
    fail_display: Cell<bool>,
    build_delay: Cell<Option<Duration>>,
    generate_calls: Cell<usize>,
    displayed: RefCell<Vec<DisplayTarget>>,
    commands: RefCell<Vec<EngineCommand>>,
    position: Cell<Option<usize>>,
    sender: RefCell<Option<mpsc::UnboundedSender<EngineEvent>>>,
    destroyed: Cell<bool>,
}

impl FakeRendition {
    pub fn new(locations_per_section: &[usize]) -> Self {
        let sections: Vec<String> = (0..locations_per_section.len())
            .map(|s| format!("chapter{s}.xhtml"))
            .collect();
        let mut locators = Vec::new();
        for (section, count) in locations_per_section.iter().enumerate() {
            for _ in 0..*count {
                let ordinal = locators.len();
                locators.push((
                    Locator::new(format!("{}#loc{ordinal}", sections[section])),
                    section,
                ));
            }
        }
        Self {
            sections,
            locators,
            built: Cell::new(false),
            fail_locations: Cell::new(false),
            fail_display: Cell::new(false),
            build_delay: Cell::new(None),
            generate_calls: Cell::new(0),
            displayed: RefCell::new(Vec::new()),
            commands: RefCell::new(Vec::new()),
            position: Cell::new(None),
            sender: RefCell::new(None),
            destroyed: Cell::new(false),
        }
    }

    pub fn build_locations(&self) {
        self.built.set(true);
    }

    pub fn fail_locations(&self) {
        self.fail_locations.set(true);
    }

    /// Every `Display` command fails from now on.
    pub fn fail_display(&self) {
        self.fail_display.set(true);
    }

    pub fn with_build_delay(self, delay: Duration) -> Self {
        self.build_delay.set(Some(delay));
        self
    }

    /// Locator of `ordinal` regardless of whether the index is built.
    pub fn locator(&self, ordinal: usize) -> Locator {
        self.locators[ordinal].0.clone()
    }

    pub fn relocation_at(&self, ordinal: usize) -> Relocation {
        let (locator, section) = self.locators[ordinal].clone();
        let len = self.locators.len();
        Relocation {
            start: LocationPoint {
                locator: Some(locator),
                href: Some(self.sections[section].clone()),
                percentage: Some(ordinal as f64 / len as f64),
            },
            at_start: ordinal == 0,
            at_end: ordinal + 1 == len,
        }
    }

    pub fn generate_calls(&self) -> usize {
        self.generate_calls.get()
    }

    pub fn displayed(&self) -> Vec<DisplayTarget> {
        self.displayed.borrow().clone()
    }

    pub fn commands(&self) -> Vec<EngineCommand> {
        self.commands.borrow().clone()
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed.get()
    }

    pub fn emit(&self, event: EngineEvent) {
        if let Some(sender) = self.sender.borrow().as_ref() {
            let _ = sender.send(event);
        }
    }

    fn move_to(&self, ordinal: usize) {
        self.position.set(Some(ordinal));
        self.emit(EngineEvent::Relocated(self.relocation_at(ordinal)));
    }

    fn ordinal_of(&self, target: &DisplayTarget) -> Option<usize> {
        match target {
            DisplayTarget::Start => Some(0),
            DisplayTarget::Locator(locator) => {
                self.locators.iter().position(|(l, _)| l == locator)
            }
            DisplayTarget::Section(href) => {
                let section = self.sections.iter().position(|s| s == href)?;
                self.locators.iter().position(|(_, s)| *s == section)
            }
        }
    }
}

#[async_trait(?Send)]
impl Rendition for FakeRendition {
    fn subscribe(&self) -> EventStream {
        let (tx, rx) = mpsc::unbounded_channel();
        *self.sender.borrow_mut() = Some(tx);
        rx
    }

    async fn issue(&self, command: EngineCommand) -> Result<(), EngineError> {
        if self.destroyed.get() {
            return Err(EngineError::Destroyed);
        }
        self.commands.borrow_mut().push(command.clone());
        let last = self.locators.len().saturating_sub(1);
        match command {
            EngineCommand::Display(target) => {
                if self.fail_display.get() {
                    return Err(EngineError::Display(target.to_string()));
                }
                self.displayed.borrow_mut().push(target.clone());
                let ordinal = self
                    .ordinal_of(&target)
                    .ok_or_else(|| EngineError::Display(target.to_string()))?;
                self.move_to(ordinal);
            }
            EngineCommand::Next => {
                let current = self.position.get().unwrap_or(0);
                self.move_to((current + 1).min(last));
            }
            EngineCommand::Prev => {
                let current = self.position.get().unwrap_or(0);
                self.move_to(current.saturating_sub(1));
            }
        }
        Ok(())
    }

    async fn generate_locations(&self, _chunk_size: usize) -> Result<usize, EngineError> {
        self.generate_calls.set(self.generate_calls.get() + 1);
        if let Some(delay) = self.build_delay.get() {
            tokio::time::sleep(delay).await;
        }
        if self.fail_locations.get() {
            return Err(EngineError::Locations("fake failure".into()));
        }
        self.built.set(true);
        Ok(self.locators.len())
    }

    fn locations_len(&self) -> usize {
        if self.built.get() { self.locators.len() } else { 0 }
    }

    fn location_of(&self, locator: &Locator) -> Option<usize> {
        if !self.built.get() {
            return None;
        }
        self.locators.iter().position(|(l, _)| l == locator)
    }

    fn locator_at(&self, index: usize) -> Option<Locator> {
        if !self.built.get() {
            return None;
        }
        self.locators.get(index).map(|(l, _)| l.clone())
    }

    fn spine(&self) -> Vec<SpineItem> {
        self.sections
            .iter()
            .enumerate()
            .map(|(index, href)| SpineItem {
                index,
                href: href.clone(),
            })
            .collect()
    }

    fn navigation(&self) -> Vec<NavPoint> {
        self.sections
            .iter()
            .enumerate()
            .map(|(i, href)| NavPoint {
                label: format!("Chapter {}", i + 1),
                href: href.clone(),
            })
            .collect()
    }

    fn current_location(&self) -> Option<Relocation> {
        self.position.get().map(|ordinal| self.relocation_at(ordinal))
    }

    fn destroy(&self) {
        self.destroyed.set(true);
        self.sender.borrow_mut().take();
    }
}

/// Hands out a prepared `FakeRendition`.
#[derive(Debug, Default)]
pub struct FakeFactory {
    rendition: RefCell<Option<Rc<FakeRendition>>>,
    metadata: DocumentMetadata,
    fail_open: bool,
}

impl FakeFactory {
    pub fn with_rendition(rendition: Rc<FakeRendition>) -> Self {
        Self {
            rendition: RefCell::new(Some(rendition)),
            ..Self::default()
        }
    }

    pub fn with_metadata(title: Option<&str>, author: Option<&str>) -> Self {
        Self {
            metadata: DocumentMetadata {
                title: title.map(str::to_string),
                author: author.map(str::to_string),
            },
            ..Self::default()
        }
    }

    pub fn failing() -> Self {
        Self {
            fail_open: true,
            ..Self::default()
        }
    }
}

#[async_trait(?Send)]
impl RenditionFactory for FakeFactory {
    async fn open(&self, _content: &[u8]) -> Result<Rc<dyn Rendition>, EngineError> {
        if self.fail_open {
            return Err(EngineError::Open("corrupt container".into()));
        }
        let rendition: Rc<dyn Rendition> = self
            .rendition
            .borrow()
            .clone()
            .unwrap_or_else(|| Rc::new(FakeRendition::new(&[1])));
        Ok(rendition)
    }

    async fn read_metadata(&self, _content: &[u8]) -> Result<DocumentMetadata, EngineError> {
        if self.fail_open {
            return Err(EngineError::Open("corrupt container".into()));
        }
        Ok(self.metadata.clone())
    }
}

#[derive(Debug)]
pub struct FakeContents {
    text: String,
    rect: Rect,
    origin: Point,
    selected: Cell<bool>,
}

impl FakeContents {
    pub fn new(text: &str, rect: Rect, origin: Point) -> Self {
        Self {
            text: text.to_string(),
            rect,
            origin,
            selected: Cell::new(true),
        }
    }

    /// Nothing is selected until `select_word_at` runs.
    pub fn needing_word_expansion(self) -> Self {
        self.selected.set(false);
        self
    }
}

impl SelectionContents for FakeContents {
    fn selected_text(&self) -> Option<String> {
        self.selected.get().then(|| self.text.clone())
    }

    fn selection_rect(&self) -> Option<Rect> {
        self.selected.get().then_some(self.rect)
    }

    fn surface_origin(&self) -> Point {
        self.origin
    }

    fn select_word_at(&self, _point: Point) -> bool {
        self.selected.set(true);
        true
    }
}

#[derive(Debug, Clone)]
enum FakeAnswer {
    Fail,
    Empty,
    Text(String),
    Echo,
}

/// Scripted dictionary provider with a shared call counter.
#[derive(Debug)]
pub struct FakeProvider {
    name: &'static str,
    answer: FakeAnswer,
    delays: HashMap<String, Duration>,
    calls: Rc<Cell<usize>>,
}

impl FakeProvider {
    fn with_answer(name: &'static str, answer: FakeAnswer) -> Self {
        Self {
            name,
            answer,
            delays: HashMap::new(),
            calls: Rc::new(Cell::new(0)),
        }
    }

    pub fn failing(name: &'static str) -> Self {
        Self::with_answer(name, FakeAnswer::Fail)
    }

    pub fn empty(name: &'static str) -> Self {
        Self::with_answer(name, FakeAnswer::Empty)
    }

    pub fn answering(name: &'static str, text: &str) -> Self {
        Self::with_answer(name, FakeAnswer::Text(text.to_string()))
    }

    /// Answers `gloss of <word>`.
    pub fn echo(name: &'static str) -> Self {
        Self::with_answer(name, FakeAnswer::Echo)
    }

    pub fn delay_word(mut self, word: &str, delay: Duration) -> Self {
        self.delays.insert(word.to_string(), delay);
        self
    }

    pub fn calls(&self) -> Rc<Cell<usize>> {
        self.calls.clone()
    }
}

#[async_trait(?Send)]
impl DictionaryProvider for FakeProvider {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn lookup(
        &self,
        word: &str,
        _target_language: &str,
    ) -> Result<Option<RawGloss>, ProviderError> {
        self.calls.set(self.calls.get() + 1);
        if let Some(delay) = self.delays.get(word) {
            tokio::time::sleep(*delay).await;
        }
        let text = match &self.answer {
            FakeAnswer::Fail => return Err(ProviderError::Status(503)),
            FakeAnswer::Empty => return Ok(None),
            FakeAnswer::Text(text) => text.clone(),
            FakeAnswer::Echo => format!("gloss of {word}"),
        };
        Ok(Some(RawGloss {
            text,
            part_of_speech: None,
            phonetic: None,
        }))
    }
}

/// `MemoryCache` that counts hits.
#[derive(Debug, Default)]
pub struct CountingCache {
    inner: MemoryCache,
    hits: Cell<usize>,
}

impl CountingCache {
    pub fn hits(&self) -> usize {
        self.hits.get()
    }
}

impl TranslationCache for CountingCache {
    fn get(&self, key: &CacheKey) -> Option<Translation> {
        let hit = self.inner.get(key);
        if hit.is_some() {
            self.hits.set(self.hits.get() + 1);
        }
        hit
    }

    fn insert(&self, key: CacheKey, translation: Translation) {
        self.inner.insert(key, translation);
    }

    fn len(&self) -> usize {
        self.inner.len()
    }
}

/// Every operation fails with an I/O error.
#[derive(Debug, Default)]
pub struct FailingStore;

fn unavailable() -> StoreError {
    StoreError::Io(std::io::Error::other("store unavailable"))
}

#[async_trait(?Send)]
impl BookStore for FailingStore {
    async fn add_book(&self, _book: NewBook) -> Result<BookId, StoreError> {
        Err(unavailable())
    }

    async fn get_book(&self, _id: BookId) -> Result<Option<Book>, StoreError> {
        Err(unavailable())
    }

    async fn update_book(&self, _id: BookId, _update: BookUpdate) -> Result<(), StoreError> {
        Err(unavailable())
    }

    async fn delete_book(&self, _id: BookId) -> Result<(), StoreError> {
        Err(unavailable())
    }

    async fn books_by_last_read(&self) -> Result<Vec<Book>, StoreError> {
        Err(unavailable())
    }

    async fn add_word(&self, _word: NewVocabularyWord) -> Result<WordId, StoreError> {
        Err(unavailable())
    }

    async fn words_for_book(&self, _book_id: BookId) -> Result<Vec<VocabularyWord>, StoreError> {
        Err(unavailable())
    }

    async fn delete_words_for_book(&self, _book_id: BookId) -> Result<usize, StoreError> {
        Err(unavailable())
    }
}
