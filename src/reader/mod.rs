//! Reader session: one open book wired to its engine, store and resolver.
//!
//! Engine events and user commands update state synchronously. Anything that
//! has to wait (index generation, lookups, navigation, store writes) is queued
//! as a local future; its result comes back through `handle_task`.

mod shortcuts;

pub use shortcuts::Modifiers;

use crate::config::AppConfig;
use crate::engine::{
    DisplayTarget, EngineCommand, EngineEvent, EventStream, NavPoint, Rendition,
    RenditionFactory,
};
use crate::error::{EngineError, StoreError};
use crate::generation::Generation;
use crate::library;
use crate::navigation::{NavigationOutcome, Navigator, PageRequest};
use crate::position::{PositionTracker, ProgressUpdate, ReaderControls, persist_progress};
use crate::selection::{
    RawSelection, SelectionPhase, SelectionPipeline, SelectionSettings, TooltipState, Viewport,
    raw_from_contents, raw_from_double_click,
};
use crate::store::{Book, BookId, BookStore, VocabularyWord, WordId};
use crate::translation::{LookupOutcome, TranslationResolver};
use anyhow::{Context, Result, anyhow};
use chrono::Utc;
use futures::future::{FutureExt, LocalBoxFuture};
use futures::stream::{FuturesUnordered, StreamExt};
use std::rc::Rc;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadState {
    Loading,
    Ready,
    /// The engine could not open the document; the view stays empty.
    Failed(String),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PanelState {
    pub show_navigation: bool,
    pub show_vocabulary: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ReaderCommand {
    NextPage,
    PrevPage,
    GoToPage(i64),
    /// Raw text from the page input; non-numeric input is ignored.
    SubmitPageInput(String),
    GoToChapter(String),
    JumpBeginning,
    JumpMiddle,
    JumpEnd,
    CloseTooltip,
    SaveWord,
    ToggleVocabulary,
    SetNavigationOpen(bool),
    ClosePanels,
    KeyPressed { key: String, modifiers: Modifiers },
    VisibilityHidden,
    Resize(Viewport),
}

#[derive(Debug)]
enum TaskResult {
    LocationsBuilt(Result<usize, EngineError>),
    Navigated(NavigationOutcome),
    LookupFinished {
        generation: Generation,
        outcome: LookupOutcome,
    },
    ProgressPersisted,
    WordSaved(Result<WordId, StoreError>),
    VocabularyLoaded(Result<Vec<VocabularyWord>>),
    EngineCommandDone,
}

type Task = LocalBoxFuture<'static, TaskResult>;

pub struct ReaderSession {
    book: Book,
    config: AppConfig,
    store: Rc<dyn BookStore>,
    resolver: Rc<TranslationResolver>,
    engine: Option<Rc<dyn Rendition>>,
    events: Option<EventStream>,
    navigator: Option<Navigator>,
    tracker: PositionTracker,
    selection: SelectionPipeline,
    panels: PanelState,
    vocabulary: Vec<VocabularyWord>,
    table_of_contents: Vec<NavPoint>,
    page_input: String,
    viewport: Viewport,
    load_state: LoadState,
    tasks: FuturesUnordered<Task>,
}

impl ReaderSession {
    /// Load the book, open the engine and show the saved position. A missing
    /// book is an error; an engine failure is reported through `load_state`.
    pub async fn open(
        book_id: BookId,
        store: Rc<dyn BookStore>,
        factory: &dyn RenditionFactory,
        resolver: Rc<TranslationResolver>,
        config: AppConfig,
        viewport: Viewport,
    ) -> Result<Self> {
        let book = store
            .get_book(book_id)
            .await
            .with_context(|| format!("failed to load book {book_id}"))?
            .ok_or_else(|| anyhow!("book {book_id} not found"))?;
        info!(book_id, title = %book.title, "Opening book");

        let mut session = Self {
            tracker: PositionTracker::resume(&book, config.locations_chunk_size),
            selection: SelectionPipeline::new(SelectionSettings::from_config(&config)),
            book,
            config,
            store,
            resolver,
            engine: None,
            events: None,
            navigator: None,
            panels: PanelState::default(),
            vocabulary: Vec::new(),
            table_of_contents: Vec::new(),
            page_input: String::new(),
            viewport,
            load_state: LoadState::Loading,
            tasks: FuturesUnordered::new(),
        };
        session.schedule_vocabulary_load();

        let engine = match factory.open(&session.book.content).await {
            Ok(engine) => engine,
            Err(err) => {
                warn!(book_id, "Error loading book: {err}");
                session.load_state = LoadState::Failed(err.to_string());
                return Ok(session);
            }
        };

        session.events = Some(engine.subscribe());
        session.table_of_contents = engine.navigation();
        session.navigator = Some(Navigator::new(
            engine.clone(),
            session.config.locations_chunk_size,
        ));
        session.engine = Some(engine.clone());

        let target = session
            .book
            .current_location
            .clone()
            .map(DisplayTarget::Locator)
            .unwrap_or(DisplayTarget::Start);
        let shown = match engine.issue(EngineCommand::Display(target.clone())).await {
            Ok(()) => Ok(()),
            Err(err) if target != DisplayTarget::Start => {
                warn!(book_id, %target, "Saved location could not be shown, starting over: {err}");
                engine
                    .issue(EngineCommand::Display(DisplayTarget::Start))
                    .await
            }
            Err(err) => Err(err),
        };
        if let Err(err) = shown {
            warn!(book_id, "Error displaying book: {err}");
            session.load_state = LoadState::Failed(err.to_string());
            return Ok(session);
        }

        session.load_state = LoadState::Ready;
        if let Some(chunk_size) = session.tracker.request_index() {
            session.schedule_index_build(chunk_size);
        }
        Ok(session)
    }

    pub fn book(&self) -> &Book {
        &self.book
    }

    pub fn load_state(&self) -> &LoadState {
        &self.load_state
    }

    pub fn controls(&self) -> &ReaderControls {
        self.tracker.controls()
    }

    pub fn tooltip(&self) -> Option<&TooltipState> {
        self.selection.tooltip()
    }

    pub fn selection_phase(&self) -> SelectionPhase {
        self.selection.phase()
    }

    pub fn panels(&self) -> PanelState {
        self.panels
    }

    pub fn vocabulary(&self) -> &[VocabularyWord] {
        &self.vocabulary
    }

    pub fn table_of_contents(&self) -> &[NavPoint] {
        &self.table_of_contents
    }

    pub fn page_input(&self) -> &str {
        &self.page_input
    }

    pub fn has_pending_work(&self) -> bool {
        !self.tasks.is_empty()
    }

    pub fn handle_event(&mut self, event: EngineEvent) {
        match event {
            EngineEvent::Relocated(relocation) => {
                let Some(engine) = self.engine.clone() else {
                    return;
                };
                let outcome = self.tracker.on_relocate(relocation, engine.as_ref());
                if let Some(chunk_size) = outcome.build_index {
                    self.schedule_index_build(chunk_size);
                }
                self.schedule_persist(outcome.update);
            }
            EngineEvent::Selected { range, contents } => {
                debug!(%range, "Engine selection");
                match raw_from_contents(contents.as_ref()) {
                    Ok(raw) => self.begin_lookup(raw),
                    Err(reason) => debug!(?reason, "No usable selection"),
                }
            }
            EngineEvent::DoubleClick { point, contents } => {
                match raw_from_double_click(point, contents.as_ref()) {
                    Ok(raw) => self.begin_lookup(raw),
                    Err(reason) => debug!(?reason, "Double click selected nothing"),
                }
            }
            EngineEvent::MouseUp { contents } => {
                if let Ok(raw) = raw_from_contents(contents.as_ref()) {
                    self.begin_lookup(raw);
                }
            }
            EngineEvent::ViewerClick => {
                if self.selection.close() {
                    debug!("Tooltip closed by viewer click");
                }
            }
        }
    }

    pub fn handle_command(&mut self, command: ReaderCommand) {
        match command {
            ReaderCommand::NextPage => {
                if let Some(nav) = self.navigator.clone() {
                    self.tasks.push(
                        async move {
                            nav.next_page().await;
                            TaskResult::EngineCommandDone
                        }
                        .boxed_local(),
                    );
                }
            }
            ReaderCommand::PrevPage => {
                if let Some(nav) = self.navigator.clone() {
                    self.tasks.push(
                        async move {
                            nav.prev_page().await;
                            TaskResult::EngineCommandDone
                        }
                        .boxed_local(),
                    );
                }
            }
            ReaderCommand::GoToPage(page) => self.schedule_navigation(PageRequest::Page(page)),
            ReaderCommand::SubmitPageInput(text) => match text.trim().parse::<i64>() {
                Ok(page) => {
                    self.page_input.clear();
                    self.schedule_navigation(PageRequest::Page(page));
                }
                Err(_) => {
                    debug!(input = %text, "Ignoring non-numeric page input");
                    self.page_input = text;
                }
            },
            ReaderCommand::GoToChapter(href) => {
                self.panels.show_navigation = false;
                if let Some(nav) = self.navigator.clone() {
                    self.tasks.push(
                        async move {
                            nav.go_to_chapter(&href).await;
                            TaskResult::EngineCommandDone
                        }
                        .boxed_local(),
                    );
                }
            }
            ReaderCommand::JumpBeginning => self.schedule_navigation(PageRequest::Beginning),
            ReaderCommand::JumpMiddle => self.schedule_navigation(PageRequest::Middle),
            ReaderCommand::JumpEnd => self.schedule_navigation(PageRequest::End),
            ReaderCommand::CloseTooltip => {
                self.selection.close();
            }
            ReaderCommand::SaveWord => self.save_word(),
            ReaderCommand::ToggleVocabulary => {
                self.panels.show_vocabulary = !self.panels.show_vocabulary;
                debug!(open = self.panels.show_vocabulary, "Toggled vocabulary panel");
            }
            ReaderCommand::SetNavigationOpen(open) => {
                self.panels.show_navigation = open;
            }
            ReaderCommand::ClosePanels => {
                self.panels = PanelState::default();
            }
            ReaderCommand::KeyPressed { key, modifiers } => {
                if self.selection.close() {
                    debug!(%key, "Key press closed the tooltip");
                    return;
                }
                if let Some(command) = shortcuts::command_for_key(&self.config, &key, modifiers) {
                    debug!(%key, ?command, "Shortcut");
                    self.handle_command(command);
                }
            }
            ReaderCommand::VisibilityHidden => {
                if let Some(update) = self.tracker.flush() {
                    debug!(book_id = self.book.id, "Flushing position on hide");
                    self.schedule_persist(update);
                }
            }
            ReaderCommand::Resize(viewport) => {
                self.viewport = viewport;
            }
        }
    }

    fn handle_task(&mut self, result: TaskResult) {
        match result {
            TaskResult::LocationsBuilt(result) => {
                let Some(engine) = self.engine.clone() else {
                    return;
                };
                if let Some(update) = self.tracker.on_index_built(result, engine.as_ref()) {
                    self.schedule_persist(update);
                }
            }
            TaskResult::Navigated(outcome) => {
                if let Some(landing) = &outcome.landing {
                    debug!(page = landing.page, total = landing.total_pages, "Navigation done");
                }
                if let (Some(build), Some(engine)) = (outcome.index_build, self.engine.clone()) {
                    if let Some(update) = self.tracker.on_index_built(build, engine.as_ref()) {
                        self.schedule_persist(update);
                    }
                }
            }
            TaskResult::LookupFinished {
                generation,
                outcome,
            } => {
                self.selection.finish(generation, outcome);
            }
            TaskResult::WordSaved(Ok(word_id)) => {
                info!(book_id = self.book.id, word_id, "Saved vocabulary word");
                self.schedule_vocabulary_load();
            }
            TaskResult::WordSaved(Err(err)) => {
                warn!(book_id = self.book.id, "Error saving word: {err}");
            }
            TaskResult::VocabularyLoaded(Ok(words)) => {
                self.vocabulary = words;
            }
            TaskResult::VocabularyLoaded(Err(err)) => {
                warn!(book_id = self.book.id, "Error loading vocabulary: {err:#}");
            }
            TaskResult::ProgressPersisted | TaskResult::EngineCommandDone => {}
        }
    }

    /// Wait for the next engine event or finished task and apply it. Returns
    /// `false` once there is nothing left to wait for.
    pub async fn step(&mut self) -> bool {
        enum Next {
            Event(EngineEvent),
            Task(TaskResult),
        }

        let next = tokio::select! {
            Some(event) = next_event(&mut self.events) => Next::Event(event),
            Some(result) = self.tasks.next(), if !self.tasks.is_empty() => Next::Task(result),
            else => return false,
        };
        match next {
            Next::Event(event) => self.handle_event(event),
            Next::Task(result) => self.handle_task(result),
        }
        true
    }

    /// Apply every queued event and run background work to completion.
    pub async fn settle(&mut self) {
        loop {
            while let Some(event) = self.events.as_mut().and_then(|rx| rx.try_recv().ok()) {
                self.handle_event(event);
            }
            match self.tasks.next().await {
                Some(result) => self.handle_task(result),
                None => {
                    let idle = self.events.as_ref().is_none_or(|rx| rx.is_empty());
                    if idle {
                        break;
                    }
                }
            }
        }
    }

    /// Flush the position and tear the engine down.
    pub async fn close(mut self) {
        if let Some(update) = self.tracker.flush() {
            persist_progress(self.store.as_ref(), update).await;
        }
        self.tasks.clear();
        self.events = None;
        if let Some(engine) = self.engine.take() {
            engine.destroy();
        }
        info!(book_id = self.book.id, "Closed book");
    }

    fn begin_lookup(&mut self, raw: RawSelection) {
        let ticket = match self.selection.begin(&raw, self.viewport) {
            Ok(ticket) => ticket,
            Err(_) => return,
        };
        let resolver = self.resolver.clone();
        self.tasks.push(
            async move {
                let outcome = resolver.translate(&ticket.word).await;
                TaskResult::LookupFinished {
                    generation: ticket.generation,
                    outcome,
                }
            }
            .boxed_local(),
        );
    }

    fn save_word(&mut self) {
        let Some(word) = self.selection.save(self.book.id, Utc::now()) else {
            debug!("Nothing to save");
            return;
        };
        let store = self.store.clone();
        self.tasks.push(
            async move { TaskResult::WordSaved(store.add_word(word).await) }.boxed_local(),
        );
    }

    fn schedule_navigation(&mut self, request: PageRequest) {
        let Some(nav) = self.navigator.clone() else {
            debug!(?request, "No engine to navigate");
            return;
        };
        self.tasks.push(
            async move { TaskResult::Navigated(nav.go_to(request).await) }.boxed_local(),
        );
    }

    fn schedule_index_build(&mut self, chunk_size: usize) {
        let Some(engine) = self.engine.clone() else {
            return;
        };
        self.tasks.push(
            async move { TaskResult::LocationsBuilt(engine.generate_locations(chunk_size).await) }
                .boxed_local(),
        );
    }

    fn schedule_persist(&mut self, update: ProgressUpdate) {
        let store = self.store.clone();
        self.tasks.push(
            async move {
                persist_progress(store.as_ref(), update).await;
                TaskResult::ProgressPersisted
            }
            .boxed_local(),
        );
    }

    fn schedule_vocabulary_load(&mut self) {
        let store = self.store.clone();
        let book_id = self.book.id;
        self.tasks.push(
            async move {
                TaskResult::VocabularyLoaded(
                    library::vocabulary_for_book(store.as_ref(), book_id).await,
                )
            }
            .boxed_local(),
        );
    }
}

async fn next_event(events: &mut Option<EventStream>) -> Option<EngineEvent> {
    match events {
        Some(rx) => rx.recv().await,
        None => None,
    }
}
