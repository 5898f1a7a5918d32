//! Reading-position tracking.
//!
//! Converts engine relocations into `(current_page, total_pages, progress)`
//! and produces the record updates that keep a book's position across
//! sessions. Which page unit is used depends on the LocationsIndex:
//!
//! - not built yet: the engine's own percentage drives progress, pages stay
//!   as last known, and a background build is requested once;
//! - built: index ordinal over index length;
//! - build failed: spine ordinal over spine length.

use crate::engine::{Locator, Relocation, Rendition};
use crate::error::EngineError;
use crate::pagination::{self, PageEstimate};
use crate::store::{Book, BookId, BookStore, BookUpdate};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexStatus {
    Unbuilt,
    Pending,
    Ready(usize),
    Failed,
}

/// What the reader controls display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReaderControls {
    pub current_location: Option<Locator>,
    pub progress: u8,
    pub can_go_next: bool,
    pub can_go_prev: bool,
    pub current_page: usize,
    pub total_pages: usize,
}

impl Default for ReaderControls {
    fn default() -> Self {
        Self {
            current_location: None,
            progress: 0,
            can_go_next: false,
            can_go_prev: false,
            current_page: 1,
            total_pages: 1,
        }
    }
}

/// Position write for a book record.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressUpdate {
    pub book_id: BookId,
    pub locator: Option<Locator>,
    pub progress: u8,
    pub read_at: DateTime<Utc>,
}

impl ProgressUpdate {
    pub fn to_book_update(&self) -> BookUpdate {
        BookUpdate {
            current_location: self.locator.clone(),
            progress: Some(self.progress),
            last_read_at: Some(self.read_at),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RelocateOutcome {
    pub update: ProgressUpdate,
    /// Chunk size for a background index build the caller should start.
    pub build_index: Option<usize>,
}

#[derive(Debug)]
pub struct PositionTracker {
    book_id: BookId,
    chunk_size: usize,
    index: IndexStatus,
    controls: ReaderControls,
    last_relocation: Option<Relocation>,
}

impl PositionTracker {
    pub fn new(book_id: BookId, chunk_size: usize) -> Self {
        Self {
            book_id,
            chunk_size: chunk_size.max(1),
            index: IndexStatus::Unbuilt,
            controls: ReaderControls::default(),
            last_relocation: None,
        }
    }

    /// Start from what the store remembers about `book`.
    pub fn resume(book: &Book, chunk_size: usize) -> Self {
        let mut tracker = Self::new(book.id, chunk_size);
        tracker.controls.current_location = book.current_location.clone();
        tracker.controls.progress = book.progress.min(crate::store::MAX_PROGRESS);
        tracker
    }

    pub fn controls(&self) -> &ReaderControls {
        &self.controls
    }

    pub fn index_status(&self) -> IndexStatus {
        self.index
    }

    pub fn total_pages(&self) -> usize {
        self.controls.total_pages
    }

    /// Claim the index build if nobody has started it yet.
    pub fn request_index(&mut self) -> Option<usize> {
        if self.index == IndexStatus::Unbuilt {
            self.index = IndexStatus::Pending;
            debug!(
                book_id = self.book_id,
                chunk_size = self.chunk_size,
                "Requesting locations index build"
            );
            Some(self.chunk_size)
        } else {
            None
        }
    }

    pub fn on_relocate(&mut self, relocation: Relocation, engine: &dyn Rendition) -> RelocateOutcome {
        self.sync_index(engine);
        let build_index = self.request_index();
        let update = self.apply(relocation, engine);
        RelocateOutcome {
            update,
            build_index,
        }
    }

    /// Record the result of an index build. When a position is already known
    /// it is recomputed with the new page unit and returned for persisting.
    pub fn on_index_built(
        &mut self,
        result: Result<usize, EngineError>,
        engine: &dyn Rendition,
    ) -> Option<ProgressUpdate> {
        let previous = self.index;
        self.index = match result {
            Ok(len) if len > 0 => {
                info!(book_id = self.book_id, pages = len, "Locations index ready");
                IndexStatus::Ready(len)
            }
            Ok(_) => {
                warn!(
                    book_id = self.book_id,
                    "Locations index came back empty; using spine pagination"
                );
                IndexStatus::Failed
            }
            Err(err) => {
                warn!(
                    book_id = self.book_id,
                    "Could not generate locations, falling back to spine pagination: {err}"
                );
                IndexStatus::Failed
            }
        };
        if self.index == previous {
            return None;
        }
        let relocation = self.last_relocation.clone()?;
        Some(self.apply(relocation, engine))
    }

    /// Current position for a teardown or backgrounding flush.
    pub fn flush(&self) -> Option<ProgressUpdate> {
        self.last_relocation.as_ref()?;
        Some(self.progress_update(Utc::now()))
    }

    fn sync_index(&mut self, engine: &dyn Rendition) {
        if matches!(self.index, IndexStatus::Ready(_)) {
            return;
        }
        let len = engine.locations_len();
        if len > 0 {
            self.index = IndexStatus::Ready(len);
        }
    }

    fn apply(&mut self, relocation: Relocation, engine: &dyn Rendition) -> ProgressUpdate {
        let estimate = self.estimate(&relocation, engine);
        debug!(
            book_id = self.book_id,
            page = estimate.current_page,
            total = estimate.total_pages,
            fraction = estimate.fraction,
            index = ?self.index,
            "Relocated"
        );

        self.controls = ReaderControls {
            current_location: relocation
                .start
                .locator
                .clone()
                .or_else(|| self.controls.current_location.clone()),
            progress: pagination::progress_percent(estimate.fraction),
            can_go_next: !relocation.at_end,
            can_go_prev: !relocation.at_start,
            current_page: estimate.current_page,
            total_pages: estimate.total_pages,
        };
        self.last_relocation = Some(relocation);
        self.progress_update(Utc::now())
    }

    fn estimate(&self, relocation: &Relocation, engine: &dyn Rendition) -> PageEstimate {
        let start = &relocation.start;
        let percentage = start.percentage.unwrap_or(0.0);
        match self.index {
            IndexStatus::Ready(len) => {
                match start
                    .locator
                    .as_ref()
                    .and_then(|locator| engine.location_of(locator))
                {
                    Some(ordinal) => pagination::estimate_from_index(ordinal, len),
                    None => PageEstimate {
                        current_page: self.controls.current_page.clamp(1, len),
                        total_pages: len,
                        fraction: percentage,
                    },
                }
            }
            IndexStatus::Failed => {
                pagination::estimate_from_spine(&engine.spine(), start, self.controls.current_page)
            }
            IndexStatus::Unbuilt | IndexStatus::Pending => PageEstimate {
                current_page: self.controls.current_page,
                total_pages: self.controls.total_pages,
                fraction: percentage,
            },
        }
    }

    fn progress_update(&self, read_at: DateTime<Utc>) -> ProgressUpdate {
        ProgressUpdate {
            book_id: self.book_id,
            locator: self.controls.current_location.clone(),
            progress: self.controls.progress,
            read_at,
        }
    }
}

/// Best-effort write of a position update. Failures are logged and never
/// touch in-memory state.
pub async fn persist_progress(store: &dyn BookStore, update: ProgressUpdate) -> bool {
    debug!(
        book_id = update.book_id,
        progress = update.progress,
        "Saving progress to store"
    );
    match store
        .update_book(update.book_id, update.to_book_update())
        .await
    {
        Ok(()) => true,
        Err(err) => {
            warn!(book_id = update.book_id, "Error updating progress: {err}");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryStore, NewBook};
    use crate::testing::{FailingStore, FakeRendition};

    fn relocation(engine: &FakeRendition, ordinal: usize) -> Relocation {
        engine.relocation_at(ordinal)
    }

    #[test]
    fn first_relocation_uses_percentage_and_requests_index_once() {
        let engine = FakeRendition::new(&[4, 4, 4]);
        let mut tracker = PositionTracker::new(7, 1650);

        let mut first = relocation(&engine, 6);
        first.start.percentage = Some(0.5);
        let outcome = tracker.on_relocate(first, &engine);

        assert_eq!(outcome.build_index, Some(1650));
        assert_eq!(outcome.update.progress, 50);
        assert_eq!(tracker.controls().current_page, 1);
        assert_eq!(tracker.controls().total_pages, 1);
        assert_eq!(tracker.index_status(), IndexStatus::Pending);

        let second = tracker.on_relocate(relocation(&engine, 7), &engine);
        assert_eq!(second.build_index, None);
    }

    #[test]
    fn built_index_switches_to_ordinal_pages() {
        let engine = FakeRendition::new(&[5, 5]);
        let mut tracker = PositionTracker::new(1, 1650);
        tracker.on_relocate(relocation(&engine, 0), &engine);

        engine.build_locations();
        let update = tracker
            .on_index_built(Ok(10), &engine)
            .expect("position recomputed");

        assert_eq!(tracker.controls().current_page, 1);
        assert_eq!(tracker.controls().total_pages, 10);
        assert_eq!(update.progress, 0);

        let outcome = tracker.on_relocate(relocation(&engine, 4), &engine);
        assert_eq!(tracker.controls().current_page, 5);
        assert_eq!(outcome.update.progress, 40);
        assert_eq!(outcome.update.locator, Some(engine.locator(4)));
    }

    #[test]
    fn failed_index_falls_back_to_spine_ordinal() {
        let engine = FakeRendition::new(&[3, 3, 3, 3]);
        let mut tracker = PositionTracker::new(1, 1650);
        tracker.on_relocate(relocation(&engine, 0), &engine);

        tracker.on_index_built(Err(EngineError::Locations("boom".into())), &engine);
        assert_eq!(tracker.index_status(), IndexStatus::Failed);

        let outcome = tracker.on_relocate(relocation(&engine, 7), &engine);
        assert_eq!(tracker.controls().current_page, 3);
        assert_eq!(tracker.controls().total_pages, 4);
        assert_eq!(outcome.update.progress, 50);
    }

    #[test]
    fn unmatched_spine_section_keeps_last_page() {
        let engine = FakeRendition::new(&[2, 2, 2]);
        let mut tracker = PositionTracker::new(1, 1650);
        tracker.on_relocate(relocation(&engine, 0), &engine);
        tracker.on_index_built(Ok(0), &engine);
        tracker.on_relocate(relocation(&engine, 2), &engine);
        assert_eq!(tracker.controls().current_page, 2);

        let stray = Relocation {
            start: crate::engine::LocationPoint {
                locator: Some(Locator::new("epubcfi(/6/40)")),
                href: Some("appendix.xhtml".into()),
                percentage: Some(0.9),
            },
            at_start: false,
            at_end: false,
        };
        tracker.on_relocate(stray, &engine);
        assert_eq!(tracker.controls().current_page, 2);
        assert_eq!(tracker.controls().progress, 90);
    }

    #[test]
    fn progress_stays_within_bounds_for_any_engine_percentage() {
        let engine = FakeRendition::new(&[3]);
        let mut tracker = PositionTracker::new(1, 1650);
        for pct in [-3.0, 0.0, 0.333, 1.0, 2.5, f64::INFINITY] {
            let mut moved = relocation(&engine, 1);
            moved.start.percentage = Some(pct);
            let outcome = tracker.on_relocate(moved, &engine);
            assert!(outcome.update.progress <= 100);
        }
    }

    #[test]
    fn navigation_flags_follow_document_edges() {
        let engine = FakeRendition::new(&[3]);
        let mut tracker = PositionTracker::new(1, 1650);
        tracker.on_relocate(relocation(&engine, 0), &engine);
        assert!(!tracker.controls().can_go_prev);
        assert!(tracker.controls().can_go_next);

        tracker.on_relocate(relocation(&engine, 2), &engine);
        assert!(tracker.controls().can_go_prev);
        assert!(!tracker.controls().can_go_next);
    }

    #[test]
    fn flush_needs_a_known_position() {
        let engine = FakeRendition::new(&[3]);
        let mut tracker = PositionTracker::new(4, 1650);
        assert!(tracker.flush().is_none());

        tracker.on_relocate(relocation(&engine, 1), &engine);
        let update = tracker.flush().expect("flush after relocation");
        assert_eq!(update.book_id, 4);
        assert_eq!(update.locator, Some(engine.locator(1)));
    }

    #[tokio::test]
    async fn persisted_progress_reaches_the_book_record() {
        let store = MemoryStore::new();
        let id = store
            .add_book(NewBook {
                title: "T".into(),
                author: "A".into(),
                file_name: "t.epub".into(),
                content: Vec::new(),
                added_at: Utc::now() - chrono::Duration::days(1),
            })
            .await
            .unwrap();
        let before = store.get_book(id).await.unwrap().unwrap().last_read_at;

        let update = ProgressUpdate {
            book_id: id,
            locator: Some(Locator::new("ch1.xhtml#loc2")),
            progress: 37,
            read_at: Utc::now(),
        };
        assert!(persist_progress(&store, update).await);

        let book = store.get_book(id).await.unwrap().unwrap();
        assert_eq!(book.progress, 37);
        assert_eq!(book.current_location, Some(Locator::new("ch1.xhtml#loc2")));
        assert!(book.last_read_at > before);
    }

    #[tokio::test]
    async fn persistence_failure_leaves_tracker_state_alone() {
        let engine = FakeRendition::new(&[3]);
        let mut tracker = PositionTracker::new(1, 1650);
        let outcome = tracker.on_relocate(relocation(&engine, 2), &engine);
        let controls = tracker.controls().clone();

        assert!(!persist_progress(&FailingStore, outcome.update).await);
        assert_eq!(tracker.controls(), &controls);
    }
}
