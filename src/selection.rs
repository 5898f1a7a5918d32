//! Selection-to-tooltip pipeline.
//!
//! Both selection sources (the engine's structured `selected` event and the
//! double-click / mouse-up fallback) are reduced to a `RawSelection` and go
//! through `normalize_selection`. The pipeline then owns the tooltip and the
//! generation counter that keeps late lookups from overwriting newer ones.

use crate::config::AppConfig;
use crate::engine::{Point, Rect, SelectionContents};
use crate::generation::{Generation, GenerationCounter};
use crate::store::{BookId, NewVocabularyWord};
use crate::text_utils::strip_surrounding_punctuation;
use crate::translation::{LookupOutcome, Translation};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;
use unicode_normalization::UnicodeNormalization;

#[derive(Debug, Clone, PartialEq)]
pub struct SelectionSettings {
    pub max_chars: usize,
    pub edge_margin: f64,
    pub min_top: f64,
    pub vertical_offset: f64,
}

impl Default for SelectionSettings {
    fn default() -> Self {
        Self::from_config(&AppConfig::default())
    }
}

impl SelectionSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            max_chars: config.max_selection_chars,
            edge_margin: config.tooltip_edge_margin,
            min_top: config.tooltip_min_top,
            vertical_offset: config.tooltip_vertical_offset,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

/// Text and geometry pulled out of a selection source.
#[derive(Debug, Clone, PartialEq)]
pub struct RawSelection {
    pub text: String,
    /// Bounding box relative to the rendering surface.
    pub rect: Rect,
    /// Where that surface sits inside the viewer.
    pub origin: Point,
}

/// Why a selection did not open a tooltip. None of these are errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionRejection {
    NoSelection,
    Empty,
    TooLong(usize),
    OnlyPunctuation,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedSelection {
    pub word: String,
    pub anchor: Point,
}

pub fn normalize_selection(
    raw: &RawSelection,
    viewport: Viewport,
    settings: &SelectionSettings,
) -> Result<NormalizedSelection, SelectionRejection> {
    let text = raw.text.trim();
    if text.is_empty() {
        return Err(SelectionRejection::Empty);
    }
    let len = text.chars().count();
    if len > settings.max_chars {
        return Err(SelectionRejection::TooLong(len));
    }
    let stripped = strip_surrounding_punctuation(text);
    if stripped.is_empty() {
        return Err(SelectionRejection::OnlyPunctuation);
    }

    Ok(NormalizedSelection {
        word: stripped.nfc().collect(),
        anchor: tooltip_anchor(raw.rect, raw.origin, viewport, settings),
    })
}

/// Centered above the selection, kept inside the horizontal margins and
/// below the minimum top.
pub fn tooltip_anchor(
    rect: Rect,
    origin: Point,
    viewport: Viewport,
    settings: &SelectionSettings,
) -> Point {
    let x = origin.x + rect.center_x();
    let y = origin.y + rect.top - settings.vertical_offset;
    Point {
        x: x.min(viewport.width - settings.edge_margin)
            .max(settings.edge_margin),
        y: y.max(settings.min_top),
    }
}

pub fn raw_from_contents(
    contents: &dyn SelectionContents,
) -> Result<RawSelection, SelectionRejection> {
    let text = contents
        .selected_text()
        .ok_or(SelectionRejection::NoSelection)?;
    let rect = contents
        .selection_rect()
        .ok_or(SelectionRejection::NoSelection)?;
    Ok(RawSelection {
        text,
        rect,
        origin: contents.surface_origin(),
    })
}

/// Double-click fallback: expand to the word under `point` first.
pub fn raw_from_double_click(
    point: Point,
    contents: &dyn SelectionContents,
) -> Result<RawSelection, SelectionRejection> {
    if !contents.select_word_at(point) {
        return Err(SelectionRejection::NoSelection);
    }
    raw_from_contents(contents)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TooltipState {
    pub word: String,
    pub translation: Option<Translation>,
    pub anchor: AnchorPosition,
    pub loading: bool,
    #[serde(skip)]
    pub generation: Generation,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AnchorPosition {
    pub x: f64,
    pub y: f64,
}

impl From<Point> for AnchorPosition {
    fn from(point: Point) -> Self {
        Self {
            x: point.x,
            y: point.y,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionPhase {
    Idle,
    Loading,
    Resolved { found: bool },
}

/// Handed to whoever runs the lookup; comes back with the outcome.
#[derive(Debug, Clone, PartialEq)]
pub struct LookupTicket {
    pub generation: Generation,
    pub word: String,
}

#[derive(Debug)]
pub struct SelectionPipeline {
    settings: SelectionSettings,
    generations: GenerationCounter,
    tooltip: Option<TooltipState>,
}

impl SelectionPipeline {
    pub fn new(settings: SelectionSettings) -> Self {
        Self {
            settings,
            generations: GenerationCounter::new(),
            tooltip: None,
        }
    }

    pub fn settings(&self) -> &SelectionSettings {
        &self.settings
    }

    pub fn tooltip(&self) -> Option<&TooltipState> {
        self.tooltip.as_ref()
    }

    pub fn phase(&self) -> SelectionPhase {
        match &self.tooltip {
            None => SelectionPhase::Idle,
            Some(tooltip) if tooltip.loading => SelectionPhase::Loading,
            Some(tooltip) => SelectionPhase::Resolved {
                found: tooltip.translation.is_some(),
            },
        }
    }

    /// Open a loading tooltip for `raw` and supersede any earlier lookup.
    /// A rejected selection leaves the current tooltip as it was.
    pub fn begin(
        &mut self,
        raw: &RawSelection,
        viewport: Viewport,
    ) -> Result<LookupTicket, SelectionRejection> {
        let normalized = normalize_selection(raw, viewport, &self.settings).inspect_err(|reason| {
            debug!(?reason, "Selection ignored");
        })?;

        let generation = self.generations.advance();
        debug!(
            word = %normalized.word,
            generation = generation.value(),
            x = normalized.anchor.x,
            y = normalized.anchor.y,
            "Selection accepted"
        );
        self.tooltip = Some(TooltipState {
            word: normalized.word.clone(),
            translation: None,
            anchor: normalized.anchor.into(),
            loading: true,
            generation,
        });
        Ok(LookupTicket {
            generation,
            word: normalized.word,
        })
    }

    /// Apply a lookup result. Returns `false` when the result is stale.
    pub fn finish(&mut self, generation: Generation, outcome: LookupOutcome) -> bool {
        if let Err(err) = self.generations.ensure_current(generation, "lookup") {
            debug!("Dropping lookup result: {err}");
            return false;
        }
        let Some(tooltip) = self.tooltip.as_mut() else {
            return false;
        };
        tooltip.loading = false;
        tooltip.translation = match outcome {
            LookupOutcome::Found(translation) => Some(translation),
            LookupOutcome::NotFound => None,
        };
        true
    }

    /// Discard the tooltip and invalidate any lookup in flight. Returns
    /// whether a tooltip was open.
    pub fn close(&mut self) -> bool {
        self.generations.advance();
        self.tooltip.take().is_some()
    }

    /// Vocabulary record for a resolved tooltip; closes it on success.
    pub fn save(&mut self, book_id: BookId, now: DateTime<Utc>) -> Option<NewVocabularyWord> {
        let tooltip = self.tooltip.as_ref()?;
        if tooltip.loading {
            return None;
        }
        let translation = tooltip.translation.as_ref()?;
        let word = NewVocabularyWord {
            word: tooltip.word.clone(),
            translation: translation.translation.clone(),
            book_id,
            context: String::new(),
            added_at: now,
        };
        self.close();
        Some(word)
    }
}
