//! Contract expected of the rendering engine.
//!
//! The engine parses the document, lays it out, and owns the LocationsIndex
//! and spine. Nothing in this crate reaches into it directly: events come out
//! of `Rendition::subscribe`, commands go in through `Rendition::issue`, and
//! the index is consulted through a handful of read-only queries.

use crate::error::EngineError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::rc::Rc;
use tokio::sync::mpsc;

/// Opaque serialized position inside a rendered document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Locator(String);

impl Locator {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Stored books use an empty string for "never opened".
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Start of the currently displayed range, as reported by the engine.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LocationPoint {
    pub locator: Option<Locator>,
    /// Section reference the position falls into.
    pub href: Option<String>,
    /// The engine's own cheap estimate in `[0, 1]`.
    pub percentage: Option<f64>,
}

/// Payload of the `relocated` event.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Relocation {
    pub start: LocationPoint,
    pub at_start: bool,
    pub at_end: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisplayTarget {
    Locator(Locator),
    Section(String),
    Start,
}

impl fmt::Display for DisplayTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DisplayTarget::Locator(locator) => write!(f, "locator {locator}"),
            DisplayTarget::Section(href) => write!(f, "section {href}"),
            DisplayTarget::Start => f.write_str("document start"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpineItem {
    pub index: usize,
    pub href: String,
}

/// One table-of-contents entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavPoint {
    pub label: String,
    pub href: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

/// Viewport-space rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn center_x(&self) -> f64 {
        self.left + self.width / 2.0
    }
}

/// Access to the platform selection inside a rendered surface.
pub trait SelectionContents: fmt::Debug {
    fn selected_text(&self) -> Option<String>;
    /// Bounding box of the current selection, relative to the surface.
    fn selection_rect(&self) -> Option<Rect>;
    /// Position of the nested surface inside the viewer.
    fn surface_origin(&self) -> Point;
    /// Collapse the selection onto the word under `point`. Returns `false`
    /// when nothing selectable is there.
    fn select_word_at(&self, point: Point) -> bool;
}

#[derive(Debug, Clone)]
pub enum EngineEvent {
    Relocated(Relocation),
    Selected {
        range: Locator,
        contents: Rc<dyn SelectionContents>,
    },
    DoubleClick {
        point: Point,
        contents: Rc<dyn SelectionContents>,
    },
    MouseUp {
        contents: Rc<dyn SelectionContents>,
    },
    /// Click on the viewer that did not land on selectable text.
    ViewerClick,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineCommand {
    Display(DisplayTarget),
    Next,
    Prev,
}

pub type EventStream = mpsc::UnboundedReceiver<EngineEvent>;

#[async_trait(?Send)]
pub trait Rendition {
    fn subscribe(&self) -> EventStream;

    async fn issue(&self, command: EngineCommand) -> Result<(), EngineError>;

    /// Build the LocationsIndex. Must be idempotent: an already built index
    /// is kept and its length returned.
    async fn generate_locations(&self, chunk_size: usize) -> Result<usize, EngineError>;

    /// Zero while the index has not been built.
    fn locations_len(&self) -> usize;
    fn location_of(&self, locator: &Locator) -> Option<usize>;
    fn locator_at(&self, index: usize) -> Option<Locator>;

    fn spine(&self) -> Vec<SpineItem>;
    fn navigation(&self) -> Vec<NavPoint>;
    fn current_location(&self) -> Option<Relocation>;

    fn destroy(&self);
}

/// Title and author as found in the document, if any.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentMetadata {
    pub title: Option<String>,
    pub author: Option<String>,
}

#[async_trait(?Send)]
pub trait RenditionFactory {
    /// Resolves once the engine signals readiness.
    async fn open(&self, content: &[u8]) -> Result<Rc<dyn Rendition>, EngineError>;

    async fn read_metadata(&self, content: &[u8]) -> Result<DocumentMetadata, EngineError>;
}
