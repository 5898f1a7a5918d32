//! Reading-position tracking, navigation and word lookup for an EPUB reader.
//!
//! The crate sits between a rendering engine (which parses and lays out the
//! document) and a record store (which keeps books and vocabulary). It turns
//! engine relocations into page/progress numbers, resolves page and chapter
//! requests into display commands, and runs user selections through a cached
//! dictionary cascade.

pub mod config;
pub mod engine;
pub mod error;
pub mod generation;
pub mod library;
pub mod navigation;
pub mod pagination;
pub mod position;
pub mod reader;
pub mod selection;
pub mod store;
pub mod text_utils;
pub mod translation;

#[cfg(test)]
pub(crate) mod testing;
