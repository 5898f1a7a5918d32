//! Library-level operations over the record store: import, listing, delete
//! with vocabulary cascade.

use crate::engine::RenditionFactory;
use crate::store::{Book, BookId, BookStore, NewBook, VocabularyWord};
use anyhow::{Context, Result, bail};
use chrono::Utc;
use tracing::{info, warn};

pub const UNKNOWN_TITLE: &str = "Unknown Title";
pub const UNKNOWN_AUTHOR: &str = "Unknown Author";

pub fn is_epub_file_name(file_name: &str) -> bool {
    file_name.to_ascii_lowercase().ends_with(".epub")
}

/// Human-readable size with up to two decimals (`1.5 KB`, `0 Bytes`).
pub fn format_file_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];
    if bytes == 0 {
        return "0 Bytes".to_string();
    }
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    let formatted = format!("{value:.2}");
    let trimmed = formatted.trim_end_matches('0').trim_end_matches('.');
    format!("{trimmed} {}", UNITS[unit])
}

fn or_placeholder(value: Option<String>, placeholder: &str) -> String {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| placeholder.to_string())
}

/// Store an uploaded document. Metadata comes from the engine; missing or
/// unreadable metadata falls back to placeholders.
pub async fn import_book(
    store: &dyn BookStore,
    factory: &dyn RenditionFactory,
    file_name: &str,
    content: Vec<u8>,
) -> Result<BookId> {
    if !is_epub_file_name(file_name) {
        bail!("{file_name} is not an .epub file");
    }

    let metadata = match factory.read_metadata(&content).await {
        Ok(metadata) => metadata,
        Err(err) => {
            warn!(file_name, "Error extracting metadata: {err}");
            Default::default()
        }
    };

    let size = content.len() as u64;
    let book = NewBook {
        title: or_placeholder(metadata.title, UNKNOWN_TITLE),
        author: or_placeholder(metadata.author, UNKNOWN_AUTHOR),
        file_name: file_name.to_string(),
        content,
        added_at: Utc::now(),
    };
    let title = book.title.clone();
    let id = store
        .add_book(book)
        .await
        .with_context(|| format!("failed to store {file_name}"))?;
    info!(book_id = id, title = %title, size = %format_file_size(size), "Imported book");
    Ok(id)
}

/// All books, most recently read first.
pub async fn list_books(store: &dyn BookStore) -> Result<Vec<Book>> {
    store
        .books_by_last_read()
        .await
        .context("failed to list books")
}

/// Delete a book and every vocabulary word saved from it.
pub async fn delete_book(store: &dyn BookStore, id: BookId) -> Result<usize> {
    store
        .delete_book(id)
        .await
        .with_context(|| format!("failed to delete book {id}"))?;
    let removed = store
        .delete_words_for_book(id)
        .await
        .with_context(|| format!("failed to delete vocabulary of book {id}"))?;
    info!(book_id = id, words = removed, "Deleted book");
    Ok(removed)
}

/// Saved words of one book, newest first.
pub async fn vocabulary_for_book(
    store: &dyn BookStore,
    book_id: BookId,
) -> Result<Vec<VocabularyWord>> {
    let mut words = store
        .words_for_book(book_id)
        .await
        .with_context(|| format!("failed to load vocabulary of book {book_id}"))?;
    words.sort_by(|a, b| b.added_at.cmp(&a.added_at).then(b.id.cmp(&a.id)));
    Ok(words)
}
