//! Persistent record store for books and saved vocabulary.
//!
//! The reader core only needs keyed CRUD over two record kinds. Writes to
//! books and to vocabulary are independent; nothing here is transactional
//! across the two.

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use crate::engine::Locator;
use crate::error::StoreError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type BookId = u64;
pub type WordId = u64;

/// Highest value `Book::progress` may take.
pub const MAX_PROGRESS: u8 = 100;

#[derive(Debug, Clone, PartialEq)]
pub struct Book {
    pub id: BookId,
    pub title: String,
    pub author: String,
    pub file_name: String,
    pub content: Vec<u8>,
    /// `None` until the book has been opened once.
    pub current_location: Option<Locator>,
    /// Whole percent in `[0, 100]`.
    pub progress: u8,
    pub added_at: DateTime<Utc>,
    pub last_read_at: DateTime<Utc>,
}

impl Book {
    pub fn apply(&mut self, update: &BookUpdate) {
        if let Some(location) = &update.current_location {
            self.current_location = Some(location.clone());
        }
        if let Some(progress) = update.progress {
            self.progress = progress.min(MAX_PROGRESS);
        }
        if let Some(read_at) = update.last_read_at {
            self.last_read_at = read_at;
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewBook {
    pub title: String,
    pub author: String,
    pub file_name: String,
    pub content: Vec<u8>,
    pub added_at: DateTime<Utc>,
}

impl NewBook {
    pub(crate) fn into_book(self, id: BookId) -> Book {
        Book {
            id,
            title: self.title,
            author: self.author,
            file_name: self.file_name,
            content: self.content,
            current_location: None,
            progress: 0,
            added_at: self.added_at,
            last_read_at: self.added_at,
        }
    }
}

/// Partial update; `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BookUpdate {
    pub current_location: Option<Locator>,
    pub progress: Option<u8>,
    pub last_read_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VocabularyWord {
    pub id: WordId,
    pub word: String,
    pub translation: String,
    pub book_id: BookId,
    pub context: String,
    pub added_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewVocabularyWord {
    pub word: String,
    pub translation: String,
    pub book_id: BookId,
    pub context: String,
    pub added_at: DateTime<Utc>,
}

impl NewVocabularyWord {
    pub(crate) fn into_word(self, id: WordId) -> VocabularyWord {
        VocabularyWord {
            id,
            word: self.word,
            translation: self.translation,
            book_id: self.book_id,
            context: self.context,
            added_at: self.added_at,
        }
    }
}

#[async_trait(?Send)]
pub trait BookStore {
    async fn add_book(&self, book: NewBook) -> Result<BookId, StoreError>;
    async fn get_book(&self, id: BookId) -> Result<Option<Book>, StoreError>;
    /// Fails with `StoreError::BookNotFound` for unknown ids.
    async fn update_book(&self, id: BookId, update: BookUpdate) -> Result<(), StoreError>;
    /// Deleting an unknown id is not an error.
    async fn delete_book(&self, id: BookId) -> Result<(), StoreError>;
    /// All books, most recently read first.
    async fn books_by_last_read(&self) -> Result<Vec<Book>, StoreError>;

    async fn add_word(&self, word: NewVocabularyWord) -> Result<WordId, StoreError>;
    async fn words_for_book(&self, book_id: BookId) -> Result<Vec<VocabularyWord>, StoreError>;
    /// Returns how many words were removed.
    async fn delete_words_for_book(&self, book_id: BookId) -> Result<usize, StoreError>;
}

pub(crate) fn sort_by_last_read(books: &mut [Book]) {
    books.sort_by(|a, b| b.last_read_at.cmp(&a.last_read_at).then(b.id.cmp(&a.id)));
}
