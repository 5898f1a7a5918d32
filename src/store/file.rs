//! On-disk store: one TOML index plus content blobs.
//!
//! Layout under the data directory:
//! - `library.toml` holds every book record (without content) and every
//!   vocabulary word.
//! - `content/<sha256>.epub` holds raw document bytes, shared between
//!   records that uploaded identical files.

use super::{
    Book, BookId, BookStore, BookUpdate, NewBook, NewVocabularyWord, VocabularyWord, WordId,
    sort_by_last_read,
};
use crate::engine::Locator;
use crate::error::StoreError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

const INDEX_FILE: &str = "library.toml";
const CONTENT_DIR: &str = "content";

#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct LibraryIndex {
    #[serde(default)]
    last_book_id: BookId,
    #[serde(default)]
    last_word_id: WordId,
    #[serde(default)]
    books: Vec<BookRecord>,
    #[serde(default)]
    words: Vec<VocabularyWord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct BookRecord {
    id: BookId,
    title: String,
    author: String,
    file_name: String,
    content_digest: String,
    #[serde(default)]
    current_location: Option<Locator>,
    #[serde(default)]
    progress: u8,
    added_at: DateTime<Utc>,
    last_read_at: DateTime<Utc>,
}

impl BookRecord {
    fn into_book(self, content: Vec<u8>) -> Book {
        Book {
            id: self.id,
            title: self.title,
            author: self.author,
            file_name: self.file_name,
            content,
            current_location: self.current_location,
            progress: self.progress,
            added_at: self.added_at,
            last_read_at: self.last_read_at,
        }
    }

    fn apply(&mut self, update: &BookUpdate) {
        let mut book = self.clone().into_book(Vec::new());
        book.apply(update);
        self.current_location = book.current_location;
        self.progress = book.progress;
        self.last_read_at = book.last_read_at;
    }
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn index_path(&self) -> PathBuf {
        self.root.join(INDEX_FILE)
    }

    fn content_path(&self, digest: &str) -> PathBuf {
        self.root.join(CONTENT_DIR).join(format!("{digest}.epub"))
    }

    fn load_index(&self) -> Result<LibraryIndex, StoreError> {
        match fs::read_to_string(self.index_path()) {
            Ok(data) => Ok(toml::from_str(&data)?),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(LibraryIndex::default()),
            Err(err) => Err(err.into()),
        }
    }

    fn save_index(&self, index: &LibraryIndex) -> Result<(), StoreError> {
        fs::create_dir_all(&self.root)?;
        let contents = toml::to_string(index)?;
        fs::write(self.index_path(), contents)?;
        Ok(())
    }

    fn write_content(&self, content: &[u8]) -> Result<String, StoreError> {
        let digest = content_digest(content);
        let path = self.content_path(&digest);
        if !path.exists() {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&path, content)?;
        }
        Ok(digest)
    }

    fn remove_content(&self, digest: &str) {
        let path = self.content_path(digest);
        if let Err(err) = fs::remove_file(&path) {
            if err.kind() != ErrorKind::NotFound {
                warn!(path = %path.display(), "Failed to remove book content: {err}");
            }
        }
    }
}

fn content_digest(content: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content);
    format!("{:x}", hasher.finalize())
}

#[async_trait(?Send)]
impl BookStore for FileStore {
    async fn add_book(&self, book: NewBook) -> Result<BookId, StoreError> {
        let mut index = self.load_index()?;
        let digest = self.write_content(&book.content)?;
        index.last_book_id += 1;
        let id = index.last_book_id;
        index.books.push(BookRecord {
            id,
            title: book.title,
            author: book.author,
            file_name: book.file_name,
            content_digest: digest,
            current_location: None,
            progress: 0,
            added_at: book.added_at,
            last_read_at: book.added_at,
        });
        self.save_index(&index)?;
        debug!(book_id = id, root = %self.root.display(), "Stored book");
        Ok(id)
    }

    async fn get_book(&self, id: BookId) -> Result<Option<Book>, StoreError> {
        let index = self.load_index()?;
        let Some(record) = index.books.into_iter().find(|record| record.id == id) else {
            return Ok(None);
        };
        let content = fs::read(self.content_path(&record.content_digest))?;
        Ok(Some(record.into_book(content)))
    }

    async fn update_book(&self, id: BookId, update: BookUpdate) -> Result<(), StoreError> {
        let mut index = self.load_index()?;
        let record = index
            .books
            .iter_mut()
            .find(|record| record.id == id)
            .ok_or(StoreError::BookNotFound(id))?;
        record.apply(&update);
        self.save_index(&index)
    }

    async fn delete_book(&self, id: BookId) -> Result<(), StoreError> {
        let mut index = self.load_index()?;
        let Some(pos) = index.books.iter().position(|record| record.id == id) else {
            return Ok(());
        };
        let removed = index.books.remove(pos);
        self.save_index(&index)?;
        let shared = index
            .books
            .iter()
            .any(|record| record.content_digest == removed.content_digest);
        if !shared {
            self.remove_content(&removed.content_digest);
        }
        Ok(())
    }

    async fn books_by_last_read(&self) -> Result<Vec<Book>, StoreError> {
        let index = self.load_index()?;
        let mut books = Vec::with_capacity(index.books.len());
        for record in index.books {
            let content = fs::read(self.content_path(&record.content_digest))?;
            books.push(record.into_book(content));
        }
        sort_by_last_read(&mut books);
        Ok(books)
    }

    async fn add_word(&self, word: NewVocabularyWord) -> Result<WordId, StoreError> {
        let mut index = self.load_index()?;
        index.last_word_id += 1;
        let id = index.last_word_id;
        index.words.push(word.into_word(id));
        self.save_index(&index)?;
        Ok(id)
    }

    async fn words_for_book(&self, book_id: BookId) -> Result<Vec<VocabularyWord>, StoreError> {
        let index = self.load_index()?;
        Ok(index
            .words
            .into_iter()
            .filter(|word| word.book_id == book_id)
            .collect())
    }

    async fn delete_words_for_book(&self, book_id: BookId) -> Result<usize, StoreError> {
        let mut index = self.load_index()?;
        let before = index.words.len();
        index.words.retain(|word| word.book_id != book_id);
        let removed = before - index.words.len();
        if removed > 0 {
            self.save_index(&index)?;
        }
        Ok(removed)
    }
}
