use super::{
    Book, BookId, BookStore, BookUpdate, NewBook, NewVocabularyWord, VocabularyWord, WordId,
    sort_by_last_read,
};
use crate::error::StoreError;
use async_trait::async_trait;
use std::cell::RefCell;
use std::collections::BTreeMap;

/// Process-local store; ids start at 1.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RefCell<MemoryState>,
}

#[derive(Debug, Default)]
struct MemoryState {
    books: BTreeMap<BookId, Book>,
    words: BTreeMap<WordId, VocabularyWord>,
    last_book_id: BookId,
    last_word_id: WordId,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait(?Send)]
impl BookStore for MemoryStore {
    async fn add_book(&self, book: NewBook) -> Result<BookId, StoreError> {
        let mut state = self.state.borrow_mut();
        state.last_book_id += 1;
        let id = state.last_book_id;
        state.books.insert(id, book.into_book(id));
        Ok(id)
    }

    async fn get_book(&self, id: BookId) -> Result<Option<Book>, StoreError> {
        Ok(self.state.borrow().books.get(&id).cloned())
    }

    async fn update_book(&self, id: BookId, update: BookUpdate) -> Result<(), StoreError> {
        let mut state = self.state.borrow_mut();
        let book = state
            .books
            .get_mut(&id)
            .ok_or(StoreError::BookNotFound(id))?;
        book.apply(&update);
        Ok(())
    }

    async fn delete_book(&self, id: BookId) -> Result<(), StoreError> {
        self.state.borrow_mut().books.remove(&id);
        Ok(())
    }

    async fn books_by_last_read(&self) -> Result<Vec<Book>, StoreError> {
        let mut books: Vec<Book> = self.state.borrow().books.values().cloned().collect();
        sort_by_last_read(&mut books);
        Ok(books)
    }

    async fn add_word(&self, word: NewVocabularyWord) -> Result<WordId, StoreError> {
        let mut state = self.state.borrow_mut();
        state.last_word_id += 1;
        let id = state.last_word_id;
        state.words.insert(id, word.into_word(id));
        Ok(id)
    }

    async fn words_for_book(&self, book_id: BookId) -> Result<Vec<VocabularyWord>, StoreError> {
        Ok(self
            .state
            .borrow()
            .words
            .values()
            .filter(|word| word.book_id == book_id)
            .cloned()
            .collect())
    }

    async fn delete_words_for_book(&self, book_id: BookId) -> Result<usize, StoreError> {
        let mut state = self.state.borrow_mut();
        let before = state.words.len();
        state.words.retain(|_, word| word.book_id != book_id);
        Ok(before - state.words.len())
    }
}
