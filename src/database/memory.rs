//! In-process stores with the same contract as the MongoDB ones.
//!
//! Each operation runs under a single lock, so the reservation and
//! uniqueness guarantees hold exactly as they do with conditional writes.

use super::{BookStore, UserStore};
use crate::models::{Book, BookFilter, BookPatch, ReserveOutcome, User, DUPLICATE_ISBN, EMAIL_IN_USE};
use crate::utils::{AppError, Page};
use async_trait::async_trait;
use mongodb::bson::{oid::ObjectId, DateTime as BsonDateTime};
use std::sync::{Mutex, MutexGuard};

fn lock<T>(m: &Mutex<T>) -> Result<MutexGuard<'_, T>, AppError> {
    m.lock()
        .map_err(|_| AppError::Internal("In-memory store lock poisoned".into()))
}

#[derive(Default)]
pub struct InMemoryBookStore {
    books: Mutex<Vec<Book>>,
}

impl InMemoryBookStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BookStore for InMemoryBookStore {
    async fn list(&self, filter: &BookFilter, page: Page) -> Result<Vec<Book>, AppError> {
        let books = lock(&self.books)?;
        Ok(books
            .iter()
            .filter(|b| filter.matches(b))
            .skip(page.skip() as usize)
            .take(page.size as usize)
            .cloned()
            .collect())
    }

    async fn categories(&self) -> Result<Vec<String>, AppError> {
        let books = lock(&self.books)?;
        let mut categories: Vec<String> = Vec::new();
        for book in books.iter() {
            if !categories.contains(&book.category) {
                categories.push(book.category.clone());
            }
        }
        Ok(categories)
    }

    async fn find_by_id(&self, id: &ObjectId) -> Result<Option<Book>, AppError> {
        let books = lock(&self.books)?;
        Ok(books.iter().find(|b| b.id.as_ref() == Some(id)).cloned())
    }

    async fn find_by_isbn(&self, isbn: &str) -> Result<Option<Book>, AppError> {
        let books = lock(&self.books)?;
        Ok(books.iter().find(|b| b.isbn == isbn).cloned())
    }

    async fn insert(&self, mut book: Book) -> Result<Book, AppError> {
        let mut books = lock(&self.books)?;
        if books.iter().any(|b| b.isbn == book.isbn) {
            return Err(AppError::conflict(DUPLICATE_ISBN));
        }

        let now = BsonDateTime::now();
        book.id = Some(ObjectId::new());
        book.created_at = Some(now);
        book.updated_at = Some(now);
        books.push(book.clone());

        Ok(book)
    }

    async fn update(&self, id: &ObjectId, patch: &BookPatch) -> Result<Option<Book>, AppError> {
        let mut books = lock(&self.books)?;

        if let Some(isbn) = &patch.isbn {
            if books.iter().any(|b| &b.isbn == isbn && b.id.as_ref() != Some(id)) {
                return Err(AppError::conflict(DUPLICATE_ISBN));
            }
        }

        Ok(books.iter_mut().find(|b| b.id.as_ref() == Some(id)).map(|book| {
            patch.apply_to(book);
            book.updated_at = Some(BsonDateTime::now());
            book.clone()
        }))
    }

    async fn delete(&self, id: &ObjectId) -> Result<bool, AppError> {
        let mut books = lock(&self.books)?;
        let before = books.len();
        books.retain(|b| b.id.as_ref() != Some(id));
        Ok(books.len() < before)
    }

    async fn reserve(&self, id: &ObjectId, user_id: &ObjectId) -> Result<ReserveOutcome, AppError> {
        let mut books = lock(&self.books)?;

        let Some(book) = books.iter_mut().find(|b| b.id.as_ref() == Some(id)) else {
            return Ok(ReserveOutcome::NotFound);
        };
        if book.available_copies <= 0 {
            return Ok(ReserveOutcome::NoCopies);
        }

        book.available_copies -= 1;
        book.reserved_by.push(*user_id);
        book.updated_at = Some(BsonDateTime::now());

        Ok(ReserveOutcome::Reserved(book.clone()))
    }
}

#[derive(Default)]
pub struct InMemoryUserStore {
    users: Mutex<Vec<User>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn insert(&self, mut user: User) -> Result<User, AppError> {
        let mut users = lock(&self.users)?;
        if users.iter().any(|u| u.email == user.email) {
            return Err(AppError::conflict(EMAIL_IN_USE));
        }

        user.id = Some(ObjectId::new());
        user.created_at = Some(BsonDateTime::now());
        users.push(user.clone());

        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let users = lock(&self.users)?;
        Ok(users.iter().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, id: &ObjectId) -> Result<Option<User>, AppError> {
        let users = lock(&self.users)?;
        Ok(users.iter().find(|u| u.id.as_ref() == Some(id)).cloned())
    }
}
