use crate::models::{Book, BookFilter, BookPatch, ReserveOutcome, User};
use crate::utils::{AppError, Page};
use async_trait::async_trait;
use mongodb::bson::oid::ObjectId;

/// Persistence seam for the `books` collection.
#[async_trait]
pub trait BookStore: Send + Sync {
    /// Page of books in ascending `_id` (creation) order.
    async fn list(&self, filter: &BookFilter, page: Page) -> Result<Vec<Book>, AppError>;

    /// Distinct category values, unordered.
    async fn categories(&self) -> Result<Vec<String>, AppError>;

    async fn find_by_id(&self, id: &ObjectId) -> Result<Option<Book>, AppError>;

    async fn find_by_isbn(&self, isbn: &str) -> Result<Option<Book>, AppError>;

    /// Inserts and returns the stored record with its generated id.
    /// A duplicate ISBN yields `AppError::Conflict`.
    async fn insert(&self, book: Book) -> Result<Book, AppError>;

    /// Applies the patch and returns the updated record, `None` if absent.
    async fn update(&self, id: &ObjectId, patch: &BookPatch) -> Result<Option<Book>, AppError>;

    /// `true` when a record was removed.
    async fn delete(&self, id: &ObjectId) -> Result<bool, AppError>;

    /// Decrements `availableCopies` and records `user_id` in a single
    /// conditional write that only matches while copies remain.
    async fn reserve(&self, id: &ObjectId, user_id: &ObjectId) -> Result<ReserveOutcome, AppError>;
}

/// Persistence seam for the `users` collection.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// A duplicate email yields `AppError::Conflict`.
    async fn insert(&self, user: User) -> Result<User, AppError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError>;

    async fn find_by_id(&self, id: &ObjectId) -> Result<Option<User>, AppError>;
}
