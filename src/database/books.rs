use super::{is_duplicate_key, BookStore, MongoDB, BOOKS};
use crate::models::{Book, BookFilter, BookPatch, ReserveOutcome, DUPLICATE_ISBN};
use crate::utils::{AppError, Page};
use async_trait::async_trait;
use futures::stream::TryStreamExt;
use mongodb::bson::{doc, oid::ObjectId, DateTime as BsonDateTime, Document};
use mongodb::options::ReturnDocument;
use mongodb::Collection;

#[derive(Clone)]
pub struct MongoBookStore {
    books: Collection<Book>,
}

impl MongoBookStore {
    pub fn new(db: &MongoDB) -> Self {
        Self {
            books: db.collection::<Book>(BOOKS),
        }
    }
}

fn map_write_error(e: mongodb::error::Error) -> AppError {
    if is_duplicate_key(&e) {
        AppError::conflict(DUPLICATE_ISBN)
    } else {
        AppError::from(e)
    }
}

fn set_document(patch: &BookPatch) -> Document {
    let mut update_doc = doc! { "updatedAt": BsonDateTime::now() };

    if let Some(title) = &patch.title { update_doc.insert("title", title); }
    if let Some(authors) = &patch.authors { update_doc.insert("authors", authors); }
    if let Some(isbn) = &patch.isbn { update_doc.insert("isbn", isbn); }
    if let Some(category) = &patch.category { update_doc.insert("category", category); }
    if let Some(description) = &patch.description { update_doc.insert("description", description); }
    if let Some(thumbnail) = &patch.thumbnail { update_doc.insert("thumbnail", thumbnail); }
    if let Some(date) = patch.published_date { update_doc.insert("publishedDate", date); }
    if let Some(publisher) = &patch.publisher { update_doc.insert("publisher", publisher); }
    if let Some(copies) = patch.available_copies { update_doc.insert("availableCopies", copies); }

    update_doc
}

#[async_trait]
impl BookStore for MongoBookStore {
    async fn list(&self, filter: &BookFilter, page: Page) -> Result<Vec<Book>, AppError> {
        let mut query = doc! {};
        if let Some(category) = &filter.category {
            query.insert("category", category);
        }

        // Offsets beyond i64 cannot be sent to the server and match nothing anyway
        let Some(skip) = page.driver_skip() else {
            return Ok(Vec::new());
        };

        let cursor = self
            .books
            .find(query)
            .sort(doc! { "_id": 1 })
            .skip(skip)
            .limit(page.size as i64)
            .await?;

        Ok(cursor.try_collect().await?)
    }

    async fn categories(&self) -> Result<Vec<String>, AppError> {
        let values = self.books.distinct("category", doc! {}).await?;

        Ok(values
            .into_iter()
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect())
    }

    async fn find_by_id(&self, id: &ObjectId) -> Result<Option<Book>, AppError> {
        Ok(self.books.find_one(doc! { "_id": *id }).await?)
    }

    async fn find_by_isbn(&self, isbn: &str) -> Result<Option<Book>, AppError> {
        Ok(self.books.find_one(doc! { "isbn": isbn }).await?)
    }

    async fn insert(&self, mut book: Book) -> Result<Book, AppError> {
        let now = BsonDateTime::now();
        book.id = None;
        book.created_at = Some(now);
        book.updated_at = Some(now);

        let result = self.books.insert_one(&book).await.map_err(map_write_error)?;

        let id = result
            .inserted_id
            .as_object_id()
            .ok_or_else(|| AppError::Internal("Inserted book id is not an ObjectId".into()))?;
        book.id = Some(id);

        Ok(book)
    }

    async fn update(&self, id: &ObjectId, patch: &BookPatch) -> Result<Option<Book>, AppError> {
        self.books
            .find_one_and_update(doc! { "_id": *id }, doc! { "$set": set_document(patch) })
            .return_document(ReturnDocument::After)
            .await
            .map_err(map_write_error)
    }

    async fn delete(&self, id: &ObjectId) -> Result<bool, AppError> {
        let result = self.books.delete_one(doc! { "_id": *id }).await?;
        Ok(result.deleted_count > 0)
    }

    async fn reserve(&self, id: &ObjectId, user_id: &ObjectId) -> Result<ReserveOutcome, AppError> {
        let updated = self
            .books
            .find_one_and_update(
                doc! { "_id": *id, "availableCopies": { "$gt": 0 } },
                doc! {
                    "$inc": { "availableCopies": -1 },
                    "$push": { "reservedBy": *user_id },
                    "$set": { "updatedAt": BsonDateTime::now() },
                },
            )
            .return_document(ReturnDocument::After)
            .await?;

        if let Some(book) = updated {
            return Ok(ReserveOutcome::Reserved(book));
        }

        // Nothing matched: either the book is gone or it has no copies left
        match self.find_by_id(id).await? {
            Some(_) => Ok(ReserveOutcome::NoCopies),
            None => Ok(ReserveOutcome::NotFound),
        }
    }
}
