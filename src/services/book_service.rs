use crate::{
    database::BookStore,
    models::{
        parse_published_date, Book, BookFilter, BookPatch, BookResponse, CreateBookRequest,
        ListBooksQuery, ReserveOutcome, ReserveRequest, UpdateBookRequest, DUPLICATE_ISBN,
    },
    utils::{AppError, Page},
};
use mongodb::bson::oid::ObjectId;
use serde_json::Value;

pub const BOOK_NOT_FOUND: &str = "Book not found";
pub const USER_ID_REQUIRED: &str = "User ID is required to reserve a book";
pub const INVALID_USER_ID: &str = "Invalid User ID format";
pub const NO_COPIES_AVAILABLE: &str = "No available copies to reserve";

const BAD_DATE: &str = "publishedDate must be an RFC 3339 timestamp or a YYYY-MM-DD date";
const NEGATIVE_COPIES: &str = "availableCopies must be a non-negative integer";

/// A book id that is not an ObjectId cannot resolve to a record.
pub fn parse_book_id(raw: &str) -> Result<ObjectId, AppError> {
    ObjectId::parse_str(raw.trim()).map_err(|_| AppError::not_found(BOOK_NOT_FOUND))
}

fn non_blank(value: Option<&String>) -> Option<String> {
    value.map(|v| v.trim()).filter(|v| !v.is_empty()).map(str::to_string)
}

fn parse_date(raw: Option<&String>) -> Result<Option<mongodb::bson::DateTime>, AppError> {
    match raw.map(|r| r.trim()).filter(|r| !r.is_empty()) {
        Some(r) => parse_published_date(r)
            .map(Some)
            .ok_or_else(|| AppError::validation(BAD_DATE)),
        None => Ok(None),
    }
}

pub async fn list_books(
    store: &dyn BookStore,
    query: &ListBooksQuery,
) -> Result<Vec<BookResponse>, AppError> {
    let filter = BookFilter {
        category: non_blank(query.category.as_ref()),
    };
    let page = Page::parse(query.page.as_deref());

    let books = store.list(&filter, page).await?;
    log::debug!(
        "📚 Listed {} books (category: {:?}, page: {})",
        books.len(),
        filter.category,
        page.number
    );

    Ok(books.into_iter().map(BookResponse::from).collect())
}

/// Distinct categories, sorted so repeated calls agree.
pub async fn list_categories(store: &dyn BookStore) -> Result<Vec<String>, AppError> {
    let mut categories = store.categories().await?;
    categories.sort();
    categories.dedup();
    Ok(categories)
}

pub async fn create_book(
    store: &dyn BookStore,
    request: &CreateBookRequest,
) -> Result<BookResponse, AppError> {
    let title = non_blank(request.title.as_ref());
    let authors = non_blank(request.authors.as_ref());
    let isbn = non_blank(request.isbn.as_ref());
    let category = non_blank(request.category.as_ref());

    let mut missing = Vec::new();
    if title.is_none() { missing.push("title"); }
    if authors.is_none() { missing.push("authors"); }
    if isbn.is_none() { missing.push("isbn"); }
    if category.is_none() { missing.push("category"); }
    if request.available_copies.is_none() { missing.push("availableCopies"); }

    let (Some(title), Some(authors), Some(isbn), Some(category), Some(available_copies)) =
        (title, authors, isbn, category, request.available_copies)
    else {
        return Err(AppError::validation(format!(
            "Missing required fields: {}",
            missing.join(", ")
        )));
    };

    if available_copies < 0 {
        return Err(AppError::validation(NEGATIVE_COPIES));
    }
    let published_date = parse_date(request.published_date.as_ref())?;

    if store.find_by_isbn(&isbn).await?.is_some() {
        return Err(AppError::conflict(DUPLICATE_ISBN));
    }

    let book = store
        .insert(Book {
            id: None,
            title,
            authors,
            isbn,
            category,
            description: non_blank(request.description.as_ref()),
            thumbnail: non_blank(request.thumbnail.as_ref()),
            published_date,
            publisher: non_blank(request.publisher.as_ref()),
            available_copies,
            reserved_by: Vec::new(),
            created_at: None,
            updated_at: None,
        })
        .await?;

    Ok(BookResponse::from(book))
}

fn build_patch(request: &UpdateBookRequest) -> Result<BookPatch, AppError> {
    let required = |value: Option<&String>, field: &str| -> Result<Option<String>, AppError> {
        match value {
            Some(v) if v.trim().is_empty() => {
                Err(AppError::validation(format!("{} cannot be empty", field)))
            }
            Some(v) => Ok(Some(v.trim().to_string())),
            None => Ok(None),
        }
    };

    if matches!(request.available_copies, Some(c) if c < 0) {
        return Err(AppError::validation(NEGATIVE_COPIES));
    }

    Ok(BookPatch {
        title: required(request.title.as_ref(), "title")?,
        authors: required(request.authors.as_ref(), "authors")?,
        isbn: required(request.isbn.as_ref(), "isbn")?,
        category: required(request.category.as_ref(), "category")?,
        description: request.description.clone(),
        thumbnail: request.thumbnail.clone(),
        published_date: parse_date(request.published_date.as_ref())?,
        publisher: request.publisher.clone(),
        available_copies: request.available_copies,
    })
}

pub async fn update_book(
    store: &dyn BookStore,
    id: &str,
    request: &UpdateBookRequest,
) -> Result<BookResponse, AppError> {
    let id = parse_book_id(id)?;
    let patch = build_patch(request)?;

    if let Some(isbn) = &patch.isbn {
        if let Some(owner) = store.find_by_isbn(isbn).await? {
            if owner.id != Some(id) {
                return Err(AppError::conflict(DUPLICATE_ISBN));
            }
        }
    }

    store
        .update(&id, &patch)
        .await?
        .map(BookResponse::from)
        .ok_or_else(|| AppError::not_found(BOOK_NOT_FOUND))
}

pub async fn delete_book(store: &dyn BookStore, id: &str) -> Result<(), AppError> {
    let id = parse_book_id(id)?;

    if store.delete(&id).await? {
        Ok(())
    } else {
        Err(AppError::not_found(BOOK_NOT_FOUND))
    }
}

/// Reserves one copy for `request.user_id`.
///
/// The user id is validated before the book is touched; the decrement and
/// the reservation record are written together by the store, so copies
/// never go below zero under concurrent requests.
pub async fn reserve_book(
    store: &dyn BookStore,
    id: &str,
    request: &ReserveRequest,
) -> Result<BookResponse, AppError> {
    let user_id = match &request.user_id {
        None | Some(Value::Null) => return Err(AppError::validation(USER_ID_REQUIRED)),
        Some(Value::String(raw)) if raw.trim().is_empty() => {
            return Err(AppError::validation(USER_ID_REQUIRED))
        }
        Some(Value::String(raw)) => ObjectId::parse_str(raw.trim())
            .map_err(|_| AppError::validation(INVALID_USER_ID))?,
        Some(_) => return Err(AppError::validation(INVALID_USER_ID)),
    };

    let book_id = parse_book_id(id)?;

    match store.reserve(&book_id, &user_id).await? {
        ReserveOutcome::Reserved(book) => {
            log::info!(
                "📕 Book {} reserved by {} ({} copies left)",
                book_id,
                user_id,
                book.available_copies
            );
            Ok(BookResponse::from(book))
        }
        ReserveOutcome::NoCopies => Err(AppError::conflict(NO_COPIES_AVAILABLE)),
        ReserveOutcome::NotFound => Err(AppError::not_found(BOOK_NOT_FOUND)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::InMemoryBookStore;

    fn create_request(isbn: &str, category: &str, copies: i64) -> CreateBookRequest {
        CreateBookRequest {
            title: Some(format!("Book {}", isbn)),
            authors: Some("Author".into()),
            isbn: Some(isbn.into()),
            category: Some(category.into()),
            published_date: Some("2020-01-01".into()),
            available_copies: Some(copies),
            ..Default::default()
        }
    }

    fn reserve_request(user: Option<&str>) -> ReserveRequest {
        ReserveRequest {
            user_id: user.map(|u| Value::String(u.to_string())),
        }
    }

    #[tokio::test]
    async fn test_create_reports_missing_fields() {
        let store = InMemoryBookStore::new();
        let request = CreateBookRequest {
            authors: Some("Author Missing Title".into()),
            ..Default::default()
        };

        let err = create_book(&store, &request).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(
            err.to_string(),
            "Missing required fields: title, isbn, category, availableCopies"
        );
    }

    #[tokio::test]
    async fn test_create_rejects_negative_copies_and_bad_dates() {
        let store = InMemoryBookStore::new();

        let err = create_book(&store, &create_request("1", "Fiction", -1)).await.unwrap_err();
        assert_eq!(err.to_string(), NEGATIVE_COPIES);

        let mut request = create_request("1", "Fiction", 1);
        request.published_date = Some("yesterday".into());
        let err = create_book(&store, &request).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_categories_are_distinct_and_sorted() {
        let store = InMemoryBookStore::new();
        assert!(list_categories(&store).await.unwrap().is_empty());

        for (isbn, category) in [("1", "Science"), ("2", "Fiction"), ("3", "Science")] {
            create_book(&store, &create_request(isbn, category, 1)).await.unwrap();
        }

        assert_eq!(list_categories(&store).await.unwrap(), vec!["Fiction", "Science"]);
    }

    #[tokio::test]
    async fn test_blank_category_means_no_filter() {
        let store = InMemoryBookStore::new();
        create_book(&store, &create_request("1", "Fiction", 1)).await.unwrap();
        create_book(&store, &create_request("2", "History", 1)).await.unwrap();

        let query = ListBooksQuery {
            category: Some("".into()),
            page: Some("abc".into()),
        };
        assert_eq!(list_books(&store, &query).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_update_rejects_blank_required_field() {
        let store = InMemoryBookStore::new();
        let created = create_book(&store, &create_request("1", "Fiction", 1)).await.unwrap();

        let request = UpdateBookRequest {
            title: Some("   ".into()),
            ..Default::default()
        };
        let err = update_book(&store, &created.id, &request).await.unwrap_err();
        assert_eq!(err.to_string(), "title cannot be empty");
    }

    #[tokio::test]
    async fn test_reserve_validates_user_before_book() {
        let store = InMemoryBookStore::new();
        let missing_book = ObjectId::new().to_hex();

        let err = reserve_book(&store, &missing_book, &reserve_request(None)).await.unwrap_err();
        assert_eq!(err.to_string(), USER_ID_REQUIRED);

        let err = reserve_book(&store, &missing_book, &reserve_request(Some("invalidUserId")))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), INVALID_USER_ID);

        let blank = reserve_request(Some("   "));
        let err = reserve_book(&store, &missing_book, &blank).await.unwrap_err();
        assert_eq!(err.to_string(), USER_ID_REQUIRED);

        let numeric = ReserveRequest { user_id: Some(serde_json::json!(42)) };
        let err = reserve_book(&store, &missing_book, &numeric).await.unwrap_err();
        assert_eq!(err.to_string(), INVALID_USER_ID);

        let user = ObjectId::new().to_hex();
        let err = reserve_book(&store, &missing_book, &reserve_request(Some(&user)))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        let err = reserve_book(&store, "not-an-id", &reserve_request(Some(&user)))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_reserve_at_zero_copies_does_not_mutate() {
        let store = InMemoryBookStore::new();
        let created = create_book(&store, &create_request("1", "Fiction", 0)).await.unwrap();
        let user = ObjectId::new().to_hex();

        let err = reserve_book(&store, &created.id, &reserve_request(Some(&user)))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), NO_COPIES_AVAILABLE);

        let stored = store
            .find_by_id(&parse_book_id(&created.id).unwrap())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.available_copies, 0);
        assert!(stored.reserved_by.is_empty());
    }
}
