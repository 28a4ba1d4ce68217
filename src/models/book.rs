use mongodb::bson::{oid::ObjectId, DateTime as BsonDateTime};
use serde::{Deserialize, Serialize};

pub const DUPLICATE_ISBN: &str = "A book with this ISBN already exists";

/// Livro do catálogo (armazenado no MongoDB, collection `books`)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,

    pub title: String,

    pub authors: String,

    /// Unique across the collection (unique index `books(isbn)`)
    pub isbn: String,

    pub category: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_date: Option<BsonDateTime>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publisher: Option<String>,

    /// Never negative
    pub available_copies: i64,

    /// Users holding a reservation, in reservation order
    #[serde(default)]
    pub reserved_by: Vec<ObjectId>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<BsonDateTime>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<BsonDateTime>,
}

/// Request para criar livro. Campos obrigatórios são validados no service
/// para que ausências virem 400 com mensagem própria.
#[derive(Debug, Default, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookRequest {
    pub title: Option<String>,
    pub authors: Option<String>,
    pub isbn: Option<String>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub thumbnail: Option<String>,
    /// RFC 3339 timestamp or `YYYY-MM-DD`
    pub published_date: Option<String>,
    pub publisher: Option<String>,
    pub available_copies: Option<i64>,
}

/// Request para atualizar livro (patch parcial)
#[derive(Debug, Default, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBookRequest {
    pub title: Option<String>,
    pub authors: Option<String>,
    pub isbn: Option<String>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub thumbnail: Option<String>,
    pub published_date: Option<String>,
    pub publisher: Option<String>,
    pub available_copies: Option<i64>,
}

/// Validated patch handed to the store. `None` leaves the field untouched.
#[derive(Debug, Default, Clone)]
pub struct BookPatch {
    pub title: Option<String>,
    pub authors: Option<String>,
    pub isbn: Option<String>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub thumbnail: Option<String>,
    pub published_date: Option<BsonDateTime>,
    pub publisher: Option<String>,
    pub available_copies: Option<i64>,
}

impl BookPatch {
    pub fn apply_to(&self, book: &mut Book) {
        if let Some(title) = &self.title { book.title = title.clone(); }
        if let Some(authors) = &self.authors { book.authors = authors.clone(); }
        if let Some(isbn) = &self.isbn { book.isbn = isbn.clone(); }
        if let Some(category) = &self.category { book.category = category.clone(); }
        if let Some(description) = &self.description { book.description = Some(description.clone()); }
        if let Some(thumbnail) = &self.thumbnail { book.thumbnail = Some(thumbnail.clone()); }
        if let Some(date) = self.published_date { book.published_date = Some(date); }
        if let Some(publisher) = &self.publisher { book.publisher = Some(publisher.clone()); }
        if let Some(copies) = self.available_copies { book.available_copies = copies; }
    }
}

/// Filtro da listagem
#[derive(Debug, Default, Clone)]
pub struct BookFilter {
    pub category: Option<String>,
}

impl BookFilter {
    pub fn matches(&self, book: &Book) -> bool {
        match &self.category {
            Some(category) => &book.category == category,
            None => true,
        }
    }
}

/// Query string de `GET /api/books`. `page` fica como texto para que
/// valores inválidos caiam na página 1 em vez de gerar 400.
#[derive(Debug, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListBooksQuery {
    /// Exact category match
    pub category: Option<String>,
    /// 1-based page number, 15 books per page
    pub page: Option<String>,
}

/// Body of `POST /api/books/{id}/reserve`. `userId` is kept as raw JSON so
/// a non-string value is reported as a bad id rather than a bad body.
#[derive(Debug, Default, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReserveRequest {
    #[schema(value_type = Option<String>, example = "64b7f0c2e4b0a1a2b3c4d5e6")]
    pub user_id: Option<serde_json::Value>,
}

/// Outcome of the atomic conditional reservation write.
#[derive(Debug)]
pub enum ReserveOutcome {
    Reserved(Book),
    NoCopies,
    NotFound,
}

/// Response de livro
#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BookResponse {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    pub authors: String,
    pub isbn: String,
    pub category: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub publisher: Option<String>,
    pub available_copies: i64,
    pub reserved_by: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

fn rfc3339(date: Option<BsonDateTime>) -> Option<String> {
    date.and_then(|d| d.try_to_rfc3339_string().ok())
}

impl From<Book> for BookResponse {
    fn from(b: Book) -> Self {
        BookResponse {
            id: b.id.map(|id| id.to_hex()).unwrap_or_default(),
            title: b.title,
            authors: b.authors,
            isbn: b.isbn,
            category: b.category,
            description: b.description,
            thumbnail: b.thumbnail,
            published_date: rfc3339(b.published_date),
            publisher: b.publisher,
            available_copies: b.available_copies,
            reserved_by: b.reserved_by.iter().map(|id| id.to_hex()).collect(),
            created_at: rfc3339(b.created_at),
            updated_at: rfc3339(b.updated_at),
        }
    }
}

/// Parses `publishedDate` as a full RFC 3339 timestamp or a plain calendar date.
pub fn parse_published_date(raw: &str) -> Option<BsonDateTime> {
    let raw = raw.trim();
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(raw) {
        return Some(BsonDateTime::from_millis(dt.timestamp_millis()));
    }
    chrono::NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| BsonDateTime::from_millis(dt.and_utc().timestamp_millis()))
}
