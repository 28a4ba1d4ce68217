use actix_web::{web, HttpResponse};
use crate::models::{
    BookResponse, CreateBookRequest, ListBooksQuery, ReserveRequest, UpdateBookRequest,
};
use crate::services::access_policy::{authorize, CatalogAction};
use crate::services::auth_service::Claims;
use crate::services::book_service;
use crate::state::AppState;
use crate::utils::AppError;

#[utoipa::path(
    get,
    path = "/api/books",
    tag = "Books",
    params(ListBooksQuery),
    responses(
        (status = 200, description = "Page of books (15 per page)", body = [BookResponse])
    )
)]
pub async fn list_books(
    state: web::Data<AppState>,
    query: web::Query<ListBooksQuery>,
) -> Result<HttpResponse, AppError> {
    log::info!("📚 GET /api/books - category: {:?}, page: {:?}", query.category, query.page);

    let books = book_service::list_books(state.books.as_ref(), &query).await?;
    Ok(HttpResponse::Ok().json(books))
}

#[utoipa::path(
    get,
    path = "/api/books/categories",
    tag = "Books",
    responses(
        (status = 200, description = "Distinct categories", body = [String])
    )
)]
pub async fn list_categories(state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    log::info!("🏷️  GET /api/books/categories");

    let categories = book_service::list_categories(state.books.as_ref()).await?;
    Ok(HttpResponse::Ok().json(categories))
}

#[utoipa::path(
    post,
    path = "/api/books",
    tag = "Books",
    request_body = CreateBookRequest,
    responses(
        (status = 201, description = "Book created", body = BookResponse),
        (status = 400, description = "Missing fields or duplicate ISBN"),
        (status = 401, description = "Missing or invalid token"),
        (status = 403, description = "Role may not create books")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn create_book(
    state: web::Data<AppState>,
    user: web::ReqData<Claims>,
    body: web::Json<CreateBookRequest>,
) -> Result<HttpResponse, AppError> {
    log::info!("➕ POST /api/books - isbn: {:?}, by: {}", body.isbn, user.sub);

    authorize(state.policy.as_ref(), &user, CatalogAction::CreateBook)?;

    let book = book_service::create_book(state.books.as_ref(), &body)
        .await
        .inspect_err(|e| log::warn!("❌ Create book failed: {}", e))?;

    log::info!("✅ Book created: {} ({})", book.id, book.isbn);
    Ok(HttpResponse::Created().json(book))
}

#[utoipa::path(
    put,
    path = "/api/books/{id}",
    tag = "Books",
    params(
        ("id" = String, Path, description = "Book id")
    ),
    request_body = UpdateBookRequest,
    responses(
        (status = 200, description = "Book updated", body = BookResponse),
        (status = 400, description = "Invalid field values"),
        (status = 401, description = "Missing or invalid token"),
        (status = 403, description = "Role may not update books"),
        (status = 404, description = "Book not found")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn update_book(
    state: web::Data<AppState>,
    user: web::ReqData<Claims>,
    path: web::Path<String>,
    body: web::Json<UpdateBookRequest>,
) -> Result<HttpResponse, AppError> {
    let book_id = path.into_inner();
    log::info!("✏️  PUT /api/books/{} - by: {}", book_id, user.sub);

    authorize(state.policy.as_ref(), &user, CatalogAction::UpdateBook)?;

    let book = book_service::update_book(state.books.as_ref(), &book_id, &body)
        .await
        .inspect_err(|e| log::warn!("❌ Update book {} failed: {}", book_id, e))?;

    Ok(HttpResponse::Ok().json(book))
}

#[utoipa::path(
    delete,
    path = "/api/books/{id}",
    tag = "Books",
    params(
        ("id" = String, Path, description = "Book id")
    ),
    responses(
        (status = 200, description = "Book deleted"),
        (status = 401, description = "Missing or invalid token"),
        (status = 403, description = "Role may not delete books"),
        (status = 404, description = "Book not found")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn delete_book(
    state: web::Data<AppState>,
    user: web::ReqData<Claims>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let book_id = path.into_inner();
    log::info!("🗑️  DELETE /api/books/{} - by: {}", book_id, user.sub);

    authorize(state.policy.as_ref(), &user, CatalogAction::DeleteBook)?;

    book_service::delete_book(state.books.as_ref(), &book_id)
        .await
        .inspect_err(|e| log::warn!("❌ Delete book {} failed: {}", book_id, e))?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "message": "Book deleted successfully"
    })))
}

#[utoipa::path(
    post,
    path = "/api/books/{id}/reserve",
    tag = "Books",
    params(
        ("id" = String, Path, description = "Book id")
    ),
    request_body = ReserveRequest,
    responses(
        (status = 200, description = "Copy reserved", body = BookResponse),
        (status = 400, description = "Missing/invalid user id or no copies left"),
        (status = 404, description = "Book not found")
    )
)]
pub async fn reserve_book(
    state: web::Data<AppState>,
    path: web::Path<String>,
    body: Option<web::Json<ReserveRequest>>,
) -> Result<HttpResponse, AppError> {
    let book_id = path.into_inner();
    // A missing or unreadable body is treated as a request without a user id
    let body = body.map(web::Json::into_inner).unwrap_or_default();
    log::info!("📕 POST /api/books/{}/reserve - user: {:?}", book_id, body.user_id);

    let book = book_service::reserve_book(state.books.as_ref(), &book_id, &body)
        .await
        .inspect_err(|e| log::warn!("❌ Reserve book {} failed: {}", book_id, e))?;

    Ok(HttpResponse::Ok().json(book))
}
