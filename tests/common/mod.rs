//! Shared helpers for the HTTP tests: in-memory state and signed tokens.

#![allow(dead_code)]

use actix_web::web;
use library_catalog::config::AuthSettings;
use library_catalog::models::{Book, Role};
use library_catalog::services::auth_service;
use library_catalog::state::AppState;
use serde_json::{json, Value};

pub fn auth_settings() -> AuthSettings {
    AuthSettings {
        bcrypt_cost: 4,
        ..Default::default()
    }
}

pub fn state() -> web::Data<AppState> {
    web::Data::new(AppState::in_memory(auth_settings()))
}

/// Creates a user with `role` directly in the store and returns a bearer header value.
pub async fn bearer_for(state: &AppState, role: Role) -> String {
    let email = format!("{}@example.com", role);
    let user = auth_service::create_user(
        state.users.as_ref(),
        &state.auth,
        &role.to_string(),
        &email,
        "password123",
        role,
    )
    .await
    .expect("create user");
    let token = auth_service::generate_jwt(&user, &state.auth).expect("sign token");
    format!("Bearer {}", token)
}

pub fn book_payload(title: &str, isbn: &str, category: &str, copies: i64) -> Value {
    json!({
        "title": title,
        "authors": "Author",
        "isbn": isbn,
        "category": category,
        "description": "A test book",
        "thumbnail": "http://example.com/thumb.jpg",
        "publishedDate": "2020-01-01T00:00:00.000Z",
        "publisher": "Publisher",
        "availableCopies": copies
    })
}

/// Inserts straight into the store, bypassing HTTP and authorization.
pub async fn seed_book(state: &AppState, isbn: &str, category: &str, copies: i64) -> Book {
    state
        .books
        .insert(Book {
            id: None,
            title: format!("Book {}", isbn),
            authors: "Author".into(),
            isbn: isbn.into(),
            category: category.into(),
            description: None,
            thumbnail: None,
            published_date: None,
            publisher: None,
            available_copies: copies,
            reserved_by: vec![],
            created_at: None,
            updated_at: None,
        })
        .await
        .expect("seed book")
}
