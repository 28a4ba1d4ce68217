pub mod access_policy;
pub mod auth_service;
pub mod book_service;

pub use access_policy::{AccessPolicy, CatalogAction, RolePolicy};
