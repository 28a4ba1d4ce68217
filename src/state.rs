use crate::{
    config::AuthSettings,
    database::{BookStore, InMemoryBookStore, InMemoryUserStore, MongoDB, UserStore},
    services::{AccessPolicy, RolePolicy},
};
use std::sync::Arc;

/// Shared application state, registered once as `web::Data<AppState>`.
pub struct AppState {
    pub books: Arc<dyn BookStore>,
    pub users: Arc<dyn UserStore>,
    pub policy: Arc<dyn AccessPolicy>,
    pub auth: AuthSettings,
    /// Present when backed by MongoDB; used by the health check
    pub database: Option<MongoDB>,
}

impl AppState {
    pub fn new(
        books: Arc<dyn BookStore>,
        users: Arc<dyn UserStore>,
        policy: Arc<dyn AccessPolicy>,
        auth: AuthSettings,
    ) -> Self {
        Self {
            books,
            users,
            policy,
            auth,
            database: None,
        }
    }

    /// State over fresh in-memory stores and the default role policy.
    pub fn in_memory(auth: AuthSettings) -> Self {
        Self::new(
            Arc::new(InMemoryBookStore::new()),
            Arc::new(InMemoryUserStore::new()),
            Arc::new(RolePolicy),
            auth,
        )
    }

    pub fn with_database(mut self, db: MongoDB) -> Self {
        self.database = Some(db);
        self
    }
}
