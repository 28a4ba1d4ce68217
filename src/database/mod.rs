pub mod books;
pub mod memory;
pub mod store;
pub mod users;

pub use books::MongoBookStore;
pub use memory::{InMemoryBookStore, InMemoryUserStore};
pub use store::{BookStore, UserStore};
pub use users::MongoUserStore;

use crate::config::DatabaseSettings;
use crate::utils::AppError;
use mongodb::error::{ErrorKind, WriteFailure};
use mongodb::{Client, Collection, Database};
use tokio::sync::OnceCell;

pub const BOOKS: &str = "books";
pub const USERS: &str = "users";

const DUPLICATE_KEY: i32 = 11000;

#[derive(Clone)]
pub struct MongoDB {
    db: Database,
}

impl MongoDB {
    pub async fn new(settings: &DatabaseSettings) -> Result<Self, AppError> {
        let mut client_options = mongodb::options::ClientOptions::parse(&settings.uri).await?;

        // Connection pool
        client_options.max_pool_size = Some(20);
        client_options.min_pool_size = Some(2);
        client_options.max_idle_time = Some(std::time::Duration::from_secs(300));

        client_options.connect_timeout = Some(std::time::Duration::from_secs(5));
        client_options.server_selection_timeout = Some(std::time::Duration::from_secs(5));
        client_options.app_name = Some("library-catalog".to_string());

        let client = Client::with_options(client_options)?;
        let db = client.database(&settings.name);

        // Test connection
        db.list_collection_names().await?;

        let mongodb = Self { db };
        mongodb.ensure_indexes().await;

        Ok(mongodb)
    }

    /// Unique indexes back the ISBN and email pre-checks, so concurrent
    /// inserts cannot both succeed. A collection that already holds
    /// duplicates cannot take the unique index; that is logged and startup
    /// continues with only the pre-checks in force.
    async fn ensure_indexes(&self) {
        use mongodb::bson::doc;
        use mongodb::options::IndexOptions;
        use mongodb::IndexModel;

        log::info!("🔧 Creating database indexes...");

        let books = self.collection::<mongodb::bson::Document>(BOOKS);

        let isbn_index = IndexModel::builder()
            .keys(doc! { "isbn": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();
        match books.create_index(isbn_index).await {
            Ok(_) => log::info!("   ✅ Index ready: books(isbn) unique"),
            Err(e) => log::warn!("   ⚠️  Could not create unique index books(isbn): {}", e),
        }

        let category_index = IndexModel::builder()
            .keys(doc! { "category": 1, "_id": 1 })
            .build();
        match books.create_index(category_index).await {
            Ok(_) => log::info!("   ✅ Index ready: books(category, _id)"),
            Err(e) => log::warn!("   ⚠️  Could not create index books(category, _id): {}", e),
        }

        let users = self.collection::<mongodb::bson::Document>(USERS);

        let email_index = IndexModel::builder()
            .keys(doc! { "email": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();
        match users.create_index(email_index).await {
            Ok(_) => log::info!("   ✅ Index ready: users(email) unique"),
            Err(e) => log::warn!("   ⚠️  Could not create unique index users(email): {}", e),
        }
    }

    pub fn collection<T: Send + Sync>(&self, name: &str) -> Collection<T> {
        self.db.collection(name)
    }

    pub async fn ping(&self) -> Result<(), AppError> {
        self.db.run_command(mongodb::bson::doc! { "ping": 1 }).await?;
        Ok(())
    }
}

/// Owned, lazily initialised handle to the shared MongoDB connection.
///
/// `init` connects on first use; later calls hand back the same client.
pub struct Connection {
    settings: DatabaseSettings,
    db: OnceCell<MongoDB>,
}

impl Connection {
    pub fn new(settings: DatabaseSettings) -> Self {
        Self {
            settings,
            db: OnceCell::new(),
        }
    }

    pub async fn init(&self) -> Result<&MongoDB, AppError> {
        if let Some(db) = self.db.get() {
            log::debug!("MongoDB already connected, reusing client");
            return Ok(db);
        }

        let db = self
            .db
            .get_or_try_init(|| async {
                log::info!("🔌 Connecting to MongoDB database '{}'...", self.settings.name);
                MongoDB::new(&self.settings).await
            })
            .await?;

        log::info!("✅ MongoDB connected: {}", self.settings.name);
        Ok(db)
    }

    pub fn is_connected(&self) -> bool {
        self.db.initialized()
    }
}

// insert_one reports E11000 as a write error, find_one_and_update as a command error
pub(crate) fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    match err.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(write_error)) => write_error.code == DUPLICATE_KEY,
        ErrorKind::Command(command_error) => command_error.code == DUPLICATE_KEY,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn local_settings() -> DatabaseSettings {
        DatabaseSettings {
            uri: std::env::var("MONGO_TEST_URI")
                .unwrap_or_else(|_| "mongodb://localhost:27017".to_string()),
            name: "library_catalog_test".to_string(),
        }
    }

    #[test]
    fn test_connection_starts_disconnected() {
        let conn = Connection::new(local_settings());
        assert!(!conn.is_connected());
    }

    #[tokio::test]
    #[ignore] // Requires MongoDB to be running
    async fn test_init_is_idempotent() {
        let conn = Connection::new(local_settings());

        let first = conn.init().await.expect("first connect") as *const MongoDB;
        let second = conn.init().await.expect("second connect") as *const MongoDB;

        assert!(conn.is_connected());
        assert_eq!(first, second);
    }

    #[tokio::test]
    #[ignore] // Requires MongoDB to be running
    async fn test_connects_despite_duplicate_isbns() {
        use mongodb::bson::{doc, Document};

        let mut settings = local_settings();
        settings.name = "library_catalog_test_duplicates".to_string();

        let raw = Client::with_uri_str(&settings.uri).await.expect("client");
        let books = raw.database(&settings.name).collection::<Document>(BOOKS);
        books.drop().await.expect("drop books");
        books
            .insert_many(vec![doc! { "isbn": "dup" }, doc! { "isbn": "dup" }])
            .await
            .expect("seed duplicates");

        let conn = Connection::new(settings);
        assert!(conn.init().await.is_ok());
        assert!(conn.is_connected());
    }
}
