use super::{is_duplicate_key, MongoDB, UserStore, USERS};
use crate::models::{User, EMAIL_IN_USE};
use crate::utils::AppError;
use async_trait::async_trait;
use mongodb::bson::{doc, oid::ObjectId, DateTime as BsonDateTime};
use mongodb::Collection;

#[derive(Clone)]
pub struct MongoUserStore {
    users: Collection<User>,
}

impl MongoUserStore {
    pub fn new(db: &MongoDB) -> Self {
        Self {
            users: db.collection::<User>(USERS),
        }
    }
}

#[async_trait]
impl UserStore for MongoUserStore {
    async fn insert(&self, mut user: User) -> Result<User, AppError> {
        user.id = None;
        user.created_at = Some(BsonDateTime::now());

        let result = self.users.insert_one(&user).await.map_err(|e| {
            if is_duplicate_key(&e) {
                AppError::conflict(EMAIL_IN_USE)
            } else {
                AppError::from(e)
            }
        })?;

        user.id = result.inserted_id.as_object_id();
        if user.id.is_none() {
            return Err(AppError::Internal("Inserted user id is not an ObjectId".into()));
        }

        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        Ok(self.users.find_one(doc! { "email": email }).await?)
    }

    async fn find_by_id(&self, id: &ObjectId) -> Result<Option<User>, AppError> {
        Ok(self.users.find_one(doc! { "_id": *id }).await?)
    }
}
