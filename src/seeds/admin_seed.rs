use crate::config::{AuthSettings, BootstrapAdmin};
use crate::database::UserStore;
use crate::models::Role;
use crate::services::auth_service;

/// Creates the configured bootstrap admin if no user owns that email yet.
/// Failures are logged; startup continues either way.
pub async fn seed_bootstrap_admin(
    users: &dyn UserStore,
    admin: Option<&BootstrapAdmin>,
    auth: &AuthSettings,
) {
    let Some(admin) = admin else {
        log::debug!("👤 No bootstrap admin configured, skipping seed");
        return;
    };

    match users.find_by_email(&admin.email).await {
        Ok(Some(_)) => {
            log::info!("👤 Bootstrap admin {} already exists, skipping seed", admin.email);
            return;
        }
        Ok(None) => {}
        Err(e) => {
            log::error!("   ❌ Failed to look up bootstrap admin: {}", e);
            return;
        }
    }

    match auth_service::create_user(users, auth, &admin.username, &admin.email, &admin.password, Role::Admin).await {
        Ok(user) => log::info!("   ✅ Bootstrap admin created: {}", user.email),
        Err(e) => log::error!("   ❌ Failed to seed bootstrap admin: {}", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::InMemoryUserStore;

    #[tokio::test]
    async fn test_seed_creates_admin_once() {
        let store = InMemoryUserStore::new();
        let auth = AuthSettings { bcrypt_cost: 4, ..Default::default() };
        let admin = BootstrapAdmin {
            username: "admin".into(),
            email: "admin@library.test".into(),
            password: "changeme".into(),
        };

        seed_bootstrap_admin(&store, Some(&admin), &auth).await;
        let first = store.find_by_email("admin@library.test").await.unwrap().unwrap();
        assert_eq!(first.role, Some(Role::Admin));

        seed_bootstrap_admin(&store, Some(&admin), &auth).await;
        let second = store.find_by_email("admin@library.test").await.unwrap().unwrap();
        assert_eq!(first.id, second.id);
    }

    #[tokio::test]
    async fn test_seed_without_config_is_noop() {
        let store = InMemoryUserStore::new();
        seed_bootstrap_admin(&store, None, &AuthSettings::default()).await;
        assert!(store.find_by_email("admin@library.test").await.unwrap().is_none());
    }
}
