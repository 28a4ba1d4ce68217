use crate::{
    config::AuthSettings,
    database::UserStore,
    models::{AuthResponse, LoginRequest, RegisterRequest, Role, User, UserView, EMAIL_IN_USE},
    utils::AppError,
};
use bcrypt::{hash, verify};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Same message for unknown email and wrong password.
pub const INVALID_CREDENTIALS: &str = "Invalid email or password";

// JWT Claims
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String,           // user _id (hex)
    pub email: String,
    pub role: Option<Role>,
    pub iat: usize,            // issued at
    pub exp: usize,            // expiration
    pub jti: String,           // JWT ID
    pub aud: String,           // audience
    pub iss: String,           // issuer
}

// Generate JWT token
pub fn generate_jwt(user: &User, settings: &AuthSettings) -> Result<String, AppError> {
    let now = Utc::now();
    let claims = Claims {
        sub: user.id.map(|id| id.to_hex()).unwrap_or_default(),
        email: user.email.clone(),
        role: user.role,
        iat: now.timestamp() as usize,
        exp: (now + Duration::hours(settings.token_ttl_hours)).timestamp() as usize,
        jti: Uuid::new_v4().to_string(),
        aud: settings.jwt_audience.clone(),
        iss: settings.jwt_issuer.clone(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(settings.jwt_secret.as_ref()),
    )
    .map_err(|e| AppError::Internal(format!("Failed to generate token: {}", e)))
}

// Verify JWT token
pub fn verify_token(token: &str, settings: &AuthSettings) -> Result<Claims, AppError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_audience(&[settings.jwt_audience.as_str()]);
    validation.set_issuer(&[settings.jwt_issuer.as_str()]);

    decode::<Claims>(
        token,
        &DecodingKey::from_secret(settings.jwt_secret.as_ref()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|e| {
        log::debug!("Token rejected: {}", e);
        AppError::Unauthorized("Invalid or expired token".to_string())
    })
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Hashes the password and stores a new user. Shared by registration and
/// the bootstrap admin seed.
pub async fn create_user(
    store: &dyn UserStore,
    settings: &AuthSettings,
    username: &str,
    email: &str,
    password: &str,
    role: Role,
) -> Result<User, AppError> {
    if store.find_by_email(email).await?.is_some() {
        return Err(AppError::conflict(EMAIL_IN_USE));
    }

    let hashed = hash(password, settings.bcrypt_cost)?;

    store
        .insert(User {
            id: None,
            username: username.to_string(),
            email: email.to_string(),
            password: hashed,
            role: Some(role),
            created_at: None,
        })
        .await
}

// User registration
pub async fn register(
    store: &dyn UserStore,
    settings: &AuthSettings,
    request: &RegisterRequest,
) -> Result<AuthResponse, AppError> {
    let (username, email, password) = match (
        non_blank(&request.username),
        non_blank(&request.email),
        request.password.as_deref().filter(|p| !p.is_empty()),
    ) {
        (Some(u), Some(e), Some(p)) => (u, e, p),
        _ => return Err(AppError::validation("All fields are required")),
    };

    let user = create_user(store, settings, username, email, password, Role::Student).await?;
    let token = generate_jwt(&user, settings)?;

    log::info!("✅ User registered successfully: {}", user.email);

    Ok(AuthResponse {
        success: true,
        message: "User registered successfully".to_string(),
        token,
        user: UserView::from(&user),
    })
}

// User login
pub async fn login(
    store: &dyn UserStore,
    settings: &AuthSettings,
    request: &LoginRequest,
) -> Result<AuthResponse, AppError> {
    let (email, password) = match (
        non_blank(&request.email),
        request.password.as_deref().filter(|p| !p.is_empty()),
    ) {
        (Some(e), Some(p)) => (e, p),
        _ => return Err(AppError::validation("Email and password are required")),
    };

    let user = store
        .find_by_email(email)
        .await?
        .ok_or_else(|| AppError::Unauthorized(INVALID_CREDENTIALS.to_string()))?;

    let valid = verify(password, &user.password).unwrap_or_else(|e| {
        log::warn!("⚠️  Stored password hash unreadable for {}: {}", user.email, e);
        false
    });
    if !valid {
        return Err(AppError::Unauthorized(INVALID_CREDENTIALS.to_string()));
    }

    let token = generate_jwt(&user, settings)?;

    Ok(AuthResponse {
        success: true,
        message: "Login successful".to_string(),
        token,
        user: UserView::from(&user),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::InMemoryUserStore;

    fn settings() -> AuthSettings {
        AuthSettings {
            bcrypt_cost: 4,
            ..Default::default()
        }
    }

    fn register_request(email: &str) -> RegisterRequest {
        RegisterRequest {
            username: Some("testuser".into()),
            email: Some(email.into()),
            password: Some("password123".into()),
        }
    }

    #[tokio::test]
    async fn test_register_then_login() {
        let store = InMemoryUserStore::new();
        let settings = settings();

        let registered = register(&store, &settings, &register_request("t@example.com"))
            .await
            .unwrap();
        assert_eq!(registered.user.role, Some(Role::Student));

        let stored = store.find_by_email("t@example.com").await.unwrap().unwrap();
        assert_ne!(stored.password, "password123");

        let logged_in = login(
            &store,
            &settings,
            &LoginRequest {
                email: Some("t@example.com".into()),
                password: Some("password123".into()),
            },
        )
        .await
        .unwrap();
        assert_eq!(logged_in.user.id, registered.user.id);

        let claims = verify_token(&logged_in.token, &settings).unwrap();
        assert_eq!(claims.sub, registered.user.id);
        assert_eq!(claims.role, Some(Role::Student));
    }

    #[tokio::test]
    async fn test_register_validation_and_duplicates() {
        let store = InMemoryUserStore::new();
        let settings = settings();

        let missing = RegisterRequest {
            username: Some("x".into()),
            ..Default::default()
        };
        let err = register(&store, &settings, &missing).await.unwrap_err();
        assert_eq!(err.to_string(), "All fields are required");

        register(&store, &settings, &register_request("dup@example.com")).await.unwrap();
        let err = register(&store, &settings, &register_request("dup@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
        assert_eq!(err.to_string(), EMAIL_IN_USE);
    }

    #[tokio::test]
    async fn test_login_failures_share_one_message() {
        let store = InMemoryUserStore::new();
        let settings = settings();
        register(&store, &settings, &register_request("a@example.com")).await.unwrap();

        let wrong_password = login(
            &store,
            &settings,
            &LoginRequest {
                email: Some("a@example.com".into()),
                password: Some("nope".into()),
            },
        )
        .await
        .unwrap_err();
        let unknown_email = login(
            &store,
            &settings,
            &LoginRequest {
                email: Some("ghost@example.com".into()),
                password: Some("password123".into()),
            },
        )
        .await
        .unwrap_err();

        assert!(matches!(wrong_password, AppError::Unauthorized(_)));
        assert_eq!(wrong_password.to_string(), unknown_email.to_string());

        let missing = login(&store, &settings, &LoginRequest::default()).await.unwrap_err();
        assert!(matches!(missing, AppError::Validation(_)));
    }

    #[test]
    fn test_token_from_other_issuer_rejected() {
        let user = User {
            id: Some(mongodb::bson::oid::ObjectId::new()),
            username: "u".into(),
            email: "u@example.com".into(),
            password: String::new(),
            role: Some(Role::Admin),
            created_at: None,
        };
        let foreign = AuthSettings {
            jwt_issuer: "someone-else".into(),
            ..settings()
        };
        let token = generate_jwt(&user, &foreign).unwrap();

        assert!(matches!(verify_token(&token, &settings()), Err(AppError::Unauthorized(_))));
        assert!(verify_token(&token, &foreign).is_ok());
    }
}
