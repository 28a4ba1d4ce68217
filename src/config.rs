use crate::utils::AppError;
use std::env;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
    /// Test runs build the app but never bind a socket
    Test,
}

impl Environment {
    fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "test" => Environment::Test,
            "production" | "prod" => Environment::Production,
            _ => Environment::Development,
        }
    }

    pub fn is_test(&self) -> bool {
        *self == Environment::Test
    }
}

#[derive(Debug, Clone)]
pub struct DatabaseSettings {
    pub uri: String,
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct AuthSettings {
    pub jwt_secret: String,
    pub jwt_issuer: String,
    pub jwt_audience: String,
    pub token_ttl_hours: i64,
    pub bcrypt_cost: u32,
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            jwt_secret: "default-secret-change-me".to_string(),
            jwt_issuer: "library-catalog".to_string(),
            jwt_audience: "library-api".to_string(),
            token_ttl_hours: 24,
            bcrypt_cost: bcrypt::DEFAULT_COST,
        }
    }
}

#[derive(Debug, Clone)]
pub struct BootstrapAdmin {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub host: String,
    pub port: u16,
    pub environment: Environment,
    pub database: DatabaseSettings,
    pub auth: AuthSettings,
    pub cors_origins: Vec<String>,
    pub bootstrap_admin: Option<BootstrapAdmin>,
}

impl Settings {
    /// Reads the process environment. `main` loads `.env` beforehand.
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let uri = get("MONGO_URI")
            .or_else(|| get("DATABASE_URL"))
            .ok_or_else(|| AppError::Config("MONGO_URI (or DATABASE_URL) must be set".into()))?;

        let name = get("DATABASE_NAME").unwrap_or_else(|| database_name_from_uri(&uri));

        let port = match get("PORT") {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .map_err(|_| AppError::Config(format!("PORT is not a valid port: {}", raw)))?,
            None => 5000,
        };

        let defaults = AuthSettings::default();
        let token_ttl_hours = match get("JWT_TTL_HOURS") {
            Some(raw) => raw
                .trim()
                .parse::<i64>()
                .ok()
                .filter(|h| *h > 0)
                .ok_or_else(|| AppError::Config(format!("JWT_TTL_HOURS must be a positive integer: {}", raw)))?,
            None => defaults.token_ttl_hours,
        };
        let bcrypt_cost = match get("BCRYPT_COST") {
            Some(raw) => raw
                .trim()
                .parse::<u32>()
                .ok()
                .filter(|c| (4..=31).contains(c))
                .ok_or_else(|| AppError::Config(format!("BCRYPT_COST must be between 4 and 31: {}", raw)))?,
            None => defaults.bcrypt_cost,
        };

        let auth = AuthSettings {
            jwt_secret: get("JWT_SECRET").unwrap_or(defaults.jwt_secret),
            jwt_issuer: get("JWT_ISSUER").unwrap_or(defaults.jwt_issuer),
            jwt_audience: get("JWT_AUDIENCE").unwrap_or(defaults.jwt_audience),
            token_ttl_hours,
            bcrypt_cost,
        };

        let cors_origins = get("CORS_ALLOWED_ORIGINS")
            .map(|raw| {
                raw.split(',')
                    .map(|o| o.trim().to_string())
                    .filter(|o| !o.is_empty())
                    .collect()
            })
            .unwrap_or_else(|| vec!["http://localhost:3000".to_string()]);

        let bootstrap_admin = match (get("BOOTSTRAP_ADMIN_EMAIL"), get("BOOTSTRAP_ADMIN_PASSWORD")) {
            (Some(email), Some(password)) => Some(BootstrapAdmin {
                username: get("BOOTSTRAP_ADMIN_USERNAME").unwrap_or_else(|| "admin".to_string()),
                email,
                password,
            }),
            _ => None,
        };

        Ok(Settings {
            host: get("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port,
            environment: get("APP_ENV")
                .map(|v| Environment::parse(&v))
                .unwrap_or(Environment::Development),
            database: DatabaseSettings { uri, name },
            auth,
            cors_origins,
            bootstrap_admin,
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

// Extract database name from URI or use default
fn database_name_from_uri(uri: &str) -> String {
    uri.trim_start_matches("mongodb+srv://")
        .trim_start_matches("mongodb://")
        .split_once('/')
        .map(|(_, rest)| rest.split('?').next().unwrap_or(""))
        .filter(|name| !name.is_empty())
        .unwrap_or("library")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn settings(vars: &[(&str, &str)]) -> Result<Settings, AppError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Settings::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_requires_connection_string() {
        assert!(matches!(settings(&[]), Err(AppError::Config(_))));
    }

    #[test]
    fn test_defaults() {
        let s = settings(&[("MONGO_URI", "mongodb://localhost:27017")]).unwrap();
        assert_eq!(s.port, 5000);
        assert_eq!(s.database.name, "library");
        assert_eq!(s.environment, Environment::Development);
        assert_eq!(s.auth.token_ttl_hours, 24);
        assert!(s.bootstrap_admin.is_none());
        assert_eq!(s.cors_origins, vec!["http://localhost:3000".to_string()]);
    }

    #[test]
    fn test_database_name_from_uri_path() {
        let s = settings(&[("DATABASE_URL", "mongodb://db:27017/catalog?retryWrites=true")]).unwrap();
        assert_eq!(s.database.name, "catalog");

        let s = settings(&[
            ("MONGO_URI", "mongodb://db:27017/catalog"),
            ("DATABASE_NAME", "override"),
        ])
        .unwrap();
        assert_eq!(s.database.name, "override");
    }

    #[test]
    fn test_test_environment_and_overrides() {
        let s = settings(&[
            ("MONGO_URI", "mongodb://localhost"),
            ("APP_ENV", "test"),
            ("PORT", "8080"),
            ("CORS_ALLOWED_ORIGINS", "http://a.test, http://b.test,"),
            ("BOOTSTRAP_ADMIN_EMAIL", "root@library.test"),
            ("BOOTSTRAP_ADMIN_PASSWORD", "s3cret"),
        ])
        .unwrap();
        assert!(s.environment.is_test());
        assert_eq!(s.bind_address(), "0.0.0.0:8080");
        assert_eq!(s.cors_origins.len(), 2);
        let admin = s.bootstrap_admin.unwrap();
        assert_eq!(admin.username, "admin");
        assert_eq!(admin.email, "root@library.test");
    }

    #[test]
    fn test_rejects_bad_numbers() {
        assert!(settings(&[("MONGO_URI", "mongodb://x"), ("PORT", "http")]).is_err());
        assert!(settings(&[("MONGO_URI", "mongodb://x"), ("BCRYPT_COST", "2")]).is_err());
        assert!(settings(&[("MONGO_URI", "mongodb://x"), ("JWT_TTL_HOURS", "0")]).is_err());
    }
}
