use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;
use thiserror::Error;

/// Auth cookie and token lifetime, in days
pub const TOKEN_TTL_DAYS: i64 = 7;

const DEV_JWT_SECRET: &str = "discountify-dev-secret";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing configuration: {0}")]
    Missing(&'static str),

    #[error("Invalid database connection settings: {0}")]
    InvalidDatabaseUrl(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub security: SecurityConfig,
    pub rate_guard: RateGuardConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    /// Built SPA assets, served as the fallback route in production
    pub static_dir: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Full connection URL; wins over the discrete PG* settings when present
    pub url: Option<String>,
    pub host: Option<String>,
    pub name: Option<String>,
    pub user: Option<String>,
    #[serde(skip_serializing)]
    pub password: Option<String>,
    pub port: u16,
    pub ssl_mode: String,
    pub max_connections: u32,
    pub connection_timeout: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    #[serde(skip_serializing)]
    pub jwt_secret: String,
    pub token_ttl_days: i64,
    pub cors_origin: String,
    pub secure_cookies: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateGuardConfig {
    /// External rate-limit / bot-detection endpoint; the guard is off when unset
    pub url: Option<String>,
    #[serde(skip_serializing)]
    pub key: Option<String>,
    pub timeout_ms: u64,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").or_else(|_| env::var("NODE_ENV")).as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        // Server
        if let Ok(v) = env::var("PORT") {
            self.server.port = v.parse().unwrap_or(self.server.port);
        }
        if let Ok(v) = env::var("STATIC_DIR") {
            self.server.static_dir = v;
        }

        // Database
        self.database.url = non_empty_var("DATABASE_URL");
        self.database.host = non_empty_var("PGHOST");
        self.database.name = non_empty_var("PGDATABASE");
        self.database.user = non_empty_var("PGUSER");
        self.database.password = non_empty_var("PGPASSWORD");
        if let Ok(v) = env::var("PGPORT") {
            self.database.port = v.parse().unwrap_or(self.database.port);
        }
        if let Some(v) = non_empty_var("PGSSLMODE") {
            self.database.ssl_mode = v;
        }
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Ok(v) = env::var("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout = v.parse().unwrap_or(self.database.connection_timeout);
        }

        // Security
        if let Some(v) = non_empty_var("JWT_SECRET") {
            self.security.jwt_secret = v;
        }
        if let Some(v) = non_empty_var("CLIENT_URL") {
            self.security.cors_origin = v;
        }

        // Rate guard
        self.rate_guard.url = non_empty_var("RATE_GUARD_URL");
        self.rate_guard.key = non_empty_var("RATE_GUARD_KEY");
        if let Ok(v) = env::var("RATE_GUARD_TIMEOUT_MS") {
            self.rate_guard.timeout_ms = v.parse().unwrap_or(self.rate_guard.timeout_ms);
        }

        self
    }

    pub fn development() -> Self {
        Self {
            environment: Environment::Development,
            server: ServerConfig {
                port: 3000,
                static_dir: "frontend/dist".to_string(),
            },
            database: DatabaseConfig {
                url: None,
                host: None,
                name: None,
                user: None,
                password: None,
                port: 5432,
                ssl_mode: "prefer".to_string(),
                max_connections: 10,
                connection_timeout: 30,
            },
            security: SecurityConfig {
                jwt_secret: DEV_JWT_SECRET.to_string(),
                token_ttl_days: TOKEN_TTL_DAYS,
                cors_origin: "http://localhost:5173".to_string(),
                secure_cookies: false,
            },
            rate_guard: RateGuardConfig {
                url: None,
                key: None,
                timeout_ms: 2000,
            },
        }
    }

    fn staging() -> Self {
        let mut config = Self::development();
        config.environment = Environment::Staging;
        config.database.ssl_mode = "require".to_string();
        config.database.max_connections = 20;
        config.database.connection_timeout = 10;
        config
    }

    fn production() -> Self {
        let mut config = Self::development();
        config.environment = Environment::Production;
        config.database.ssl_mode = "require".to_string();
        config.database.max_connections = 50;
        config.database.connection_timeout = 5;
        // Must come from JWT_SECRET; validate() rejects an empty secret
        config.security.jwt_secret = String::new();
        config.security.secure_cookies = true;
        config
    }

    pub fn is_production(&self) -> bool {
        matches!(self.environment, Environment::Production)
    }

    /// Startup checks that cannot be expressed as defaults
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.security.jwt_secret.is_empty() {
            return Err(ConfigError::Missing("JWT_SECRET"));
        }
        if !self.is_production() && self.security.jwt_secret == DEV_JWT_SECRET {
            tracing::warn!("JWT_SECRET not set, using the development signing secret");
        }
        self.database.connection_url().map(|_| ())
    }
}

impl DatabaseConfig {
    /// Resolve the Postgres connection string from DATABASE_URL or the PG* parts
    pub fn connection_url(&self) -> Result<String, ConfigError> {
        if let Some(url) = &self.url {
            return Ok(url.clone());
        }

        let host = self.host.as_deref().ok_or(ConfigError::Missing("PGHOST"))?;
        let name = self.name.as_deref().ok_or(ConfigError::Missing("PGDATABASE"))?;
        let user = self.user.as_deref().ok_or(ConfigError::Missing("PGUSER"))?;

        let mut url = url::Url::parse("postgres://localhost")
            .map_err(|e| ConfigError::InvalidDatabaseUrl(e.to_string()))?;
        url.set_host(Some(host))
            .map_err(|e| ConfigError::InvalidDatabaseUrl(e.to_string()))?;
        url.set_username(user)
            .map_err(|_| ConfigError::InvalidDatabaseUrl("invalid PGUSER".to_string()))?;
        url.set_password(self.password.as_deref())
            .map_err(|_| ConfigError::InvalidDatabaseUrl("invalid PGPASSWORD".to_string()))?;
        url.set_port(Some(self.port))
            .map_err(|_| ConfigError::InvalidDatabaseUrl("invalid PGPORT".to_string()))?;
        url.set_path(&format!("/{}", name));
        url.query_pairs_mut().append_pair("sslmode", &self.ssl_mode);

        Ok(url.into())
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

// Convenience function for accessing config
pub fn config() -> &'static AppConfig {
    &CONFIG
}
