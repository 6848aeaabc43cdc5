/// Configuration management for the MO26 portal
use crate::error::{PortalError, PortalResult};
use serde::{Deserialize, Serialize};
use std::env;

/// Log filter used when RUST_LOG is unset
pub const DEFAULT_LOG_FILTER: &str = "mo26_portal=debug,tower_http=debug";

/// Main server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub service: ServiceConfig,
    pub database: DatabaseConfig,
    pub authentication: AuthConfig,
    pub logging: LoggingConfig,
}

/// Service-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    pub hostname: String,
    pub port: u16,
    pub version: String,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,
    pub max_connections: u32,
    /// Connection acquire timeout in seconds
    pub connect_timeout: u64,
    /// Apply pending migrations when the server starts
    pub run_migrations: bool,
}

/// Admin authentication configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// First-admin credentials, only consulted while no admin user exists
    pub bootstrap: Option<BootstrapAdmin>,
    pub session_ttl_hours: i64,
    /// Mark the session cookie `Secure` (HTTPS deployments)
    pub cookie_secure: bool,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct BootstrapAdmin {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for BootstrapAdmin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BootstrapAdmin")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    /// `text` or `json`
    pub format: String,
}

impl ServerConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> PortalResult<Self> {
        dotenv::dotenv().ok();

        let hostname = env::var("PORTAL_HOSTNAME").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = env::var("PORTAL_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse()
            .map_err(|_| PortalError::Validation("Invalid port number".to_string()))?;
        let version = env!("CARGO_PKG_VERSION").to_string();

        let url = env::var("DATABASE_URL")
            .map_err(|_| PortalError::Validation("DATABASE_URL must be set".to_string()))?;
        let max_connections = env::var("PORTAL_DB_MAX_CONNECTIONS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(10);
        let connect_timeout = env::var("PORTAL_DB_CONNECT_TIMEOUT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(30);
        let run_migrations = env::var("PORTAL_RUN_MIGRATIONS")
            .unwrap_or_else(|_| "true".to_string())
            .parse()
            .unwrap_or(true);

        let bootstrap = bootstrap_from_env(
            env::var("ADMIN_USERNAME").ok(),
            env::var("ADMIN_PASSWORD").ok(),
        );
        let session_ttl_hours = env::var("PORTAL_SESSION_TTL_HOURS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(24);
        let cookie_secure = env::var("PORTAL_COOKIE_SECURE")
            .unwrap_or_else(|_| "false".to_string())
            .parse()
            .unwrap_or(false);

        let level = env::var("RUST_LOG").unwrap_or_else(|_| DEFAULT_LOG_FILTER.to_string());
        let format = env::var("PORTAL_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

        Ok(ServerConfig {
            service: ServiceConfig {
                hostname,
                port,
                version,
            },
            database: DatabaseConfig {
                url,
                max_connections,
                connect_timeout,
                run_migrations,
            },
            authentication: AuthConfig {
                bootstrap,
                session_ttl_hours,
                cookie_secure,
            },
            logging: LoggingConfig { level, format },
        })
    }

    /// Validate configuration
    pub fn validate(&self) -> PortalResult<()> {
        if self.service.hostname.is_empty() {
            return Err(PortalError::Validation("Hostname cannot be empty".to_string()));
        }

        if self.database.url.trim().is_empty() {
            return Err(PortalError::Validation("DATABASE_URL cannot be empty".to_string()));
        }

        if self.authentication.session_ttl_hours <= 0 {
            return Err(PortalError::Validation(
                "Session TTL must be a positive number of hours".to_string(),
            ));
        }

        Ok(())
    }

    /// Configuration suitable for tests; nothing is read from the environment
    pub fn for_database(url: impl Into<String>) -> Self {
        ServerConfig {
            service: ServiceConfig {
                hostname: "127.0.0.1".to_string(),
                port: 3000,
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
            database: DatabaseConfig {
                url: url.into(),
                max_connections: 5,
                connect_timeout: 5,
                run_migrations: true,
            },
            authentication: AuthConfig {
                bootstrap: None,
                session_ttl_hours: 24,
                cookie_secure: false,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                format: "text".to_string(),
            },
        }
    }
}

/// Both values must be present and non-blank after trimming
fn bootstrap_from_env(username: Option<String>, password: Option<String>) -> Option<BootstrapAdmin> {
    let username = username.map(|u| u.trim().to_string()).unwrap_or_default();
    let password = password.map(|p| p.trim().to_string()).unwrap_or_default();

    if username.is_empty() || password.is_empty() {
        None
    } else {
        Some(BootstrapAdmin { username, password })
    }
}
