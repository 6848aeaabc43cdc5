/// Admin account management
///
/// Handles admin credential verification, first-admin bootstrap, and the
/// server-side sessions behind the `admin_session` cookie.

mod manager;
pub mod password;

pub use manager::AdminManager;
pub use password::PasswordHasher;

use crate::admin::Role;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Name of the session cookie
pub const SESSION_COOKIE: &str = "admin_session";

/// Admin user record in the database
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminUser {
    pub id: String,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

/// Login request
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

/// Issued session returned by a successful login
#[derive(Debug, Clone)]
pub struct IssuedSession {
    pub token: String,
    /// Stored role name; may be one this build does not know
    pub role: String,
    pub expires_at: DateTime<Utc>,
}

/// Login response body
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub success: bool,
    pub message: String,
    pub session_token: String,
    pub role: String,
    pub redirect_to: String,
}

/// Session resolved from a token
#[derive(Debug, Clone)]
pub struct ValidatedSession {
    pub session_id: String,
    pub admin_user_id: Option<String>,
    pub username: Option<String>,
    pub role_name: String,
    /// `None` when `role_name` is not a known role; such sessions pass no role check
    pub role: Option<Role>,
    pub expires_at: DateTime<Utc>,
}

/// Outcome of the first-admin bootstrap
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootstrapOutcome {
    Created,
    /// At least one admin already exists; nothing was written
    AlreadyInitialized,
}
