/// MO26 portal - registration and administration service for Mini Olympics 2026
///
/// Participants register teams and pay by cash or online transfer; admins
/// verify payments and manage pricing, coupons, email settings, inventory
/// and finance records. Everything is an HTTP JSON API over PostgreSQL.

pub mod account;
pub mod admin;
pub mod api;
pub mod auth;
pub mod config;
pub mod context;
pub mod db;
pub mod error;
pub mod mailer;
pub mod registration;
pub mod server;

pub use config::ServerConfig;
pub use context::AppContext;
pub use error::{PortalError, PortalResult};
