/// Admin account manager using runtime queries
use crate::{
    account::{AdminUser, BootstrapOutcome, IssuedSession, PasswordHasher, ValidatedSession},
    admin::Role,
    config::ServerConfig,
    db,
    error::{PortalError, PortalResult},
};
use chrono::{DateTime, Duration, Utc};
use rand::{distributions::Alphanumeric, Rng};
use sqlx::{PgPool, Row};
use std::sync::Arc;
use uuid::Uuid;

const TOKEN_LEN: usize = 48;

/// Admin account and session service
pub struct AdminManager {
    db: PgPool,
    config: Arc<ServerConfig>,
}

impl AdminManager {
    /// Create a new admin manager
    pub fn new(db: PgPool, config: Arc<ServerConfig>) -> Self {
        Self { db, config }
    }

    /// Generate an opaque session token
    pub fn generate_token() -> String {
        rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(TOKEN_LEN)
            .map(char::from)
            .collect()
    }

    /// Authenticate admin credentials and open a session
    pub async fn login(&self, username: &str, password: &str) -> PortalResult<IssuedSession> {
        let username = username.trim();
        let password = password.trim();

        if username.is_empty() || password.is_empty() {
            return Err(PortalError::Authentication("Invalid credentials".to_string()));
        }

        self.ensure_schema().await?;

        if self.count_admins().await? == 0 {
            let matches_env = self
                .config
                .authentication
                .bootstrap
                .as_ref()
                .map(|b| b.username == username && b.password == password)
                .unwrap_or(false);

            if !matches_env {
                return Err(PortalError::Setup {
                    message: "No admin users yet.".to_string(),
                    fix: "Create one: mo26-portal create-admin <username> <password>".to_string(),
                });
            }

            self.bootstrap_first_admin(username, password).await?;
        }

        let user = self
            .get_admin_by_username(username)
            .await?
            .filter(|user| PasswordHasher::verify(password, &user.password_hash))
            .ok_or_else(|| {
                tracing::warn!("Failed admin login for {}", username);
                PortalError::Authentication("Invalid credentials".to_string())
            })?;

        let role = user.role.trim();
        if role.parse::<Role>().is_err() {
            tracing::warn!("Admin {} has unknown role {}", user.username, role);
        }

        let session = self.create_session(Some(&user.id), role).await?;

        tracing::info!("Admin {} logged in as {}", user.username, role);

        Ok(session)
    }

    /// Fail with a remediation hint if the auth tables were never created
    async fn ensure_schema(&self) -> PortalResult<()> {
        for table in ["admin_sessions", "admin_users"] {
            if !db::table_exists(&self.db, table).await? {
                return Err(PortalError::schema_missing(table));
            }
        }

        Ok(())
    }

    /// Number of admin users
    pub async fn count_admins(&self) -> PortalResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM admin_users")
            .fetch_one(&self.db)
            .await
            .map_err(|e| db::map_missing_table(e, "admin_users"))?;

        Ok(count)
    }

    /// Create the first admin, only while the table is empty
    ///
    /// The insert carries its own emptiness check so a concurrent bootstrap
    /// cannot add a second row.
    pub async fn bootstrap_first_admin(
        &self,
        username: &str,
        password: &str,
    ) -> PortalResult<BootstrapOutcome> {
        let password_hash = PasswordHasher::hash(password)?;

        let result = sqlx::query(
            r#"
            INSERT INTO admin_users (id, username, password_hash, role)
            SELECT $1, $2, $3, $4
            WHERE NOT EXISTS (SELECT 1 FROM admin_users)
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(username)
        .bind(&password_hash)
        .bind(Role::SuperAdmin.as_str())
        .execute(&self.db)
        .await;

        match result {
            Ok(done) if done.rows_affected() == 1 => {
                tracing::info!("Bootstrapped first admin user {}", username);
                Ok(BootstrapOutcome::Created)
            }
            Ok(_) => Ok(BootstrapOutcome::AlreadyInitialized),
            Err(e) if db::is_unique_violation(&e) => Ok(BootstrapOutcome::AlreadyInitialized),
            Err(e) => Err(db::map_missing_table(e, "admin_users")),
        }
    }

    /// Bootstrap from configured environment credentials
    pub async fn bootstrap_from_config(&self) -> PortalResult<BootstrapOutcome> {
        let bootstrap = self.config.authentication.bootstrap.clone().ok_or_else(|| {
            PortalError::Validation(
                "ADMIN_USERNAME and ADMIN_PASSWORD must both be set".to_string(),
            )
        })?;

        self.bootstrap_first_admin(&bootstrap.username, &bootstrap.password)
            .await
    }

    /// Insert an admin user, or reset the password and role of an existing one
    pub async fn upsert_admin(
        &self,
        username: &str,
        password: &str,
        role: Role,
    ) -> PortalResult<AdminUser> {
        let username = username.trim();
        if username.is_empty() {
            return Err(PortalError::invalid_field("username", "Username is required"));
        }
        if password.trim().is_empty() {
            return Err(PortalError::invalid_field("password", "Password is required"));
        }

        let password_hash = PasswordHasher::hash(password.trim())?;

        let row = sqlx::query(
            r#"
            INSERT INTO admin_users (id, username, password_hash, role)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (username) DO UPDATE
            SET password_hash = EXCLUDED.password_hash,
                role = EXCLUDED.role,
                updated_at = NOW()
            RETURNING id, username, password_hash, role, created_at
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(username)
        .bind(&password_hash)
        .bind(role.as_str())
        .fetch_one(&self.db)
        .await
        .map_err(|e| db::map_missing_table(e, "admin_users"))?;

        Ok(admin_from_row(&row))
    }

    /// Get admin by username
    pub async fn get_admin_by_username(&self, username: &str) -> PortalResult<Option<AdminUser>> {
        let row = sqlx::query(
            "SELECT id, username, password_hash, role, created_at FROM admin_users WHERE username = $1 LIMIT 1",
        )
        .bind(username)
        .fetch_optional(&self.db)
        .await?;

        Ok(row.as_ref().map(admin_from_row))
    }

    /// Create a session for an admin
    pub async fn create_session(
        &self,
        admin_user_id: Option<&str>,
        role: &str,
    ) -> PortalResult<IssuedSession> {
        let token = Self::generate_token();
        let expires_at = Utc::now() + Duration::hours(self.config.authentication.session_ttl_hours);

        sqlx::query(
            r#"
            INSERT INTO admin_sessions (id, session_token, expires_at, admin_user_id, role)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(&token)
        .bind(expires_at)
        .bind(admin_user_id)
        .bind(role)
        .execute(&self.db)
        .await
        .map_err(|e| db::map_missing_table(e, "admin_sessions"))?;

        Ok(IssuedSession {
            token,
            role: role.to_string(),
            expires_at,
        })
    }

    /// Validate a session token and return session info
    pub async fn validate_session(&self, token: &str) -> PortalResult<ValidatedSession> {
        if token.is_empty() {
            return Err(PortalError::Authentication("Unauthorized".to_string()));
        }

        let row = sqlx::query(
            r#"
            SELECT s.id, s.expires_at, s.admin_user_id, s.role, u.username, u.role AS user_role
            FROM admin_sessions s
            LEFT JOIN admin_users u ON u.id = s.admin_user_id
            WHERE s.session_token = $1
            "#,
        )
        .bind(token)
        .fetch_optional(&self.db)
        .await
        .map_err(|e| db::map_missing_table(e, "admin_sessions"))?
        .ok_or_else(|| PortalError::Authentication("Invalid or expired session".to_string()))?;

        let expires_at: DateTime<Utc> = row.get("expires_at");
        if Utc::now() > expires_at {
            return Err(PortalError::Authentication("Session expired".to_string()));
        }

        let session_role: Option<String> = row.get("role");
        let user_role: Option<String> = row.get("user_role");
        // Sessions written before roles existed belong to the sole super admin
        let role_name = session_role
            .or(user_role)
            .map(|role| role.trim().to_string())
            .unwrap_or_else(|| Role::SuperAdmin.as_str().to_string());
        let role = role_name.parse::<Role>().ok();

        Ok(ValidatedSession {
            session_id: row.get("id"),
            admin_user_id: row.get("admin_user_id"),
            username: row.get("username"),
            role_name,
            role,
            expires_at,
        })
    }

    /// Delete a session (logout)
    pub async fn delete_session(&self, token: &str) -> PortalResult<()> {
        sqlx::query("DELETE FROM admin_sessions WHERE session_token = $1")
            .bind(token)
            .execute(&self.db)
            .await?;

        Ok(())
    }
}

fn admin_from_row(row: &sqlx::postgres::PgRow) -> AdminUser {
    AdminUser {
        id: row.get("id"),
        username: row.get("username"),
        password_hash: row.get("password_hash"),
        role: row.get("role"),
        created_at: row.get("created_at"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_token() {
        let token = AdminManager::generate_token();
        assert_eq!(token.len(), TOKEN_LEN);
        assert!(token.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(token, AdminManager::generate_token());
    }
}
