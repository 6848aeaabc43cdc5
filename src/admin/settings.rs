/// System settings key-value store
use crate::{
    db,
    error::{PortalError, PortalResult},
};
use sqlx::{PgPool, Row};
use std::collections::BTreeMap;

/// Setting that gates the public registration form
pub const REGISTRATIONS_OPEN: &str = "registrations_open";

/// Settings manager
#[derive(Clone)]
pub struct SettingsManager {
    db: PgPool,
}

impl SettingsManager {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// All settings as a key → value map
    pub async fn get_all(&self) -> PortalResult<BTreeMap<String, String>> {
        let rows = sqlx::query("SELECT key, value FROM system_settings ORDER BY key")
            .fetch_all(&self.db)
            .await
            .map_err(|e| db::map_missing_table(e, "system_settings"))?;

        Ok(rows
            .iter()
            .map(|row| {
                let value: Option<String> = row.get("value");
                (row.get("key"), value.unwrap_or_default())
            })
            .collect())
    }

    /// Settings whose key starts with `prefix`
    pub async fn get_prefixed(&self, prefix: &str) -> PortalResult<BTreeMap<String, String>> {
        let rows = sqlx::query("SELECT key, value FROM system_settings WHERE starts_with(key, $1)")
            .bind(prefix)
            .fetch_all(&self.db)
            .await
            .map_err(|e| db::map_missing_table(e, "system_settings"))?;

        Ok(rows
            .iter()
            .map(|row| {
                let value: Option<String> = row.get("value");
                (row.get("key"), value.unwrap_or_default())
            })
            .collect())
    }

    /// Get a single setting
    pub async fn get(&self, key: &str) -> PortalResult<Option<String>> {
        let value: Option<Option<String>> =
            sqlx::query_scalar("SELECT value FROM system_settings WHERE key = $1")
                .bind(key)
                .fetch_optional(&self.db)
                .await
                .map_err(|e| db::map_missing_table(e, "system_settings"))?;

        Ok(value.flatten())
    }

    /// Set a setting, creating it if needed
    pub async fn set(&self, key: &str, value: &str) -> PortalResult<()> {
        let key = key.trim();
        if key.is_empty() {
            return Err(PortalError::invalid_field("key", "Setting key is required"));
        }

        sqlx::query(
            r#"
            INSERT INTO system_settings (key, value, updated_at)
            VALUES ($1, $2, NOW())
            ON CONFLICT (key) DO UPDATE
            SET value = EXCLUDED.value,
                updated_at = NOW()
            "#,
        )
        .bind(key)
        .bind(value)
        .execute(&self.db)
        .await
        .map_err(|e| db::map_missing_table(e, "system_settings"))?;

        tracing::info!("Updated setting {}", key);

        Ok(())
    }

    /// Whether the public registration form is open; errors read as open
    pub async fn registrations_open(&self) -> bool {
        match self.get(REGISTRATIONS_OPEN).await {
            Ok(value) => is_open_value(value.as_deref()),
            Err(e) => {
                tracing::warn!("Could not read {}: {}", REGISTRATIONS_OPEN, e);
                true
            }
        }
    }
}

/// Unset means open; only `false` and `0` close registrations
pub fn is_open_value(value: Option<&str>) -> bool {
    !matches!(value.map(str::trim), Some("false") | Some("0"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_open_value() {
        assert!(is_open_value(None));
        assert!(is_open_value(Some("true")));
        assert!(is_open_value(Some("")));
        assert!(is_open_value(Some("yes")));
        assert!(!is_open_value(Some("false")));
        assert!(!is_open_value(Some("0")));
        assert!(!is_open_value(Some(" false ")));
    }
}
