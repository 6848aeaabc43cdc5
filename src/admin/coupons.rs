/// Coupon Code Management
use crate::{
    db,
    error::{PortalError, PortalResult},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Row};
use uuid::Uuid;

/// Percentage discount code
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Coupon {
    pub id: String,
    pub code: String,
    pub discount_percent: f64,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// Result of checking a code a participant typed in
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CouponCheck {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discount_percent: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CouponCheck {
    pub fn valid(discount_percent: f64) -> Self {
        Self {
            valid: true,
            discount_percent: Some(discount_percent),
            error: None,
        }
    }

    pub fn invalid(error: &str) -> Self {
        Self {
            valid: false,
            discount_percent: None,
            error: Some(error.to_string()),
        }
    }
}

/// Trim and upper-case a coupon code
pub fn normalize_code(code: &str) -> String {
    code.trim().to_uppercase()
}

/// Discount percentages live in (0, 100]
pub fn is_valid_percent(pct: f64) -> bool {
    db::positive_at_scale(pct, 2) && pct <= 100.0
}

/// Percentage discount on `total`, rounded to cents and clamped to [0, total]
pub fn apply_percent(total: f64, pct: f64) -> f64 {
    let discount = ((total * pct / 100.0) * 100.0).round() / 100.0;
    clamp_discount(discount, total)
}

/// Keep a discount inside [0, total]
pub fn clamp_discount(discount: f64, total: f64) -> f64 {
    if !discount.is_finite() || discount < 0.0 {
        0.0
    } else if discount > total {
        total.max(0.0)
    } else {
        discount
    }
}

/// Coupon manager
#[derive(Clone)]
pub struct CouponManager {
    db: PgPool,
}

impl CouponManager {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Create coupon
    pub async fn create_coupon(&self, code: &str, discount_percent: f64) -> PortalResult<Coupon> {
        let code = normalize_code(code);
        if code.is_empty() {
            return Err(PortalError::invalid_field("code", "Coupon code is required"));
        }
        db::check_length("code", &code, 50)?;
        if !is_valid_percent(discount_percent) {
            return Err(PortalError::invalid_field(
                "discount_percent",
                "Discount percent must be between 1 and 100",
            ));
        }

        let row = sqlx::query(
            r#"
            INSERT INTO coupons (id, code, discount_percent, is_active)
            VALUES ($1, $2, $3, TRUE)
            RETURNING id, code, discount_percent::float8 AS discount_percent, is_active, created_at
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(&code)
        .bind(discount_percent)
        .fetch_one(&self.db)
        .await
        .map_err(|e| {
            if db::is_unique_violation(&e) {
                PortalError::conflict("This coupon code already exists", Some("code"))
            } else {
                db::map_missing_table(e, "coupons")
            }
        })?;

        tracing::info!("Created coupon {} ({}%)", code, discount_percent);

        Ok(coupon_from_row(&row))
    }

    /// List all coupons, newest first
    pub async fn list_coupons(&self) -> PortalResult<Vec<Coupon>> {
        let rows = sqlx::query(
            r#"
            SELECT id, code, discount_percent::float8 AS discount_percent, is_active, created_at
            FROM coupons
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(&self.db)
        .await
        .map_err(|e| db::map_missing_table(e, "coupons"))?;

        Ok(rows.iter().map(coupon_from_row).collect())
    }

    /// Delete coupon
    pub async fn delete_coupon(&self, id: &str) -> PortalResult<()> {
        let result = sqlx::query("DELETE FROM coupons WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await
            .map_err(|e| db::map_missing_table(e, "coupons"))?;

        if result.rows_affected() == 0 {
            return Err(PortalError::NotFound("Coupon not found".to_string()));
        }

        Ok(())
    }

    /// Activate or deactivate a coupon
    pub async fn set_active(&self, id: &str, is_active: bool) -> PortalResult<()> {
        let result = sqlx::query("UPDATE coupons SET is_active = $1 WHERE id = $2")
            .bind(is_active)
            .bind(id)
            .execute(&self.db)
            .await
            .map_err(|e| db::map_missing_table(e, "coupons"))?;

        if result.rows_affected() == 0 {
            return Err(PortalError::NotFound("Coupon not found".to_string()));
        }

        Ok(())
    }

    /// Get coupon by normalized code, active or not
    pub async fn get_by_code(&self, code: &str) -> PortalResult<Option<Coupon>> {
        let row = sqlx::query(
            r#"
            SELECT id, code, discount_percent::float8 AS discount_percent, is_active, created_at
            FROM coupons
            WHERE UPPER(TRIM(code)) = $1
            LIMIT 1
            "#,
        )
        .bind(normalize_code(code))
        .fetch_optional(&self.db)
        .await?;

        Ok(row.as_ref().map(coupon_from_row))
    }

    /// Active coupon with a usable percentage; a missing table counts as no coupon
    pub async fn find_active(&self, code: &str) -> PortalResult<Option<Coupon>> {
        let row = sqlx::query(
            r#"
            SELECT id, code, discount_percent::float8 AS discount_percent, is_active, created_at
            FROM coupons
            WHERE UPPER(TRIM(code)) = $1 AND is_active = TRUE
            LIMIT 1
            "#,
        )
        .bind(normalize_code(code))
        .fetch_optional(&self.db)
        .await;

        match row {
            Ok(row) => Ok(row
                .as_ref()
                .map(coupon_from_row)
                .filter(|c| is_valid_percent(c.discount_percent))),
            Err(e) if db::is_undefined_table(&e) => {
                tracing::warn!("coupons table missing; ignoring coupon {}", code);
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Validate a code for the public coupon check
    pub async fn check_code(&self, code: &str) -> PortalResult<CouponCheck> {
        let coupon = match self.get_by_code(code).await {
            Ok(coupon) => coupon,
            Err(PortalError::Database(e)) if db::is_undefined_table(&e) => None,
            Err(e) => return Err(e),
        };

        Ok(match coupon {
            None => CouponCheck::invalid("Invalid coupon code"),
            Some(c) if !c.is_active => CouponCheck::invalid("This coupon is no longer active"),
            Some(c) if !is_valid_percent(c.discount_percent) => {
                CouponCheck::invalid("Invalid discount")
            }
            Some(c) => CouponCheck::valid(c.discount_percent),
        })
    }
}

fn coupon_from_row(row: &sqlx::postgres::PgRow) -> Coupon {
    Coupon {
        id: row.get("id"),
        code: row.get("code"),
        discount_percent: row.get("discount_percent"),
        is_active: row.get("is_active"),
        created_at: row.get("created_at"),
    }
}
