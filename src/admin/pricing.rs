/// Game pricing catalog
use crate::{
    db,
    error::{PortalError, PortalResult},
};
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Row};

/// Genders a price row can apply to
pub const PRICING_GENDERS: [&str; 3] = ["boys", "girls", "both"];

/// Price of one game for one gender
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GamePricing {
    pub id: i32,
    pub game_name: String,
    pub gender: String,
    pub price: f64,
    pub players: Option<i32>,
}

/// Upsert request body
#[derive(Debug, Clone, Deserialize)]
pub struct UpsertGamePricing {
    pub game_name: String,
    pub gender: String,
    pub price: f64,
    #[serde(default)]
    pub players: Option<i32>,
}

impl UpsertGamePricing {
    pub fn validate(&self) -> PortalResult<()> {
        if self.game_name.trim().is_empty() {
            return Err(PortalError::invalid_field("game_name", "Game name is required"));
        }
        db::check_length("game_name", self.game_name.trim(), 100)?;
        if !PRICING_GENDERS.contains(&self.gender.as_str()) {
            return Err(PortalError::invalid_field(
                "gender",
                "Gender must be boys, girls or both",
            ));
        }
        if !self.price.is_finite() || self.price < 0.0 {
            return Err(PortalError::invalid_field("price", "Price must be zero or more"));
        }
        if !db::fits_numeric(self.price, 10, 2) {
            return Err(PortalError::invalid_field("price", "Price is too large"));
        }
        if matches!(self.players, Some(p) if p <= 0) {
            return Err(PortalError::invalid_field("players", "Players must be positive"));
        }
        Ok(())
    }
}

/// Pricing manager
#[derive(Clone)]
pub struct PricingManager {
    db: PgPool,
}

impl PricingManager {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// All pricing rows ordered by game then gender
    pub async fn list(&self) -> PortalResult<Vec<GamePricing>> {
        let rows = sqlx::query(
            r#"
            SELECT id, game_name, gender, price::float8 AS price, players
            FROM games_pricing
            ORDER BY game_name, gender
            "#,
        )
        .fetch_all(&self.db)
        .await
        .map_err(|e| db::map_missing_table(e, "games_pricing"))?;

        Ok(rows.iter().map(pricing_from_row).collect())
    }

    /// Insert or replace the price for (game_name, gender)
    pub async fn upsert(&self, req: &UpsertGamePricing) -> PortalResult<GamePricing> {
        req.validate()?;

        let row = sqlx::query(
            r#"
            INSERT INTO games_pricing (game_name, gender, price, players)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (game_name, gender) DO UPDATE
            SET price = EXCLUDED.price,
                players = EXCLUDED.players
            RETURNING id, game_name, gender, price::float8 AS price, players
            "#,
        )
        .bind(req.game_name.trim())
        .bind(&req.gender)
        .bind(req.price)
        .bind(req.players)
        .fetch_one(&self.db)
        .await
        .map_err(|e| db::map_missing_table(e, "games_pricing"))?;

        Ok(pricing_from_row(&row))
    }

    /// Remove the price for (game_name, gender)
    pub async fn delete(&self, game_name: &str, gender: &str) -> PortalResult<()> {
        let result = sqlx::query("DELETE FROM games_pricing WHERE game_name = $1 AND gender = $2")
            .bind(game_name)
            .bind(gender)
            .execute(&self.db)
            .await
            .map_err(|e| db::map_missing_table(e, "games_pricing"))?;

        if result.rows_affected() == 0 {
            return Err(PortalError::NotFound(format!(
                "No pricing for {} ({})",
                game_name, gender
            )));
        }

        Ok(())
    }
}

fn pricing_from_row(row: &sqlx::postgres::PgRow) -> GamePricing {
    GamePricing {
        id: row.get("id"),
        game_name: row.get("game_name"),
        gender: row.get("gender"),
        price: row.get("price"),
        players: row.get("players"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn req(game: &str, gender: &str, price: f64, players: Option<i32>) -> UpsertGamePricing {
        UpsertGamePricing {
            game_name: game.to_string(),
            gender: gender.to_string(),
            price,
            players,
        }
    }

    #[test]
    fn test_validate_upsert() {
        assert!(req("Cricket", "boys", 2200.0, Some(11)).validate().is_ok());
        assert!(req("Chess", "both", 150.0, None).validate().is_ok());

        assert!(req(" ", "boys", 100.0, None).validate().is_err());
        assert!(req("Cricket", "men", 100.0, None).validate().is_err());
        assert!(req("Cricket", "boys", -1.0, None).validate().is_err());
        assert!(req("Cricket", "boys", 100.0, Some(0)).validate().is_err());
    }

    #[test]
    fn test_values_fit_pricing_columns() {
        assert!(req(&"G".repeat(100), "boys", 99_999_999.99, None).validate().is_ok());
        assert!(req(&"G".repeat(101), "boys", 100.0, None).validate().is_err());
        assert!(req("Cricket", "boys", 100_000_000.0, None).validate().is_err());
    }
}
