/// Inventory stock and movement log
use crate::{
    db,
    error::{PortalError, PortalResult},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Postgres, QueryBuilder, Row};
use uuid::Uuid;

/// Kind of stock change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MovementType {
    Add,
    Remove,
    Adjust,
    Loan,
    Return,
}

impl MovementType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MovementType::Add => "add",
            MovementType::Remove => "remove",
            MovementType::Adjust => "adjust",
            MovementType::Loan => "loan",
            MovementType::Return => "return",
        }
    }

    /// Quantity after applying this movement of `quantity` to `current`
    pub fn apply(&self, current: i32, quantity: i32) -> PortalResult<i32> {
        if quantity < 0 {
            return Err(PortalError::invalid_field(
                "quantity",
                "Quantity must not be negative",
            ));
        }

        match self {
            MovementType::Adjust => Ok(quantity),
            _ if quantity == 0 => Err(PortalError::invalid_field(
                "quantity",
                "Quantity must be positive",
            )),
            MovementType::Add | MovementType::Return => current
                .checked_add(quantity)
                .ok_or_else(|| PortalError::invalid_field("quantity", "Quantity too large")),
            MovementType::Remove | MovementType::Loan => {
                if quantity > current {
                    Err(PortalError::invalid_field(
                        "quantity",
                        format!("Insufficient stock: {} available", current),
                    ))
                } else {
                    Ok(current - quantity)
                }
            }
        }
    }
}

/// Stock item
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryItem {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub category: String,
    pub quantity: i32,
    pub unit: String,
    pub min_quantity: i32,
    pub location: Option<String>,
    pub is_active: bool,
    pub low_stock: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One entry of the movement log
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryMovement {
    pub id: String,
    pub item_id: String,
    pub movement_type: String,
    pub quantity: i32,
    pub previous_quantity: i32,
    pub new_quantity: i32,
    pub reason: Option<String>,
    pub performed_by: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateItemRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub quantity: i32,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub min_quantity: i32,
    #[serde(default)]
    pub location: Option<String>,
}

/// Metadata update; quantity only changes through movements
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateItemRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub unit: Option<String>,
    pub min_quantity: Option<i32>,
    pub location: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MovementRequest {
    pub movement_type: MovementType,
    pub quantity: i32,
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemFilter {
    pub category: Option<String>,
    #[serde(default)]
    pub active_only: bool,
}

const ITEM_COLUMNS: &str = "id, name, description, category, quantity, unit, min_quantity, \
                            location, is_active, created_at, updated_at";

/// Inventory manager
#[derive(Clone)]
pub struct InventoryManager {
    db: PgPool,
}

impl InventoryManager {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// List items, optionally by category or active only
    pub async fn list_items(&self, filter: &ItemFilter) -> PortalResult<Vec<InventoryItem>> {
        let mut query: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("SELECT {} FROM inventory_items WHERE 1=1", ITEM_COLUMNS));

        if let Some(category) = filter.category.as_deref().filter(|c| !c.trim().is_empty()) {
            query.push(" AND category = ").push_bind(category.trim().to_string());
        }
        if filter.active_only {
            query.push(" AND is_active = TRUE");
        }
        query.push(" ORDER BY category, name");

        let rows = query
            .build()
            .fetch_all(&self.db)
            .await
            .map_err(|e| db::map_missing_table(e, "inventory_items"))?;

        Ok(rows.iter().map(item_from_row).collect())
    }

    pub async fn get_item(&self, id: &str) -> PortalResult<InventoryItem> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM inventory_items WHERE id = $1",
            ITEM_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .map_err(|e| db::map_missing_table(e, "inventory_items"))?
        .ok_or_else(|| PortalError::NotFound("Inventory item not found".to_string()))?;

        Ok(item_from_row(&row))
    }

    /// Create an item; an opening stock is logged as an `add` movement
    pub async fn create_item(
        &self,
        req: &CreateItemRequest,
        performed_by: Option<&str>,
    ) -> PortalResult<InventoryItem> {
        let name = req.name.trim();
        if name.is_empty() {
            return Err(PortalError::invalid_field("name", "Item name is required"));
        }
        if req.quantity < 0 {
            return Err(PortalError::invalid_field(
                "quantity",
                "Quantity must not be negative",
            ));
        }
        if req.min_quantity < 0 {
            return Err(PortalError::invalid_field(
                "minQuantity",
                "Minimum quantity must not be negative",
            ));
        }

        let id = Uuid::new_v4().to_string();
        let mut tx = self.db.begin().await?;

        let row = sqlx::query(&format!(
            r#"
            INSERT INTO inventory_items (id, name, description, category, quantity, unit, min_quantity, location)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {}
            "#,
            ITEM_COLUMNS
        ))
        .bind(&id)
        .bind(name)
        .bind(non_blank(req.description.as_deref()))
        .bind(non_blank(req.category.as_deref()).unwrap_or("general"))
        .bind(req.quantity)
        .bind(non_blank(req.unit.as_deref()).unwrap_or("pcs"))
        .bind(req.min_quantity)
        .bind(non_blank(req.location.as_deref()))
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| db::map_missing_table(e, "inventory_items"))?;

        if req.quantity > 0 {
            insert_movement(
                &mut tx,
                &id,
                MovementType::Add,
                req.quantity,
                0,
                req.quantity,
                Some("Initial stock"),
                performed_by,
            )
            .await?;
        }

        tx.commit().await?;

        tracing::info!("Created inventory item {} ({})", name, id);

        Ok(item_from_row(&row))
    }

    /// Update item metadata
    pub async fn update_item(&self, id: &str, req: &UpdateItemRequest) -> PortalResult<InventoryItem> {
        if matches!(req.name.as_deref(), Some(n) if n.trim().is_empty()) {
            return Err(PortalError::invalid_field("name", "Item name is required"));
        }
        if matches!(req.min_quantity, Some(m) if m < 0) {
            return Err(PortalError::invalid_field(
                "minQuantity",
                "Minimum quantity must not be negative",
            ));
        }

        let row = sqlx::query(&format!(
            r#"
            UPDATE inventory_items
            SET name = COALESCE($2, name),
                description = COALESCE($3, description),
                category = COALESCE($4, category),
                unit = COALESCE($5, unit),
                min_quantity = COALESCE($6, min_quantity),
                location = COALESCE($7, location),
                is_active = COALESCE($8, is_active),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            ITEM_COLUMNS
        ))
        .bind(id)
        .bind(req.name.as_deref().map(str::trim))
        .bind(req.description.as_deref())
        .bind(non_blank(req.category.as_deref()))
        .bind(non_blank(req.unit.as_deref()))
        .bind(req.min_quantity)
        .bind(req.location.as_deref())
        .bind(req.is_active)
        .fetch_optional(&self.db)
        .await
        .map_err(|e| db::map_missing_table(e, "inventory_items"))?
        .ok_or_else(|| PortalError::NotFound("Inventory item not found".to_string()))?;

        Ok(item_from_row(&row))
    }

    /// Apply a stock movement; the item row stays locked until the log entry is written
    pub async fn record_movement(
        &self,
        item_id: &str,
        req: &MovementRequest,
        performed_by: Option<&str>,
    ) -> PortalResult<InventoryMovement> {
        let mut tx = self.db.begin().await?;

        let current: i32 =
            sqlx::query_scalar("SELECT quantity FROM inventory_items WHERE id = $1 FOR UPDATE")
                .bind(item_id)
                .fetch_optional(&mut *tx)
                .await
                .map_err(|e| db::map_missing_table(e, "inventory_items"))?
                .ok_or_else(|| PortalError::NotFound("Inventory item not found".to_string()))?;

        let new_quantity = req.movement_type.apply(current, req.quantity)?;

        sqlx::query("UPDATE inventory_items SET quantity = $1, updated_at = NOW() WHERE id = $2")
            .bind(new_quantity)
            .bind(item_id)
            .execute(&mut *tx)
            .await?;

        let movement = insert_movement(
            &mut tx,
            item_id,
            req.movement_type,
            req.quantity,
            current,
            new_quantity,
            non_blank(req.reason.as_deref()),
            performed_by,
        )
        .await?;

        tx.commit().await?;

        tracing::info!(
            "Inventory {} {} x{}: {} -> {}",
            item_id,
            req.movement_type.as_str(),
            req.quantity,
            current,
            new_quantity
        );

        Ok(movement)
    }

    /// Movement log for one item, newest first
    pub async fn list_movements(&self, item_id: &str) -> PortalResult<Vec<InventoryMovement>> {
        let rows = sqlx::query(
            r#"
            SELECT id, item_id, movement_type, quantity, previous_quantity, new_quantity,
                   reason, performed_by, created_at
            FROM inventory_movements
            WHERE item_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(item_id)
        .fetch_all(&self.db)
        .await
        .map_err(|e| db::map_missing_table(e, "inventory_movements"))?;

        Ok(rows.iter().map(movement_from_row).collect())
    }
}

#[allow(clippy::too_many_arguments)]
async fn insert_movement(
    tx: &mut sqlx::Transaction<'_, Postgres>,
    item_id: &str,
    movement_type: MovementType,
    quantity: i32,
    previous_quantity: i32,
    new_quantity: i32,
    reason: Option<&str>,
    performed_by: Option<&str>,
) -> PortalResult<InventoryMovement> {
    let row = sqlx::query(
        r#"
        INSERT INTO inventory_movements
            (id, item_id, movement_type, quantity, previous_quantity, new_quantity, reason, performed_by)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING id, item_id, movement_type, quantity, previous_quantity, new_quantity,
                  reason, performed_by, created_at
        "#,
    )
    .bind(Uuid::new_v4().to_string())
    .bind(item_id)
    .bind(movement_type.as_str())
    .bind(quantity)
    .bind(previous_quantity)
    .bind(new_quantity)
    .bind(reason)
    .bind(performed_by)
    .fetch_one(&mut **tx)
    .await
    .map_err(|e| db::map_missing_table(e, "inventory_movements"))?;

    Ok(movement_from_row(&row))
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn item_from_row(row: &sqlx::postgres::PgRow) -> InventoryItem {
    let quantity: i32 = row.get("quantity");
    let min_quantity: i32 = row.get("min_quantity");

    InventoryItem {
        id: row.get("id"),
        name: row.get("name"),
        description: row.get("description"),
        category: row.get("category"),
        quantity,
        unit: row.get("unit"),
        min_quantity,
        location: row.get("location"),
        is_active: row.get("is_active"),
        low_stock: quantity < min_quantity,
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

fn movement_from_row(row: &sqlx::postgres::PgRow) -> InventoryMovement {
    InventoryMovement {
        id: row.get("id"),
        item_id: row.get("item_id"),
        movement_type: row.get("movement_type"),
        quantity: row.get("quantity"),
        previous_quantity: row.get("previous_quantity"),
        new_quantity: row.get("new_quantity"),
        reason: row.get("reason"),
        performed_by: row.get("performed_by"),
        created_at: row.get("created_at"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_and_return_increase_stock() {
        assert_eq!(MovementType::Add.apply(5, 3).unwrap(), 8);
        assert_eq!(MovementType::Return.apply(0, 2).unwrap(), 2);
    }

    #[test]
    fn test_remove_and_loan_cannot_go_negative() {
        assert_eq!(MovementType::Remove.apply(5, 5).unwrap(), 0);
        assert_eq!(MovementType::Loan.apply(5, 2).unwrap(), 3);

        let err = MovementType::Remove.apply(2, 3).unwrap_err();
        assert_eq!(err.status_code(), axum::http::StatusCode::BAD_REQUEST);
        assert!(MovementType::Loan.apply(0, 1).is_err());
    }

    #[test]
    fn test_adjust_sets_quantity() {
        assert_eq!(MovementType::Adjust.apply(10, 4).unwrap(), 4);
        assert_eq!(MovementType::Adjust.apply(10, 0).unwrap(), 0);
    }

    #[test]
    fn test_rejects_invalid_quantities() {
        assert!(MovementType::Add.apply(5, 0).is_err());
        assert!(MovementType::Add.apply(5, -1).is_err());
        assert!(MovementType::Adjust.apply(5, -1).is_err());
        assert!(MovementType::Add.apply(i32::MAX, 1).is_err());
    }

    #[test]
    fn test_movement_request_deserializes() {
        let req: MovementRequest =
            serde_json::from_str(r#"{"movementType":"loan","quantity":2,"reason":"Match day"}"#)
                .unwrap();
        assert_eq!(req.movement_type, MovementType::Loan);
        assert_eq!(req.quantity, 2);
    }

    #[test]
    fn test_non_blank() {
        assert_eq!(non_blank(Some("  ")), None);
        assert_eq!(non_blank(Some(" balls ")), Some("balls"));
        assert_eq!(non_blank(None), None);
    }
}
