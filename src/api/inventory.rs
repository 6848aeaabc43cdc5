/// Inventory endpoints
use crate::{
    admin::{
        inventory::{CreateItemRequest, ItemFilter, MovementRequest, UpdateItemRequest},
        InventoryItem, InventoryMovement, Role,
    },
    api::{data, extract::{ApiJson, ApiPath, ApiQuery}, DataResponse},
    auth::AdminAuthContext,
    context::AppContext,
    error::PortalResult,
    require_admin_role,
};
use axum::{
    extract::State,
    routing::{get, patch},
    Json, Router,
};

/// Build inventory routes
pub fn routes() -> Router<AppContext> {
    Router::new()
        .route("/api/admin/inventory", get(list_items).post(create_item))
        .route("/api/admin/inventory/:id", patch(update_item))
        .route(
            "/api/admin/inventory/:id/movements",
            get(list_movements).post(record_movement),
        )
}

async fn list_items(
    State(ctx): State<AppContext>,
    auth: AdminAuthContext,
    ApiQuery(filter): ApiQuery<ItemFilter>,
) -> PortalResult<Json<DataResponse<Vec<InventoryItem>>>> {
    require_admin_role!(auth, Role::InventoryAdmin);

    Ok(data(ctx.inventory_manager.list_items(&filter).await?))
}

async fn create_item(
    State(ctx): State<AppContext>,
    auth: AdminAuthContext,
    ApiJson(req): ApiJson<CreateItemRequest>,
) -> PortalResult<Json<DataResponse<InventoryItem>>> {
    require_admin_role!(auth, Role::InventoryAdmin);

    let item = ctx
        .inventory_manager
        .create_item(&req, Some(&auth.actor()))
        .await?;

    Ok(data(item))
}

async fn update_item(
    State(ctx): State<AppContext>,
    auth: AdminAuthContext,
    ApiPath(id): ApiPath<String>,
    ApiJson(req): ApiJson<UpdateItemRequest>,
) -> PortalResult<Json<DataResponse<InventoryItem>>> {
    require_admin_role!(auth, Role::InventoryAdmin);

    Ok(data(ctx.inventory_manager.update_item(&id, &req).await?))
}

async fn list_movements(
    State(ctx): State<AppContext>,
    auth: AdminAuthContext,
    ApiPath(id): ApiPath<String>,
) -> PortalResult<Json<DataResponse<Vec<InventoryMovement>>>> {
    require_admin_role!(auth, Role::InventoryAdmin);

    // 404 for unknown items rather than an empty log
    ctx.inventory_manager.get_item(&id).await?;

    Ok(data(ctx.inventory_manager.list_movements(&id).await?))
}

async fn record_movement(
    State(ctx): State<AppContext>,
    auth: AdminAuthContext,
    ApiPath(id): ApiPath<String>,
    ApiJson(req): ApiJson<MovementRequest>,
) -> PortalResult<Json<DataResponse<InventoryMovement>>> {
    require_admin_role!(auth, Role::InventoryAdmin);

    let movement = ctx
        .inventory_manager
        .record_movement(&id, &req, Some(&auth.actor()))
        .await?;

    Ok(data(movement))
}
