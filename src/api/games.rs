/// Game pricing endpoints
use crate::{
    admin::{pricing::UpsertGamePricing, GamePricing, Role},
    api::{data, extract::{ApiJson, ApiQuery}, success, DataResponse, SuccessResponse},
    auth::AdminAuthContext,
    context::AppContext,
    error::{PortalError, PortalResult},
    require_admin_role,
};
use axum::{
    extract::State,
    routing::get,
    Json, Router,
};
use serde::Deserialize;

/// Build game pricing routes
pub fn routes() -> Router<AppContext> {
    Router::new()
        .route("/api/games", get(public_pricing))
        .route(
            "/api/admin/games",
            get(list_pricing).post(upsert_pricing).delete(delete_pricing),
        )
}

/// Price list for the registration form
async fn public_pricing(
    State(ctx): State<AppContext>,
) -> PortalResult<Json<DataResponse<Vec<GamePricing>>>> {
    Ok(data(ctx.pricing_manager.list().await?))
}

async fn list_pricing(
    State(ctx): State<AppContext>,
    auth: AdminAuthContext,
) -> PortalResult<Json<DataResponse<Vec<GamePricing>>>> {
    require_admin_role!(auth, Role::SuperAdmin);

    Ok(data(ctx.pricing_manager.list().await?))
}

async fn upsert_pricing(
    State(ctx): State<AppContext>,
    auth: AdminAuthContext,
    ApiJson(req): ApiJson<UpsertGamePricing>,
) -> PortalResult<Json<DataResponse<GamePricing>>> {
    require_admin_role!(auth, Role::SuperAdmin);

    let pricing = ctx.pricing_manager.upsert(&req).await?;
    tracing::info!(
        "Set price of {} ({}) to {:.2}",
        pricing.game_name,
        pricing.gender,
        pricing.price
    );

    Ok(data(pricing))
}

#[derive(Debug, Deserialize)]
struct DeleteQuery {
    #[serde(default)]
    game_name: Option<String>,
    #[serde(default)]
    gender: Option<String>,
}

async fn delete_pricing(
    State(ctx): State<AppContext>,
    auth: AdminAuthContext,
    ApiQuery(query): ApiQuery<DeleteQuery>,
) -> PortalResult<Json<SuccessResponse>> {
    require_admin_role!(auth, Role::SuperAdmin);

    let (game_name, gender) = match (query.game_name, query.gender) {
        (Some(game_name), Some(gender)) if !game_name.is_empty() && !gender.is_empty() => {
            (game_name, gender)
        }
        _ => {
            return Err(PortalError::Validation(
                "game_name and gender are required".to_string(),
            ))
        }
    };

    ctx.pricing_manager.delete(&game_name, &gender).await?;

    Ok(success(None))
}
