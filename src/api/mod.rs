/// API routes and handlers
pub mod auth;
pub mod coupons;
pub mod extract;
pub mod finance;
pub mod games;
pub mod health;
pub mod inventory;
pub mod middleware;
pub mod registrations;
pub mod settings;

use crate::context::AppContext;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

/// Build API routes
pub fn routes() -> Router<AppContext> {
    Router::new()
        .merge(health::routes())
        .merge(auth::routes())
        .merge(registrations::routes())
        .merge(coupons::routes())
        .merge(games::routes())
        .merge(settings::routes())
        .merge(inventory::routes())
        .merge(finance::routes())
}

/// `{success: true, data}` envelope used by list and detail endpoints
#[derive(Debug, Serialize, Deserialize)]
pub struct DataResponse<T> {
    pub success: bool,
    pub data: T,
}

pub fn data<T: Serialize>(data: T) -> Json<DataResponse<T>> {
    Json(DataResponse {
        success: true,
        data,
    })
}

/// `{success: true}` with an optional message
#[derive(Debug, Serialize, Deserialize)]
pub struct SuccessResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

pub fn success(message: Option<&str>) -> Json<SuccessResponse> {
    Json(SuccessResponse {
        success: true,
        message: message.map(str::to_string),
    })
}
