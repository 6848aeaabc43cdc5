/// Coupon endpoints: public validation and super admin management
use crate::{
    admin::{Coupon, CouponCheck, Role},
    api::{data, extract::{ApiJson, ApiQuery}, success, DataResponse, SuccessResponse},
    auth::AdminAuthContext,
    context::AppContext,
    error::{PortalError, PortalResult},
    require_admin_role,
};
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Deserialize;

/// Build coupon routes
pub fn routes() -> Router<AppContext> {
    Router::new()
        .route("/api/coupons/validate", get(validate_coupon))
        .route(
            "/api/admin/coupons",
            get(list_coupons)
                .post(create_coupon)
                .patch(set_coupon_active)
                .delete(delete_coupon),
        )
}

#[derive(Debug, Deserialize)]
struct ValidateQuery {
    #[serde(default)]
    code: Option<String>,
}

/// Check a code typed into the registration form; never cached
async fn validate_coupon(
    State(ctx): State<AppContext>,
    query: Result<ApiQuery<ValidateQuery>, PortalError>,
) -> Response {
    let query = match query {
        Ok(ApiQuery(query)) => query,
        Err(e) => return no_store(e.into_response()),
    };
    let code = query.code.as_deref().map(str::trim).unwrap_or_default();

    let (status, body) = if code.is_empty() {
        (
            StatusCode::BAD_REQUEST,
            CouponCheck::invalid("Coupon code is required"),
        )
    } else {
        match ctx.coupon_manager.check_code(code).await {
            Ok(check) => (StatusCode::OK, check),
            Err(e) => return no_store(e.into_response()),
        }
    };

    no_store((status, Json(body)).into_response())
}

fn no_store(mut response: Response) -> Response {
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        header::HeaderValue::from_static("no-store"),
    );
    response
}

async fn list_coupons(
    State(ctx): State<AppContext>,
    auth: AdminAuthContext,
) -> PortalResult<Json<DataResponse<Vec<Coupon>>>> {
    require_admin_role!(auth, Role::SuperAdmin);

    Ok(data(ctx.coupon_manager.list_coupons().await?))
}

#[derive(Debug, Deserialize)]
struct CreateCouponRequest {
    #[serde(default)]
    code: String,
    #[serde(default, alias = "discountPercent")]
    discount_percent: Option<f64>,
}

async fn create_coupon(
    State(ctx): State<AppContext>,
    auth: AdminAuthContext,
    ApiJson(req): ApiJson<CreateCouponRequest>,
) -> PortalResult<Json<DataResponse<Coupon>>> {
    require_admin_role!(auth, Role::SuperAdmin);

    let coupon = ctx
        .coupon_manager
        .create_coupon(&req.code, req.discount_percent.unwrap_or(0.0))
        .await?;

    Ok(data(coupon))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SetActiveRequest {
    id: String,
    is_active: bool,
}

async fn set_coupon_active(
    State(ctx): State<AppContext>,
    auth: AdminAuthContext,
    ApiJson(req): ApiJson<SetActiveRequest>,
) -> PortalResult<Json<SuccessResponse>> {
    require_admin_role!(auth, Role::SuperAdmin);

    ctx.coupon_manager.set_active(&req.id, req.is_active).await?;
    tracing::info!("Coupon {} active={}", req.id, req.is_active);

    Ok(success(None))
}

#[derive(Debug, Deserialize)]
struct DeleteQuery {
    #[serde(default)]
    id: Option<String>,
}

async fn delete_coupon(
    State(ctx): State<AppContext>,
    auth: AdminAuthContext,
    ApiQuery(query): ApiQuery<DeleteQuery>,
) -> PortalResult<Json<SuccessResponse>> {
    require_admin_role!(auth, Role::SuperAdmin);

    let id = query
        .id
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| PortalError::invalid_field("id", "Coupon id is required"))?;

    ctx.coupon_manager.delete_coupon(&id).await?;

    Ok(success(None))
}
