/// System settings endpoints
use crate::{
    admin::Role,
    api::{data, extract::ApiJson, success, DataResponse, SuccessResponse},
    auth::AdminAuthContext,
    context::AppContext,
    error::{PortalError, PortalResult},
    require_admin_role,
};
use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use validator::ValidateEmail;

/// Build settings routes
pub fn routes() -> Router<AppContext> {
    Router::new()
        .route("/api/admin/settings", get(get_settings).post(set_setting))
        .route("/api/admin/email/test", post(send_test_email))
        .route("/api/public/registration-status", get(registration_status))
}

async fn get_settings(
    State(ctx): State<AppContext>,
    auth: AdminAuthContext,
) -> PortalResult<Json<DataResponse<BTreeMap<String, String>>>> {
    require_admin_role!(auth, Role::SuperAdmin);

    Ok(data(ctx.settings_manager.get_all().await?))
}

#[derive(Debug, Deserialize)]
struct SetSettingRequest {
    key: String,
    #[serde(default)]
    value: serde_json::Value,
}

async fn set_setting(
    State(ctx): State<AppContext>,
    auth: AdminAuthContext,
    ApiJson(req): ApiJson<SetSettingRequest>,
) -> PortalResult<Json<SuccessResponse>> {
    require_admin_role!(auth, Role::SuperAdmin);

    let value = match req.value {
        serde_json::Value::Null => String::new(),
        serde_json::Value::String(s) => s,
        other => other.to_string(),
    };

    ctx.settings_manager.set(&req.key, &value).await?;

    Ok(success(None))
}

#[derive(Debug, Deserialize)]
struct TestEmailRequest {
    to: String,
}

async fn send_test_email(
    State(ctx): State<AppContext>,
    auth: AdminAuthContext,
    ApiJson(req): ApiJson<TestEmailRequest>,
) -> PortalResult<Json<SuccessResponse>> {
    require_admin_role!(auth, Role::SuperAdmin);

    let to = req.to.trim();
    if !to.validate_email() {
        return Err(PortalError::invalid_field("to", "Invalid email address"));
    }

    ctx.mailer.send_test(to).await?;

    Ok(success(Some("Test email sent")))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RegistrationStatusResponse {
    pub success: bool,
    pub open: bool,
}

/// Whether the public form accepts registrations
async fn registration_status(State(ctx): State<AppContext>) -> Json<RegistrationStatusResponse> {
    Json(RegistrationStatusResponse {
        success: true,
        open: ctx.settings_manager.registrations_open().await,
    })
}
