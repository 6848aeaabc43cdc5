/// Admin login, logout and session endpoints
use crate::{
    account::{LoginRequest, LoginResponse, SESSION_COOKIE},
    admin::roles::landing_for,
    api::{extract::ApiJson, middleware::extract_session_token, success, SuccessResponse},
    auth::AdminAuthContext,
    context::AppContext,
    error::PortalResult,
};
use axum::{
    extract::State,
    http::HeaderMap,
    routing::{get, post},
    Json, Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Build auth routes
pub fn routes() -> Router<AppContext> {
    Router::new()
        .route("/api/admin/login", post(login))
        .route("/api/admin/logout", post(logout))
        .route("/api/admin/session", get(session))
}

/// Authenticate and set the session cookie
async fn login(
    State(ctx): State<AppContext>,
    jar: CookieJar,
    ApiJson(req): ApiJson<LoginRequest>,
) -> PortalResult<(CookieJar, Json<LoginResponse>)> {
    let username = req.username.unwrap_or_default();
    let password = req.password.unwrap_or_default();

    let issued = ctx.admin_manager.login(&username, &password).await?;

    let ttl_hours = ctx.config.authentication.session_ttl_hours;
    let cookie = Cookie::build((SESSION_COOKIE, issued.token.clone()))
        .http_only(true)
        .same_site(SameSite::Lax)
        .path("/")
        .secure(ctx.config.authentication.cookie_secure)
        .max_age(time::Duration::hours(ttl_hours));

    let response = LoginResponse {
        success: true,
        message: "Login successful".to_string(),
        session_token: issued.token,
        redirect_to: landing_for(&issued.role).to_string(),
        role: issued.role,
    };

    Ok((jar.add(cookie), Json(response)))
}

/// Delete the current session, if any, and clear the cookie
async fn logout(
    State(ctx): State<AppContext>,
    jar: CookieJar,
    headers: HeaderMap,
) -> PortalResult<(CookieJar, Json<SuccessResponse>)> {
    if let Some(token) = extract_session_token(&headers) {
        ctx.admin_manager.delete_session(&token).await?;
    }

    Ok((
        jar.remove(Cookie::build(SESSION_COOKIE).path("/")),
        success(Some("Logged out successfully")),
    ))
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub success: bool,
    pub username: Option<String>,
    pub role: String,
    pub redirect_to: String,
    pub expires_at: DateTime<Utc>,
}

/// Describe the caller's session
async fn session(auth: AdminAuthContext) -> Json<SessionResponse> {
    Json(SessionResponse {
        success: true,
        username: auth.session.username.clone(),
        role: auth.session.role_name.clone(),
        redirect_to: landing_for(&auth.session.role_name).to_string(),
        expires_at: auth.session.expires_at,
    })
}
