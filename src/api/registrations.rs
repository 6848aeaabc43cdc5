/// Registration endpoints
use crate::{
    admin::Role,
    api::{data, extract::{ApiJson, ApiPath, ApiQuery}, DataResponse},
    auth::AdminAuthContext,
    context::AppContext,
    error::{PortalError, PortalResult},
    registration::{
        Registration, RegistrationFilter, RegistrationReceipt, RegistrationRequest,
        RegistrationStats, RegistrationStatus, StatusUpdate,
    },
    require_admin_role,
};
use axum::{
    extract::State,
    routing::{get, patch},
    Json, Router,
};

/// Build registration routes
pub fn routes() -> Router<AppContext> {
    Router::new()
        .route(
            "/api/registrations",
            get(list_registrations).post(create_registration),
        )
        .route("/api/registrations/:id/status", patch(update_status))
        .route("/api/stats", get(stats))
}

/// Public registration form submission
async fn create_registration(
    State(ctx): State<AppContext>,
    ApiJson(req): ApiJson<RegistrationRequest>,
) -> PortalResult<Json<RegistrationReceipt>> {
    let reg = req.validate()?;
    let receipt = ctx.registration_manager.create(&reg).await?;

    Ok(Json(receipt))
}

async fn list_registrations(
    State(ctx): State<AppContext>,
    auth: AdminAuthContext,
    ApiQuery(filter): ApiQuery<RegistrationFilter>,
) -> PortalResult<Json<DataResponse<Vec<Registration>>>> {
    require_admin_role!(auth, Role::RegistrationAdmin);

    let registrations = ctx.registration_manager.list(&filter).await?;
    tracing::debug!("Returning {} registrations", registrations.len());

    Ok(data(registrations))
}

async fn update_status(
    State(ctx): State<AppContext>,
    auth: AdminAuthContext,
    ApiPath(id): ApiPath<String>,
    ApiJson(req): ApiJson<StatusUpdate>,
) -> PortalResult<Json<DataResponse<Registration>>> {
    require_admin_role!(auth, Role::RegistrationAdmin);

    let status = RegistrationStatus::parse(&req.status).ok_or_else(|| {
        PortalError::invalid_field(
            "status",
            "Status must be pending_cash, pending_online, paid or rejected",
        )
    })?;

    let registration = ctx.registration_manager.update_status(&id, status).await?;

    Ok(data(registration))
}

async fn stats(
    State(ctx): State<AppContext>,
    auth: AdminAuthContext,
) -> PortalResult<Json<DataResponse<RegistrationStats>>> {
    require_admin_role!(auth, Role::RegistrationAdmin);

    Ok(data(ctx.registration_manager.stats().await?))
}
