/// Finance endpoints
use crate::{
    admin::{
        finance::{CreateRecordRequest, RecordFilter},
        FinanceRecord, FinanceSummary, Role,
    },
    api::{data, extract::{ApiJson, ApiPath, ApiQuery}, success, DataResponse, SuccessResponse},
    auth::AdminAuthContext,
    context::AppContext,
    error::PortalResult,
    require_admin_role,
};
use axum::{
    extract::State,
    routing::{delete, get},
    Json, Router,
};

/// Build finance routes
pub fn routes() -> Router<AppContext> {
    Router::new()
        .route("/api/admin/finance", get(list_records).post(create_record))
        .route("/api/admin/finance/summary", get(summary))
        .route("/api/admin/finance/:id", delete(delete_record))
}

async fn list_records(
    State(ctx): State<AppContext>,
    auth: AdminAuthContext,
    ApiQuery(filter): ApiQuery<RecordFilter>,
) -> PortalResult<Json<DataResponse<Vec<FinanceRecord>>>> {
    require_admin_role!(auth, Role::FinanceAdmin);

    Ok(data(ctx.finance_manager.list(&filter).await?))
}

async fn create_record(
    State(ctx): State<AppContext>,
    auth: AdminAuthContext,
    ApiJson(req): ApiJson<CreateRecordRequest>,
) -> PortalResult<Json<DataResponse<FinanceRecord>>> {
    require_admin_role!(auth, Role::FinanceAdmin);

    let record = ctx
        .finance_manager
        .create(&req, Some(&auth.actor()))
        .await?;

    Ok(data(record))
}

async fn delete_record(
    State(ctx): State<AppContext>,
    auth: AdminAuthContext,
    ApiPath(id): ApiPath<String>,
) -> PortalResult<Json<SuccessResponse>> {
    require_admin_role!(auth, Role::FinanceAdmin);

    ctx.finance_manager.delete(&id).await?;
    tracing::info!("Deleted finance record {}", id);

    Ok(success(None))
}

async fn summary(
    State(ctx): State<AppContext>,
    auth: AdminAuthContext,
    ApiQuery(filter): ApiQuery<RecordFilter>,
) -> PortalResult<Json<DataResponse<FinanceSummary>>> {
    require_admin_role!(auth, Role::FinanceAdmin);

    Ok(data(ctx.finance_manager.summary(&filter).await?))
}
