// src/handlers/dashboard.rs

use axum::{extract::State, Json};

use crate::{
    common::error::ApiError,
    config::AppState,
    middleware::{
        i18n::Locale,
        rbac::{PermDashboardRead, RequirePermission},
    },
    models::dashboard::DashboardSummary,
};

#[utoipa::path(
    get,
    path = "/api/dashboard/summary",
    tag = "Dashboard",
    responses(
        (status = 200, description = "Indicadores de estoque, vendas, compras e CRM", body = DashboardSummary),
        (status = 401, description = "Não autorizado"),
        (status = 403, description = "Sem permissão")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_summary(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermDashboardRead>,
) -> Result<Json<DashboardSummary>, ApiError> {
    let summary = app_state
        .dashboard_service
        .get_summary()
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(summary))
}
