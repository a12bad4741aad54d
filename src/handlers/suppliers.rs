// src/handlers/suppliers.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;

use crate::{
    common::{
        error::ApiError,
        pagination::{ListQuery, Page},
    },
    config::AppState,
    middleware::{
        i18n::Locale,
        rbac::{PermPurchasesRead, PermPurchasesWrite, RequirePermission},
    },
    models::supplier::{SetActivePayload, Supplier, SupplierFilter, SupplierPayload},
};

// Fornecedores ficam sob as permissões de compras

#[utoipa::path(
    get,
    path = "/api/suppliers",
    tag = "Suppliers",
    params(ListQuery, SupplierFilter),
    responses((status = 200, description = "Fornecedores paginados", body = Page<Supplier>)),
    security(("api_jwt" = []))
)]
pub async fn list_suppliers(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermPurchasesRead>,
    Query(query): Query<ListQuery>,
    Query(filter): Query<SupplierFilter>,
) -> Result<Json<Page<Supplier>>, ApiError> {
    let page = app_state
        .supplier_service
        .list(&query, &filter)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(page))
}

#[utoipa::path(
    post,
    path = "/api/suppliers",
    tag = "Suppliers",
    request_body = SupplierPayload,
    responses(
        (status = 201, description = "Fornecedor cadastrado", body = Supplier),
        (status = 400, description = "Dados inválidos (CNPJ/CPF, e-mail...)"),
        (status = 409, description = "Código já existe")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_supplier(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermPurchasesWrite>,
    Json(payload): Json<SupplierPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let supplier = app_state
        .supplier_service
        .create(payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(supplier)))
}

#[utoipa::path(
    get,
    path = "/api/suppliers/{id}",
    tag = "Suppliers",
    params(("id" = Uuid, Path, description = "ID do fornecedor")),
    responses(
        (status = 200, description = "Fornecedor", body = Supplier),
        (status = 404, description = "Não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_supplier(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermPurchasesRead>,
    Path(id): Path<Uuid>,
) -> Result<Json<Supplier>, ApiError> {
    let supplier = app_state
        .supplier_service
        .get(id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(supplier))
}

#[utoipa::path(
    put,
    path = "/api/suppliers/{id}",
    tag = "Suppliers",
    params(("id" = Uuid, Path, description = "ID do fornecedor")),
    request_body = SupplierPayload,
    responses((status = 200, description = "Fornecedor atualizado", body = Supplier)),
    security(("api_jwt" = []))
)]
pub async fn update_supplier(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermPurchasesWrite>,
    Path(id): Path<Uuid>,
    Json(payload): Json<SupplierPayload>,
) -> Result<Json<Supplier>, ApiError> {
    let supplier = app_state
        .supplier_service
        .update(id, payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(supplier))
}

#[utoipa::path(
    patch,
    path = "/api/suppliers/{id}/active",
    tag = "Suppliers",
    params(("id" = Uuid, Path, description = "ID do fornecedor")),
    request_body = SetActivePayload,
    responses((status = 200, description = "Status atualizado", body = Supplier)),
    security(("api_jwt" = []))
)]
pub async fn set_supplier_active(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermPurchasesWrite>,
    Path(id): Path<Uuid>,
    Json(payload): Json<SetActivePayload>,
) -> Result<Json<Supplier>, ApiError> {
    let supplier = app_state
        .supplier_service
        .set_active(id, payload.active)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(supplier))
}

#[utoipa::path(
    delete,
    path = "/api/suppliers/{id}",
    tag = "Suppliers",
    params(("id" = Uuid, Path, description = "ID do fornecedor")),
    responses((status = 204, description = "Removido")),
    security(("api_jwt" = []))
)]
pub async fn delete_supplier(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermPurchasesWrite>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    app_state
        .supplier_service
        .delete(id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}
