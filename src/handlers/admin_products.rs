// src/handlers/admin_products.rs
//
// Proxy para a API administrativa de produtos.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::{
    clients::AdminProduct,
    common::error::ApiError,
    config::AppState,
    middleware::{
        i18n::Locale,
        rbac::{PermInventoryRead, PermInventoryWrite, RequirePermission},
    },
};

#[utoipa::path(
    get,
    path = "/api/admin-products",
    tag = "Admin Products",
    responses(
        (status = 200, description = "Produtos da API administrativa", body = Vec<AdminProduct>),
        (status = 502, description = "Falha na API administrativa")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_admin_products(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermInventoryRead>,
) -> Result<Json<Vec<AdminProduct>>, ApiError> {
    let products = app_state
        .admin_products
        .list_all()
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(products))
}

#[utoipa::path(
    get,
    path = "/api/admin-products/{id}",
    tag = "Admin Products",
    params(("id" = String, Path, description = "ID na API administrativa")),
    responses(
        (status = 200, description = "Produto", body = AdminProduct),
        (status = 404, description = "Não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_admin_product(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermInventoryRead>,
    Path(id): Path<String>,
) -> Result<Json<AdminProduct>, ApiError> {
    let product = app_state
        .admin_products
        .fetch(&id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(product))
}

#[utoipa::path(
    put,
    path = "/api/admin-products/{id}",
    tag = "Admin Products",
    params(("id" = String, Path, description = "ID na API administrativa")),
    request_body = AdminProduct,
    responses((status = 200, description = "Produto atualizado", body = AdminProduct)),
    security(("api_jwt" = []))
)]
pub async fn update_admin_product(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermInventoryWrite>,
    Path(id): Path<String>,
    Json(product): Json<AdminProduct>,
) -> Result<Json<AdminProduct>, ApiError> {
    let updated = app_state
        .admin_products
        .update(&id, &product)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(updated))
}

#[utoipa::path(
    delete,
    path = "/api/admin-products/{id}",
    tag = "Admin Products",
    params(("id" = String, Path, description = "ID na API administrativa")),
    responses((status = 204, description = "Removido")),
    security(("api_jwt" = []))
)]
pub async fn delete_admin_product(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermInventoryWrite>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    app_state
        .admin_products
        .delete(&id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}
