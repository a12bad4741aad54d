// src/handlers/inventory.rs

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
        auth::AuthenticatedUser,
        i18n::Locale,
        rbac::{PermInventoryRead, PermInventoryWrite, RequirePermission},
    },
    models::{
        kardex::{KardexEntry, KardexQuery},
        product::{AdjustStockPayload, LowStockEntry, LowStockQuery, Product, ProductPayload},
    },
};

#[utoipa::path(
    get,
    path = "/api/inventory/products",
    tag = "Inventory",
    params(ListQuery),
    responses(
        (status = 200, description = "Produtos paginados", body = Page<Product>),
        (status = 403, description = "Sem permissão")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_products(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermInventoryRead>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Page<Product>>, ApiError> {
    let page = app_state
        .inventory_service
        .list_products(&query)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(page))
}

#[utoipa::path(
    post,
    path = "/api/inventory/products",
    tag = "Inventory",
    request_body = ProductPayload,
    responses(
        (status = 201, description = "Produto cadastrado", body = Product),
        (status = 400, description = "Dados inválidos"),
        (status = 409, description = "Código já existe")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_product(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    _guard: RequirePermission<PermInventoryWrite>,
    Json(payload): Json<ProductPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let product = app_state
        .inventory_service
        .create_product(payload, &user.actor())
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(product)))
}

#[utoipa::path(
    get,
    path = "/api/inventory/products/{id}",
    tag = "Inventory",
    params(("id" = Uuid, Path, description = "ID do produto")),
    responses(
        (status = 200, description = "Produto", body = Product),
        (status = 404, description = "Não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_product(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermInventoryRead>,
    Path(id): Path<Uuid>,
) -> Result<Json<Product>, ApiError> {
    let product = app_state
        .inventory_service
        .get_product(id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(product))
}

#[utoipa::path(
    put,
    path = "/api/inventory/products/{id}",
    tag = "Inventory",
    params(("id" = Uuid, Path, description = "ID do produto")),
    request_body = ProductPayload,
    responses(
        (status = 200, description = "Produto atualizado (o saldo não muda)", body = Product),
        (status = 404, description = "Não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_product(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermInventoryWrite>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ProductPayload>,
) -> Result<Json<Product>, ApiError> {
    let product = app_state
        .inventory_service
        .update_product(id, payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(product))
}

#[utoipa::path(
    delete,
    path = "/api/inventory/products/{id}",
    tag = "Inventory",
    params(("id" = Uuid, Path, description = "ID do produto")),
    responses(
        (status = 204, description = "Removido"),
        (status = 404, description = "Não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_product(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermInventoryWrite>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    app_state
        .inventory_service
        .delete_product(id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}

// Ajuste manual de saldo (inventário físico, perdas...)
#[utoipa::path(
    post,
    path = "/api/inventory/products/{id}/adjust",
    tag = "Inventory",
    params(("id" = Uuid, Path, description = "ID do produto")),
    request_body = AdjustStockPayload,
    responses(
        (status = 201, description = "Movimentação registrada no Kardex", body = KardexEntry),
        (status = 422, description = "Estoque insuficiente")
    ),
    security(("api_jwt" = []))
)]
pub async fn adjust_stock(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    _guard: RequirePermission<PermInventoryWrite>,
    Path(id): Path<Uuid>,
    Json(payload): Json<AdjustStockPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let entry = app_state
        .inventory_service
        .adjust_stock(id, payload, &user.actor())
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(entry)))
}

#[utoipa::path(
    get,
    path = "/api/inventory/low-stock",
    tag = "Inventory",
    params(LowStockQuery),
    responses(
        (status = 200, description = "Produtos com saldo no limite ou abaixo", body = Vec<LowStockEntry>)
    ),
    security(("api_jwt" = []))
)]
pub async fn low_stock(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermInventoryRead>,
    Query(query): Query<LowStockQuery>,
) -> Result<Json<Vec<LowStockEntry>>, ApiError> {
    let entries = app_state
        .inventory_service
        .low_stock(query.threshold)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(entries))
}

#[utoipa::path(
    get,
    path = "/api/inventory/kardex",
    tag = "Inventory",
    params(KardexQuery),
    responses(
        (status = 200, description = "Movimentações, mais recentes primeiro", body = Vec<KardexEntry>)
    ),
    security(("api_jwt" = []))
)]
pub async fn kardex(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermInventoryRead>,
    Query(query): Query<KardexQuery>,
) -> Result<Json<Vec<KardexEntry>>, ApiError> {
    let entries = app_state
        .inventory_service
        .kardex(&query)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(entries))
}
