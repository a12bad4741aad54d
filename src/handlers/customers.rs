// src/handlers/customers.rs

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
        rbac::{PermSalesRead, PermSalesWrite, RequirePermission},
    },
    models::customer::{Customer, CustomerPayload},
};

#[utoipa::path(
    get,
    path = "/api/customers",
    tag = "Customers",
    params(ListQuery),
    responses((status = 200, description = "Clientes paginados", body = Page<Customer>)),
    security(("api_jwt" = []))
)]
pub async fn list_customers(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermSalesRead>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Page<Customer>>, ApiError> {
    let page = app_state
        .customer_service
        .list(&query)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(page))
}

#[utoipa::path(
    post,
    path = "/api/customers",
    tag = "Customers",
    request_body = CustomerPayload,
    responses(
        (status = 201, description = "Cliente cadastrado", body = Customer),
        (status = 400, description = "Dados inválidos")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_customer(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermSalesWrite>,
    Json(payload): Json<CustomerPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let customer = app_state
        .customer_service
        .create(payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(customer)))
}

#[utoipa::path(
    get,
    path = "/api/customers/{id}",
    tag = "Customers",
    params(("id" = Uuid, Path, description = "ID do cliente")),
    responses(
        (status = 200, description = "Cliente", body = Customer),
        (status = 404, description = "Não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_customer(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermSalesRead>,
    Path(id): Path<Uuid>,
) -> Result<Json<Customer>, ApiError> {
    let customer = app_state
        .customer_service
        .get(id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(customer))
}

#[utoipa::path(
    put,
    path = "/api/customers/{id}",
    tag = "Customers",
    params(("id" = Uuid, Path, description = "ID do cliente")),
    request_body = CustomerPayload,
    responses((status = 200, description = "Cliente atualizado", body = Customer)),
    security(("api_jwt" = []))
)]
pub async fn update_customer(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermSalesWrite>,
    Path(id): Path<Uuid>,
    Json(payload): Json<CustomerPayload>,
) -> Result<Json<Customer>, ApiError> {
    let customer = app_state
        .customer_service
        .update(id, payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(customer))
}

#[utoipa::path(
    delete,
    path = "/api/customers/{id}",
    tag = "Customers",
    params(("id" = Uuid, Path, description = "ID do cliente")),
    responses((status = 204, description = "Removido")),
    security(("api_jwt" = []))
)]
pub async fn delete_customer(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermSalesWrite>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    app_state
        .customer_service
        .delete(id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}
