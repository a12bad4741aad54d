// src/handlers/orders.rs

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
        rbac::{PermInvoicesWrite, PermSalesRead, PermSalesWrite, RequirePermission},
    },
    models::{
        invoice::Invoice,
        order::{CreateOrderPayload, Order, OrderFilter, UpdateOrderStatusPayload},
    },
};

#[utoipa::path(
    get,
    path = "/api/orders",
    tag = "Orders",
    params(ListQuery, OrderFilter),
    responses((status = 200, description = "Pedidos paginados, mais recentes primeiro", body = Page<Order>)),
    security(("api_jwt" = []))
)]
pub async fn list_orders(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermSalesRead>,
    Query(query): Query<ListQuery>,
    Query(filter): Query<OrderFilter>,
) -> Result<Json<Page<Order>>, ApiError> {
    let page = app_state
        .order_service
        .list(&query, &filter)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(page))
}

#[utoipa::path(
    post,
    path = "/api/orders",
    tag = "Orders",
    request_body = CreateOrderPayload,
    responses(
        (status = 201, description = "Pedido criado com status pending", body = Order),
        (status = 400, description = "Itens vazios ou inválidos")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_order(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    _guard: RequirePermission<PermSalesWrite>,
    Json(payload): Json<CreateOrderPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let order = app_state
        .order_service
        .create(payload, &user.actor())
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(order)))
}

#[utoipa::path(
    get,
    path = "/api/orders/{id}",
    tag = "Orders",
    params(("id" = Uuid, Path, description = "ID do pedido")),
    responses(
        (status = 200, description = "Pedido", body = Order),
        (status = 404, description = "Não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_order(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermSalesRead>,
    Path(id): Path<Uuid>,
) -> Result<Json<Order>, ApiError> {
    let order = app_state
        .order_service
        .get(id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(order))
}

#[utoipa::path(
    post,
    path = "/api/orders/{id}/status",
    tag = "Orders",
    params(("id" = Uuid, Path, description = "ID do pedido")),
    request_body = UpdateOrderStatusPayload,
    responses(
        (status = 200, description = "Status avançado", body = Order),
        (status = 422, description = "Transição inválida")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_order_status(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    _guard: RequirePermission<PermSalesWrite>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateOrderStatusPayload>,
) -> Result<Json<Order>, ApiError> {
    let order = app_state
        .order_service
        .update_status(id, payload.status, &user.actor())
        .await
        .map_err(|e| {
            tracing::warn!("Transição de pedido recusada ({}): {}", id, e);
            e.to_api_error(&locale, &app_state.i18n_store)
        })?;

    Ok(Json(order))
}

// Emissão da nota de saída (baixa o estoque)
#[utoipa::path(
    post,
    path = "/api/orders/{id}/invoice",
    tag = "Orders",
    params(("id" = Uuid, Path, description = "ID do pedido")),
    responses(
        (status = 201, description = "Nota de saída do pedido", body = Invoice),
        (status = 422, description = "Estoque insuficiente")
    ),
    security(("api_jwt" = []))
)]
pub async fn issue_order_invoice(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    _guard: RequirePermission<PermInvoicesWrite>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let invoice = app_state
        .order_service
        .issue_invoice(id, &user.actor())
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(invoice)))
}

#[utoipa::path(
    delete,
    path = "/api/orders/{id}",
    tag = "Orders",
    params(("id" = Uuid, Path, description = "ID do pedido")),
    responses(
        (status = 204, description = "Removido"),
        (status = 422, description = "Só pedidos pendentes podem ser removidos")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_order(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermSalesWrite>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    app_state
        .order_service
        .delete(id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}
