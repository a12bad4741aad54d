// src/handlers/purchases.rs

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
        rbac::{PermPurchasesRead, PermPurchasesWrite, RequirePermission},
    },
    models::purchase::{
        CreatePurchasePayload, PurchaseFilter, PurchaseOrder, QuotationPayload,
        UpdatePurchaseStatusPayload,
    },
};

#[utoipa::path(
    get,
    path = "/api/purchases",
    tag = "Purchases",
    params(ListQuery, PurchaseFilter),
    responses((status = 200, description = "Compras paginadas", body = Page<PurchaseOrder>)),
    security(("api_jwt" = []))
)]
pub async fn list_purchases(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermPurchasesRead>,
    Query(query): Query<ListQuery>,
    Query(filter): Query<PurchaseFilter>,
) -> Result<Json<Page<PurchaseOrder>>, ApiError> {
    let page = app_state
        .purchase_service
        .list(&query, &filter)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(page))
}

#[utoipa::path(
    post,
    path = "/api/purchases",
    tag = "Purchases",
    request_body = CreatePurchasePayload,
    responses(
        (status = 201, description = "Requisição criada", body = PurchaseOrder),
        (status = 400, description = "Itens vazios ou inválidos")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_purchase(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    _guard: RequirePermission<PermPurchasesWrite>,
    Json(payload): Json<CreatePurchasePayload>,
) -> Result<impl IntoResponse, ApiError> {
    let purchase = app_state
        .purchase_service
        .create(payload, &user.actor())
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(purchase)))
}

#[utoipa::path(
    get,
    path = "/api/purchases/{id}",
    tag = "Purchases",
    params(("id" = Uuid, Path, description = "ID da compra")),
    responses(
        (status = 200, description = "Compra", body = PurchaseOrder),
        (status = 404, description = "Não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_purchase(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermPurchasesRead>,
    Path(id): Path<Uuid>,
) -> Result<Json<PurchaseOrder>, ApiError> {
    let purchase = app_state
        .purchase_service
        .get(id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(purchase))
}

// Aprovação exige purchases:approve; o recebimento lança nota e estoque
#[utoipa::path(
    post,
    path = "/api/purchases/{id}/status",
    tag = "Purchases",
    params(("id" = Uuid, Path, description = "ID da compra")),
    request_body = UpdatePurchaseStatusPayload,
    responses(
        (status = 200, description = "Status alterado", body = PurchaseOrder),
        (status = 403, description = "Sem permissão para aprovar"),
        (status = 422, description = "Transição inválida")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_purchase_status(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    _guard: RequirePermission<PermPurchasesWrite>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdatePurchaseStatusPayload>,
) -> Result<Json<PurchaseOrder>, ApiError> {
    let purchase = app_state
        .purchase_service
        .update_status(id, payload.status, &user.actor(), user.0.role)
        .await
        .map_err(|e| {
            tracing::warn!("Transição de compra recusada ({}): {}", id, e);
            e.to_api_error(&locale, &app_state.i18n_store)
        })?;

    Ok(Json(purchase))
}

#[utoipa::path(
    post,
    path = "/api/purchases/{id}/quotations",
    tag = "Purchases",
    params(("id" = Uuid, Path, description = "ID da compra")),
    request_body = QuotationPayload,
    responses(
        (status = 200, description = "Cotação adicionada", body = PurchaseOrder),
        (status = 422, description = "Compra não está pendente")
    ),
    security(("api_jwt" = []))
)]
pub async fn add_quotation(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermPurchasesWrite>,
    Path(id): Path<Uuid>,
    Json(payload): Json<QuotationPayload>,
) -> Result<Json<PurchaseOrder>, ApiError> {
    let purchase = app_state
        .purchase_service
        .add_quotation(id, payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(purchase))
}

#[utoipa::path(
    post,
    path = "/api/purchases/{id}/quotations/{index}/select",
    tag = "Purchases",
    params(
        ("id" = Uuid, Path, description = "ID da compra"),
        ("index" = usize, Path, description = "Posição da cotação (a partir de 0)")
    ),
    responses(
        (status = 200, description = "Cotação escolhida; fornecedor atualizado", body = PurchaseOrder),
        (status = 404, description = "Cotação não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn select_quotation(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermPurchasesWrite>,
    Path((id, index)): Path<(Uuid, usize)>,
) -> Result<Json<PurchaseOrder>, ApiError> {
    let purchase = app_state
        .purchase_service
        .select_quotation(id, index)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(purchase))
}

#[utoipa::path(
    delete,
    path = "/api/purchases/{id}",
    tag = "Purchases",
    params(("id" = Uuid, Path, description = "ID da compra")),
    responses(
        (status = 204, description = "Removida"),
        (status = 422, description = "Só pendentes ou canceladas")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_purchase(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermPurchasesWrite>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    app_state
        .purchase_service
        .delete(id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}
