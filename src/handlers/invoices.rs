// src/handlers/invoices.rs

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
        rbac::{PermInvoicesRead, PermInvoicesWrite, RequirePermission},
    },
    models::invoice::{EntryInvoicePayload, Invoice, InvoiceFilter},
};

#[utoipa::path(
    get,
    path = "/api/invoices",
    tag = "Invoices",
    params(ListQuery, InvoiceFilter),
    responses((status = 200, description = "Notas paginadas", body = Page<Invoice>)),
    security(("api_jwt" = []))
)]
pub async fn list_invoices(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermInvoicesRead>,
    Query(query): Query<ListQuery>,
    Query(filter): Query<InvoiceFilter>,
) -> Result<Json<Page<Invoice>>, ApiError> {
    let page = app_state
        .invoice_service
        .list(&query, &filter)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(page))
}

// Lançamento manual de nota de entrada (soma estoque)
#[utoipa::path(
    post,
    path = "/api/invoices/entry",
    tag = "Invoices",
    request_body = EntryInvoicePayload,
    responses(
        (status = 201, description = "Nota lançada; estoque atualizado", body = Invoice),
        (status = 400, description = "Chave de acesso ou itens inválidos"),
        (status = 409, description = "Nota já lançada")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_entry_invoice(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    _guard: RequirePermission<PermInvoicesWrite>,
    Json(payload): Json<EntryInvoicePayload>,
) -> Result<impl IntoResponse, ApiError> {
    let invoice = app_state
        .invoice_service
        .create_entry(payload, &user.actor())
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(invoice)))
}

#[utoipa::path(
    get,
    path = "/api/invoices/{id}",
    tag = "Invoices",
    params(("id" = Uuid, Path, description = "ID da nota")),
    responses(
        (status = 200, description = "Nota fiscal", body = Invoice),
        (status = 404, description = "Não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_invoice(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermInvoicesRead>,
    Path(id): Path<Uuid>,
) -> Result<Json<Invoice>, ApiError> {
    let invoice = app_state
        .invoice_service
        .get(id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(invoice))
}
