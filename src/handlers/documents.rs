// src/handlers/documents.rs

use axum::{
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Response},
};
use uuid::Uuid;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{
        i18n::Locale,
        rbac::{PermInvoicesRead, PermSalesRead, RequirePermission},
    },
    services::document_service::DanfeLayout,
};

// Renderiza fora do runtime (genpdf é síncrono) e monta a resposta de download
async fn pdf_response(
    app_state: &AppState,
    layout: DanfeLayout,
    filename: String,
) -> Result<Response, AppError> {
    let document_service = app_state.document_service.clone();
    let pdf_bytes = tokio::task::spawn_blocking(move || document_service.render(&layout))
        .await
        .map_err(|e| AppError::InternalServerError(anyhow::Error::from(e)))??;

    // Configura os Headers para o navegador baixar o PDF
    let headers = [
        (header::CONTENT_TYPE, "application/pdf".to_string()),
        (header::CONTENT_DISPOSITION, format!("attachment; filename=\"{}\"", filename)),
    ];

    Ok((headers, pdf_bytes).into_response())
}

// DANFE do pedido: a nota real se já foi emitida, senão o espelho provisório
#[utoipa::path(
    get,
    path = "/api/orders/{id}/danfe",
    tag = "Documents",
    params(("id" = Uuid, Path, description = "ID do pedido")),
    responses(
        (status = 200, description = "PDF do DANFE", body = Vec<u8>, content_type = "application/pdf"),
        (status = 404, description = "Pedido não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn order_danfe(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermSalesRead>,
    Path(order_id): Path<Uuid>,
) -> Result<Response, ApiError> {
    let result: Result<Response, AppError> = async {
        let order = app_state.order_service.get(order_id).await?;
        let layout = match order.invoice_id {
            Some(invoice_id) => {
                let invoice = app_state.invoice_service.get(invoice_id).await?;
                app_state.document_service.invoice_layout(&invoice)
            }
            None => app_state.document_service.order_layout(&order),
        };
        pdf_response(&app_state, layout, format!("pedido_{}.pdf", order.order_number)).await
    }
    .await;

    result.map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))
}

#[utoipa::path(
    get,
    path = "/api/invoices/{id}/danfe",
    tag = "Documents",
    params(("id" = Uuid, Path, description = "ID da nota")),
    responses(
        (status = 200, description = "PDF do DANFE", body = Vec<u8>, content_type = "application/pdf"),
        (status = 404, description = "Nota não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn invoice_danfe(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermInvoicesRead>,
    Path(invoice_id): Path<Uuid>,
) -> Result<Response, ApiError> {
    let result: Result<Response, AppError> = async {
        let invoice = app_state.invoice_service.get(invoice_id).await?;
        let layout = app_state.document_service.invoice_layout(&invoice);
        pdf_response(&app_state, layout, format!("nfe_{}.pdf", invoice.number)).await
    }
    .await;

    result.map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))
}
