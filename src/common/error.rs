// src/common/error.rs

use std::collections::BTreeMap;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use rust_decimal::Decimal;
use serde_json::{json, Value};
use thiserror::Error;
use validator::{ValidationErrors, ValidationErrorsKind};

use crate::{common::i18n::I18nStore, middleware::i18n::Locale};

// O erro de domínio. Os handlers convertem para ApiError com `to_api_error`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] ValidationErrors),

    #[error("E-mail já existe")]
    EmailAlreadyExists,

    #[error("Código já existe: {0}")]
    CodeAlreadyExists(String),

    #[error("Credenciais inválidas")]
    InvalidCredentials,

    #[error("Token inválido")]
    InvalidToken,

    #[error("Funcionário inativo")]
    InactiveEmployee,

    #[error("Permissão negada: {0}")]
    Forbidden(String),

    #[error("Cadastro inicial já realizado")]
    RegistrationClosed,

    #[error("Recurso não encontrado: {0}")]
    ResourceNotFound(String),

    #[error("Documento duplicado na coleção {0}")]
    DocumentConflict(String),

    #[error("Transição de status inválida: {from} -> {to}")]
    InvalidStatusTransition { from: String, to: String },

    #[error("Estoque insuficiente para {product}")]
    InsufficientStock {
        product: String,
        available: Decimal,
        requested: Decimal,
    },

    #[error("Lista de itens vazia")]
    EmptyItems,

    #[error("Documento bloqueado no status {0}")]
    DocumentLocked(String),

    #[error("Chave de acesso inválida")]
    InvalidAccessKey,

    #[error("Erro na API administrativa: {0}")]
    UpstreamError(#[from] reqwest::Error),

    #[error("API administrativa respondeu com status {0}")]
    UpstreamStatus(u16),

    #[error("Fonte não encontrada: {0}")]
    FontNotFound(String),

    #[error("Falha ao gerar PDF: {0}")]
    PdfError(String),

    #[error("Erro de banco de dados")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Documento corrompido: {0}")]
    SerializationError(#[from] serde_json::Error),

    // `anyhow::Error` guarda o contexto do erro inesperado.
    #[error("Erro interno do servidor")]
    InternalServerError(#[from] anyhow::Error),

    #[error("Erro de Bcrypt: {0}")]
    BcryptError(#[from] bcrypt::BcryptError),

    #[error("Erro de JWT: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),
}

// A resposta HTTP de erro: {"error": "...", "details": {...}}
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub error: String,
    pub details: Option<Value>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = match self.details {
            Some(details) => json!({ "error": self.error, "details": details }),
            None => json!({ "error": self.error }),
        };
        (self.status, Json(body)).into_response()
    }
}

impl AppError {
    /// Status HTTP e chave de tradução de cada variante.
    pub fn status_and_key(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::ValidationError(_) => (StatusCode::BAD_REQUEST, "VALIDATION_FAILED"),
            AppError::EmailAlreadyExists => (StatusCode::CONFLICT, "EMAIL_ALREADY_EXISTS"),
            AppError::CodeAlreadyExists(_) => (StatusCode::CONFLICT, "CODE_ALREADY_EXISTS"),
            AppError::InvalidCredentials => (StatusCode::UNAUTHORIZED, "INVALID_CREDENTIALS"),
            AppError::InvalidToken => (StatusCode::UNAUTHORIZED, "INVALID_TOKEN"),
            AppError::InactiveEmployee => (StatusCode::FORBIDDEN, "INACTIVE_EMPLOYEE"),
            AppError::Forbidden(_) => (StatusCode::FORBIDDEN, "PERMISSION_DENIED"),
            AppError::RegistrationClosed => (StatusCode::FORBIDDEN, "REGISTRATION_CLOSED"),
            AppError::ResourceNotFound(_) => (StatusCode::NOT_FOUND, "RESOURCE_NOT_FOUND"),
            AppError::DocumentConflict(_) => (StatusCode::CONFLICT, "DOCUMENT_CONFLICT"),
            AppError::InvalidStatusTransition { .. } => {
                (StatusCode::UNPROCESSABLE_ENTITY, "INVALID_STATUS_TRANSITION")
            }
            AppError::InsufficientStock { .. } => {
                (StatusCode::UNPROCESSABLE_ENTITY, "INSUFFICIENT_STOCK")
            }
            AppError::EmptyItems => (StatusCode::BAD_REQUEST, "EMPTY_ITEMS"),
            AppError::DocumentLocked(_) => (StatusCode::UNPROCESSABLE_ENTITY, "DOCUMENT_LOCKED"),
            AppError::InvalidAccessKey => (StatusCode::BAD_REQUEST, "INVALID_ACCESS_KEY"),
            AppError::UpstreamError(_) | AppError::UpstreamStatus(_) => {
                (StatusCode::BAD_GATEWAY, "UPSTREAM_ERROR")
            }
            AppError::FontNotFound(_) => (StatusCode::INTERNAL_SERVER_ERROR, "FONT_NOT_FOUND"),
            AppError::PdfError(_)
            | AppError::DatabaseError(_)
            | AppError::SerializationError(_)
            | AppError::InternalServerError(_)
            | AppError::BcryptError(_)
            | AppError::JwtError(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }

    fn message_args(&self) -> Vec<(&'static str, String)> {
        match self {
            AppError::CodeAlreadyExists(code) => vec![("code", code.clone())],
            AppError::Forbidden(permission) => vec![("permission", permission.clone())],
            AppError::ResourceNotFound(resource) => vec![("resource", resource.clone())],
            AppError::DocumentConflict(collection) => vec![("collection", collection.clone())],
            AppError::InvalidStatusTransition { from, to } => {
                vec![("from", from.clone()), ("to", to.clone())]
            }
            AppError::InsufficientStock { product, available, requested } => vec![
                ("product", product.clone()),
                ("available", available.normalize().to_string()),
                ("requested", requested.normalize().to_string()),
            ],
            AppError::DocumentLocked(status) => vec![("status", status.clone())],
            AppError::UpstreamStatus(code) => vec![("status", code.to_string())],
            AppError::FontNotFound(dir) => vec![("dir", dir.clone())],
            _ => Vec::new(),
        }
    }

    /// Converte o erro de domínio para a resposta HTTP, já traduzida.
    pub fn to_api_error(&self, locale: &Locale, store: &I18nStore) -> ApiError {
        let (status, key) = self.status_and_key();

        // O `tracing` loga a mensagem detalhada; o cliente só recebe a genérica.
        if status.is_server_error() {
            tracing::error!("Erro Interno do Servidor: {:?}", self);
        }

        let details = match self {
            AppError::ValidationError(errors) => {
                let mut fields = BTreeMap::new();
                collect_field_errors(errors, "", locale, store, &mut fields);
                Some(json!(fields))
            }
            _ => None,
        };

        ApiError {
            status,
            error: store.translate_with(&locale.0, key, &self.message_args()),
            details,
        }
    }
}

// Achata erros aninhados ("items[0].quantity") e traduz cada mensagem.
fn collect_field_errors(
    errors: &ValidationErrors,
    prefix: &str,
    locale: &Locale,
    store: &I18nStore,
    out: &mut BTreeMap<String, Vec<String>>,
) {
    for (field, kind) in errors.errors() {
        let path = if prefix.is_empty() {
            field.to_string()
        } else {
            format!("{}.{}", prefix, field)
        };

        match kind {
            ValidationErrorsKind::Field(field_errors) => {
                let messages = field_errors
                    .iter()
                    .map(|e| {
                        let key = e.message.as_deref().unwrap_or(&e.code);
                        store.translate(&locale.0, key)
                    })
                    .collect();
                out.insert(path, messages);
            }
            ValidationErrorsKind::Struct(inner) => {
                collect_field_errors(inner, &path, locale, store, out);
            }
            ValidationErrorsKind::List(items) => {
                for (index, inner) in items {
                    collect_field_errors(inner, &format!("{}[{}]", path, index), locale, store, out);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::ValidationError;

    fn store() -> I18nStore {
        I18nStore::load().unwrap()
    }

    #[test]
    fn not_found_is_translated_with_resource_name() {
        let err = AppError::ResourceNotFound("Produto".into());
        let api = err.to_api_error(&Locale("pt".into()), &store());

        assert_eq!(api.status, StatusCode::NOT_FOUND);
        assert!(api.error.contains("Produto"));
        assert!(api.details.is_none());
    }

    #[test]
    fn validation_errors_are_reported_per_field() {
        let mut errors = ValidationErrors::new();
        let mut err = ValidationError::new("length");
        err.message = Some("required".into());
        errors.add("name", err);

        let api = AppError::ValidationError(errors).to_api_error(&Locale("en".into()), &store());

        assert_eq!(api.status, StatusCode::BAD_REQUEST);
        let details = api.details.unwrap();
        assert_eq!(details["name"][0], "This field is required.");
    }

    #[test]
    fn internal_errors_hide_details() {
        let err = AppError::InternalServerError(anyhow::anyhow!("pool timeout"));
        let api = err.to_api_error(&Locale("pt".into()), &store());

        assert_eq!(api.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!api.error.contains("pool"));
    }
}
