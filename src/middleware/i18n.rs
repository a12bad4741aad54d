// src/middleware/i18n.rs

use axum::extract::FromRequestParts;
use axum::http::{header, request::Parts};

pub const DEFAULT_LANG: &str = "en";

// Extrator de idioma (Accept-Language)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locale(pub String);

impl Locale {
    /// "pt-BR,pt;q=0.9" -> "pt"
    pub fn from_header(value: Option<&str>) -> Self {
        let lang = value
            .and_then(|header_str| {
                accept_language::parse(header_str)
                    .first()
                    .map(|tag| tag.split('-').next().unwrap_or(tag).to_lowercase())
            })
            .unwrap_or_else(|| DEFAULT_LANG.to_string());

        Locale(lang)
    }
}

impl<S> FromRequestParts<S> for Locale
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header_value = parts
            .headers
            .get(header::ACCEPT_LANGUAGE)
            .and_then(|value| value.to_str().ok());

        Ok(Locale::from_header(header_value))
    }
}
