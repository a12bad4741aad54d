// src/middleware/auth.rs

use axum::{
    extract::{FromRef, FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::i18n::Locale,
    models::{employee::Employee, Actor},
};

// O middleware: valida o Bearer token e guarda o funcionário nos "extensions"
pub async fn auth_guard(
    State(app_state): State<AppState>,
    locale: Locale,
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let to_api = |e: AppError| e.to_api_error(&locale, &app_state.i18n_store);

    let TypedHeader(Authorization(bearer)) = bearer.ok_or(AppError::InvalidToken).map_err(to_api)?;
    let employee = app_state
        .auth_service
        .validate_token(bearer.token())
        .await
        .map_err(to_api)?;

    request.extensions_mut().insert(AuthenticatedUser(employee));
    Ok(next.run(request).await)
}

// Extrator para obter o funcionário autenticado diretamente nos handlers
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub Employee);

impl AuthenticatedUser {
    pub fn actor(&self) -> Actor {
        self.0.actor()
    }
}

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(user) = parts.extensions.get::<AuthenticatedUser>() {
            return Ok(user.clone());
        }

        let app_state = AppState::from_ref(state);
        let Ok(locale) = Locale::from_request_parts(parts, state).await;
        Err(AppError::InvalidToken.to_api_error(&locale, &app_state.i18n_store))
    }
}
