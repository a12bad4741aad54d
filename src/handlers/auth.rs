// src/handlers/auth.rs

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};

use crate::{
    common::error::ApiError,
    config::AppState,
    middleware::{auth::AuthenticatedUser, i18n::Locale},
    models::employee::{
        AuthResponse, EmployeeResponse, LoginPayload, PermissionCatalog, RegisterAdminPayload,
    },
};

// Cadastro inicial (só enquanto não existe nenhum funcionário)
#[utoipa::path(
    post,
    path = "/api/auth/register",
    tag = "Auth",
    request_body = RegisterAdminPayload,
    responses(
        (status = 201, description = "Administrador criado", body = AuthResponse),
        (status = 400, description = "Dados inválidos"),
        (status = 403, description = "Cadastro inicial já realizado")
    )
)]
pub async fn register(
    State(app_state): State<AppState>,
    locale: Locale,
    Json(payload): Json<RegisterAdminPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let response = app_state
        .auth_service
        .register_admin(payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(response)))
}

#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "Auth",
    request_body = LoginPayload,
    responses(
        (status = 200, description = "Login realizado", body = AuthResponse),
        (status = 401, description = "Credenciais inválidas"),
        (status = 403, description = "Funcionário inativo")
    )
)]
pub async fn login(
    State(app_state): State<AppState>,
    locale: Locale,
    Json(payload): Json<LoginPayload>,
) -> Result<Json<AuthResponse>, ApiError> {
    let response = app_state
        .auth_service
        .login(payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(response))
}

#[utoipa::path(
    get,
    path = "/api/auth/me",
    tag = "Auth",
    responses(
        (status = 200, description = "Funcionário logado", body = EmployeeResponse),
        (status = 401, description = "Não autorizado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_me(AuthenticatedUser(employee): AuthenticatedUser) -> Json<EmployeeResponse> {
    Json(employee.into())
}

// Catálogo de permissões e a tabela cargo -> permissões
#[utoipa::path(
    get,
    path = "/api/permissions",
    tag = "Auth",
    responses(
        (status = 200, description = "Permissões do sistema", body = PermissionCatalog)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_permissions(_user: AuthenticatedUser) -> Json<PermissionCatalog> {
    Json(PermissionCatalog::build())
}
