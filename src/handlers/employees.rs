// src/handlers/employees.rs

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
        rbac::{PermHrRead, PermHrWrite, RequirePermission},
    },
    models::employee::{EmployeePayload, EmployeeResponse},
};

#[utoipa::path(
    get,
    path = "/api/employees",
    tag = "Employees",
    params(ListQuery),
    responses((status = 200, description = "Funcionários paginados", body = Page<EmployeeResponse>)),
    security(("api_jwt" = []))
)]
pub async fn list_employees(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermHrRead>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Page<EmployeeResponse>>, ApiError> {
    let page = app_state
        .employee_service
        .list(&query)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(page))
}

#[utoipa::path(
    post,
    path = "/api/employees",
    tag = "Employees",
    request_body = EmployeePayload,
    responses(
        (status = 201, description = "Funcionário cadastrado", body = EmployeeResponse),
        (status = 400, description = "Dados inválidos"),
        (status = 409, description = "E-mail já existe")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_employee(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermHrWrite>,
    Json(payload): Json<EmployeePayload>,
) -> Result<impl IntoResponse, ApiError> {
    let employee = app_state
        .employee_service
        .create(payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(employee)))
}

#[utoipa::path(
    get,
    path = "/api/employees/{id}",
    tag = "Employees",
    params(("id" = Uuid, Path, description = "ID do funcionário")),
    responses(
        (status = 200, description = "Funcionário", body = EmployeeResponse),
        (status = 404, description = "Não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_employee(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermHrRead>,
    Path(id): Path<Uuid>,
) -> Result<Json<EmployeeResponse>, ApiError> {
    let employee = app_state
        .employee_service
        .get(id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(employee.into()))
}

#[utoipa::path(
    put,
    path = "/api/employees/{id}",
    tag = "Employees",
    params(("id" = Uuid, Path, description = "ID do funcionário")),
    request_body = EmployeePayload,
    responses((status = 200, description = "Funcionário atualizado", body = EmployeeResponse)),
    security(("api_jwt" = []))
)]
pub async fn update_employee(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermHrWrite>,
    Path(id): Path<Uuid>,
    Json(payload): Json<EmployeePayload>,
) -> Result<Json<EmployeeResponse>, ApiError> {
    let employee = app_state
        .employee_service
        .update(id, payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(employee))
}

#[utoipa::path(
    delete,
    path = "/api/employees/{id}",
    tag = "Employees",
    params(("id" = Uuid, Path, description = "ID do funcionário")),
    responses((status = 204, description = "Removido")),
    security(("api_jwt" = []))
)]
pub async fn delete_employee(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermHrWrite>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    app_state
        .employee_service
        .delete(id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}
