// src/handlers/goals.rs

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
        rbac::{PermGoalsRead, PermGoalsWrite, RequirePermission},
    },
    models::goal::{GoalFilter, GoalPayload, GoalView, ProgressPayload},
};

#[utoipa::path(
    get,
    path = "/api/goals",
    tag = "Goals",
    params(ListQuery, GoalFilter),
    responses((status = 200, description = "Metas com progresso e status efetivo", body = Page<GoalView>)),
    security(("api_jwt" = []))
)]
pub async fn list_goals(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermGoalsRead>,
    Query(query): Query<ListQuery>,
    Query(filter): Query<GoalFilter>,
) -> Result<Json<Page<GoalView>>, ApiError> {
    let page = app_state
        .goal_service
        .list(&query, &filter)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(page))
}

#[utoipa::path(
    post,
    path = "/api/goals",
    tag = "Goals",
    request_body = GoalPayload,
    responses(
        (status = 201, description = "Meta criada", body = GoalView),
        (status = 400, description = "Dados inválidos")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_goal(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermGoalsWrite>,
    Json(payload): Json<GoalPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let goal = app_state
        .goal_service
        .create(payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(goal)))
}

#[utoipa::path(
    get,
    path = "/api/goals/{id}",
    tag = "Goals",
    params(("id" = Uuid, Path, description = "ID da meta")),
    responses((status = 200, description = "Meta", body = GoalView)),
    security(("api_jwt" = []))
)]
pub async fn get_goal(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermGoalsRead>,
    Path(id): Path<Uuid>,
) -> Result<Json<GoalView>, ApiError> {
    let goal = app_state
        .goal_service
        .get(id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(goal))
}

#[utoipa::path(
    put,
    path = "/api/goals/{id}",
    tag = "Goals",
    params(("id" = Uuid, Path, description = "ID da meta")),
    request_body = GoalPayload,
    responses((status = 200, description = "Meta atualizada", body = GoalView)),
    security(("api_jwt" = []))
)]
pub async fn update_goal(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermGoalsWrite>,
    Path(id): Path<Uuid>,
    Json(payload): Json<GoalPayload>,
) -> Result<Json<GoalView>, ApiError> {
    let goal = app_state
        .goal_service
        .update(id, payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(goal))
}

#[utoipa::path(
    post,
    path = "/api/goals/{id}/progress",
    tag = "Goals",
    params(("id" = Uuid, Path, description = "ID da meta")),
    request_body = ProgressPayload,
    responses(
        (status = 200, description = "Progresso atualizado", body = GoalView),
        (status = 422, description = "Meta cancelada")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_goal_progress(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermGoalsWrite>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ProgressPayload>,
) -> Result<Json<GoalView>, ApiError> {
    let goal = app_state
        .goal_service
        .update_progress(id, payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(goal))
}

#[utoipa::path(
    delete,
    path = "/api/goals/{id}",
    tag = "Goals",
    params(("id" = Uuid, Path, description = "ID da meta")),
    responses((status = 204, description = "Removida")),
    security(("api_jwt" = []))
)]
pub async fn delete_goal(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermGoalsWrite>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    app_state
        .goal_service
        .delete(id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}
