// src/handlers/crm.rs

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
        rbac::{PermCrmRead, PermCrmWrite, RequirePermission},
    },
    models::crm::{
        Campaign, CampaignPayload, Lead, LeadPayload, LeadStatusPayload, Opportunity,
        OpportunityDraft, OpportunityPayload, OpportunityStagePayload,
    },
};

// ---
// LEADS
// ---

#[utoipa::path(
    get,
    path = "/api/crm/leads",
    tag = "CRM",
    params(ListQuery),
    responses((status = 200, description = "Leads paginados", body = Page<Lead>)),
    security(("api_jwt" = []))
)]
pub async fn list_leads(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermCrmRead>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Page<Lead>>, ApiError> {
    let page = app_state
        .crm_service
        .list_leads(&query)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(page))
}

#[utoipa::path(
    post,
    path = "/api/crm/leads",
    tag = "CRM",
    request_body = LeadPayload,
    responses((status = 201, description = "Lead cadastrado", body = Lead)),
    security(("api_jwt" = []))
)]
pub async fn create_lead(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermCrmWrite>,
    Json(payload): Json<LeadPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let lead = app_state
        .crm_service
        .create_lead(payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(lead)))
}

#[utoipa::path(
    get,
    path = "/api/crm/leads/{id}",
    tag = "CRM",
    params(("id" = Uuid, Path, description = "ID do lead")),
    responses(
        (status = 200, description = "Lead", body = Lead),
        (status = 404, description = "Não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_lead(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermCrmRead>,
    Path(id): Path<Uuid>,
) -> Result<Json<Lead>, ApiError> {
    let lead = app_state
        .crm_service
        .get_lead(id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(lead))
}

#[utoipa::path(
    put,
    path = "/api/crm/leads/{id}",
    tag = "CRM",
    params(("id" = Uuid, Path, description = "ID do lead")),
    request_body = LeadPayload,
    responses((status = 200, description = "Lead atualizado", body = Lead)),
    security(("api_jwt" = []))
)]
pub async fn update_lead(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermCrmWrite>,
    Path(id): Path<Uuid>,
    Json(payload): Json<LeadPayload>,
) -> Result<Json<Lead>, ApiError> {
    let lead = app_state
        .crm_service
        .update_lead(id, payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(lead))
}

#[utoipa::path(
    post,
    path = "/api/crm/leads/{id}/status",
    tag = "CRM",
    params(("id" = Uuid, Path, description = "ID do lead")),
    request_body = LeadStatusPayload,
    responses(
        (status = 200, description = "Status alterado", body = Lead),
        (status = 422, description = "Transição inválida")
    ),
    security(("api_jwt" = []))
)]
pub async fn set_lead_status(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermCrmWrite>,
    Path(id): Path<Uuid>,
    Json(payload): Json<LeadStatusPayload>,
) -> Result<Json<Lead>, ApiError> {
    let lead = app_state
        .crm_service
        .set_lead_status(id, payload.status)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(lead))
}

// Formulário "Converter em oportunidade"
#[utoipa::path(
    get,
    path = "/api/crm/leads/{id}/conversion",
    tag = "CRM",
    params(("id" = Uuid, Path, description = "ID do lead")),
    responses(
        (status = 200, description = "Oportunidade pré-preenchida", body = OpportunityDraft),
        (status = 422, description = "Lead perdido")
    ),
    security(("api_jwt" = []))
)]
pub async fn lead_conversion(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermCrmRead>,
    Path(id): Path<Uuid>,
) -> Result<Json<OpportunityDraft>, ApiError> {
    let draft = app_state
        .crm_service
        .conversion_draft(id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(draft))
}

#[utoipa::path(
    delete,
    path = "/api/crm/leads/{id}",
    tag = "CRM",
    params(("id" = Uuid, Path, description = "ID do lead")),
    responses((status = 204, description = "Removido")),
    security(("api_jwt" = []))
)]
pub async fn delete_lead(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermCrmWrite>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    app_state
        .crm_service
        .delete_lead(id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}

// ---
// OPORTUNIDADES
// ---

#[utoipa::path(
    get,
    path = "/api/crm/opportunities",
    tag = "CRM",
    params(ListQuery),
    responses((status = 200, description = "Oportunidades paginadas", body = Page<Opportunity>)),
    security(("api_jwt" = []))
)]
pub async fn list_opportunities(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermCrmRead>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Page<Opportunity>>, ApiError> {
    let page = app_state
        .crm_service
        .list_opportunities(&query)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(page))
}

#[utoipa::path(
    post,
    path = "/api/crm/opportunities",
    tag = "CRM",
    request_body = OpportunityPayload,
    responses(
        (status = 201, description = "Oportunidade criada (o lead vinculado vira CONVERTED)", body = Opportunity),
        (status = 422, description = "Lead perdido")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_opportunity(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermCrmWrite>,
    Json(payload): Json<OpportunityPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let opportunity = app_state
        .crm_service
        .create_opportunity(payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(opportunity)))
}

#[utoipa::path(
    get,
    path = "/api/crm/opportunities/{id}",
    tag = "CRM",
    params(("id" = Uuid, Path, description = "ID da oportunidade")),
    responses((status = 200, description = "Oportunidade", body = Opportunity)),
    security(("api_jwt" = []))
)]
pub async fn get_opportunity(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermCrmRead>,
    Path(id): Path<Uuid>,
) -> Result<Json<Opportunity>, ApiError> {
    let opportunity = app_state
        .crm_service
        .get_opportunity(id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(opportunity))
}

#[utoipa::path(
    put,
    path = "/api/crm/opportunities/{id}",
    tag = "CRM",
    params(("id" = Uuid, Path, description = "ID da oportunidade")),
    request_body = OpportunityPayload,
    responses((status = 200, description = "Oportunidade atualizada", body = Opportunity)),
    security(("api_jwt" = []))
)]
pub async fn update_opportunity(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermCrmWrite>,
    Path(id): Path<Uuid>,
    Json(payload): Json<OpportunityPayload>,
) -> Result<Json<Opportunity>, ApiError> {
    let opportunity = app_state
        .crm_service
        .update_opportunity(id, payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(opportunity))
}

#[utoipa::path(
    post,
    path = "/api/crm/opportunities/{id}/stage",
    tag = "CRM",
    params(("id" = Uuid, Path, description = "ID da oportunidade")),
    request_body = OpportunityStagePayload,
    responses(
        (status = 200, description = "Etapa alterada", body = Opportunity),
        (status = 422, description = "Oportunidade já fechada")
    ),
    security(("api_jwt" = []))
)]
pub async fn set_opportunity_stage(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermCrmWrite>,
    Path(id): Path<Uuid>,
    Json(payload): Json<OpportunityStagePayload>,
) -> Result<Json<Opportunity>, ApiError> {
    let opportunity = app_state
        .crm_service
        .set_stage(id, payload.stage)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(opportunity))
}

#[utoipa::path(
    delete,
    path = "/api/crm/opportunities/{id}",
    tag = "CRM",
    params(("id" = Uuid, Path, description = "ID da oportunidade")),
    responses((status = 204, description = "Removida")),
    security(("api_jwt" = []))
)]
pub async fn delete_opportunity(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermCrmWrite>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    app_state
        .crm_service
        .delete_opportunity(id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}

// ---
// CAMPANHAS
// ---

#[utoipa::path(
    get,
    path = "/api/crm/campaigns",
    tag = "CRM",
    params(ListQuery),
    responses((status = 200, description = "Campanhas paginadas", body = Page<Campaign>)),
    security(("api_jwt" = []))
)]
pub async fn list_campaigns(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermCrmRead>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Page<Campaign>>, ApiError> {
    let page = app_state
        .crm_service
        .list_campaigns(&query)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(page))
}

#[utoipa::path(
    post,
    path = "/api/crm/campaigns",
    tag = "CRM",
    request_body = CampaignPayload,
    responses(
        (status = 201, description = "Campanha criada", body = Campaign),
        (status = 400, description = "Datas inválidas")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_campaign(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermCrmWrite>,
    Json(payload): Json<CampaignPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let campaign = app_state
        .crm_service
        .create_campaign(payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(campaign)))
}

#[utoipa::path(
    get,
    path = "/api/crm/campaigns/{id}",
    tag = "CRM",
    params(("id" = Uuid, Path, description = "ID da campanha")),
    responses((status = 200, description = "Campanha", body = Campaign)),
    security(("api_jwt" = []))
)]
pub async fn get_campaign(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermCrmRead>,
    Path(id): Path<Uuid>,
) -> Result<Json<Campaign>, ApiError> {
    let campaign = app_state
        .crm_service
        .get_campaign(id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(campaign))
}

#[utoipa::path(
    put,
    path = "/api/crm/campaigns/{id}",
    tag = "CRM",
    params(("id" = Uuid, Path, description = "ID da campanha")),
    request_body = CampaignPayload,
    responses((status = 200, description = "Campanha atualizada", body = Campaign)),
    security(("api_jwt" = []))
)]
pub async fn update_campaign(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermCrmWrite>,
    Path(id): Path<Uuid>,
    Json(payload): Json<CampaignPayload>,
) -> Result<Json<Campaign>, ApiError> {
    let campaign = app_state
        .crm_service
        .update_campaign(id, payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(campaign))
}

#[utoipa::path(
    delete,
    path = "/api/crm/campaigns/{id}",
    tag = "CRM",
    params(("id" = Uuid, Path, description = "ID da campanha")),
    responses((status = 204, description = "Removida")),
    security(("api_jwt" = []))
)]
pub async fn delete_campaign(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermCrmWrite>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    app_state
        .crm_service
        .delete_campaign(id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}
