// src/models/crm.rs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::{
    common::{
        pagination::Searchable,
        validation::{date_range_error, validate_not_blank, validate_not_negative},
    },
    db::{Collection, Entity},
};

// ---
// Leads
// ---
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LeadStatus {
    New,
    Contacted,
    Qualified,
    Converted,
    Lost,
}

impl LeadStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LeadStatus::New => "NEW",
            LeadStatus::Contacted => "CONTACTED",
            LeadStatus::Qualified => "QUALIFIED",
            LeadStatus::Converted => "CONVERTED",
            LeadStatus::Lost => "LOST",
        }
    }

    /// Lead convertido não volta atrás; lead perdido não vira oportunidade.
    pub fn can_transition_to(&self, next: LeadStatus) -> bool {
        match (self, next) {
            (LeadStatus::Converted, _) => false,
            (LeadStatus::Lost, LeadStatus::Converted) => false,
            (current, next) => *current != next,
        }
    }

    pub fn is_open(&self) -> bool {
        !matches!(self, LeadStatus::Converted | LeadStatus::Lost)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Lead {
    pub id: Uuid,
    #[schema(example = "Maria Souza")]
    pub name: String,
    pub company: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    #[schema(example = "Indicação")]
    pub source: Option<String>,
    pub status: LeadStatus,
    pub estimated_value: Option<Decimal>,
    pub campaign_id: Option<Uuid>,
    pub owner_id: Option<Uuid>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity for Lead {
    const COLLECTION: Collection = Collection::Leads;
    const LABEL: &'static str = "Lead";

    fn id(&self) -> Uuid {
        self.id
    }
}

impl Searchable for Lead {
    fn search_fields(&self) -> Vec<Option<&str>> {
        vec![
            Some(&self.name),
            self.company.as_deref(),
            self.email.as_deref(),
            self.source.as_deref(),
        ]
    }
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LeadPayload {
    #[validate(custom(function = "validate_not_blank"))]
    pub name: String,
    pub company: Option<String>,
    #[validate(email(message = "invalid_email"))]
    pub email: Option<String>,
    pub phone: Option<String>,
    pub source: Option<String>,
    /// Padrão NEW no cadastro
    pub status: Option<LeadStatus>,
    #[validate(custom(function = "validate_not_negative"))]
    pub estimated_value: Option<Decimal>,
    pub campaign_id: Option<Uuid>,
    pub owner_id: Option<Uuid>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct LeadStatusPayload {
    pub status: LeadStatus,
}

// ---
// Oportunidades (funil)
// ---
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OpportunityStage {
    Prospecting,
    Qualification,
    Proposal,
    Negotiation,
    ClosedWon,
    ClosedLost,
}

impl OpportunityStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            OpportunityStage::Prospecting => "PROSPECTING",
            OpportunityStage::Qualification => "QUALIFICATION",
            OpportunityStage::Proposal => "PROPOSAL",
            OpportunityStage::Negotiation => "NEGOTIATION",
            OpportunityStage::ClosedWon => "CLOSED_WON",
            OpportunityStage::ClosedLost => "CLOSED_LOST",
        }
    }

    pub fn is_closed(&self) -> bool {
        matches!(self, OpportunityStage::ClosedWon | OpportunityStage::ClosedLost)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Opportunity {
    pub id: Uuid,
    #[schema(example = "Oportunidade - Maria Souza")]
    pub title: String,
    pub lead_id: Option<Uuid>,
    pub customer_id: Option<Uuid>,
    pub stage: OpportunityStage,
    pub estimated_value: Decimal,
    #[schema(example = 40)]
    pub probability: u8,
    pub expected_close_date: Option<NaiveDate>,
    pub owner_id: Option<Uuid>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity for Opportunity {
    const COLLECTION: Collection = Collection::Opportunities;
    const LABEL: &'static str = "Oportunidade";

    fn id(&self) -> Uuid {
        self.id
    }
}

impl Searchable for Opportunity {
    fn search_fields(&self) -> Vec<Option<&str>> {
        vec![Some(&self.title), self.notes.as_deref()]
    }
}

fn validate_probability(val: u8) -> Result<(), ValidationError> {
    if val > 100 {
        let mut err = ValidationError::new("range");
        err.message = Some("invalid_probability".into());
        return Err(err);
    }
    Ok(())
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OpportunityPayload {
    #[validate(custom(function = "validate_not_blank"))]
    pub title: String,
    pub lead_id: Option<Uuid>,
    pub customer_id: Option<Uuid>,
    /// Padrão PROSPECTING no cadastro
    pub stage: Option<OpportunityStage>,
    #[validate(custom(function = "validate_not_negative"))]
    #[serde(default)]
    pub estimated_value: Decimal,
    #[validate(custom(function = "validate_probability"))]
    #[serde(default)]
    pub probability: u8,
    pub expected_close_date: Option<NaiveDate>,
    pub owner_id: Option<Uuid>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct OpportunityStagePayload {
    pub stage: OpportunityStage,
}

/// Formulário de oportunidade pré-preenchido a partir de um lead.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OpportunityDraft {
    pub title: String,
    pub lead_id: Uuid,
    pub stage: OpportunityStage,
    pub estimated_value: Decimal,
    pub probability: u8,
    pub owner_id: Option<Uuid>,
}

impl OpportunityDraft {
    pub fn from_lead(lead: &Lead) -> Self {
        Self {
            title: format!("Oportunidade - {}", lead.name),
            lead_id: lead.id,
            stage: OpportunityStage::Prospecting,
            estimated_value: lead.estimated_value.unwrap_or_default(),
            probability: 10,
            owner_id: lead.owner_id,
        }
    }
}

// ---
// Campanhas
// ---
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CampaignStatus {
    Planned,
    Active,
    Paused,
    Completed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Campaign {
    pub id: Uuid,
    #[schema(example = "Black Friday")]
    pub name: String,
    #[schema(example = "E-mail")]
    pub channel: Option<String>,
    pub status: CampaignStatus,
    pub budget: Decimal,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity for Campaign {
    const COLLECTION: Collection = Collection::Campaigns;
    const LABEL: &'static str = "Campanha";

    fn id(&self) -> Uuid {
        self.id
    }
}

impl Searchable for Campaign {
    fn search_fields(&self) -> Vec<Option<&str>> {
        vec![Some(&self.name), self.channel.as_deref(), self.description.as_deref()]
    }
}

fn validate_campaign_dates(payload: &CampaignPayload) -> Result<(), ValidationError> {
    match payload.end_date {
        Some(end) if end < payload.start_date => Err(date_range_error()),
        _ => Ok(()),
    }
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_campaign_dates", skip_on_field_errors = false))]
pub struct CampaignPayload {
    #[validate(custom(function = "validate_not_blank"))]
    pub name: String,
    pub channel: Option<String>,
    /// Padrão PLANNED no cadastro
    pub status: Option<CampaignStatus>,
    #[validate(custom(function = "validate_not_negative"))]
    #[serde(default)]
    pub budget: Decimal,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub description: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lead(name: &str) -> Lead {
        Lead {
            id: Uuid::new_v4(),
            name: name.into(),
            company: Some("ACME".into()),
            email: None,
            phone: None,
            source: None,
            status: LeadStatus::Qualified,
            estimated_value: Some(Decimal::from(5000)),
            campaign_id: None,
            owner_id: None,
            notes: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn conversion_draft_title_uses_lead_name() {
        let lead = lead("Maria Souza");
        let draft = OpportunityDraft::from_lead(&lead);
        assert_eq!(draft.title, "Oportunidade - Maria Souza");
        assert_eq!(draft.lead_id, lead.id);
        assert_eq!(draft.estimated_value, Decimal::from(5000));
    }

    #[test]
    fn lead_status_rules() {
        assert!(LeadStatus::New.can_transition_to(LeadStatus::Contacted));
        assert!(LeadStatus::Qualified.can_transition_to(LeadStatus::Lost));
        assert!(!LeadStatus::Lost.can_transition_to(LeadStatus::Converted));
        assert!(!LeadStatus::Converted.can_transition_to(LeadStatus::New));
    }

    #[test]
    fn probability_above_100_is_rejected() {
        let payload: OpportunityPayload = serde_json::from_value(serde_json::json!({
            "title": "Venda", "probability": 120
        }))
        .unwrap();
        let errors = payload.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("probability"));
    }

    #[test]
    fn campaign_end_before_start_is_rejected() {
        let payload: CampaignPayload = serde_json::from_value(serde_json::json!({
            "name": "Inverno", "startDate": "2024-06-10", "endDate": "2024-06-01"
        }))
        .unwrap();
        assert!(payload.validate().is_err());

        let ok: CampaignPayload = serde_json::from_value(serde_json::json!({
            "name": "Inverno", "startDate": "2024-06-01", "endDate": "2024-06-01"
        }))
        .unwrap();
        assert!(ok.validate().is_ok());
    }
}
