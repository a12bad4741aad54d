// src/services/crm_service.rs

use chrono::Utc;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::{
        error::AppError,
        pagination::{ListQuery, Page},
    },
    db::Repository,
    models::crm::{
        Campaign, CampaignPayload, CampaignStatus, Lead, LeadPayload, LeadStatus, Opportunity,
        OpportunityDraft, OpportunityPayload, OpportunityStage,
    },
};

#[derive(Clone)]
pub struct CrmService {
    leads: Repository<Lead>,
    opportunities: Repository<Opportunity>,
    campaigns: Repository<Campaign>,
}

impl CrmService {
    pub fn new(
        leads: Repository<Lead>,
        opportunities: Repository<Opportunity>,
        campaigns: Repository<Campaign>,
    ) -> Self {
        Self { leads, opportunities, campaigns }
    }

    // =========================================================================
    //  1. LEADS
    // =========================================================================

    pub async fn list_leads(&self, query: &ListQuery) -> Result<Page<Lead>, AppError> {
        let mut leads = self.leads.list().await?;
        leads.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(query.apply(leads))
    }

    pub async fn all_leads(&self) -> Result<Vec<Lead>, AppError> {
        self.leads.list().await
    }

    pub async fn get_lead(&self, id: Uuid) -> Result<Lead, AppError> {
        self.leads.require(id).await
    }

    async fn ensure_campaign(&self, campaign_id: Option<Uuid>) -> Result<(), AppError> {
        if let Some(id) = campaign_id {
            self.campaigns.require(id).await?;
        }
        Ok(())
    }

    pub async fn create_lead(&self, payload: LeadPayload) -> Result<Lead, AppError> {
        payload.validate()?;
        self.ensure_campaign(payload.campaign_id).await?;

        let now = Utc::now();
        let lead = Lead {
            id: Uuid::new_v4(),
            name: payload.name.trim().to_string(),
            company: payload.company,
            email: payload.email,
            phone: payload.phone,
            source: payload.source,
            status: payload.status.unwrap_or(LeadStatus::New),
            estimated_value: payload.estimated_value,
            campaign_id: payload.campaign_id,
            owner_id: payload.owner_id,
            notes: payload.notes,
            created_at: now,
            updated_at: now,
        };
        self.leads.create(&lead).await?;
        Ok(lead)
    }

    pub async fn update_lead(&self, id: Uuid, payload: LeadPayload) -> Result<Lead, AppError> {
        payload.validate()?;
        let mut lead = self.leads.require(id).await?;
        self.ensure_campaign(payload.campaign_id).await?;

        if let Some(status) = payload.status {
            if status != lead.status {
                Self::check_lead_transition(lead.status, status)?;
                lead.status = status;
            }
        }
        lead.name = payload.name.trim().to_string();
        lead.company = payload.company;
        lead.email = payload.email;
        lead.phone = payload.phone;
        lead.source = payload.source;
        lead.estimated_value = payload.estimated_value;
        lead.campaign_id = payload.campaign_id;
        lead.owner_id = payload.owner_id;
        lead.notes = payload.notes;
        lead.updated_at = Utc::now();

        self.leads.save(&lead).await?;
        Ok(lead)
    }

    fn check_lead_transition(from: LeadStatus, to: LeadStatus) -> Result<(), AppError> {
        if !from.can_transition_to(to) {
            return Err(AppError::InvalidStatusTransition {
                from: from.as_str().to_string(),
                to: to.as_str().to_string(),
            });
        }
        Ok(())
    }

    pub async fn set_lead_status(&self, id: Uuid, status: LeadStatus) -> Result<Lead, AppError> {
        let mut lead = self.leads.require(id).await?;
        Self::check_lead_transition(lead.status, status)?;

        lead.status = status;
        lead.updated_at = Utc::now();
        self.leads.save(&lead).await?;
        Ok(lead)
    }

    pub async fn delete_lead(&self, id: Uuid) -> Result<(), AppError> {
        self.leads.delete(id).await
    }

    /// Formulário pré-preenchido para converter o lead em oportunidade.
    pub async fn conversion_draft(&self, lead_id: Uuid) -> Result<OpportunityDraft, AppError> {
        let lead = self.leads.require(lead_id).await?;
        if lead.status == LeadStatus::Lost {
            return Err(AppError::InvalidStatusTransition {
                from: LeadStatus::Lost.as_str().to_string(),
                to: LeadStatus::Converted.as_str().to_string(),
            });
        }
        Ok(OpportunityDraft::from_lead(&lead))
    }

    // =========================================================================
    //  2. OPORTUNIDADES
    // =========================================================================

    pub async fn list_opportunities(&self, query: &ListQuery) -> Result<Page<Opportunity>, AppError> {
        let mut opportunities = self.opportunities.list().await?;
        opportunities.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(query.apply(opportunities))
    }

    pub async fn all_opportunities(&self) -> Result<Vec<Opportunity>, AppError> {
        self.opportunities.list().await
    }

    pub async fn get_opportunity(&self, id: Uuid) -> Result<Opportunity, AppError> {
        self.opportunities.require(id).await
    }

    /// Com `leadId`, a criação converte o lead.
    pub async fn create_opportunity(&self, payload: OpportunityPayload) -> Result<Opportunity, AppError> {
        payload.validate()?;

        let lead = match payload.lead_id {
            Some(lead_id) => {
                let lead = self.leads.require(lead_id).await?;
                if lead.status == LeadStatus::Lost {
                    return Err(AppError::InvalidStatusTransition {
                        from: LeadStatus::Lost.as_str().to_string(),
                        to: LeadStatus::Converted.as_str().to_string(),
                    });
                }
                Some(lead)
            }
            None => None,
        };

        let now = Utc::now();
        let opportunity = Opportunity {
            id: Uuid::new_v4(),
            title: payload.title.trim().to_string(),
            lead_id: payload.lead_id,
            customer_id: payload.customer_id,
            stage: payload.stage.unwrap_or(OpportunityStage::Prospecting),
            estimated_value: payload.estimated_value,
            probability: payload.probability,
            expected_close_date: payload.expected_close_date,
            owner_id: payload.owner_id,
            notes: payload.notes,
            created_at: now,
            updated_at: now,
        };
        self.opportunities.create(&opportunity).await?;

        if let Some(mut lead) = lead.filter(|l| l.status != LeadStatus::Converted) {
            lead.status = LeadStatus::Converted;
            lead.updated_at = now;
            self.leads.save(&lead).await?;
            tracing::info!("🎯 Lead {} convertido em oportunidade", lead.name);
        }

        Ok(opportunity)
    }

    fn check_stage_change(from: OpportunityStage, to: OpportunityStage) -> Result<(), AppError> {
        if from.is_closed() && from != to {
            return Err(AppError::InvalidStatusTransition {
                from: from.as_str().to_string(),
                to: to.as_str().to_string(),
            });
        }
        Ok(())
    }

    pub async fn update_opportunity(
        &self,
        id: Uuid,
        payload: OpportunityPayload,
    ) -> Result<Opportunity, AppError> {
        payload.validate()?;
        let mut opportunity = self.opportunities.require(id).await?;

        if let Some(stage) = payload.stage {
            Self::check_stage_change(opportunity.stage, stage)?;
            opportunity.stage = stage;
        }
        opportunity.title = payload.title.trim().to_string();
        opportunity.customer_id = payload.customer_id;
        opportunity.estimated_value = payload.estimated_value;
        opportunity.probability = payload.probability;
        opportunity.expected_close_date = payload.expected_close_date;
        opportunity.owner_id = payload.owner_id;
        opportunity.notes = payload.notes;
        opportunity.updated_at = Utc::now();

        self.opportunities.save(&opportunity).await?;
        Ok(opportunity)
    }

    pub async fn set_stage(&self, id: Uuid, stage: OpportunityStage) -> Result<Opportunity, AppError> {
        let mut opportunity = self.opportunities.require(id).await?;
        if opportunity.stage == stage {
            return Ok(opportunity);
        }
        Self::check_stage_change(opportunity.stage, stage)?;

        opportunity.stage = stage;
        match stage {
            OpportunityStage::ClosedWon => opportunity.probability = 100,
            OpportunityStage::ClosedLost => opportunity.probability = 0,
            _ => {}
        }
        opportunity.updated_at = Utc::now();
        self.opportunities.save(&opportunity).await?;
        Ok(opportunity)
    }

    pub async fn delete_opportunity(&self, id: Uuid) -> Result<(), AppError> {
        self.opportunities.delete(id).await
    }

    // =========================================================================
    //  3. CAMPANHAS
    // =========================================================================

    pub async fn list_campaigns(&self, query: &ListQuery) -> Result<Page<Campaign>, AppError> {
        let mut campaigns = self.campaigns.list().await?;
        campaigns.sort_by(|a, b| b.start_date.cmp(&a.start_date));
        Ok(query.apply(campaigns))
    }

    pub async fn get_campaign(&self, id: Uuid) -> Result<Campaign, AppError> {
        self.campaigns.require(id).await
    }

    pub async fn create_campaign(&self, payload: CampaignPayload) -> Result<Campaign, AppError> {
        payload.validate()?;

        let now = Utc::now();
        let campaign = Campaign {
            id: Uuid::new_v4(),
            name: payload.name.trim().to_string(),
            channel: payload.channel,
            status: payload.status.unwrap_or(CampaignStatus::Planned),
            budget: payload.budget,
            start_date: payload.start_date,
            end_date: payload.end_date,
            description: payload.description,
            created_at: now,
            updated_at: now,
        };
        self.campaigns.create(&campaign).await?;
        Ok(campaign)
    }

    pub async fn update_campaign(&self, id: Uuid, payload: CampaignPayload) -> Result<Campaign, AppError> {
        payload.validate()?;
        let mut campaign = self.campaigns.require(id).await?;

        campaign.name = payload.name.trim().to_string();
        campaign.channel = payload.channel;
        if let Some(status) = payload.status {
            campaign.status = status;
        }
        campaign.budget = payload.budget;
        campaign.start_date = payload.start_date;
        campaign.end_date = payload.end_date;
        campaign.description = payload.description;
        campaign.updated_at = Utc::now();

        self.campaigns.save(&campaign).await?;
        Ok(campaign)
    }

    pub async fn delete_campaign(&self, id: Uuid) -> Result<(), AppError> {
        self.campaigns.delete(id).await
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;
    use crate::test_support::{lead_payload, memory_state};

    fn opportunity_from(draft: &OpportunityDraft) -> OpportunityPayload {
        OpportunityPayload {
            title: draft.title.clone(),
            lead_id: Some(draft.lead_id),
            customer_id: None,
            stage: Some(draft.stage),
            estimated_value: draft.estimated_value,
            probability: draft.probability,
            expected_close_date: None,
            owner_id: draft.owner_id,
            notes: None,
        }
    }

    #[tokio::test]
    async fn converting_a_lead_prefills_and_marks_it_converted() {
        let state = memory_state();
        let crm = &state.crm_service;
        let lead = crm.create_lead(lead_payload("Carlos Lima")).await.unwrap();

        let draft = crm.conversion_draft(lead.id).await.unwrap();
        assert_eq!(draft.title, "Oportunidade - Carlos Lima");
        assert_eq!(draft.estimated_value, Decimal::from(1500));

        let opportunity = crm.create_opportunity(opportunity_from(&draft)).await.unwrap();
        assert_eq!(opportunity.lead_id, Some(lead.id));
        assert_eq!(crm.get_lead(lead.id).await.unwrap().status, LeadStatus::Converted);
    }

    #[tokio::test]
    async fn lost_leads_cannot_be_converted() {
        let state = memory_state();
        let crm = &state.crm_service;
        let lead = crm.create_lead(lead_payload("Carlos Lima")).await.unwrap();
        crm.set_lead_status(lead.id, LeadStatus::Lost).await.unwrap();

        assert!(matches!(
            crm.conversion_draft(lead.id).await,
            Err(AppError::InvalidStatusTransition { .. })
        ));
    }

    #[tokio::test]
    async fn closed_stages_are_terminal() {
        let state = memory_state();
        let crm = &state.crm_service;
        let lead = crm.create_lead(lead_payload("Carlos Lima")).await.unwrap();
        let draft = crm.conversion_draft(lead.id).await.unwrap();
        let opportunity = crm.create_opportunity(opportunity_from(&draft)).await.unwrap();

        let won = crm.set_stage(opportunity.id, OpportunityStage::ClosedWon).await.unwrap();
        assert_eq!(won.probability, 100);

        assert!(matches!(
            crm.set_stage(opportunity.id, OpportunityStage::Negotiation).await,
            Err(AppError::InvalidStatusTransition { .. })
        ));
    }
}
