// src/services/goal_service.rs

use chrono::Utc;
use rust_decimal::Decimal;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::{
        error::AppError,
        pagination::{ListQuery, Page},
    },
    db::{Query, Repository, SortDirection},
    models::goal::{Goal, GoalFilter, GoalPayload, GoalStatus, GoalView, ProgressPayload},
};

#[derive(Clone)]
pub struct GoalService {
    goals: Repository<Goal>,
}

impl GoalService {
    pub fn new(goals: Repository<Goal>) -> Self {
        Self { goals }
    }

    fn view(goal: Goal) -> GoalView {
        GoalView::new(goal, Utc::now().date_naive())
    }

    /// Filtra pelo status efetivo (uma meta vencida aparece como MISSED).
    pub async fn list(&self, query: &ListQuery, filter: &GoalFilter) -> Result<Page<GoalView>, AppError> {
        let today = Utc::now().date_naive();
        let goals: Vec<Goal> = self
            .goals
            .find(&Query::new().order_by("endDate", SortDirection::Asc))
            .await?
            .into_iter()
            .filter(|g| filter.status.is_none_or(|s| g.effective_status(today) == s))
            .collect();

        Ok(query.apply(goals).map(|g| GoalView::new(g, today)))
    }

    pub async fn get(&self, id: Uuid) -> Result<GoalView, AppError> {
        Ok(Self::view(self.goals.require(id).await?))
    }

    fn status_from(payload_status: Option<GoalStatus>, current: Decimal, target: Decimal) -> GoalStatus {
        match payload_status {
            Some(GoalStatus::Canceled) => GoalStatus::Canceled,
            _ => Goal::status_for(current, target),
        }
    }

    pub async fn create(&self, payload: GoalPayload) -> Result<GoalView, AppError> {
        payload.validate()?;

        let now = Utc::now();
        let goal = Goal {
            id: Uuid::new_v4(),
            title: payload.title.trim().to_string(),
            description: payload.description,
            status: Self::status_from(payload.status, payload.current_value, payload.target_value),
            target_value: payload.target_value,
            current_value: payload.current_value,
            unit: payload.unit,
            start_date: payload.start_date,
            end_date: payload.end_date,
            priority: payload.priority,
            owner_id: payload.owner_id,
            created_at: now,
            updated_at: now,
        };
        self.goals.create(&goal).await?;
        Ok(Self::view(goal))
    }

    pub async fn update(&self, id: Uuid, payload: GoalPayload) -> Result<GoalView, AppError> {
        payload.validate()?;
        let mut goal = self.goals.require(id).await?;

        goal.title = payload.title.trim().to_string();
        goal.description = payload.description;
        goal.status = Self::status_from(payload.status, payload.current_value, payload.target_value);
        goal.target_value = payload.target_value;
        goal.current_value = payload.current_value;
        goal.unit = payload.unit;
        goal.start_date = payload.start_date;
        goal.end_date = payload.end_date;
        goal.priority = payload.priority;
        goal.owner_id = payload.owner_id;
        goal.updated_at = Utc::now();

        self.goals.save(&goal).await?;
        Ok(Self::view(goal))
    }

    /// Atualiza o valor atingido e recalcula o status. Metas canceladas ficam travadas.
    pub async fn update_progress(&self, id: Uuid, payload: ProgressPayload) -> Result<GoalView, AppError> {
        payload.validate()?;
        let mut goal = self.goals.require(id).await?;
        if goal.status == GoalStatus::Canceled {
            return Err(AppError::DocumentLocked(goal.status.as_str().to_string()));
        }

        goal.current_value = payload.current_value;
        goal.status = Goal::status_for(goal.current_value, goal.target_value);
        goal.updated_at = Utc::now();

        self.goals.save(&goal).await?;
        Ok(Self::view(goal))
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        self.goals.delete(id).await
    }
}
