// src/models/goal.rs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::{
    common::{
        pagination::Searchable,
        validation::{date_range_error, validate_not_blank, validate_not_negative, validate_positive},
    },
    db::{Collection, Entity},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GoalStatus {
    NotStarted,
    InProgress,
    Achieved,
    Missed,
    Canceled,
}

impl GoalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            GoalStatus::NotStarted => "NOT_STARTED",
            GoalStatus::InProgress => "IN_PROGRESS",
            GoalStatus::Achieved => "ACHIEVED",
            GoalStatus::Missed => "MISSED",
            GoalStatus::Canceled => "CANCELED",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GoalPriority {
    Low,
    #[default]
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Goal {
    pub id: Uuid,
    #[schema(example = "Vendas do trimestre")]
    pub title: String,
    pub description: Option<String>,
    pub target_value: Decimal,
    pub current_value: Decimal,
    #[schema(example = "R$")]
    pub unit: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: GoalStatus,
    pub priority: GoalPriority,
    pub owner_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Goal {
    /// Status derivado do progresso.
    pub fn status_for(current: Decimal, target: Decimal) -> GoalStatus {
        if current >= target {
            GoalStatus::Achieved
        } else if current > Decimal::ZERO {
            GoalStatus::InProgress
        } else {
            GoalStatus::NotStarted
        }
    }

    pub fn progress_percent(&self) -> Decimal {
        if self.target_value <= Decimal::ZERO {
            return Decimal::ZERO;
        }
        let percent = self.current_value * Decimal::ONE_HUNDRED / self.target_value;
        percent.min(Decimal::ONE_HUNDRED).max(Decimal::ZERO).round_dp(2)
    }

    /// `MISSED` quando o prazo acabou sem atingir a meta.
    pub fn effective_status(&self, today: NaiveDate) -> GoalStatus {
        match self.status {
            GoalStatus::Canceled | GoalStatus::Achieved => self.status,
            _ if today > self.end_date => GoalStatus::Missed,
            status => status,
        }
    }
}

impl Entity for Goal {
    const COLLECTION: Collection = Collection::Goals;
    const LABEL: &'static str = "Meta";

    fn id(&self) -> Uuid {
        self.id
    }
}

impl Searchable for Goal {
    fn search_fields(&self) -> Vec<Option<&str>> {
        vec![Some(&self.title), self.description.as_deref()]
    }
}

/// Meta com os campos calculados que a tela exibe.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GoalView {
    #[serde(flatten)]
    pub goal: Goal,
    pub progress_percent: Decimal,
    pub effective_status: GoalStatus,
}

impl GoalView {
    pub fn new(goal: Goal, today: NaiveDate) -> Self {
        Self {
            progress_percent: goal.progress_percent(),
            effective_status: goal.effective_status(today),
            goal,
        }
    }
}

fn validate_goal_dates(payload: &GoalPayload) -> Result<(), ValidationError> {
    if payload.end_date < payload.start_date {
        return Err(date_range_error());
    }
    Ok(())
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_goal_dates", skip_on_field_errors = false))]
pub struct GoalPayload {
    #[validate(custom(function = "validate_not_blank"))]
    pub title: String,
    pub description: Option<String>,
    #[validate(custom(function = "validate_positive"))]
    pub target_value: Decimal,
    #[validate(custom(function = "validate_not_negative"))]
    #[serde(default)]
    pub current_value: Decimal,
    pub unit: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// Só CANCELED é aceito explicitamente; os demais são derivados do progresso
    pub status: Option<GoalStatus>,
    #[serde(default)]
    pub priority: GoalPriority,
    pub owner_id: Option<Uuid>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProgressPayload {
    #[validate(custom(function = "validate_not_negative"))]
    pub current_value: Decimal,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct GoalFilter {
    pub status: Option<GoalStatus>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn goal(current: i64, target: i64) -> Goal {
        Goal {
            id: Uuid::new_v4(),
            title: "Meta".into(),
            description: None,
            target_value: Decimal::from(target),
            current_value: Decimal::from(current),
            unit: None,
            start_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2024, 3, 31).unwrap(),
            status: Goal::status_for(Decimal::from(current), Decimal::from(target)),
            priority: GoalPriority::Medium,
            owner_id: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn status_follows_progress() {
        assert_eq!(goal(0, 100).status, GoalStatus::NotStarted);
        assert_eq!(goal(30, 100).status, GoalStatus::InProgress);
        assert_eq!(goal(100, 100).status, GoalStatus::Achieved);
    }

    #[test]
    fn progress_is_capped_at_100() {
        assert_eq!(goal(30, 120).progress_percent(), Decimal::from(25));
        assert_eq!(goal(300, 100).progress_percent(), Decimal::ONE_HUNDRED);
    }

    #[test]
    fn unmet_goal_is_missed_after_the_window() {
        let during = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();
        let after = NaiveDate::from_ymd_opt(2024, 4, 1).unwrap();
        assert_eq!(goal(30, 100).effective_status(during), GoalStatus::InProgress);
        assert_eq!(goal(30, 100).effective_status(after), GoalStatus::Missed);
        assert_eq!(goal(100, 100).effective_status(after), GoalStatus::Achieved);
    }
}
