use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{
    entities::{
        features::{FeatureEntity, InsertFeatureEntity},
        plans::{InsertPlanEntity, PlanEntity},
    },
    errors::SubscriptionError,
    value_objects::enums::intervals::Interval,
};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FeatureModel {
    pub id: Uuid,
    pub slug: String,
    pub name: String,
    /// Interpreted by callers: flag presence, numeric limit, or free text.
    pub value: Option<String>,
    pub description: Option<String>,
    pub sort_order: i32,
}

impl From<FeatureEntity> for FeatureModel {
    fn from(value: FeatureEntity) -> Self {
        Self {
            id: value.id,
            slug: value.slug,
            name: value.name,
            value: value.value,
            description: value.description,
            sort_order: value.sort_order,
        }
    }
}

/// A plan together with its features, ordered by `sort_order`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlanModel {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub price_minor: i64,
    pub interval: Interval,
    pub interval_count: i32,
    pub trial_period_days: Option<i32>,
    pub sort_order: i32,
    pub features: Vec<FeatureModel>,
}

impl PlanModel {
    pub fn from_entities(
        plan: PlanEntity,
        mut features: Vec<FeatureEntity>,
    ) -> Result<Self, SubscriptionError> {
        let interval = Interval::try_from(plan.interval.as_str())?;
        features.retain(|feature| feature.plan_id == plan.id);
        features.sort_by_key(|feature| feature.sort_order);

        Ok(Self {
            id: plan.id,
            name: plan.name,
            description: plan.description,
            price_minor: plan.price_minor,
            interval,
            interval_count: plan.interval_count,
            trial_period_days: plan.trial_period_days,
            sort_order: plan.sort_order,
            features: features.into_iter().map(FeatureModel::from).collect(),
        })
    }

    pub fn is_free(&self) -> bool {
        self.price_minor <= 0
    }

    pub fn has_trial(&self) -> bool {
        self.trial_period_days.is_some_and(|days| days > 0)
    }

    pub fn interval_name(&self) -> &'static str {
        self.interval.name()
    }

    /// Two plans share a cadence when both interval and count match.
    pub fn same_cadence(&self, other: &PlanModel) -> bool {
        self.interval == other.interval && self.interval_count == other.interval_count
    }

    /// First feature whose slug matches.
    pub fn feature(&self, slug: &str) -> Option<&FeatureModel> {
        self.features.iter().find(|feature| feature.slug == slug)
    }
}

/// Catalog input for a new plan. Unset interval and count fall back to one month.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlanDraft {
    pub name: String,
    pub description: Option<String>,
    pub price_minor: i64,
    pub interval: Option<Interval>,
    pub interval_count: Option<i32>,
    pub trial_period_days: Option<i32>,
    pub sort_order: i32,
}

impl PlanDraft {
    pub fn into_insert_entity(self, now: DateTime<Utc>) -> InsertPlanEntity {
        InsertPlanEntity {
            id: Uuid::new_v4(),
            name: self.name,
            description: self.description,
            price_minor: self.price_minor,
            interval: self.interval.unwrap_or_default().to_string(),
            interval_count: self.interval_count.filter(|count| *count > 0).unwrap_or(1),
            trial_period_days: self.trial_period_days,
            sort_order: self.sort_order,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FeatureDraft {
    pub slug: String,
    pub name: String,
    pub value: Option<String>,
    pub description: Option<String>,
    pub sort_order: i32,
}

impl FeatureDraft {
    pub fn into_insert_entity(self, plan_id: Uuid, now: DateTime<Utc>) -> InsertFeatureEntity {
        InsertFeatureEntity {
            id: Uuid::new_v4(),
            plan_id,
            slug: self.slug,
            name: self.name,
            value: self.value,
            description: self.description,
            sort_order: self.sort_order,
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plan_entity(price_minor: i64, trial_period_days: Option<i32>) -> PlanEntity {
        let now = Utc::now();
        PlanEntity {
            id: Uuid::new_v4(),
            name: "Pro".to_string(),
            description: None,
            price_minor,
            interval: "month".to_string(),
            interval_count: 1,
            trial_period_days,
            sort_order: 0,
            created_at: now,
            updated_at: now,
        }
    }

    fn feature_entity(plan_id: Uuid, slug: &str, sort_order: i32) -> FeatureEntity {
        let now = Utc::now();
        FeatureEntity {
            id: Uuid::new_v4(),
            plan_id,
            slug: slug.to_string(),
            name: slug.to_string(),
            value: Some("Y".to_string()),
            description: None,
            sort_order,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn free_and_trial_predicates() {
        let free = PlanModel::from_entities(plan_entity(0, None), vec![]).unwrap();
        assert!(free.is_free());
        assert!(!free.has_trial());

        let refunded = PlanModel::from_entities(plan_entity(-100, Some(0)), vec![]).unwrap();
        assert!(refunded.is_free());
        assert!(!refunded.has_trial());

        let paid = PlanModel::from_entities(plan_entity(1999, Some(14)), vec![]).unwrap();
        assert!(!paid.is_free());
        assert!(paid.has_trial());
        assert_eq!(paid.interval_name(), "Month");
    }

    #[test]
    fn features_are_sorted_and_scoped_to_the_plan() {
        let plan = plan_entity(1000, None);
        let plan_id = plan.id;
        let features = vec![
            feature_entity(plan_id, "exports", 2),
            feature_entity(Uuid::new_v4(), "foreign", 0),
            feature_entity(plan_id, "seats", 1),
        ];

        let model = PlanModel::from_entities(plan, features).unwrap();
        let slugs: Vec<&str> = model.features.iter().map(|f| f.slug.as_str()).collect();
        assert_eq!(slugs, vec!["seats", "exports"]);
        assert!(model.feature("foreign").is_none());
    }

    #[test]
    fn unknown_interval_in_storage_is_rejected() {
        let mut plan = plan_entity(1000, None);
        plan.interval = "quarter".to_string();

        let err = PlanModel::from_entities(plan, vec![]).unwrap_err();
        assert!(matches!(err, SubscriptionError::InvalidInterval(_)));
    }

    #[test]
    fn draft_fills_interval_defaults() {
        let insert = PlanDraft {
            name: "Basic".to_string(),
            price_minor: 500,
            ..Default::default()
        }
        .into_insert_entity(Utc::now());
        assert_eq!(insert.interval, "month");
        assert_eq!(insert.interval_count, 1);

        let insert = PlanDraft {
            name: "Annual".to_string(),
            interval: Some(Interval::Year),
            interval_count: Some(2),
            ..Default::default()
        }
        .into_insert_entity(Utc::now());
        assert_eq!(insert.interval, "year");
        assert_eq!(insert.interval_count, 2);
    }
}
