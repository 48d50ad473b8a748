use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{
    entities::subscriptions::{
        InsertSubscriptionEntity, SubscriptionEntity, UpdateSubscriptionEntity,
    },
    errors::SubscriptionError,
    value_objects::{
        enums::{intervals::Interval, subscription_statuses::SubscriptionStatus},
        periods::{Period, compute_period},
        plans::PlanModel,
        subscribers::SubscriberRef,
    },
};

pub const DEFAULT_SUBSCRIPTION_NAME: &str = "default";

/// One subscriber's relationship to one plan.
///
/// Every query takes the instant to evaluate against; callers read their clock once
/// per operation and pass the same value to every check. Mutations only change the
/// in-memory model, persisting is left to the caller.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SubscriptionModel {
    pub id: Uuid,
    pub subscriber: SubscriberRef,
    pub name: String,
    pub plan: Option<PlanModel>,
    pub trial_ends_at: Option<DateTime<Utc>>,
    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
    pub canceled_at: Option<DateTime<Utc>>,
    pub suspended: bool,
    /// Optimistic concurrency token. Zero until first saved.
    pub version: i32,
    pub created_at: Option<DateTime<Utc>>,
}

impl SubscriptionModel {
    pub fn new(subscriber: SubscriberRef, name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            subscriber,
            name: name.into(),
            plan: None,
            trial_ends_at: None,
            starts_at: None,
            ends_at: None,
            canceled_at: None,
            suspended: false,
            version: 0,
            created_at: None,
        }
    }

    pub fn from_entity(entity: SubscriptionEntity, plan: PlanModel) -> Self {
        Self {
            id: entity.id,
            subscriber: SubscriberRef::new(entity.subscriber_type, entity.subscriber_id),
            name: entity.name,
            plan: Some(plan),
            trial_ends_at: entity.trial_ends_at,
            starts_at: Some(entity.starts_at),
            ends_at: Some(entity.ends_at),
            canceled_at: entity.canceled_at,
            suspended: entity.suspended,
            version: entity.version,
            created_at: Some(entity.created_at),
        }
    }

    pub fn is_persisted(&self) -> bool {
        self.created_at.is_some()
    }

    pub fn plan_id(&self) -> Option<Uuid> {
        self.plan.as_ref().map(|plan| plan.id)
    }

    pub fn period(&self) -> Option<Period> {
        match (self.starts_at, self.ends_at) {
            (Some(starts_at), Some(ends_at)) => Some(Period { starts_at, ends_at }),
            _ => None,
        }
    }

    pub fn on_trial(&self, now: DateTime<Utc>) -> bool {
        self.trial_ends_at.is_some_and(|trial_ends_at| now < trial_ends_at)
    }

    pub fn is_suspended(&self) -> bool {
        self.suspended
    }

    pub fn is_canceled(&self) -> bool {
        self.canceled_at.is_some()
    }

    pub fn has_ended(&self, now: DateTime<Utc>) -> Result<bool, SubscriptionError> {
        let ends_at = self.ends_at.ok_or(SubscriptionError::MissingPeriod)?;
        Ok(now >= ends_at)
    }

    /// Suspension masks everything; otherwise an unexpired period or a running trial
    /// keeps the subscription active.
    pub fn is_active(&self, now: DateTime<Utc>) -> Result<bool, SubscriptionError> {
        if self.suspended {
            return Ok(false);
        }

        Ok(!self.has_ended(now)? || self.on_trial(now))
    }

    pub fn status(&self, now: DateTime<Utc>) -> Result<SubscriptionStatus, SubscriptionError> {
        if self.suspended {
            return Ok(SubscriptionStatus::Suspended);
        }

        if self.is_active(now)? {
            return Ok(SubscriptionStatus::Active);
        }

        if self.is_canceled() {
            return Ok(SubscriptionStatus::Canceled);
        }

        Ok(SubscriptionStatus::Expired)
    }

    pub fn suspend(&mut self) {
        self.suspended = true;
    }

    pub fn unsuspend(&mut self) {
        self.suspended = false;
    }

    /// Marks the subscription canceled at `now`. With `immediately` the current period
    /// is collapsed so it ends at the cancellation instant.
    pub fn cancel(&mut self, immediately: bool, now: DateTime<Utc>) {
        self.canceled_at = Some(now);

        if immediately {
            self.ends_at = Some(now);
        }
    }

    pub fn ensure_renewable(&self, now: DateTime<Utc>) -> Result<(), SubscriptionError> {
        if self.is_canceled() && self.has_ended(now)? {
            return Err(SubscriptionError::Renewal);
        }

        Ok(())
    }

    /// Starts a fresh period at `now` under the current plan and clears any cancellation.
    pub fn renew(&mut self, now: DateTime<Utc>) -> Result<(), SubscriptionError> {
        self.ensure_renewable(now)?;

        let (interval, interval_count) = self.plan_cadence()?;
        self.set_new_period(interval, interval_count, now)?;
        self.canceled_at = None;
        Ok(())
    }

    /// Swaps the plan. A different cadence (interval or count), or no plan attached
    /// yet, restarts the billing period at `now`; the same cadence keeps the period.
    pub fn change_plan(
        &mut self,
        plan: PlanModel,
        now: DateTime<Utc>,
    ) -> Result<(), SubscriptionError> {
        let keeps_cadence = self
            .plan
            .as_ref()
            .is_some_and(|current| current.same_cadence(&plan));

        if !keeps_cadence {
            self.set_new_period(plan.interval, plan.interval_count.into(), now)?;
        }

        self.plan = Some(plan);
        Ok(())
    }

    pub fn set_new_period(
        &mut self,
        interval: Interval,
        interval_count: i64,
        start: DateTime<Utc>,
    ) -> Result<(), SubscriptionError> {
        let period = compute_period(interval, interval_count, start)?;
        self.starts_at = Some(period.starts_at);
        self.ends_at = Some(period.ends_at);
        Ok(())
    }

    /// Computes a period from the current plan when none is set. Runs before every save.
    pub fn ensure_period(&mut self, now: DateTime<Utc>) -> Result<(), SubscriptionError> {
        if self.ends_at.is_some() {
            if self.starts_at.is_none() {
                self.starts_at = Some(now);
            }
            return Ok(());
        }

        let (interval, interval_count) = self.plan_cadence()?;
        self.set_new_period(interval, interval_count, now)
    }

    fn plan_cadence(&self) -> Result<(Interval, i64), SubscriptionError> {
        let plan = self.plan.as_ref().ok_or(SubscriptionError::MissingPlan)?;
        Ok((plan.interval, plan.interval_count.into()))
    }

    pub fn to_insert_entity(
        &self,
        now: DateTime<Utc>,
    ) -> Result<InsertSubscriptionEntity, SubscriptionError> {
        let plan_id = self.plan_id().ok_or(SubscriptionError::MissingPlan)?;
        let period = self.period().ok_or(SubscriptionError::MissingPeriod)?;

        Ok(InsertSubscriptionEntity {
            id: self.id,
            subscriber_type: self.subscriber.subscriber_type.clone(),
            subscriber_id: self.subscriber.subscriber_id,
            plan_id,
            name: self.name.clone(),
            trial_ends_at: self.trial_ends_at,
            starts_at: period.starts_at,
            ends_at: period.ends_at,
            canceled_at: self.canceled_at,
            suspended: self.suspended,
            version: 1,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn to_update_entity(
        &self,
        now: DateTime<Utc>,
    ) -> Result<UpdateSubscriptionEntity, SubscriptionError> {
        let plan_id = self.plan_id().ok_or(SubscriptionError::MissingPlan)?;
        let period = self.period().ok_or(SubscriptionError::MissingPeriod)?;

        Ok(UpdateSubscriptionEntity {
            plan_id,
            name: self.name.clone(),
            trial_ends_at: self.trial_ends_at,
            starts_at: period.starts_at,
            ends_at: period.ends_at,
            canceled_at: self.canceled_at,
            suspended: self.suspended,
            updated_at: now,
        })
    }

    /// Copies the stored row's bookkeeping back after a successful write.
    pub fn sync_from_entity(&mut self, entity: &SubscriptionEntity) {
        self.starts_at = Some(entity.starts_at);
        self.ends_at = Some(entity.ends_at);
        self.canceled_at = entity.canceled_at;
        self.trial_ends_at = entity.trial_ends_at;
        self.suspended = entity.suspended;
        self.version = entity.version;
        self.created_at = Some(entity.created_at);
    }
}

/// Builder for a subscriber's new subscription to a plan.
#[derive(Debug, Clone)]
pub struct NewSubscription {
    subscriber: SubscriberRef,
    name: String,
    plan: PlanModel,
    trial_days: Option<i32>,
    skip_trial: bool,
}

impl NewSubscription {
    pub fn new(subscriber: SubscriberRef, name: impl Into<String>, plan: PlanModel) -> Self {
        Self {
            subscriber,
            name: name.into(),
            plan,
            trial_days: None,
            skip_trial: false,
        }
    }

    /// Overrides the plan's trial length.
    pub fn trial_days(mut self, days: i32) -> Self {
        self.trial_days = Some(days);
        self
    }

    pub fn skip_trial(mut self) -> Self {
        self.skip_trial = true;
        self
    }

    pub fn build(self, now: DateTime<Utc>) -> Result<SubscriptionModel, SubscriptionError> {
        let trial_days = if self.skip_trial {
            None
        } else {
            self.trial_days
                .or(self.plan.trial_period_days)
                .filter(|days| *days > 0)
        };

        let mut subscription = SubscriptionModel::new(self.subscriber, self.name);
        subscription.change_plan(self.plan, now)?;
        subscription.trial_ends_at = trial_days.map(|days| now + Duration::days(days.into()));

        Ok(subscription)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_objects::plans::FeatureModel;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    fn plan(interval: Interval, interval_count: i32, trial_period_days: Option<i32>) -> PlanModel {
        PlanModel {
            id: Uuid::new_v4(),
            name: "Pro".to_string(),
            description: None,
            price_minor: 2500,
            interval,
            interval_count,
            trial_period_days,
            sort_order: 0,
            features: vec![FeatureModel {
                id: Uuid::new_v4(),
                slug: "exports".to_string(),
                name: "Exports".to_string(),
                value: Some("Y".to_string()),
                description: None,
                sort_order: 0,
            }],
        }
    }

    fn subscriber() -> SubscriberRef {
        SubscriberRef::new("user", Uuid::new_v4())
    }

    fn monthly_subscription() -> SubscriptionModel {
        NewSubscription::new(subscriber(), DEFAULT_SUBSCRIPTION_NAME, plan(Interval::Month, 1, None))
            .build(t0())
            .unwrap()
    }

    #[test]
    fn new_subscription_starts_period_now() {
        let subscription = monthly_subscription();

        assert_eq!(subscription.starts_at, Some(t0()));
        assert_eq!(
            subscription.ends_at,
            Some(Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap())
        );
        assert_eq!(subscription.trial_ends_at, None);
        assert!(!subscription.is_persisted());
    }

    #[test]
    fn builder_applies_plan_trial_unless_skipped() {
        let trial_plan = plan(Interval::Month, 1, Some(14));

        let with_trial = NewSubscription::new(subscriber(), "default", trial_plan.clone())
            .build(t0())
            .unwrap();
        assert_eq!(with_trial.trial_ends_at, Some(t0() + Duration::days(14)));

        let overridden = NewSubscription::new(subscriber(), "default", trial_plan.clone())
            .trial_days(30)
            .build(t0())
            .unwrap();
        assert_eq!(overridden.trial_ends_at, Some(t0() + Duration::days(30)));

        let skipped = NewSubscription::new(subscriber(), "default", trial_plan)
            .skip_trial()
            .build(t0())
            .unwrap();
        assert_eq!(skipped.trial_ends_at, None);
    }

    #[test]
    fn active_within_period() {
        let subscription = monthly_subscription();
        let now = t0() + Duration::days(3);

        assert!(!subscription.has_ended(now).unwrap());
        assert!(subscription.is_active(now).unwrap());
        assert_eq!(subscription.status(now).unwrap(), SubscriptionStatus::Active);
    }

    #[test]
    fn ended_is_inclusive_of_period_end() {
        let subscription = monthly_subscription();
        let ends_at = subscription.ends_at.unwrap();

        assert!(!subscription.has_ended(ends_at - Duration::seconds(1)).unwrap());
        assert!(subscription.has_ended(ends_at).unwrap());
    }

    #[test]
    fn trial_keeps_ended_subscription_active() {
        let mut subscription = monthly_subscription();
        subscription.ends_at = Some(t0() + Duration::days(1));
        subscription.trial_ends_at = Some(t0() + Duration::days(14));
        let now = t0() + Duration::days(5);

        assert!(subscription.has_ended(now).unwrap());
        assert!(subscription.on_trial(now));
        assert_eq!(subscription.status(now).unwrap(), SubscriptionStatus::Active);
    }

    #[test]
    fn trial_end_is_exclusive() {
        let mut subscription = monthly_subscription();
        subscription.trial_ends_at = Some(t0() + Duration::days(14));

        assert!(subscription.on_trial(t0() + Duration::days(14) - Duration::seconds(1)));
        assert!(!subscription.on_trial(t0() + Duration::days(14)));
    }

    #[test]
    fn suspension_masks_active_and_trial() {
        let mut subscription =
            NewSubscription::new(subscriber(), "default", plan(Interval::Month, 1, Some(14)))
                .build(t0())
                .unwrap();
        let now = t0() + Duration::days(1);
        assert_eq!(subscription.status(now).unwrap(), SubscriptionStatus::Active);

        subscription.suspend();
        assert!(subscription.on_trial(now));
        assert!(!subscription.is_active(now).unwrap());
        assert_eq!(subscription.status(now).unwrap(), SubscriptionStatus::Suspended);

        subscription.suspend();
        assert!(subscription.is_suspended());

        subscription.unsuspend();
        subscription.unsuspend();
        assert_eq!(subscription.status(now).unwrap(), SubscriptionStatus::Active);
    }

    #[test]
    fn suspension_wins_over_cancellation() {
        let mut subscription = monthly_subscription();
        subscription.cancel(true, t0());
        subscription.suspend();

        assert_eq!(
            subscription.status(t0() + Duration::days(1)).unwrap(),
            SubscriptionStatus::Suspended
        );
    }

    #[test]
    fn trial_expiry_without_renewal() {
        let mut subscription =
            NewSubscription::new(subscriber(), "default", plan(Interval::Month, 1, Some(14)))
                .build(t0())
                .unwrap();
        subscription.ends_at = subscription.trial_ends_at;

        assert_eq!(
            subscription.status(t0() + Duration::days(5)).unwrap(),
            SubscriptionStatus::Active
        );

        let later = t0() + Duration::days(20);
        assert!(subscription.has_ended(later).unwrap());
        assert!(!subscription.on_trial(later));
        assert_eq!(subscription.status(later).unwrap(), SubscriptionStatus::Expired);

        subscription.canceled_at = Some(t0() + Duration::days(10));
        assert_eq!(subscription.status(later).unwrap(), SubscriptionStatus::Canceled);
    }

    #[test]
    fn canceled_subscription_stays_active_until_period_end() {
        let mut subscription = monthly_subscription();
        let ends_at = subscription.ends_at;
        let now = t0() + Duration::days(2);

        subscription.cancel(false, now);

        assert_eq!(subscription.canceled_at, Some(now));
        assert_eq!(subscription.ends_at, ends_at);
        assert_eq!(subscription.status(now).unwrap(), SubscriptionStatus::Active);
    }

    #[test]
    fn immediate_cancel_collapses_period() {
        let mut subscription = monthly_subscription();
        let now = t0() + Duration::days(2);

        subscription.cancel(true, now);

        assert_eq!(subscription.ends_at, subscription.canceled_at);
        assert_eq!(subscription.status(now).unwrap(), SubscriptionStatus::Canceled);
    }

    #[test]
    fn cancel_again_moves_cancellation_forward() {
        let mut subscription = monthly_subscription();
        subscription.cancel(false, t0() + Duration::days(1));
        subscription.cancel(false, t0() + Duration::days(2));

        assert_eq!(subscription.canceled_at, Some(t0() + Duration::days(2)));
    }

    #[test]
    fn missing_period_is_an_error() {
        let subscription = SubscriptionModel::new(subscriber(), "default");

        assert!(matches!(
            subscription.has_ended(t0()),
            Err(SubscriptionError::MissingPeriod)
        ));
        assert!(matches!(
            subscription.status(t0()),
            Err(SubscriptionError::MissingPeriod)
        ));
    }

    #[test]
    fn renew_starts_new_period_and_clears_cancellation() {
        let mut subscription = monthly_subscription();
        let now = t0() + Duration::days(10);
        subscription.cancel(false, now);

        subscription.renew(now).unwrap();

        assert_eq!(subscription.starts_at, Some(now));
        assert_eq!(
            subscription.ends_at,
            Some(Utc.with_ymd_and_hms(2024, 6, 11, 12, 0, 0).unwrap())
        );
        assert_eq!(subscription.canceled_at, None);
    }

    #[test]
    fn renew_after_plain_expiry_is_allowed() {
        let mut subscription = monthly_subscription();
        let now = t0() + Duration::days(45);

        subscription.renew(now).unwrap();
        assert_eq!(subscription.status(now).unwrap(), SubscriptionStatus::Active);
    }

    #[test]
    fn renew_rejects_canceled_and_ended() {
        let mut subscription = monthly_subscription();
        subscription.cancel(true, t0() + Duration::days(1));
        let before = subscription.clone();

        let err = subscription.renew(t0() + Duration::days(2)).unwrap_err();

        assert!(matches!(err, SubscriptionError::Renewal));
        assert_eq!(err.to_string(), "unable to renew: canceled and ended");
        assert_eq!(subscription, before);
    }

    #[test]
    fn change_plan_same_cadence_keeps_period() {
        let mut subscription = monthly_subscription();
        let period = subscription.period();
        let upgrade = plan(Interval::Month, 1, None);
        let upgrade_id = upgrade.id;

        subscription
            .change_plan(upgrade, t0() + Duration::days(9))
            .unwrap();

        assert_eq!(subscription.period(), period);
        assert_eq!(subscription.plan_id(), Some(upgrade_id));
    }

    #[test]
    fn change_plan_new_cadence_resets_period() {
        let mut subscription = monthly_subscription();
        let now = t0() + Duration::days(9);

        subscription
            .change_plan(plan(Interval::Month, 3, None), now)
            .unwrap();
        assert_eq!(subscription.starts_at, Some(now));
        assert_eq!(
            subscription.ends_at,
            Some(Utc.with_ymd_and_hms(2024, 8, 10, 12, 0, 0).unwrap())
        );

        let later = now + Duration::days(1);
        subscription
            .change_plan(plan(Interval::Year, 3, None), later)
            .unwrap();
        assert_eq!(subscription.starts_at, Some(later));
        assert_eq!(
            subscription.ends_at,
            Some(Utc.with_ymd_and_hms(2027, 5, 11, 12, 0, 0).unwrap())
        );
    }

    #[test]
    fn ensure_period_fills_missing_end_from_plan() {
        let mut subscription = SubscriptionModel::new(subscriber(), "default");
        assert!(matches!(
            subscription.ensure_period(t0()),
            Err(SubscriptionError::MissingPlan)
        ));

        subscription.plan = Some(plan(Interval::Week, 2, None));
        subscription.ensure_period(t0()).unwrap();
        assert_eq!(subscription.starts_at, Some(t0()));
        assert_eq!(subscription.ends_at, Some(t0() + Duration::weeks(2)));

        let period = subscription.period();
        subscription.ensure_period(t0() + Duration::days(1)).unwrap();
        assert_eq!(subscription.period(), period);
    }

    #[test]
    fn entities_carry_period_and_plan() {
        let subscription = monthly_subscription();
        let insert = subscription.to_insert_entity(t0()).unwrap();

        assert_eq!(insert.id, subscription.id);
        assert_eq!(Some(insert.plan_id), subscription.plan_id());
        assert_eq!(Some(insert.ends_at), subscription.ends_at);
        assert_eq!(insert.version, 1);

        let orphan = SubscriptionModel::new(subscriber(), "default");
        assert!(matches!(
            orphan.to_update_entity(t0()),
            Err(SubscriptionError::MissingPlan)
        ));
    }
}
