use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use mockall::automock;
use uuid::Uuid;

use crate::domain::entities::subscriptions::{
    InsertSubscriptionEntity, SubscriptionEntity, UpdateSubscriptionEntity,
};

#[async_trait]
#[automock]
pub trait SubscriptionRepository {
    async fn find_by_id(&self, subscription_id: Uuid) -> Result<Option<SubscriptionEntity>>;

    /// Newest first.
    async fn find_by_subscriber(
        &self,
        subscriber_type: &str,
        subscriber_id: Uuid,
    ) -> Result<Vec<SubscriptionEntity>>;

    async fn find_by_plan(&self, plan_id: Uuid) -> Result<Vec<SubscriptionEntity>>;

    async fn insert(
        &self,
        insert_subscription_entity: InsertSubscriptionEntity,
    ) -> Result<SubscriptionEntity>;

    /// Writes the row only if its version still equals `expected_version`, bumping it.
    /// Returns `None` when the row is gone or was changed concurrently.
    async fn update(
        &self,
        subscription_id: Uuid,
        expected_version: i32,
        update_subscription_entity: UpdateSubscriptionEntity,
    ) -> Result<Option<SubscriptionEntity>>;

    /// Writes the renewed row (plan, period, cleared `canceled_at`) in a single
    /// transaction holding the row lock, guarded by `expected_version` like
    /// [`SubscriptionRepository::update`].
    async fn renew_period(
        &self,
        subscription_id: Uuid,
        expected_version: i32,
        update_subscription_entity: UpdateSubscriptionEntity,
    ) -> Result<Option<SubscriptionEntity>>;

    /// `trial_ends_at` within `[from, to]`.
    async fn find_trial_ends_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<SubscriptionEntity>>;

    /// `trial_ends_at <= now`.
    async fn find_trial_ended_by(&self, now: DateTime<Utc>) -> Result<Vec<SubscriptionEntity>>;

    /// `ends_at` falls on `date` (UTC).
    async fn find_ends_on(&self, date: NaiveDate) -> Result<Vec<SubscriptionEntity>>;

    /// `ends_at` within `[from, to]`.
    async fn find_ends_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<SubscriptionEntity>>;

    /// `ends_at <= now`.
    async fn find_ended_by(&self, now: DateTime<Utc>) -> Result<Vec<SubscriptionEntity>>;
}
