use std::{collections::HashMap, sync::Arc};

use chrono::{DateTime, Duration, Utc};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::{
    application::usecases::{entitlements::EntitlementResolver, plans::PlanCatalogUseCase},
    domain::{
        entities::subscriptions::SubscriptionEntity,
        errors::{SubscriptionError, UseCaseResult},
        repositories::{plans::PlanRepository, subscriptions::SubscriptionRepository},
        value_objects::{
            clock::Clock,
            enums::subscription_statuses::SubscriptionStatus,
            plans::PlanModel,
            subscribers::Subscriber,
            subscriptions::{NewSubscription, SubscriptionModel},
        },
    },
};

/// Default look-ahead, in days, for the "ending" queries.
pub const DEFAULT_DAY_RANGE: i64 = 3;

/// A plan given either by id or as an already loaded record.
#[derive(Debug, Clone)]
pub enum PlanRef {
    Id(Uuid),
    Plan(PlanModel),
}

impl From<Uuid> for PlanRef {
    fn from(value: Uuid) -> Self {
        PlanRef::Id(value)
    }
}

impl From<PlanModel> for PlanRef {
    fn from(value: PlanModel) -> Self {
        PlanRef::Plan(value)
    }
}

pub struct SubscriptionUseCase<P, S, C>
where
    P: PlanRepository + Send + Sync + 'static,
    S: SubscriptionRepository + Send + Sync + 'static,
    C: Clock + 'static,
{
    catalog: PlanCatalogUseCase<P, C>,
    subscription_repo: Arc<S>,
    clock: Arc<C>,
}

impl<P, S, C> SubscriptionUseCase<P, S, C>
where
    P: PlanRepository + Send + Sync + 'static,
    S: SubscriptionRepository + Send + Sync + 'static,
    C: Clock + 'static,
{
    pub fn new(plan_repo: Arc<P>, subscription_repo: Arc<S>, clock: Arc<C>) -> Self {
        Self {
            catalog: PlanCatalogUseCase::new(plan_repo, Arc::clone(&clock)),
            subscription_repo,
            clock,
        }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub async fn find(&self, subscription_id: Uuid) -> UseCaseResult<SubscriptionModel> {
        let entity = self
            .subscription_repo
            .find_by_id(subscription_id)
            .await
            .map_err(|err| {
                error!(%subscription_id, db_error = ?err, "subscriptions: failed to load subscription");
                SubscriptionError::Internal(err)
            })?
            .ok_or(SubscriptionError::SubscriptionNotFound(subscription_id))?;

        let plan = self.catalog.find_plan(entity.plan_id).await?;
        Ok(SubscriptionModel::from_entity(entity, plan))
    }

    /// All subscriptions of a subscriber, newest first.
    pub async fn subscriptions<T>(&self, subscriber: &T) -> UseCaseResult<Vec<SubscriptionModel>>
    where
        T: Subscriber + Sync,
    {
        let entities = self
            .subscription_repo
            .find_by_subscriber(subscriber.subscriber_type(), subscriber.subscriber_id())
            .await
            .map_err(|err| {
                error!(
                    subscriber_type = subscriber.subscriber_type(),
                    subscriber_id = %subscriber.subscriber_id(),
                    db_error = ?err,
                    "subscriptions: failed to load subscriber subscriptions"
                );
                SubscriptionError::Internal(err)
            })?;

        self.hydrate(entities).await
    }

    /// Newest subscription of the subscriber carrying `name`.
    pub async fn subscription<T>(
        &self,
        subscriber: &T,
        name: &str,
    ) -> UseCaseResult<Option<SubscriptionModel>>
    where
        T: Subscriber + Sync,
    {
        let mut entities = self
            .subscription_repo
            .find_by_subscriber(subscriber.subscriber_type(), subscriber.subscriber_id())
            .await
            .map_err(SubscriptionError::Internal)?;

        entities.retain(|entity| entity.name == name);
        let newest = entities.into_iter().max_by_key(|entity| entity.created_at);

        match newest {
            Some(entity) => {
                let plan = self.catalog.find_plan(entity.plan_id).await?;
                Ok(Some(SubscriptionModel::from_entity(entity, plan)))
            }
            None => Ok(None),
        }
    }

    /// Whether the named subscription exists and is active, optionally on a given plan.
    pub async fn subscribed<T>(
        &self,
        subscriber: &T,
        name: &str,
        plan_id: Option<Uuid>,
    ) -> UseCaseResult<bool>
    where
        T: Subscriber + Sync,
    {
        let Some(subscription) = self.subscription(subscriber, name).await? else {
            return Ok(false);
        };

        if plan_id.is_some_and(|plan_id| subscription.plan_id() != Some(plan_id)) {
            return Ok(false);
        }

        subscription.is_active(self.now())
    }

    pub async fn by_plan(&self, plan_id: Uuid) -> UseCaseResult<Vec<SubscriptionModel>> {
        let entities = self
            .subscription_repo
            .find_by_plan(plan_id)
            .await
            .map_err(SubscriptionError::Internal)?;

        self.hydrate(entities).await
    }

    /// Builder for a new subscription to `plan_id`; finish with [`Self::subscribe`].
    pub async fn new_subscription<T>(
        &self,
        subscriber: &T,
        name: &str,
        plan_id: Uuid,
    ) -> UseCaseResult<NewSubscription>
    where
        T: Subscriber + Sync,
    {
        let plan = self.catalog.find_plan(plan_id).await?;
        Ok(NewSubscription::new(subscriber.subscriber_ref(), name, plan))
    }

    pub async fn subscribe(&self, new_subscription: NewSubscription) -> UseCaseResult<SubscriptionModel> {
        let mut subscription = new_subscription.build(self.now())?;
        self.save(&mut subscription).await?;

        info!(
            subscription_id = %subscription.id,
            subscriber_id = %subscription.subscriber.subscriber_id,
            plan_id = ?subscription.plan_id(),
            "subscriptions: subscription created"
        );
        Ok(subscription)
    }

    /// Persists the subscription, deriving a period from its plan when none is set.
    /// On failure the model is left as it was.
    pub async fn save(&self, subscription: &mut SubscriptionModel) -> UseCaseResult<()> {
        let now = self.now();
        let mut next = subscription.clone();
        next.ensure_period(now)?;

        let stored = if next.is_persisted() {
            self.subscription_repo
                .update(next.id, next.version, next.to_update_entity(now)?)
                .await
                .map_err(|err| {
                    error!(subscription_id = %next.id, db_error = ?err, "subscriptions: failed to update subscription");
                    SubscriptionError::Internal(err)
                })?
                .ok_or_else(|| {
                    warn!(
                        subscription_id = %next.id,
                        expected_version = next.version,
                        "subscriptions: concurrent modification detected"
                    );
                    SubscriptionError::Conflict(next.id)
                })?
        } else {
            self.subscription_repo
                .insert(next.to_insert_entity(now)?)
                .await
                .map_err(|err| {
                    error!(subscription_id = %next.id, db_error = ?err, "subscriptions: failed to insert subscription");
                    SubscriptionError::Internal(err)
                })?
        };

        next.sync_from_entity(&stored);
        *subscription = next;
        Ok(())
    }

    pub async fn suspend(&self, subscription: &mut SubscriptionModel) -> UseCaseResult<()> {
        let mut next = subscription.clone();
        next.suspend();
        self.save(&mut next).await?;
        *subscription = next;

        info!(subscription_id = %subscription.id, "subscriptions: suspended");
        Ok(())
    }

    pub async fn unsuspend(&self, subscription: &mut SubscriptionModel) -> UseCaseResult<()> {
        let mut next = subscription.clone();
        next.unsuspend();
        self.save(&mut next).await?;
        *subscription = next;

        info!(subscription_id = %subscription.id, "subscriptions: unsuspended");
        Ok(())
    }

    pub async fn cancel(
        &self,
        subscription: &mut SubscriptionModel,
        immediately: bool,
    ) -> UseCaseResult<()> {
        let mut next = subscription.clone();
        next.cancel(immediately, self.now());
        self.save(&mut next).await?;
        *subscription = next;

        info!(
            subscription_id = %subscription.id,
            immediately,
            canceled_at = ?subscription.canceled_at,
            "subscriptions: canceled"
        );
        Ok(())
    }

    /// Starts a new period at the current instant and clears cancellation, in one
    /// storage transaction. Fails without touching anything when the subscription is
    /// both canceled and ended.
    pub async fn renew(&self, subscription: &mut SubscriptionModel) -> UseCaseResult<()> {
        let now = self.now();

        if let Err(err) = subscription.ensure_renewable(now) {
            warn!(subscription_id = %subscription.id, error = %err, "subscriptions: renewal refused");
            return Err(err);
        }

        if !subscription.is_persisted() {
            return Err(SubscriptionError::SubscriptionNotFound(subscription.id));
        }

        let mut next = subscription.clone();
        next.renew(now)?;
        let period = next.period().ok_or(SubscriptionError::MissingPeriod)?;

        let stored = self
            .subscription_repo
            .renew_period(next.id, next.version, next.to_update_entity(now)?)
            .await
            .map_err(|err| {
                error!(subscription_id = %next.id, db_error = ?err, "subscriptions: renewal transaction failed");
                SubscriptionError::Internal(err)
            })?
            .ok_or_else(|| {
                warn!(
                    subscription_id = %next.id,
                    expected_version = next.version,
                    "subscriptions: concurrent modification during renewal"
                );
                SubscriptionError::Conflict(next.id)
            })?;

        next.sync_from_entity(&stored);
        *subscription = next;

        info!(
            subscription_id = %subscription.id,
            starts_at = %period.starts_at,
            ends_at = %period.ends_at,
            "subscriptions: renewed"
        );
        Ok(())
    }

    /// Swaps the plan in memory; the caller decides when to [`Self::save`].
    pub async fn change_plan(
        &self,
        subscription: &mut SubscriptionModel,
        plan: impl Into<PlanRef>,
    ) -> UseCaseResult<()> {
        let plan = match plan.into() {
            PlanRef::Id(plan_id) => self.catalog.find_plan(plan_id).await?,
            PlanRef::Plan(plan) => plan,
        };

        let previous_plan_id = subscription.plan_id();
        subscription.change_plan(plan, self.now())?;

        info!(
            subscription_id = %subscription.id,
            previous_plan_id = ?previous_plan_id,
            plan_id = ?subscription.plan_id(),
            "subscriptions: plan changed"
        );
        Ok(())
    }

    pub fn status(&self, subscription: &SubscriptionModel) -> UseCaseResult<SubscriptionStatus> {
        subscription.status(self.now())
    }

    pub fn is_active(&self, subscription: &SubscriptionModel) -> UseCaseResult<bool> {
        subscription.is_active(self.now())
    }

    pub fn ability<'a>(&self, subscription: &'a SubscriptionModel) -> EntitlementResolver<'a> {
        EntitlementResolver::new(subscription, self.now())
    }

    /// Trials ending within the next `day_range` days.
    pub async fn ending_trial(&self, day_range: i64) -> UseCaseResult<Vec<SubscriptionModel>> {
        let from = self.now();
        let to = from + Duration::days(day_range);
        let entities = self
            .subscription_repo
            .find_trial_ends_between(from, to)
            .await
            .map_err(SubscriptionError::Internal)?;

        self.hydrate(entities).await
    }

    pub async fn ended_trial(&self) -> UseCaseResult<Vec<SubscriptionModel>> {
        let entities = self
            .subscription_repo
            .find_trial_ended_by(self.now())
            .await
            .map_err(SubscriptionError::Internal)?;

        self.hydrate(entities).await
    }

    /// Subscriptions whose period ends today.
    pub async fn renewable(&self) -> UseCaseResult<Vec<SubscriptionModel>> {
        let entities = self
            .subscription_repo
            .find_ends_on(self.now().date_naive())
            .await
            .map_err(SubscriptionError::Internal)?;

        self.hydrate(entities).await
    }

    /// Periods ending within `day_range` days of `from` (now when absent).
    pub async fn ending_period(
        &self,
        day_range: i64,
        from: Option<DateTime<Utc>>,
    ) -> UseCaseResult<Vec<SubscriptionModel>> {
        let from = from.unwrap_or_else(|| self.now());
        let to = from + Duration::days(day_range);
        let entities = self
            .subscription_repo
            .find_ends_between(from, to)
            .await
            .map_err(SubscriptionError::Internal)?;

        self.hydrate(entities).await
    }

    pub async fn ended_period(&self) -> UseCaseResult<Vec<SubscriptionModel>> {
        let entities = self
            .subscription_repo
            .find_ended_by(self.now())
            .await
            .map_err(SubscriptionError::Internal)?;

        self.hydrate(entities).await
    }

    async fn hydrate(
        &self,
        entities: Vec<SubscriptionEntity>,
    ) -> UseCaseResult<Vec<SubscriptionModel>> {
        let mut plans: HashMap<Uuid, PlanModel> = HashMap::new();
        let mut models = Vec::with_capacity(entities.len());

        for entity in entities {
            let plan = match plans.get(&entity.plan_id) {
                Some(plan) => plan.clone(),
                None => {
                    let plan = self.catalog.find_plan(entity.plan_id).await?;
                    plans.insert(plan.id, plan.clone());
                    plan
                }
            };
            models.push(SubscriptionModel::from_entity(entity, plan));
        }

        Ok(models)
    }
}
