use std::sync::Arc;

use tracing::{error, info};
use uuid::Uuid;

use crate::domain::{
    errors::{SubscriptionError, UseCaseResult},
    repositories::plans::PlanRepository,
    value_objects::{
        clock::Clock,
        plans::{FeatureDraft, FeatureModel, PlanDraft, PlanModel},
    },
};

/// Read side of the plan catalog plus default-filling creation.
pub struct PlanCatalogUseCase<P, C>
where
    P: PlanRepository + Send + Sync + 'static,
    C: Clock + 'static,
{
    plan_repo: Arc<P>,
    clock: Arc<C>,
}

impl<P, C> PlanCatalogUseCase<P, C>
where
    P: PlanRepository + Send + Sync + 'static,
    C: Clock + 'static,
{
    pub fn new(plan_repo: Arc<P>, clock: Arc<C>) -> Self {
        Self { plan_repo, clock }
    }

    pub async fn find_plan(&self, plan_id: Uuid) -> UseCaseResult<PlanModel> {
        let plan = self
            .plan_repo
            .find_by_id(plan_id)
            .await
            .map_err(|err| {
                error!(%plan_id, db_error = ?err, "plans: failed to load plan");
                SubscriptionError::Internal(err)
            })?
            .ok_or(SubscriptionError::PlanNotFound(plan_id))?;

        let features = self
            .plan_repo
            .list_features(plan_id)
            .await
            .map_err(|err| {
                error!(%plan_id, db_error = ?err, "plans: failed to load plan features");
                SubscriptionError::Internal(err)
            })?;

        PlanModel::from_entities(plan, features)
    }

    pub async fn list_plans(&self) -> UseCaseResult<Vec<PlanModel>> {
        let plans = self.plan_repo.list_plans().await.map_err(|err| {
            error!(db_error = ?err, "plans: failed to list plans");
            SubscriptionError::Internal(err)
        })?;

        let mut models = Vec::with_capacity(plans.len());
        for plan in plans {
            let features = self
                .plan_repo
                .list_features(plan.id)
                .await
                .map_err(SubscriptionError::Internal)?;
            models.push(PlanModel::from_entities(plan, features)?);
        }

        info!(plan_count = models.len(), "plans: catalog loaded");
        Ok(models)
    }

    pub async fn create_plan(&self, draft: PlanDraft) -> UseCaseResult<PlanModel> {
        let insert = draft.into_insert_entity(self.clock.now());
        let plan = self.plan_repo.insert_plan(insert).await.map_err(|err| {
            error!(db_error = ?err, "plans: failed to insert plan");
            SubscriptionError::Internal(err)
        })?;

        info!(plan_id = %plan.id, interval = %plan.interval, "plans: plan created");
        PlanModel::from_entities(plan, Vec::new())
    }

    pub async fn add_feature(
        &self,
        plan_id: Uuid,
        draft: FeatureDraft,
    ) -> UseCaseResult<FeatureModel> {
        let feature = self
            .plan_repo
            .insert_feature(draft.into_insert_entity(plan_id, self.clock.now()))
            .await
            .map_err(|err| {
                error!(%plan_id, db_error = ?err, "plans: failed to insert feature");
                SubscriptionError::Internal(err)
            })?;

        Ok(FeatureModel::from(feature))
    }
}
