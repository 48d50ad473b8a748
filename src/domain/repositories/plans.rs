use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;
use uuid::Uuid;

use crate::domain::entities::{
    features::{FeatureEntity, InsertFeatureEntity},
    plans::{InsertPlanEntity, PlanEntity},
};

#[async_trait]
#[automock]
pub trait PlanRepository {
    async fn find_by_id(&self, plan_id: Uuid) -> Result<Option<PlanEntity>>;

    /// Plans ordered by `sort_order`.
    async fn list_plans(&self) -> Result<Vec<PlanEntity>>;

    /// Features of one plan ordered by `sort_order`.
    async fn list_features(&self, plan_id: Uuid) -> Result<Vec<FeatureEntity>>;

    async fn insert_plan(&self, insert_plan_entity: InsertPlanEntity) -> Result<PlanEntity>;

    async fn insert_feature(
        &self,
        insert_feature_entity: InsertFeatureEntity,
    ) -> Result<FeatureEntity>;
}
