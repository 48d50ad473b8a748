use anyhow::Result;
use async_trait::async_trait;
use diesel::{RunQueryDsl, insert_into, prelude::*};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    domain::{
        entities::{
            features::{FeatureEntity, InsertFeatureEntity},
            plans::{InsertPlanEntity, PlanEntity},
        },
        repositories::plans::PlanRepository,
    },
    infrastructure::postgres::{
        postgres_connection::PgPool,
        schema::{features, plans},
    },
};

pub struct PlanPostgres {
    db_pool: Arc<PgPool>,
}

impl PlanPostgres {
    pub fn new(db_pool: Arc<PgPool>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl PlanRepository for PlanPostgres {
    async fn find_by_id(&self, plan_id: Uuid) -> Result<Option<PlanEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let plan = plans::table
            .filter(plans::id.eq(plan_id))
            .select(PlanEntity::as_select())
            .first::<PlanEntity>(&mut conn)
            .optional()?;

        Ok(plan)
    }

    async fn list_plans(&self) -> Result<Vec<PlanEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let results = plans::table
            .order((plans::sort_order.asc(), plans::created_at.asc()))
            .select(PlanEntity::as_select())
            .load::<PlanEntity>(&mut conn)?;

        Ok(results)
    }

    async fn list_features(&self, plan_id: Uuid) -> Result<Vec<FeatureEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let results = features::table
            .filter(features::plan_id.eq(plan_id))
            .order((features::sort_order.asc(), features::created_at.asc()))
            .select(FeatureEntity::as_select())
            .load::<FeatureEntity>(&mut conn)?;

        Ok(results)
    }

    async fn insert_plan(&self, insert_plan_entity: InsertPlanEntity) -> Result<PlanEntity> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = insert_into(plans::table)
            .values(&insert_plan_entity)
            .returning(PlanEntity::as_returning())
            .get_result::<PlanEntity>(&mut conn)?;

        Ok(result)
    }

    async fn insert_feature(
        &self,
        insert_feature_entity: InsertFeatureEntity,
    ) -> Result<FeatureEntity> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = insert_into(features::table)
            .values(&insert_feature_entity)
            .returning(FeatureEntity::as_returning())
            .get_result::<FeatureEntity>(&mut conn)?;

        Ok(result)
    }
}
