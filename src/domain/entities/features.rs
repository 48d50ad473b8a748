use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::infrastructure::postgres::schema::features;

#[derive(Debug, Clone, Identifiable, Selectable, Queryable)]
#[diesel(table_name = features)]
pub struct FeatureEntity {
    pub id: Uuid,
    pub plan_id: Uuid,
    pub slug: String,
    pub name: String,
    pub value: Option<String>,
    pub description: Option<String>,
    pub sort_order: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = features)]
pub struct InsertFeatureEntity {
    pub id: Uuid,
    pub plan_id: Uuid,
    pub slug: String,
    pub name: String,
    pub value: Option<String>,
    pub description: Option<String>,
    pub sort_order: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
