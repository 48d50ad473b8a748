pub mod intervals;
pub mod subscription_statuses;
