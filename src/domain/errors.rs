use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum SubscriptionError {
    #[error("invalid interval \"{0}\"")]
    InvalidInterval(String),
    #[error("invalid interval count {0}: must be at least 1")]
    InvalidIntervalCount(i64),
    #[error("unable to renew: canceled and ended")]
    Renewal,
    #[error("subscription has no billing period")]
    MissingPeriod,
    #[error("subscription has no plan attached")]
    MissingPlan,
    #[error("plan not found: {0}")]
    PlanNotFound(Uuid),
    #[error("subscription not found: {0}")]
    SubscriptionNotFound(Uuid),
    #[error("subscription {0} was modified concurrently")]
    Conflict(Uuid),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

pub type UseCaseResult<T> = std::result::Result<T, SubscriptionError>;
