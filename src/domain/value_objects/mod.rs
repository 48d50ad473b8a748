pub mod clock;
pub mod enums;
pub mod periods;
pub mod plans;
pub mod subscribers;
pub mod subscriptions;
