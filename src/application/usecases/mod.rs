pub mod entitlements;
pub mod plans;
pub mod subscriptions;
