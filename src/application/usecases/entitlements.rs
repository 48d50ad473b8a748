use chrono::{DateTime, Utc};
use tracing::warn;

use crate::domain::value_objects::{plans::FeatureModel, subscriptions::SubscriptionModel};

/// Feature gating for one subscription, evaluated at a single instant.
///
/// Never fails: missing plan, missing feature, or a subscription without a period
/// all degrade to `false` or the caller's default.
pub struct EntitlementResolver<'a> {
    subscription: &'a SubscriptionModel,
    now: DateTime<Utc>,
}

impl<'a> EntitlementResolver<'a> {
    pub fn new(subscription: &'a SubscriptionModel, now: DateTime<Utc>) -> Self {
        Self { subscription, now }
    }

    /// Active subscription and the feature is enabled on its plan.
    pub fn can_use(&self, feature_slug: &str) -> bool {
        if !self.subscription_active() {
            return false;
        }

        self.enabled(feature_slug)
    }

    /// The plan carries the feature with a non-null value. Ignores subscription status.
    pub fn enabled(&self, feature_slug: &str) -> bool {
        self.value(feature_slug).is_some()
    }

    /// Raw value of the first feature matching `feature_slug`, or `None`.
    pub fn value(&self, feature_slug: &str) -> Option<&'a str> {
        self.feature(feature_slug)
            .and_then(|feature| feature.value.as_deref())
    }

    /// `default` only stands in for a feature the plan lacks; a feature present with a
    /// null value still yields `None`.
    pub fn value_or(&self, feature_slug: &str, default: &'a str) -> Option<&'a str> {
        self.feature(feature_slug)
            .map_or(Some(default), |feature| feature.value.as_deref())
    }

    fn feature(&self, feature_slug: &str) -> Option<&'a FeatureModel> {
        self.subscription
            .plan
            .as_ref()
            .and_then(|plan| plan.feature(feature_slug))
    }

    fn subscription_active(&self) -> bool {
        match self.subscription.is_active(self.now) {
            Ok(active) => active,
            Err(err) => {
                warn!(
                    subscription_id = %self.subscription.id,
                    error = %err,
                    "entitlements: treating subscription as inactive"
                );
                false
            }
        }
    }
}
