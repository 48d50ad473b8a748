use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Anything that can hold subscriptions. `subscriber_type` discriminates between
/// kinds of subscriber sharing the same table (e.g. "user", "team").
pub trait Subscriber {
    fn subscriber_type(&self) -> &str;
    fn subscriber_id(&self) -> Uuid;

    fn subscriber_ref(&self) -> SubscriberRef {
        SubscriberRef {
            subscriber_type: self.subscriber_type().to_string(),
            subscriber_id: self.subscriber_id(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct SubscriberRef {
    pub subscriber_type: String,
    pub subscriber_id: Uuid,
}

impl SubscriberRef {
    pub fn new(subscriber_type: impl Into<String>, subscriber_id: Uuid) -> Self {
        Self {
            subscriber_type: subscriber_type.into(),
            subscriber_id,
        }
    }
}

impl Subscriber for SubscriberRef {
    fn subscriber_type(&self) -> &str {
        &self.subscriber_type
    }

    fn subscriber_id(&self) -> Uuid {
        self.subscriber_id
    }

    fn subscriber_ref(&self) -> SubscriberRef {
        self.clone()
    }
}
