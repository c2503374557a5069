//! SNS topic subscriptions
//!
//! * [`attributes`] maps configuration to and from SNS subscription attributes
//! * [`policy`] normalizes policy documents for diff suppression
//! * [`waiter`] polls a new subscription until it is confirmed
//! * [`subscription`] ties them together as a [`connector_sdk::ManagedResource`]

pub mod attributes;
pub mod client;
pub mod model;
pub mod policy;
pub mod subscription;
pub mod waiter;

#[cfg(test)]
pub(crate) mod testing;

pub use attributes::{AttributeMap, AttributeName};
pub use client::{SnsClient, SubscribeRequest, SubscriptionClient};
pub use model::{check_subscription_role, Protocol, SubscriptionConfig, SubscriptionState};
pub use subscription::TopicSubscription;
pub use waiter::{ConfirmationPlan, ConfirmationWaiter, WaiterConfig};

/// Resource kind used in errors and logs
pub const SUBSCRIPTION_RESOURCE: &str = "SNS Topic Subscription";
