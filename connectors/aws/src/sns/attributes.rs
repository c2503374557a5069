//! Subscription attribute codec
//!
//! SNS exchanges subscription settings as a flat map of named string
//! attributes. Presence matters: an attribute sent with an empty value is not
//! the same request as leaving it out, so [`encode`] only emits attributes
//! whose configured value differs from its default.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use super::model::{SubscriptionConfig, SubscriptionState, DEFAULT_CONFIRMATION_TIMEOUT_IN_MINUTES};

/// Subscription attributes known to this connector
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum AttributeName {
    /// Whether the confirmation was authenticated (read-only)
    ConfirmationWasAuthenticated,
    /// Delivery retry policy document
    DeliveryPolicy,
    /// Endpoint receiving messages (read-only)
    Endpoint,
    /// Message filter policy document
    FilterPolicy,
    /// Account owning the subscription (read-only)
    Owner,
    /// `"true"` until the endpoint confirms (read-only)
    PendingConfirmation,
    /// Delivery protocol (read-only)
    Protocol,
    /// Deliver messages without the SNS envelope
    RawMessageDelivery,
    /// Dead-letter queue policy document
    RedrivePolicy,
    /// Subscription ARN (read-only)
    SubscriptionArn,
    /// IAM role used for firehose delivery
    SubscriptionRoleArn,
    /// Subscribed topic (read-only)
    TopicArn,
}

impl AttributeName {
    /// Every known attribute
    pub const ALL: [AttributeName; 12] = [
        AttributeName::ConfirmationWasAuthenticated,
        AttributeName::DeliveryPolicy,
        AttributeName::Endpoint,
        AttributeName::FilterPolicy,
        AttributeName::Owner,
        AttributeName::PendingConfirmation,
        AttributeName::Protocol,
        AttributeName::RawMessageDelivery,
        AttributeName::RedrivePolicy,
        AttributeName::SubscriptionArn,
        AttributeName::SubscriptionRoleArn,
        AttributeName::TopicArn,
    ];

    /// Attributes accepted by `Subscribe` and `SetSubscriptionAttributes`
    pub const SETTABLE: [AttributeName; 5] = [
        AttributeName::RawMessageDelivery,
        AttributeName::FilterPolicy,
        AttributeName::DeliveryPolicy,
        AttributeName::SubscriptionRoleArn,
        AttributeName::RedrivePolicy,
    ];

    /// Wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            AttributeName::ConfirmationWasAuthenticated => "ConfirmationWasAuthenticated",
            AttributeName::DeliveryPolicy => "DeliveryPolicy",
            AttributeName::Endpoint => "Endpoint",
            AttributeName::FilterPolicy => "FilterPolicy",
            AttributeName::Owner => "Owner",
            AttributeName::PendingConfirmation => "PendingConfirmation",
            AttributeName::Protocol => "Protocol",
            AttributeName::RawMessageDelivery => "RawMessageDelivery",
            AttributeName::RedrivePolicy => "RedrivePolicy",
            AttributeName::SubscriptionArn => "SubscriptionArn",
            AttributeName::SubscriptionRoleArn => "SubscriptionRoleArn",
            AttributeName::TopicArn => "TopicArn",
        }
    }

    /// Look up a wire name; unknown names yield `None`
    pub fn from_wire(name: &str) -> Option<Self> {
        AttributeName::ALL
            .into_iter()
            .find(|attribute| attribute.as_str() == name)
    }

    /// Returns true if the attribute can be written
    pub fn is_settable(&self) -> bool {
        AttributeName::SETTABLE.contains(self)
    }
}

impl fmt::Display for AttributeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sparse map of subscription attributes
///
/// An absent entry means "use the remote default", never "set to empty".
#[derive(Clone, Default, PartialEq, Eq, Debug)]
pub struct AttributeMap(BTreeMap<AttributeName, String>);

impl AttributeMap {
    /// Empty map
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep the known attributes of a raw remote map, dropping the rest
    pub fn from_remote(raw: HashMap<String, String>) -> Self {
        raw.into_iter()
            .filter_map(|(name, value)| AttributeName::from_wire(&name).map(|name| (name, value)))
            .collect()
    }

    /// Raw map in the shape the SDK expects
    pub fn into_remote(self) -> HashMap<String, String> {
        self.0
            .into_iter()
            .map(|(name, value)| (name.as_str().to_string(), value))
            .collect()
    }

    /// Set an attribute, replacing any previous value
    pub fn insert(&mut self, name: AttributeName, value: impl Into<String>) {
        self.0.insert(name, value.into());
    }

    /// Value of an attribute if present
    pub fn get(&self, name: AttributeName) -> Option<&str> {
        self.0.get(&name).map(String::as_str)
    }

    /// Returns true if the attribute is present, whatever its value
    pub fn has(&self, name: AttributeName) -> bool {
        self.0.contains_key(&name)
    }

    /// Present and exactly `"true"`
    pub fn flag(&self, name: AttributeName) -> bool {
        self.get(name) == Some("true")
    }

    /// Value of an attribute, empty if absent
    pub fn text(&self, name: AttributeName) -> String {
        self.get(name).unwrap_or_default().to_string()
    }

    /// Returns true if no attribute is present
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of present attributes
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Present attributes in name order
    pub fn iter(&self) -> impl Iterator<Item = (AttributeName, &str)> {
        self.0.iter().map(|(name, value)| (*name, value.as_str()))
    }
}

impl FromIterator<(AttributeName, String)> for AttributeMap {
    fn from_iter<T: IntoIterator<Item = (AttributeName, String)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Configured value of a settable attribute, in wire form
///
/// Returns `None` for attributes that are only ever read.
pub fn configured_value(config: &SubscriptionConfig, name: AttributeName) -> Option<String> {
    let value = match name {
        AttributeName::RawMessageDelivery => config.raw_message_delivery.to_string(),
        AttributeName::FilterPolicy => config.filter_policy.clone(),
        AttributeName::DeliveryPolicy => config.delivery_policy.clone(),
        AttributeName::SubscriptionRoleArn => config.subscription_role_arn.clone(),
        AttributeName::RedrivePolicy => config.redrive_policy.clone(),
        _ => return None,
    };
    Some(value)
}

/// Settable attributes of `config` that differ from their defaults
///
/// Defaults are judged on the typed field, never on the wire text: a policy
/// whose text happens to be `false` is still sent.
pub fn encode(config: &SubscriptionConfig) -> AttributeMap {
    let mut attributes = AttributeMap::new();
    if config.raw_message_delivery {
        attributes.insert(AttributeName::RawMessageDelivery, "true");
    }
    let texts = [
        (AttributeName::FilterPolicy, &config.filter_policy),
        (AttributeName::DeliveryPolicy, &config.delivery_policy),
        (AttributeName::SubscriptionRoleArn, &config.subscription_role_arn),
        (AttributeName::RedrivePolicy, &config.redrive_policy),
    ];
    for (name, value) in texts {
        if !value.is_empty() {
            attributes.insert(name, value.as_str());
        }
    }
    attributes
}

/// Build subscription state from remote attributes
///
/// Missing strings decode as empty and missing flags as false.
pub fn decode(attributes: &AttributeMap) -> SubscriptionState {
    SubscriptionState {
        arn: attributes.text(AttributeName::SubscriptionArn),
        owner_id: attributes.text(AttributeName::Owner),
        topic_arn: attributes.text(AttributeName::TopicArn),
        protocol: attributes.text(AttributeName::Protocol),
        endpoint: attributes.text(AttributeName::Endpoint),
        raw_message_delivery: attributes.flag(AttributeName::RawMessageDelivery),
        delivery_policy: attributes.text(AttributeName::DeliveryPolicy),
        filter_policy: attributes.text(AttributeName::FilterPolicy),
        redrive_policy: attributes.text(AttributeName::RedrivePolicy),
        subscription_role_arn: attributes.text(AttributeName::SubscriptionRoleArn),
        pending_confirmation: attributes.flag(AttributeName::PendingConfirmation),
        confirmation_was_authenticated: attributes.flag(AttributeName::ConfirmationWasAuthenticated),
        endpoint_auto_confirms: false,
        confirmation_timeout_in_minutes: DEFAULT_CONFIRMATION_TIMEOUT_IN_MINUTES,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sns::model::Protocol;

    const TOPIC: &str = "arn:aws:sns:us-west-2:123456789012:orders";
    const QUEUE: &str = "arn:aws:sqs:us-west-2:123456789012:orders-queue";

    #[test]
    fn defaults_encode_to_nothing() {
        let config = SubscriptionConfig::new(TOPIC, Protocol::Sqs, QUEUE);
        assert!(encode(&config).is_empty());
    }

    #[test]
    fn only_non_default_attributes_are_encoded() {
        let config = SubscriptionConfig::new(TOPIC, Protocol::Sqs, QUEUE)
            .with_raw_message_delivery(true)
            .with_filter_policy(r#"{"store":["online"]}"#);

        let attributes = encode(&config);
        assert_eq!(attributes.len(), 2);
        assert_eq!(attributes.get(AttributeName::RawMessageDelivery), Some("true"));
        assert_eq!(attributes.get(AttributeName::FilterPolicy), Some(r#"{"store":["online"]}"#));
        assert!(!attributes.has(AttributeName::DeliveryPolicy));
        assert!(!attributes.has(AttributeName::RedrivePolicy));
    }

    #[test]
    fn policy_text_false_is_still_encoded() {
        let config = SubscriptionConfig::new(TOPIC, Protocol::Sqs, QUEUE).with_filter_policy("false");
        assert!(config.check().is_ok());

        let attributes = encode(&config);
        assert_eq!(attributes.len(), 1);
        assert_eq!(attributes.get(AttributeName::FilterPolicy), Some("false"));
    }

    #[test]
    fn decode_reconstructs_encoded_fields() {
        let config = SubscriptionConfig::new(TOPIC, Protocol::Firehose, "arn:aws:firehose:us-west-2:123456789012:deliverystream/s")
            .with_raw_message_delivery(true)
            .with_delivery_policy(r#"{"healthyRetryPolicy":{"numRetries":3}}"#)
            .with_redrive_policy(r#"{"deadLetterTargetArn":"arn:aws:sqs:us-west-2:123456789012:dlq"}"#)
            .with_subscription_role_arn("arn:aws:iam::123456789012:role/firehose");

        let state = decode(&encode(&config));
        assert!(state.raw_message_delivery);
        assert_eq!(state.delivery_policy, config.delivery_policy);
        assert_eq!(state.redrive_policy, config.redrive_policy);
        assert_eq!(state.subscription_role_arn, config.subscription_role_arn);
        assert!(state.filter_policy.is_empty());
    }

    #[test]
    fn empty_map_decodes_to_defaults() {
        let state = decode(&AttributeMap::new());
        assert!(state.arn.is_empty());
        assert!(state.endpoint.is_empty());
        assert!(!state.raw_message_delivery);
        assert!(!state.pending_confirmation);
        assert!(!state.confirmation_was_authenticated);
        assert_eq!(state.confirmation_timeout_in_minutes, DEFAULT_CONFIRMATION_TIMEOUT_IN_MINUTES);
    }

    #[test]
    fn unknown_remote_attributes_are_dropped() {
        let raw = HashMap::from([
            ("PendingConfirmation".to_string(), "false".to_string()),
            ("Endpoint".to_string(), QUEUE.to_string()),
            ("SomeFutureAttribute".to_string(), "x".to_string()),
        ]);
        let attributes = AttributeMap::from_remote(raw);
        assert_eq!(attributes.len(), 2);
        assert!(attributes.has(AttributeName::PendingConfirmation));
        assert!(!attributes.flag(AttributeName::PendingConfirmation));

        let state = decode(&attributes);
        assert_eq!(state.endpoint, QUEUE);
    }

    #[test]
    fn flags_are_true_only_for_exact_true() {
        let attributes: AttributeMap = [(AttributeName::RawMessageDelivery, "TRUE".to_string())]
            .into_iter()
            .collect();
        assert!(!decode(&attributes).raw_message_delivery);
    }

    #[test]
    fn remote_round_trip_uses_wire_names() {
        let mut attributes = AttributeMap::new();
        attributes.insert(AttributeName::SubscriptionRoleArn, "arn:aws:iam::123456789012:role/r");
        let raw = attributes.into_remote();
        assert_eq!(raw.get("SubscriptionRoleArn").map(String::as_str), Some("arn:aws:iam::123456789012:role/r"));
    }
}
