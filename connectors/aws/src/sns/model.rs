//! Subscription configuration and state records

use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use core_types::{Error, Result};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

/// Default budget for `http`/`https` endpoints to confirm, in minutes
pub const DEFAULT_CONFIRMATION_TIMEOUT_IN_MINUTES: u32 = 1;

/// Delivery protocol of a subscription
#[derive(Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Debug)]
#[serde(try_from = "String", into = "&'static str")]
pub enum Protocol {
    /// Mobile push application endpoint
    Application,
    /// Email, plain text
    Email,
    /// Email, JSON encoded
    EmailJson,
    /// Kinesis Data Firehose delivery stream
    Firehose,
    /// HTTP endpoint
    Http,
    /// HTTPS endpoint
    Https,
    /// Lambda function
    Lambda,
    /// SMS text message
    Sms,
    /// SQS queue
    Sqs,
}

impl Protocol {
    /// Every supported protocol
    pub const ALL: [Protocol; 9] = [
        Protocol::Application,
        Protocol::Email,
        Protocol::EmailJson,
        Protocol::Firehose,
        Protocol::Http,
        Protocol::Https,
        Protocol::Lambda,
        Protocol::Sms,
        Protocol::Sqs,
    ];

    /// Wire name of the protocol
    pub fn as_str(&self) -> &'static str {
        match self {
            Protocol::Application => "application",
            Protocol::Email => "email",
            Protocol::EmailJson => "email-json",
            Protocol::Firehose => "firehose",
            Protocol::Http => "http",
            Protocol::Https => "https",
            Protocol::Lambda => "lambda",
            Protocol::Sms => "sms",
            Protocol::Sqs => "sqs",
        }
    }

    /// `http` or `https`
    pub fn is_http(&self) -> bool {
        matches!(self, Protocol::Http | Protocol::Https)
    }

    /// `email` or `email-json`
    pub fn is_email(&self) -> bool {
        matches!(self, Protocol::Email | Protocol::EmailJson)
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Protocol {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Protocol::ALL
            .into_iter()
            .find(|protocol| protocol.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| Error::Validation(format!("unsupported protocol '{s}'")))
    }
}

impl TryFrom<String> for Protocol {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<Protocol> for &'static str {
    fn from(protocol: Protocol) -> Self {
        protocol.as_str()
    }
}

/// Reason a role/protocol pair is rejected, if it is
pub(crate) fn role_mismatch(protocol: Protocol, subscription_role_arn: &str) -> Option<&'static str> {
    match (protocol == Protocol::Firehose, subscription_role_arn.is_empty()) {
        (true, true) => Some("protocol firehose must contain subscription_role_arn"),
        (false, false) => Some("only protocol firehose supports subscription_role_arn"),
        _ => None,
    }
}

/// Check that `subscription_role_arn` is set exactly when the protocol is firehose
pub fn check_subscription_role(protocol: Protocol, subscription_role_arn: &str) -> Result<()> {
    match role_mismatch(protocol, subscription_role_arn) {
        Some(reason) => Err(Error::Validation(reason.to_string())),
        None => Ok(()),
    }
}

fn validate_role_for_protocol(config: &SubscriptionConfig) -> std::result::Result<(), ValidationError> {
    match role_mismatch(config.protocol, &config.subscription_role_arn) {
        Some(reason) => {
            let mut error = ValidationError::new("subscription_role_arn");
            error.message = Some(Cow::Borrowed(reason));
            Err(error)
        }
        None => Ok(()),
    }
}

fn validate_json(value: &str) -> std::result::Result<(), ValidationError> {
    if value.is_empty() {
        return Ok(());
    }
    match serde_json::from_str::<serde::de::IgnoredAny>(value) {
        Ok(_) => Ok(()),
        Err(err) => {
            let mut error = ValidationError::new("invalid_json");
            error.add_param("reason".into(), &err.to_string());
            Err(error)
        }
    }
}

fn default_confirmation_timeout_in_minutes() -> u32 {
    DEFAULT_CONFIRMATION_TIMEOUT_IN_MINUTES
}

/// Desired configuration of a topic subscription
///
/// `topic_arn`, `protocol` and `endpoint` are fixed once the subscription
/// exists; changing them means replacing it.
#[derive(Clone, Serialize, Deserialize, Validate, PartialEq, Eq, Debug)]
#[validate(schema(function = "validate_role_for_protocol"))]
pub struct SubscriptionConfig {
    /// Topic to subscribe to
    #[validate(length(min = 1))]
    pub topic_arn: String,

    /// Delivery protocol
    pub protocol: Protocol,

    /// Protocol-specific endpoint (queue ARN, URL, address, ...)
    #[validate(length(min = 1))]
    pub endpoint: String,

    /// The endpoint confirms the subscription by itself
    #[serde(default)]
    pub endpoint_auto_confirms: bool,

    /// Confirmation budget for `http`/`https` endpoints
    #[serde(default = "default_confirmation_timeout_in_minutes")]
    pub confirmation_timeout_in_minutes: u32,

    /// Deliver messages without the SNS envelope
    #[serde(default)]
    pub raw_message_delivery: bool,

    /// Delivery retry policy JSON, `http`/`https` only
    #[serde(default)]
    #[validate(custom(function = "validate_json"))]
    pub delivery_policy: String,

    /// Message filter policy JSON
    #[serde(default)]
    #[validate(custom(function = "validate_json"))]
    pub filter_policy: String,

    /// Dead-letter queue policy JSON
    #[serde(default)]
    #[validate(custom(function = "validate_json"))]
    pub redrive_policy: String,

    /// IAM role for `firehose` delivery
    #[serde(default)]
    pub subscription_role_arn: String,
}

impl SubscriptionConfig {
    /// Create a configuration with every optional attribute at its default
    pub fn new(topic_arn: impl Into<String>, protocol: Protocol, endpoint: impl Into<String>) -> Self {
        Self {
            topic_arn: topic_arn.into(),
            protocol,
            endpoint: endpoint.into(),
            endpoint_auto_confirms: false,
            confirmation_timeout_in_minutes: DEFAULT_CONFIRMATION_TIMEOUT_IN_MINUTES,
            raw_message_delivery: false,
            delivery_policy: String::new(),
            filter_policy: String::new(),
            redrive_policy: String::new(),
            subscription_role_arn: String::new(),
        }
    }

    /// Set raw message delivery
    pub fn with_raw_message_delivery(mut self, enabled: bool) -> Self {
        self.raw_message_delivery = enabled;
        self
    }

    /// Set the delivery policy document
    pub fn with_delivery_policy(mut self, policy: impl Into<String>) -> Self {
        self.delivery_policy = policy.into();
        self
    }

    /// Set the filter policy document
    pub fn with_filter_policy(mut self, policy: impl Into<String>) -> Self {
        self.filter_policy = policy.into();
        self
    }

    /// Set the redrive policy document
    pub fn with_redrive_policy(mut self, policy: impl Into<String>) -> Self {
        self.redrive_policy = policy.into();
        self
    }

    /// Set the role SNS assumes to write to a firehose stream
    pub fn with_subscription_role_arn(mut self, role_arn: impl Into<String>) -> Self {
        self.subscription_role_arn = role_arn.into();
        self
    }

    /// Mark the endpoint as confirming by itself
    pub fn with_endpoint_auto_confirms(mut self, auto_confirms: bool) -> Self {
        self.endpoint_auto_confirms = auto_confirms;
        self
    }

    /// Set the `http`/`https` confirmation budget
    pub fn with_confirmation_timeout_in_minutes(mut self, minutes: u32) -> Self {
        self.confirmation_timeout_in_minutes = minutes;
        self
    }

    /// Run field validation, reporting failures as [`Error::Validation`]
    pub fn check(&self) -> Result<()> {
        self.validate()
            .map_err(|errors| Error::Validation(errors.to_string()))
    }

    /// Returns true if moving from `self` to `other` cannot be done in place
    pub fn requires_replacement(&self, other: &SubscriptionConfig) -> bool {
        self.topic_arn != other.topic_arn
            || self.protocol != other.protocol
            || self.endpoint != other.endpoint
    }
}

/// Persisted state of a topic subscription
///
/// Everything except `endpoint_auto_confirms` and
/// `confirmation_timeout_in_minutes` is decoded from the remote attributes;
/// those two only exist locally and are copied from the configuration when
/// one is available.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq, Debug)]
pub struct SubscriptionState {
    /// Subscription ARN, the resource identifier
    pub arn: String,
    /// Account owning the subscription
    pub owner_id: String,
    /// Subscribed topic
    pub topic_arn: String,
    /// Protocol as reported by the service
    pub protocol: String,
    /// Protocol-specific endpoint
    pub endpoint: String,
    /// Messages are delivered without the SNS envelope
    pub raw_message_delivery: bool,
    /// Delivery policy as returned by the service
    pub delivery_policy: String,
    /// Filter policy, key-sorted
    pub filter_policy: String,
    /// Redrive policy as returned by the service
    pub redrive_policy: String,
    /// IAM role for `firehose` delivery
    pub subscription_role_arn: String,
    /// The endpoint has not confirmed yet
    pub pending_confirmation: bool,
    /// The confirmation request was authenticated
    pub confirmation_was_authenticated: bool,
    /// Copied from the configuration, never read remotely
    pub endpoint_auto_confirms: bool,
    /// Copied from the configuration, never read remotely
    pub confirmation_timeout_in_minutes: u32,
}

impl SubscriptionState {
    /// Resource identifier
    pub fn id(&self) -> &str {
        &self.arn
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOPIC: &str = "arn:aws:sns:us-west-2:123456789012:orders";

    #[test]
    fn protocol_parses_case_insensitively() {
        assert_eq!("HTTPS".parse::<Protocol>().unwrap(), Protocol::Https);
        assert_eq!("Email-JSON".parse::<Protocol>().unwrap(), Protocol::EmailJson);
        assert!("carrier-pigeon".parse::<Protocol>().is_err());
    }

    #[test]
    fn protocol_serializes_as_wire_name() {
        let json = serde_json::to_string(&Protocol::EmailJson).unwrap();
        assert_eq!(json, "\"email-json\"");
        let protocol: Protocol = serde_json::from_str("\"SQS\"").unwrap();
        assert_eq!(protocol, Protocol::Sqs);
    }

    #[test]
    fn config_defaults_from_json() {
        let config: SubscriptionConfig = serde_json::from_str(
            r#"{"topic_arn":"arn:aws:sns:us-west-2:123456789012:orders","protocol":"sqs","endpoint":"arn:aws:sqs:us-west-2:123456789012:q"}"#,
        )
        .unwrap();
        assert_eq!(config.confirmation_timeout_in_minutes, 1);
        assert!(!config.raw_message_delivery);
        assert!(config.delivery_policy.is_empty());
        assert!(config.check().is_ok());
    }

    #[test]
    fn role_is_checked_against_protocol() {
        assert!(check_subscription_role(Protocol::Sqs, "arn:aws:iam::123456789012:role/x").is_err());
        assert!(check_subscription_role(Protocol::Firehose, "").is_err());
        assert!(check_subscription_role(Protocol::Firehose, "arn:aws:iam::123456789012:role/x").is_ok());
        assert!(check_subscription_role(Protocol::Sqs, "").is_ok());
    }

    #[test]
    fn validation_rejects_bad_json_and_role_mismatch() {
        let config = SubscriptionConfig::new(TOPIC, Protocol::Sqs, "arn:aws:sqs:us-west-2:123456789012:q")
            .with_filter_policy("{not json");
        assert!(matches!(config.check(), Err(Error::Validation(_))));

        let config = SubscriptionConfig::new(TOPIC, Protocol::Firehose, "arn:aws:firehose:us-west-2:123456789012:deliverystream/s");
        assert!(matches!(config.check(), Err(Error::Validation(_))));

        let config = SubscriptionConfig::new(TOPIC, Protocol::Sqs, "");
        assert!(config.check().is_err());
    }

    #[test]
    fn replacement_is_needed_only_for_immutable_fields() {
        let base = SubscriptionConfig::new(TOPIC, Protocol::Sqs, "arn:aws:sqs:us-west-2:123456789012:q");
        assert!(!base.requires_replacement(&base.clone().with_raw_message_delivery(true)));
        assert!(base.requires_replacement(&SubscriptionConfig::new(
            TOPIC,
            Protocol::Lambda,
            "arn:aws:sqs:us-west-2:123456789012:q"
        )));
    }
}
