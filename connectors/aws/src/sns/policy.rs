//! Policy document normalization for diff suppression
//!
//! The service hands policies back reformatted, so comparing configured and
//! remote text directly produces spurious diffs. The delivery policy is parsed
//! into its fixed schema and re-serialized with stable field order, dropping
//! unknown fields and zero values. The result is only ever compared, never
//! stored.
//!
//! Field names match case-insensitively and `null` reads as the zero value,
//! which is how SNS itself reads these documents.

use serde::de::{DeserializeOwned, IgnoredAny};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

/// Every field name of the policy schemas, in canonical spelling
const POLICY_FIELDS: [&str; 13] = [
    "guaranteed",
    "healthyRetryPolicy",
    "sicklyRetryPolicy",
    "throttlePolicy",
    "backoffFunction",
    "maxDelayTarget",
    "minDelayTarget",
    "numMaxDelayRetries",
    "numMinDelayRetries",
    "numNoDelayRetries",
    "numRetries",
    "maxReceivesPerSecond",
    "deadLetterTargetArn",
];

fn is_false(value: &bool) -> bool {
    !*value
}

fn is_zero(value: &i64) -> bool {
    *value == 0
}

/// Subscription delivery policy
#[derive(Clone, Default, Serialize, Deserialize, PartialEq, Eq, Debug)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryPolicy {
    /// Keep retrying past the retry policy for guaranteed delivery
    #[serde(default, skip_serializing_if = "is_false")]
    pub guaranteed: bool,

    /// Retries while the endpoint is healthy
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub healthy_retry_policy: Option<RetryPolicy>,

    /// Retries while the endpoint is unhealthy
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sickly_retry_policy: Option<RetryPolicy>,

    /// Delivery rate limit
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub throttle_policy: Option<ThrottlePolicy>,
}

/// Retry schedule used while the endpoint is healthy or sickly
#[derive(Clone, Default, Serialize, Deserialize, PartialEq, Eq, Debug)]
#[serde(rename_all = "camelCase")]
pub struct RetryPolicy {
    /// `linear`, `arithmetic`, `geometric` or `exponential`
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub backoff_function: String,

    /// Upper bound of the delay between retries, in seconds
    #[serde(default, skip_serializing_if = "is_zero")]
    pub max_delay_target: i64,

    /// Lower bound of the delay between retries, in seconds
    #[serde(default, skip_serializing_if = "is_zero")]
    pub min_delay_target: i64,

    /// Retries at the maximum delay
    #[serde(default, skip_serializing_if = "is_zero")]
    pub num_max_delay_retries: i64,

    /// Retries at the minimum delay
    #[serde(default, skip_serializing_if = "is_zero")]
    pub num_min_delay_retries: i64,

    /// Immediate retries
    #[serde(default, skip_serializing_if = "is_zero")]
    pub num_no_delay_retries: i64,

    /// Total number of retries
    #[serde(default, skip_serializing_if = "is_zero")]
    pub num_retries: i64,
}

/// Rate limit of deliveries to the endpoint
#[derive(Clone, Default, Serialize, Deserialize, PartialEq, Eq, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ThrottlePolicy {
    /// Deliveries per second
    #[serde(default, skip_serializing_if = "is_zero")]
    pub max_receives_per_second: i64,
}

/// Dead-letter routing for undeliverable messages
#[derive(Clone, Default, Serialize, Deserialize, PartialEq, Eq, Debug)]
#[serde(rename_all = "camelCase")]
pub struct RedrivePolicy {
    /// Queue receiving messages that could not be delivered
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub dead_letter_target_arn: String,
}

/// Rewrite object keys to their canonical spelling and drop `null` members
///
/// Keys outside the schema are dropped here rather than by serde.
fn fold_fields(value: Value) -> Value {
    let Value::Object(members) = value else {
        return value;
    };
    let folded = members
        .into_iter()
        .filter(|(_, member)| !member.is_null())
        .filter_map(|(key, member)| {
            POLICY_FIELDS
                .iter()
                .find(|field| field.eq_ignore_ascii_case(&key))
                .map(|field| (field.to_string(), fold_fields(member)))
        })
        .collect::<Map<String, Value>>();
    Value::Object(folded)
}

fn parse_policy<T: DeserializeOwned>(text: &str) -> serde_json::Result<T> {
    match serde_json::from_str::<Value>(text)? {
        Value::Null => serde_json::from_value(Value::Object(Map::new())),
        value => serde_json::from_value(fold_fields(value)),
    }
}

/// Canonical text of a delivery policy
pub fn normalize_delivery_policy(text: &str) -> serde_json::Result<String> {
    let policy: DeliveryPolicy = parse_policy(text)?;
    serde_json::to_string(&policy)
}

/// Canonical text of a redrive policy
pub fn normalize_redrive_policy(text: &str) -> serde_json::Result<String> {
    let policy: RedrivePolicy = parse_policy(text)?;
    serde_json::to_string(&policy)
}

/// Any JSON document with object keys sorted and whitespace removed
pub fn normalize_json(text: &str) -> serde_json::Result<String> {
    let value: serde_json::Value = serde_json::from_str(text)?;
    serde_json::to_string(&value)
}

/// Remove insignificant whitespace, leaving everything else untouched
///
/// Field order and number formatting are preserved. Invalid JSON is rejected.
pub fn compact(text: &str) -> serde_json::Result<String> {
    serde_json::from_str::<IgnoredAny>(text)?;

    let mut out = String::with_capacity(text.len());
    let mut in_string = false;
    let mut escaped = false;
    for c in text.chars() {
        if in_string {
            out.push(c);
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }
        match c {
            ' ' | '\t' | '\n' | '\r' => {}
            '"' => {
                in_string = true;
                out.push(c);
            }
            _ => out.push(c),
        }
    }
    Ok(out)
}

/// Returns true if the `old` delivery policy and the `new` one are the same
///
/// Only `old` is schema-normalized; `new` is only compacted. A `new` text
/// carrying unknown fields, zero values or a different field order is
/// therefore reported as different. Unparseable input is never equivalent.
pub fn delivery_policy_equivalent(old: &str, new: &str) -> bool {
    let normalized = match normalize_delivery_policy(old) {
        Ok(normalized) => normalized,
        Err(err) => {
            warn!(error = %err, "unable to parse SNS topic subscription delivery policy");
            return false;
        }
    };
    match compact(new) {
        Ok(compacted) => normalized == compacted,
        Err(err) => {
            warn!(error = %err, "unable to compact SNS topic subscription delivery policy");
            false
        }
    }
}

/// Returns true if two JSON texts hold the same value
pub fn json_equivalent(old: &str, new: &str) -> bool {
    let parse = |text: &str| serde_json::from_str::<serde_json::Value>(text);
    match (parse(old), parse(new)) {
        (Ok(old), Ok(new)) => old == new,
        (Err(err), _) | (_, Err(err)) => {
            warn!(error = %err, "unable to compare JSON documents");
            false
        }
    }
}
