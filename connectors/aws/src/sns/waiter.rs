//! Subscription confirmation polling
//!
//! After `Subscribe`, most protocols leave the subscription in
//! `PendingConfirmation = "true"` until the endpoint acknowledges it. The
//! waiter polls the attribute until it flips, the subscription disappears, a
//! remote call fails, the deadline passes, or the caller cancels.

use std::time::Duration;

use connector_sdk::CancellationToken;
use core_types::{Action, Error, Result};
use tracing::debug;

use super::attributes::{AttributeMap, AttributeName};
use super::client::{find_subscription_attributes, SubscriptionClient};
use super::model::Protocol;
use super::SUBSCRIPTION_RESOURCE;

/// Budget for protocols other than `http`/`https`
pub const DEFAULT_CONFIRMATION_TIMEOUT: Duration = Duration::from_secs(2 * 60);

/// Delay between two status queries
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Timing of confirmation polling
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct WaiterConfig {
    /// Budget for protocols without a configured timeout
    pub default_timeout: Duration,
    /// Delay between two status queries
    pub poll_interval: Duration,
}

impl Default for WaiterConfig {
    fn default() -> Self {
        Self {
            default_timeout: DEFAULT_CONFIRMATION_TIMEOUT,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

/// Whether, and for how long, a new subscription is waited on
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ConfirmationPlan {
    /// Confirmation is synchronous or driven from outside
    Skip,
    /// Poll until confirmed, for at most this long
    Wait(Duration),
}

/// Decide how a freshly created subscription is confirmed
///
/// Email protocols are confirmed by a person and `http`/`https` endpoints
/// that confirm by themselves do so synchronously; neither is polled. Other
/// `http`/`https` endpoints get `timeout_in_minutes`, everything else the
/// configured default.
pub fn confirmation_plan(
    protocol: Protocol,
    endpoint_auto_confirms: bool,
    timeout_in_minutes: u32,
    config: &WaiterConfig,
) -> ConfirmationPlan {
    if protocol.is_email() || (protocol.is_http() && endpoint_auto_confirms) {
        return ConfirmationPlan::Skip;
    }
    if protocol.is_http() {
        return ConfirmationPlan::Wait(Duration::from_secs(u64::from(timeout_in_minutes) * 60));
    }
    ConfirmationPlan::Wait(config.default_timeout)
}

/// Confirmation status read from `PendingConfirmation`
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ConfirmationStatus {
    /// `PendingConfirmation` is `"true"`
    Pending,
    /// Any other value, or no value
    Confirmed,
}

impl ConfirmationStatus {
    /// Anything but an explicit `"true"` counts as confirmed
    pub fn from_attributes(attributes: &AttributeMap) -> Self {
        if attributes.flag(AttributeName::PendingConfirmation) {
            ConfirmationStatus::Pending
        } else {
            ConfirmationStatus::Confirmed
        }
    }
}

/// Polls one subscription until it is confirmed
pub struct ConfirmationWaiter<'a, C: ?Sized> {
    client: &'a C,
    config: WaiterConfig,
}

impl<'a, C> ConfirmationWaiter<'a, C>
where
    C: SubscriptionClient + ?Sized,
{
    /// Waiter polling through `client`
    pub fn new(client: &'a C, config: WaiterConfig) -> Self {
        Self { client, config }
    }

    /// Wait for `arn` to leave the pending state
    ///
    /// Returns the attributes of the confirmed subscription. Fails with
    /// `NotFound` if the subscription vanished, `TimedOut` once `timeout`
    /// has passed, `Cancelled` when `cancel` fires, and with the remote error
    /// for any other failed query. An empty attribute set is retried.
    pub async fn wait(
        &self,
        arn: &str,
        timeout: Duration,
        cancel: &dyn CancellationToken,
    ) -> Result<AttributeMap> {
        let cancelled = || Error::Cancelled {
            action: Action::Waiting,
            resource: SUBSCRIPTION_RESOURCE,
            id: arn.to_string(),
        };
        if cancel.is_cancelled() {
            return Err(cancelled());
        }

        let mut last_state = String::new();
        let outcome = tokio::select! {
            _ = cancel.cancelled() => None,
            polled = tokio::time::timeout(timeout, self.poll(arn, &mut last_state)) => Some(polled),
        };

        match outcome {
            None => Err(cancelled()),
            Some(Ok(result)) => result,
            Some(Err(_elapsed)) => Err(Error::TimedOut {
                action: Action::Waiting,
                resource: SUBSCRIPTION_RESOURCE,
                id: arn.to_string(),
                last_state,
                timeout,
            }),
        }
    }

    async fn poll(&self, arn: &str, last_state: &mut String) -> Result<AttributeMap> {
        loop {
            match find_subscription_attributes(self.client, arn).await {
                Ok(attributes) => match ConfirmationStatus::from_attributes(&attributes) {
                    ConfirmationStatus::Confirmed => {
                        debug!(arn, "SNS topic subscription confirmed");
                        return Ok(attributes);
                    }
                    ConfirmationStatus::Pending => {
                        debug!(arn, "SNS topic subscription pending confirmation");
                        *last_state = "true".to_string();
                    }
                },
                Err(Error::EmptyResult { .. }) => {
                    debug!(arn, "empty SNS topic subscription attributes, retrying");
                }
                Err(err) => return Err(err),
            }
            tokio::time::sleep(self.config.poll_interval).await;
        }
    }
}
