//! SNS topic subscription resource

use async_trait::async_trait;
use connector_sdk::{CancellationToken, ManagedResource};
use core_types::{Action, Error, Result, ServiceError};
use tracing::{debug, info, warn};

use super::attributes::{configured_value, decode, encode, AttributeName};
use super::client::{find_subscription_attributes, SubscribeRequest, SubscriptionClient};
use super::model::{check_subscription_role, Protocol, SubscriptionConfig, SubscriptionState};
use super::policy::{delivery_policy_equivalent, json_equivalent, normalize_json};
use super::waiter::{confirmation_plan, ConfirmationPlan, ConfirmationWaiter, WaiterConfig};
use super::SUBSCRIPTION_RESOURCE;

/// Value actually sent for an attribute update
///
/// SNS rejects an empty redrive policy but accepts its removal, and removes
/// a filter policy when given an empty object.
pub fn attribute_payload(name: AttributeName, value: &str) -> Option<String> {
    match (name, value.is_empty()) {
        (AttributeName::RedrivePolicy, true) => None,
        (AttributeName::FilterPolicy, true) => Some("{}".to_string()),
        _ => Some(value.to_string()),
    }
}

/// Settable attributes whose value differs between `prior` and `config`
///
/// Policy documents that only differ in formatting are not reported. The
/// order is the order updates are applied in.
pub fn changed_attributes(prior: &SubscriptionConfig, config: &SubscriptionConfig) -> Vec<AttributeName> {
    AttributeName::SETTABLE
        .into_iter()
        .filter(|name| {
            let old = configured_value(prior, *name).unwrap_or_default();
            let new = configured_value(config, *name).unwrap_or_default();
            if old == new {
                return false;
            }
            // Setting or removing a policy is a change on its face
            if old.is_empty() || new.is_empty() {
                return true;
            }
            match name {
                AttributeName::DeliveryPolicy => !delivery_policy_equivalent(&old, &new),
                AttributeName::FilterPolicy | AttributeName::RedrivePolicy => !json_equivalent(&old, &new),
                _ => true,
            }
        })
        .collect()
}

/// Topic subscription lifecycle over a [`SubscriptionClient`]
pub struct TopicSubscription<C> {
    client: C,
    waiter: WaiterConfig,
}

impl<C> TopicSubscription<C>
where
    C: SubscriptionClient,
{
    /// Manage subscriptions through `client`, waiting per `waiter`
    pub fn new(client: C, waiter: WaiterConfig) -> Self {
        Self { client, waiter }
    }

    /// Underlying subscription client
    pub fn client(&self) -> &C {
        &self.client
    }

    /// Write a single attribute of an existing subscription
    ///
    /// The role/protocol pairing is checked before anything is sent.
    pub async fn set_attribute(
        &self,
        arn: &str,
        protocol: Protocol,
        name: AttributeName,
        value: &str,
    ) -> Result<()> {
        if !name.is_settable() {
            return Err(Error::Validation(format!("attribute {name} is read-only")));
        }
        if name == AttributeName::SubscriptionRoleArn {
            check_subscription_role(protocol, value)?;
        }

        debug!(arn, attribute = %name, "updating SNS topic subscription attribute");
        self.client
            .set_attribute(arn, name, attribute_payload(name, value))
            .await
            .map_err(|err| match err {
                ServiceError::NotFound(_) => Error::service(Action::Updating, SUBSCRIPTION_RESOURCE, arn, err),
                err => Error::service(
                    Action::Updating,
                    SUBSCRIPTION_RESOURCE,
                    format!("{arn}, attribute {name}"),
                    err,
                ),
            })
    }

    async fn refresh(&self, arn: &str, config: Option<&SubscriptionConfig>) -> Result<SubscriptionState> {
        debug!(arn, "loading SNS topic subscription");
        let attributes = find_subscription_attributes(&self.client, arn).await?;

        let mut state = decode(&attributes);
        if state.arn.is_empty() {
            state.arn = arn.to_string();
        }
        if !state.filter_policy.is_empty() {
            if let Ok(normalized) = normalize_json(&state.filter_policy) {
                state.filter_policy = normalized;
            }
        }
        if let Some(config) = config {
            state.endpoint_auto_confirms = config.endpoint_auto_confirms;
            state.confirmation_timeout_in_minutes = config.confirmation_timeout_in_minutes;
        }
        Ok(state)
    }
}

#[async_trait]
impl<C> ManagedResource for TopicSubscription<C>
where
    C: SubscriptionClient,
{
    type Config = SubscriptionConfig;
    type State = SubscriptionState;

    fn kind(&self) -> &'static str {
        SUBSCRIPTION_RESOURCE
    }

    async fn create(
        &self,
        config: &SubscriptionConfig,
        cancel: &dyn CancellationToken,
    ) -> Result<SubscriptionState> {
        config.check()?;

        let request = SubscribeRequest {
            topic_arn: config.topic_arn.clone(),
            protocol: config.protocol,
            endpoint: config.endpoint.clone(),
            attributes: encode(config),
        };
        debug!(topic_arn = %config.topic_arn, protocol = %config.protocol, "creating SNS topic subscription");

        let arn = self
            .client
            .subscribe(request)
            .await
            .map_err(|err| Error::service(Action::Creating, SUBSCRIPTION_RESOURCE, &config.topic_arn, err))?
            .ok_or_else(|| Error::EmptyResult {
                action: Action::Creating,
                resource: SUBSCRIPTION_RESOURCE,
                id: config.topic_arn.clone(),
            })?;
        info!(arn = %arn, "created SNS topic subscription");

        match confirmation_plan(
            config.protocol,
            config.endpoint_auto_confirms,
            config.confirmation_timeout_in_minutes,
            &self.waiter,
        ) {
            ConfirmationPlan::Skip => {
                debug!(arn = %arn, "not waiting for SNS topic subscription confirmation");
            }
            ConfirmationPlan::Wait(timeout) => {
                ConfirmationWaiter::new(&self.client, self.waiter)
                    .wait(&arn, timeout, cancel)
                    .await?;
            }
        }

        self.refresh(&arn, Some(config)).await
    }

    async fn read(&self, id: &str) -> Result<Option<SubscriptionState>> {
        match self.refresh(id, None).await {
            Ok(state) => Ok(Some(state)),
            Err(err) if err.is_not_found() => {
                warn!(arn = id, "SNS topic subscription not found, removing from state");
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    async fn update(
        &self,
        id: &str,
        prior: &SubscriptionConfig,
        config: &SubscriptionConfig,
    ) -> Result<SubscriptionState> {
        if prior.requires_replacement(config) {
            return Err(Error::Validation(
                "topic_arn, protocol and endpoint cannot be changed in place".to_string(),
            ));
        }
        config.check()?;

        for name in changed_attributes(prior, config) {
            let value = configured_value(config, name).unwrap_or_default();
            self.set_attribute(id, config.protocol, name, &value).await?;
        }

        self.refresh(id, Some(config)).await
    }

    async fn delete(&self, id: &str) -> Result<()> {
        debug!(arn = id, "deleting SNS topic subscription");
        match self.client.unsubscribe(id).await {
            Ok(()) => Ok(()),
            Err(ServiceError::PendingConfirmation(message)) => {
                warn!(
                    arn = id,
                    %message,
                    "removing unconfirmed SNS topic subscription from state, it still exists remotely"
                );
                Ok(())
            }
            Err(err) => Err(Error::service(Action::Deleting, SUBSCRIPTION_RESOURCE, id, err)),
        }
    }
}
