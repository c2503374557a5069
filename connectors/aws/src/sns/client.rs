//! Remote subscription API
//!
//! [`SubscriptionClient`] is the seam between the resource logic and SNS.
//! [`SnsClient`] implements it over `aws-sdk-sns`; tests substitute a scripted
//! fake.

use std::collections::HashMap;

use async_trait::async_trait;
use aws_config::SdkConfig;
use core_types::{Action, Error, Result, ServiceError};

use crate::error::service_error;

use super::attributes::{AttributeMap, AttributeName};
use super::model::Protocol;
use super::SUBSCRIPTION_RESOURCE;

/// Parameters of a `Subscribe` call
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct SubscribeRequest {
    /// Topic to subscribe to
    pub topic_arn: String,
    /// Delivery protocol
    pub protocol: Protocol,
    /// Protocol-specific endpoint (queue ARN, URL, address, ...)
    pub endpoint: String,
    /// Attributes set at creation, omitted from the call when empty
    pub attributes: AttributeMap,
}

/// Subscription operations of the remote service
#[async_trait]
pub trait SubscriptionClient: Send + Sync {
    /// Create a subscription, returning its ARN when the service reports one
    async fn subscribe(&self, request: SubscribeRequest) -> std::result::Result<Option<String>, ServiceError>;

    /// Fetch all attributes of a subscription, keyed by wire name
    async fn get_attributes(&self, arn: &str) -> std::result::Result<HashMap<String, String>, ServiceError>;

    /// Write one attribute; `None` clears it
    async fn set_attribute(
        &self,
        arn: &str,
        name: AttributeName,
        value: Option<String>,
    ) -> std::result::Result<(), ServiceError>;

    /// Delete a subscription
    async fn unsubscribe(&self, arn: &str) -> std::result::Result<(), ServiceError>;
}

/// Look up the attributes of `arn`
///
/// An empty response is reported as [`Error::EmptyResult`]. Attributes this
/// connector does not know are dropped afterwards.
pub async fn find_subscription_attributes<C>(client: &C, arn: &str) -> Result<AttributeMap>
where
    C: SubscriptionClient + ?Sized,
{
    let raw = client
        .get_attributes(arn)
        .await
        .map_err(|err| Error::service(Action::Reading, SUBSCRIPTION_RESOURCE, arn, err))?;

    if raw.is_empty() {
        return Err(Error::EmptyResult {
            action: Action::Reading,
            resource: SUBSCRIPTION_RESOURCE,
            id: arn.to_string(),
        });
    }

    Ok(AttributeMap::from_remote(raw))
}

/// [`SubscriptionClient`] backed by the AWS SDK
#[derive(Clone, Debug)]
pub struct SnsClient {
    inner: aws_sdk_sns::Client,
}

impl SnsClient {
    /// Build a client from a loaded SDK configuration
    pub fn new(config: &SdkConfig) -> Self {
        Self {
            inner: aws_sdk_sns::Client::new(config),
        }
    }

    /// Wrap an existing SDK client
    pub fn from_client(inner: aws_sdk_sns::Client) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl SubscriptionClient for SnsClient {
    async fn subscribe(&self, request: SubscribeRequest) -> std::result::Result<Option<String>, ServiceError> {
        let attributes = (!request.attributes.is_empty()).then(|| request.attributes.into_remote());

        // Unconfirmed subscriptions still get an ARN back
        let output = self
            .inner
            .subscribe()
            .topic_arn(request.topic_arn)
            .protocol(request.protocol.as_str())
            .endpoint(request.endpoint)
            .set_attributes(attributes)
            .return_subscription_arn(true)
            .send()
            .await
            .map_err(service_error)?;

        Ok(output
            .subscription_arn()
            .filter(|arn| !arn.is_empty())
            .map(str::to_owned))
    }

    async fn get_attributes(&self, arn: &str) -> std::result::Result<HashMap<String, String>, ServiceError> {
        let output = self
            .inner
            .get_subscription_attributes()
            .subscription_arn(arn)
            .send()
            .await
            .map_err(service_error)?;

        Ok(output.attributes().cloned().unwrap_or_default())
    }

    async fn set_attribute(
        &self,
        arn: &str,
        name: AttributeName,
        value: Option<String>,
    ) -> std::result::Result<(), ServiceError> {
        self.inner
            .set_subscription_attributes()
            .subscription_arn(arn)
            .attribute_name(name.as_str())
            .set_attribute_value(value)
            .send()
            .await
            .map_err(service_error)?;
        Ok(())
    }

    async fn unsubscribe(&self, arn: &str) -> std::result::Result<(), ServiceError> {
        self.inner
            .unsubscribe()
            .subscription_arn(arn)
            .send()
            .await
            .map_err(service_error)?;
        Ok(())
    }
}
