//! AWS connector: SNS topic subscriptions and SES custom verification email templates
#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod ses;
pub mod sns;

pub use config::ProviderConfig;
pub use connector_sdk::{
    CancellationToken, DataSource, Error, ErrorKind, ManagedResource, NeverCancel, Result,
};

use ses::{CustomVerificationEmailTemplate, CustomVerificationEmailTemplateLookup, SesClient};
use sns::{SnsClient, TopicSubscription};

/// Every resource and data source of the connector, bound to live clients
pub struct AwsProvider {
    /// `aws_sns_topic_subscription`
    pub topic_subscriptions: TopicSubscription<SnsClient>,
    /// `aws_ses_custom_verification_email_template`
    pub verification_templates: CustomVerificationEmailTemplate<SesClient>,
    /// Data source for existing verification templates
    pub verification_template_lookup: CustomVerificationEmailTemplateLookup<SesClient>,
}

impl AwsProvider {
    /// Load SDK configuration and build the service clients
    pub async fn connect(config: &ProviderConfig) -> Self {
        let sdk_config = config.load_sdk_config().await;
        let ses = SesClient::new(&sdk_config);
        Self {
            topic_subscriptions: TopicSubscription::new(SnsClient::new(&sdk_config), config.waiter()),
            verification_templates: CustomVerificationEmailTemplate::new(ses.clone()),
            verification_template_lookup: CustomVerificationEmailTemplateLookup::new(ses),
        }
    }
}
