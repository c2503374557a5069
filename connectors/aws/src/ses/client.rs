//! Remote custom verification email template API

use async_trait::async_trait;
use aws_config::SdkConfig;
use core_types::ServiceError;

use crate::error::service_error;

use super::template::VerificationTemplate;

/// Fields to change on an existing template; `None` leaves a field alone
#[derive(Clone, Default, PartialEq, Eq, Debug)]
pub struct TemplateUpdate {
    /// Template to change
    pub template_name: String,
    /// New sender address
    pub from_email_address: Option<String>,
    /// New subject line
    pub template_subject: Option<String>,
    /// New HTML body
    pub template_content: Option<String>,
    /// New redirect after a successful verification
    pub success_redirection_url: Option<String>,
    /// New redirect after a failed verification
    pub failure_redirection_url: Option<String>,
}

impl TemplateUpdate {
    /// Update carrying every non-empty field of `template`
    pub fn from_template(template: &VerificationTemplate) -> Self {
        let non_empty = |value: &String| (!value.is_empty()).then(|| value.clone());
        Self {
            template_name: template.template_name.clone(),
            from_email_address: non_empty(&template.from_email_address),
            template_subject: non_empty(&template.template_subject),
            template_content: non_empty(&template.template_content),
            success_redirection_url: non_empty(&template.success_redirection_url),
            failure_redirection_url: non_empty(&template.failure_redirection_url),
        }
    }
}

/// Template operations of the remote service
#[async_trait]
pub trait VerificationTemplateClient: Send + Sync {
    /// Create a template from every field of `template`
    async fn create_template(&self, template: &VerificationTemplate) -> Result<(), ServiceError>;

    /// `Ok(None)` when the service answered without a template
    async fn get_template(&self, name: &str) -> Result<Option<VerificationTemplate>, ServiceError>;

    /// Change the fields set in `update`
    async fn update_template(&self, update: &TemplateUpdate) -> Result<(), ServiceError>;

    /// Delete a template by name
    async fn delete_template(&self, name: &str) -> Result<(), ServiceError>;
}

/// [`VerificationTemplateClient`] backed by the AWS SDK
#[derive(Clone, Debug)]
pub struct SesClient {
    inner: aws_sdk_sesv2::Client,
}

impl SesClient {
    /// Build a client from a loaded SDK configuration
    pub fn new(config: &SdkConfig) -> Self {
        Self {
            inner: aws_sdk_sesv2::Client::new(config),
        }
    }

    /// Wrap an existing SDK client
    pub fn from_client(inner: aws_sdk_sesv2::Client) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl VerificationTemplateClient for SesClient {
    async fn create_template(&self, template: &VerificationTemplate) -> Result<(), ServiceError> {
        self.inner
            .create_custom_verification_email_template()
            .template_name(&template.template_name)
            .from_email_address(&template.from_email_address)
            .template_subject(&template.template_subject)
            .template_content(&template.template_content)
            .success_redirection_url(&template.success_redirection_url)
            .failure_redirection_url(&template.failure_redirection_url)
            .send()
            .await
            .map_err(service_error)?;
        Ok(())
    }

    async fn get_template(&self, name: &str) -> Result<Option<VerificationTemplate>, ServiceError> {
        let output = self
            .inner
            .get_custom_verification_email_template()
            .template_name(name)
            .send()
            .await
            .map_err(service_error)?;

        let Some(template_name) = output.template_name() else {
            return Ok(None);
        };
        let text = |value: Option<&str>| value.unwrap_or_default().to_string();
        Ok(Some(VerificationTemplate {
            template_name: template_name.to_string(),
            from_email_address: text(output.from_email_address()),
            template_subject: text(output.template_subject()),
            template_content: text(output.template_content()),
            success_redirection_url: text(output.success_redirection_url()),
            failure_redirection_url: text(output.failure_redirection_url()),
        }))
    }

    async fn update_template(&self, update: &TemplateUpdate) -> Result<(), ServiceError> {
        self.inner
            .update_custom_verification_email_template()
            .template_name(&update.template_name)
            .set_from_email_address(update.from_email_address.clone())
            .set_template_subject(update.template_subject.clone())
            .set_template_content(update.template_content.clone())
            .set_success_redirection_url(update.success_redirection_url.clone())
            .set_failure_redirection_url(update.failure_redirection_url.clone())
            .send()
            .await
            .map_err(service_error)?;
        Ok(())
    }

    async fn delete_template(&self, name: &str) -> Result<(), ServiceError> {
        self.inner
            .delete_custom_verification_email_template()
            .template_name(name)
            .send()
            .await
            .map_err(service_error)?;
        Ok(())
    }
}
