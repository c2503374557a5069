//! SES custom verification email template resource and data source

use async_trait::async_trait;
use connector_sdk::{CancellationToken, DataSource, ManagedResource};
use core_types::{Action, Error, Result, ServiceError};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use validator::{Validate, ValidateEmail, ValidateUrl, ValidationError};

use super::client::{TemplateUpdate, VerificationTemplateClient};
use super::{TEMPLATE_DATA_SOURCE, TEMPLATE_RESOURCE};

fn validate_optional_email(value: &str) -> std::result::Result<(), ValidationError> {
    if value.is_empty() || ValidateEmail::validate_email(&value) {
        return Ok(());
    }
    let mut error = ValidationError::new("invalid_email");
    error.add_param("value".into(), &value);
    Err(error)
}

fn validate_optional_url(value: &str) -> std::result::Result<(), ValidationError> {
    if value.is_empty() || ValidateUrl::validate_url(&value) {
        return Ok(());
    }
    let mut error = ValidationError::new("invalid_url");
    error.add_param("value".into(), &value);
    Err(error)
}

/// A custom verification email template
///
/// Used both as the desired configuration and as the persisted state; the
/// template name is the identifier and cannot change in place. Every other
/// field is optional and left empty when unset.
#[derive(Clone, Default, Serialize, Deserialize, Validate, PartialEq, Eq, Debug)]
pub struct VerificationTemplate {
    /// Unique template name, the resource identifier
    #[validate(length(min = 1))]
    pub template_name: String,

    /// Sender address of verification emails
    #[serde(default)]
    #[validate(custom(function = "validate_optional_email"))]
    pub from_email_address: String,

    /// Subject line of verification emails
    #[serde(default)]
    pub template_subject: String,

    /// HTML body of the verification email
    #[serde(default)]
    pub template_content: String,

    /// Where the recipient lands after verifying
    #[serde(default)]
    #[validate(custom(function = "validate_optional_url"))]
    pub success_redirection_url: String,

    /// Where the recipient lands when verification fails
    #[serde(default)]
    #[validate(custom(function = "validate_optional_url"))]
    pub failure_redirection_url: String,
}

impl VerificationTemplate {
    /// Template with only a name
    pub fn new(template_name: impl Into<String>) -> Self {
        Self {
            template_name: template_name.into(),
            ..Self::default()
        }
    }

    /// Set the sender address
    pub fn with_from_email_address(mut self, address: impl Into<String>) -> Self {
        self.from_email_address = address.into();
        self
    }

    /// Set the subject line
    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.template_subject = subject.into();
        self
    }

    /// Set the HTML body
    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.template_content = content.into();
        self
    }

    /// Set both redirection URLs
    pub fn with_redirection_urls(mut self, success: impl Into<String>, failure: impl Into<String>) -> Self {
        self.success_redirection_url = success.into();
        self.failure_redirection_url = failure.into();
        self
    }

    /// Resource identifier
    pub fn id(&self) -> &str {
        &self.template_name
    }

    /// Run field validation, reporting failures as [`Error::Validation`]
    pub fn check(&self) -> Result<()> {
        self.validate()
            .map_err(|errors| Error::Validation(errors.to_string()))
    }
}

/// Fetch a template by name
///
/// Absence is [`Error::NotFound`]; an answer without a template is
/// [`Error::EmptyResult`].
pub async fn find_template<C>(client: &C, resource: &'static str, name: &str) -> Result<VerificationTemplate>
where
    C: VerificationTemplateClient + ?Sized,
{
    client
        .get_template(name)
        .await
        .map_err(|err| Error::service(Action::Reading, resource, name, err))?
        .ok_or_else(|| Error::EmptyResult {
            action: Action::Reading,
            resource,
            id: name.to_string(),
        })
}

/// Custom verification email template lifecycle
pub struct CustomVerificationEmailTemplate<C> {
    client: C,
}

impl<C> CustomVerificationEmailTemplate<C>
where
    C: VerificationTemplateClient,
{
    /// Manage templates through `client`
    pub fn new(client: C) -> Self {
        Self { client }
    }

    /// Underlying template client
    pub fn client(&self) -> &C {
        &self.client
    }

    async fn refresh(&self, name: &str) -> Result<VerificationTemplate> {
        let mut template = find_template(&self.client, TEMPLATE_RESOURCE, name).await?;
        template.template_name = name.to_string();
        Ok(template)
    }
}

#[async_trait]
impl<C> ManagedResource for CustomVerificationEmailTemplate<C>
where
    C: VerificationTemplateClient,
{
    type Config = VerificationTemplate;
    type State = VerificationTemplate;

    fn kind(&self) -> &'static str {
        TEMPLATE_RESOURCE
    }

    async fn create(
        &self,
        config: &VerificationTemplate,
        _cancel: &dyn CancellationToken,
    ) -> Result<VerificationTemplate> {
        config.check()?;

        self.client
            .create_template(config)
            .await
            .map_err(|err| Error::service(Action::Creating, TEMPLATE_RESOURCE, &config.template_name, err))?;
        info!(template_name = %config.template_name, "created SES custom verification email template");

        self.refresh(&config.template_name).await
    }

    async fn read(&self, id: &str) -> Result<Option<VerificationTemplate>> {
        match self.refresh(id).await {
            Ok(template) => Ok(Some(template)),
            Err(err) if err.is_not_found() => {
                warn!(template_name = id, "SES custom verification email template not found, removing from state");
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    async fn update(
        &self,
        id: &str,
        prior: &VerificationTemplate,
        config: &VerificationTemplate,
    ) -> Result<VerificationTemplate> {
        if prior.template_name != config.template_name {
            return Err(Error::Validation(
                "template_name cannot be changed in place".to_string(),
            ));
        }
        config.check()?;

        let mut update = TemplateUpdate::from_template(config);
        update.template_name = id.to_string();
        debug!(?update, "updating SES custom verification email template");

        self.client
            .update_template(&update)
            .await
            .map_err(|err| Error::service(Action::Updating, TEMPLATE_RESOURCE, id, err))?;

        self.refresh(id).await
    }

    async fn delete(&self, id: &str) -> Result<()> {
        info!(template_name = id, "deleting SES custom verification email template");
        match self.client.delete_template(id).await {
            Ok(()) | Err(ServiceError::NotFound(_)) => Ok(()),
            Err(err) => Err(Error::service(Action::Deleting, TEMPLATE_RESOURCE, id, err)),
        }
    }
}

/// Read-only lookup of an existing template by name
pub struct CustomVerificationEmailTemplateLookup<C> {
    client: C,
}

impl<C> CustomVerificationEmailTemplateLookup<C>
where
    C: VerificationTemplateClient,
{
    /// Look templates up through `client`
    pub fn new(client: C) -> Self {
        Self { client }
    }
}

#[async_trait]
impl<C> DataSource for CustomVerificationEmailTemplateLookup<C>
where
    C: VerificationTemplateClient,
{
    type Query = str;
    type State = VerificationTemplate;

    async fn lookup(&self, name: &str) -> Result<VerificationTemplate> {
        find_template(&self.client, TEMPLATE_DATA_SOURCE, name).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use connector_sdk::{ErrorKind, NeverCancel};
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Keeps templates in a map, like the service would
    #[derive(Default)]
    struct FakeTemplateClient {
        templates: Mutex<HashMap<String, VerificationTemplate>>,
        updates: Mutex<Vec<TemplateUpdate>>,
        fail_with: Option<ServiceError>,
    }

    impl FakeTemplateClient {
        fn failing(err: ServiceError) -> Self {
            Self {
                fail_with: Some(err),
                ..Self::default()
            }
        }

        fn check(&self) -> std::result::Result<(), ServiceError> {
            match &self.fail_with {
                Some(err) => Err(err.clone()),
                None => Ok(()),
            }
        }

        fn not_found(name: &str) -> ServiceError {
            ServiceError::NotFound(format!("Template {name} does not exist"))
        }
    }

    #[async_trait]
    impl VerificationTemplateClient for FakeTemplateClient {
        async fn create_template(&self, template: &VerificationTemplate) -> std::result::Result<(), ServiceError> {
            self.check()?;
            self.templates
                .lock()
                .unwrap()
                .insert(template.template_name.clone(), template.clone());
            Ok(())
        }

        async fn get_template(&self, name: &str) -> std::result::Result<Option<VerificationTemplate>, ServiceError> {
            self.check()?;
            self.templates
                .lock()
                .unwrap()
                .get(name)
                .cloned()
                .map(Some)
                .ok_or_else(|| Self::not_found(name))
        }

        async fn update_template(&self, update: &TemplateUpdate) -> std::result::Result<(), ServiceError> {
            self.check()?;
            self.updates.lock().unwrap().push(update.clone());
            let mut templates = self.templates.lock().unwrap();
            let template = templates
                .get_mut(&update.template_name)
                .ok_or_else(|| Self::not_found(&update.template_name))?;
            if let Some(subject) = &update.template_subject {
                template.template_subject = subject.clone();
            }
            if let Some(content) = &update.template_content {
                template.template_content = content.clone();
            }
            Ok(())
        }

        async fn delete_template(&self, name: &str) -> std::result::Result<(), ServiceError> {
            self.check()?;
            self.templates
                .lock()
                .unwrap()
                .remove(name)
                .map(|_| ())
                .ok_or_else(|| Self::not_found(name))
        }
    }

    fn welcome() -> VerificationTemplate {
        VerificationTemplate::new("welcome")
            .with_from_email_address("no-reply@example.com")
            .with_subject("Please confirm your address")
            .with_content("<html><body>Click the link below.</body></html>")
            .with_redirection_urls("https://example.com/verified", "https://example.com/failed")
    }

    #[tokio::test]
    async fn create_then_read() {
        let templates = CustomVerificationEmailTemplate::new(FakeTemplateClient::default());

        let state = templates.create(&welcome(), &NeverCancel).await.unwrap();
        assert_eq!(state, welcome());
        assert_eq!(state.id(), "welcome");
        assert_eq!(templates.read("welcome").await.unwrap(), Some(welcome()));
    }

    #[tokio::test]
    async fn create_rejects_invalid_fields() {
        let templates = CustomVerificationEmailTemplate::new(FakeTemplateClient::default());

        let bad_email = welcome().with_from_email_address("not-an-email");
        let err = templates.create(&bad_email, &NeverCancel).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);

        let bad_url = welcome().with_redirection_urls("not a url", "https://example.com/failed");
        assert!(templates.create(&bad_url, &NeverCancel).await.is_err());

        assert!(VerificationTemplate::new("").check().is_err());
        assert!(VerificationTemplate::new("bare").check().is_ok());
    }

    #[tokio::test]
    async fn read_of_missing_template_drops_state() {
        let templates = CustomVerificationEmailTemplate::new(FakeTemplateClient::default());
        assert_eq!(templates.read("welcome").await.unwrap(), None);
    }

    #[tokio::test]
    async fn update_sends_only_non_empty_fields() {
        let templates = CustomVerificationEmailTemplate::new(FakeTemplateClient::default());
        templates.create(&welcome(), &NeverCancel).await.unwrap();

        let config = VerificationTemplate::new("welcome").with_subject("Confirm your email");
        let state = templates.update("welcome", &welcome(), &config).await.unwrap();
        assert_eq!(state.template_subject, "Confirm your email");
        assert_eq!(state.template_content, welcome().template_content);

        let updates = templates.client().updates.lock().unwrap().clone();
        assert_eq!(
            updates,
            vec![TemplateUpdate {
                template_name: "welcome".to_string(),
                template_subject: Some("Confirm your email".to_string()),
                ..TemplateUpdate::default()
            }]
        );
    }

    #[tokio::test]
    async fn update_refuses_rename() {
        let templates = CustomVerificationEmailTemplate::new(FakeTemplateClient::default());
        let err = templates
            .update("welcome", &welcome(), &VerificationTemplate::new("other"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[tokio::test]
    async fn delete_tolerates_missing_template() {
        let templates = CustomVerificationEmailTemplate::new(FakeTemplateClient::default());
        templates.delete("welcome").await.unwrap();
    }

    #[tokio::test]
    async fn delete_surfaces_other_errors() {
        let templates = CustomVerificationEmailTemplate::new(FakeTemplateClient::failing(ServiceError::Other(
            "TooManyRequestsException: slow down".to_string(),
        )));
        let err = templates.delete("welcome").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Remote);
        assert_eq!(
            err.to_string(),
            "deleting SES Custom Verification Email Template (welcome): TooManyRequestsException: slow down"
        );
    }

    #[tokio::test]
    async fn lookup_requires_existing_template() {
        let client = FakeTemplateClient::default();
        client.create_template(&welcome()).await.unwrap();
        let lookup = CustomVerificationEmailTemplateLookup::new(client);

        assert_eq!(lookup.lookup("welcome").await.unwrap(), welcome());

        let err = lookup.lookup("missing").await.unwrap_err();
        assert!(err.is_not_found());
        assert!(err.to_string().starts_with(TEMPLATE_DATA_SOURCE));
    }
}
