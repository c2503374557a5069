//! SES custom verification email templates

pub mod client;
pub mod template;

pub use client::{SesClient, TemplateUpdate, VerificationTemplateClient};
pub use template::{
    find_template, CustomVerificationEmailTemplate, CustomVerificationEmailTemplateLookup,
    VerificationTemplate,
};

/// Resource kind used in errors and logs
pub const TEMPLATE_RESOURCE: &str = "SES Custom Verification Email Template";

/// Data source kind used in errors and logs
pub const TEMPLATE_DATA_SOURCE: &str = "SES Custom Verification Email Template Data Source";
