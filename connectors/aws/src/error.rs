//! Classification of AWS service failures
//!
//! Each client adapter reduces an SDK failure with [`service_error`], which
//! extracts the error code and message and hands them to [`classify`];
//! nothing past the adapter inspects error payloads again.

use aws_sdk_sns::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use core_types::ServiceError;

/// Message SNS returns when unsubscribing a subscription that was never confirmed
pub const PENDING_CONFIRMATION_MESSAGE: &str =
    "Cannot unsubscribe a subscription that is pending confirmation";

const NOT_FOUND_CODES: &[&str] = &[
    "NotFound",
    "NotFoundException",
    "ResourceNotFound",
    "ResourceNotFoundException",
];

const INVALID_PARAMETER_CODES: &[&str] = &[
    "InvalidParameter",
    "InvalidParameterException",
    "BadRequestException",
];

/// Map an AWS error code and message to a [`ServiceError`]
pub fn classify(code: Option<&str>, message: String) -> ServiceError {
    match code {
        Some(code) if NOT_FOUND_CODES.contains(&code) => ServiceError::NotFound(message),
        Some(code) if INVALID_PARAMETER_CODES.contains(&code) => {
            if message.contains(PENDING_CONFIRMATION_MESSAGE) {
                ServiceError::PendingConfirmation(message)
            } else {
                ServiceError::InvalidParameter(message)
            }
        }
        Some(code) => ServiceError::Other(format!("{code}: {message}")),
        None => ServiceError::Other(message),
    }
}

/// Reduce a failed SDK call to a [`ServiceError`]
///
/// `SdkError` is shared by every AWS service crate, so this serves the SNS
/// and SES v2 adapters alike.
pub(crate) fn service_error<E, R>(err: SdkError<E, R>) -> ServiceError
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
    R: std::fmt::Debug,
{
    let code = err.code().map(str::to_owned);
    let message = err
        .message()
        .map(str::to_owned)
        .unwrap_or_else(|| DisplayErrorContext(&err).to_string());
    classify(code.as_deref(), message)
}
