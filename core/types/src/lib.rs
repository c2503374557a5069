//! Core types shared by the AWS connectors
//!
//! Every connector reports failures through [`Error`]. Remote clients classify
//! SDK failures once, at the boundary, into a [`ServiceError`]; the resource
//! layer then attaches the action, resource kind and identifier with
//! [`Error::service`].
#![warn(missing_docs)]

use std::fmt;
use std::time::Duration;

use thiserror::Error;

/// Lifecycle step an error was raised in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Remote create call
    Creating,
    /// Remote read call
    Reading,
    /// Remote update call
    Updating,
    /// Remote delete call
    Deleting,
    /// Polling for an asynchronous state change
    Waiting,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verb = match self {
            Action::Creating => "creating",
            Action::Reading => "reading",
            Action::Updating => "updating",
            Action::Deleting => "deleting",
            Action::Waiting => "waiting for",
        };
        f.write_str(verb)
    }
}

/// Classification of a failed remote call, decided by the client adapter
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
    /// The remote object does not exist
    #[error("not found: {0}")]
    NotFound(String),

    /// The remote service refused to remove a subscription that is still
    /// waiting for its endpoint to confirm
    #[error("pending confirmation: {0}")]
    PendingConfirmation(String),

    /// The remote service rejected a request parameter
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Anything else (throttling, transport, unexpected service errors)
    #[error("{0}")]
    Other(String),
}

/// Coarse error classification for callers deciding what to do next
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Remote object is absent
    NotFound,
    /// Call succeeded but carried no usable payload
    EmptyResult,
    /// A polling deadline passed
    TimedOut,
    /// The caller cancelled the operation
    Cancelled,
    /// Local configuration is invalid; nothing was sent
    Validation,
    /// Any other remote failure
    Remote,
}

/// Core error type
#[derive(Debug, Error)]
pub enum Error {
    /// Remote object is absent
    #[error("{resource} ({id}) not found: {message}")]
    NotFound {
        /// Resource kind, e.g. "SNS Topic Subscription"
        resource: &'static str,
        /// Resource identifier
        id: String,
        /// Message returned by the service
        message: String,
    },

    /// Call succeeded but returned nothing usable
    #[error("{action} {resource} ({id}): empty result")]
    EmptyResult {
        /// Action that produced the empty response
        action: Action,
        /// Resource kind
        resource: &'static str,
        /// Resource identifier, may be empty when the call was a create
        id: String,
    },

    /// Polling gave up
    #[error("timeout after {timeout:?} {action} {resource} ({id}) (last state: '{last_state}')")]
    TimedOut {
        /// Action that was polling
        action: Action,
        /// Resource kind
        resource: &'static str,
        /// Resource identifier
        id: String,
        /// Last status observed before the deadline
        last_state: String,
        /// Budget that was exhausted
        timeout: Duration,
    },

    /// The caller signalled cancellation
    #[error("cancelled while {action} {resource} ({id})")]
    Cancelled {
        /// Action in progress
        action: Action,
        /// Resource kind
        resource: &'static str,
        /// Resource identifier
        id: String,
    },

    /// Invalid local configuration, raised before any remote call
    #[error("invalid configuration: {0}")]
    Validation(String),

    /// Remote call failed
    #[error("{action} {resource} ({id}): {source}")]
    Remote {
        /// Action that failed
        action: Action,
        /// Resource kind
        resource: &'static str,
        /// Resource identifier
        id: String,
        /// Classified service failure
        #[source]
        source: ServiceError,
    },
}

impl Error {
    /// Attach operation context to a classified service failure
    ///
    /// `NotFound` keeps its own variant so callers can drop state; every
    /// other classification becomes [`Error::Remote`].
    pub fn service(
        action: Action,
        resource: &'static str,
        id: impl Into<String>,
        source: ServiceError,
    ) -> Self {
        match source {
            ServiceError::NotFound(message) => Error::NotFound {
                resource,
                id: id.into(),
                message,
            },
            source => Error::Remote {
                action,
                resource,
                id: id.into(),
                source,
            },
        }
    }

    /// Get the classification of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::NotFound { .. } => ErrorKind::NotFound,
            Error::EmptyResult { .. } => ErrorKind::EmptyResult,
            Error::TimedOut { .. } => ErrorKind::TimedOut,
            Error::Cancelled { .. } => ErrorKind::Cancelled,
            Error::Validation(_) => ErrorKind::Validation,
            Error::Remote { .. } => ErrorKind::Remote,
        }
    }

    /// Returns true if the remote object is absent
    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }
}

/// Result alias
pub type Result<T> = std::result::Result<T, Error>;
