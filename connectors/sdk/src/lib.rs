//! Connector SDK for building AWS resource adapters
//!
//! The host framework owns the lifecycle: it decides when to create, read,
//! update or delete a resource and persists whatever state comes back. A
//! connector only implements [`ManagedResource`] (and [`DataSource`] for
//! read-only lookups).
#![warn(missing_docs)]

pub mod cancel;

pub use cancel::{shutdown_channel, CancellationToken, NeverCancel, ShutdownHandle, ShutdownToken};
pub use core_types::{Action, Error, ErrorKind, Result, ServiceError};

/// Lifecycle operations for a declaratively managed remote object
#[async_trait::async_trait]
pub trait ManagedResource: Send + Sync {
    /// Desired configuration supplied by the host
    type Config: Send + Sync;

    /// Persisted state returned to the host
    type State: Send;

    /// Resource kind used in errors and logs
    fn kind(&self) -> &'static str;

    /// Create the remote object and return its refreshed state
    ///
    /// `cancel` is observed by any asynchronous waiting the create performs.
    async fn create(
        &self,
        config: &Self::Config,
        cancel: &dyn CancellationToken,
    ) -> Result<Self::State>;

    /// Refresh state for `id`
    ///
    /// Returns `Ok(None)` when the object was deleted outside of the host;
    /// the host is expected to drop its record.
    async fn read(&self, id: &str) -> Result<Option<Self::State>>;

    /// Apply the differences between `prior` and `config` to `id`
    async fn update(
        &self,
        id: &str,
        prior: &Self::Config,
        config: &Self::Config,
    ) -> Result<Self::State>;

    /// Remove the remote object
    async fn delete(&self, id: &str) -> Result<()>;
}

/// Read-only lookup of an existing remote object
#[async_trait::async_trait]
pub trait DataSource: Send + Sync {
    /// Lookup key
    type Query: Send + Sync + ?Sized;

    /// Looked-up state
    type State: Send;

    /// Fetch the object; an absent object is an error
    async fn lookup(&self, query: &Self::Query) -> Result<Self::State>;
}
