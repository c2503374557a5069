//! Provider settings and AWS SDK configuration loading

use std::time::Duration;

use aws_config::profile::{ProfileFileCredentialsProvider, ProfileFileRegionProvider};
use aws_config::{BehaviorVersion, ConfigLoader, Region, SdkConfig};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::sns::waiter::{WaiterConfig, DEFAULT_CONFIRMATION_TIMEOUT, DEFAULT_POLL_INTERVAL};

/// Settings shared by every resource of the provider
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq, Debug)]
#[serde(default)]
pub struct ProviderConfig {
    /// Shared credentials profile; the SDK default chain is used when unset
    pub profile_name: Option<String>,
    /// Overrides the region resolved from the profile
    pub region: Option<String>,
    /// Confirmation wait for protocols without a configurable timeout
    pub confirmation_timeout_secs: u64,
    /// Delay between two confirmation queries
    pub poll_interval_secs: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            profile_name: None,
            region: None,
            confirmation_timeout_secs: DEFAULT_CONFIRMATION_TIMEOUT.as_secs(),
            poll_interval_secs: DEFAULT_POLL_INTERVAL.as_secs(),
        }
    }
}

impl ProviderConfig {
    /// Defaults with profile and region taken from `AWS_PROFILE` and `AWS_REGION`
    pub fn from_env() -> Self {
        let var = |name: &str| std::env::var(name).ok().filter(|value| !value.is_empty());
        Self {
            profile_name: var("AWS_PROFILE"),
            region: var("AWS_REGION"),
            ..Self::default()
        }
    }

    /// Confirmation poller timing derived from these settings
    pub fn waiter(&self) -> WaiterConfig {
        WaiterConfig {
            default_timeout: Duration::from_secs(self.confirmation_timeout_secs),
            poll_interval: Duration::from_secs(self.poll_interval_secs.max(1)),
        }
    }

    /// Resolve credentials and region into an SDK configuration
    pub async fn load_sdk_config(&self) -> SdkConfig {
        let mut loader = ConfigLoader::default().behavior_version(BehaviorVersion::v2024_03_28());

        if let Some(profile) = &self.profile_name {
            let credentials_provider = ProfileFileCredentialsProvider::builder()
                .profile_name(profile)
                .build();
            loader = loader
                .profile_name(profile)
                .credentials_provider(credentials_provider);

            if self.region.is_none() {
                let region_provider = ProfileFileRegionProvider::builder()
                    .profile_name(profile)
                    .build();
                loader = loader.region(region_provider);
            }
        }

        if let Some(region) = &self.region {
            loader = loader.region(Region::new(region.clone()));
        }

        debug!(profile = ?self.profile_name, region = ?self.region, "loading AWS SDK configuration");
        loader.load().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_waiter_defaults() {
        let config = ProviderConfig::default();
        assert_eq!(config.waiter(), WaiterConfig::default());
        assert_eq!(config.profile_name, None);
    }

    #[test]
    fn partial_settings_keep_defaults() {
        let config: ProviderConfig =
            serde_json::from_str(r#"{"profile_name": "notifications", "poll_interval_secs": 2}"#).unwrap();
        assert_eq!(config.profile_name.as_deref(), Some("notifications"));
        assert_eq!(config.region, None);
        assert_eq!(config.confirmation_timeout_secs, 120);
        assert_eq!(config.waiter().poll_interval, Duration::from_secs(2));
    }

    #[test]
    fn zero_poll_interval_is_raised() {
        let config = ProviderConfig {
            poll_interval_secs: 0,
            ..ProviderConfig::default()
        };
        assert_eq!(config.waiter().poll_interval, Duration::from_secs(1));
    }
}
