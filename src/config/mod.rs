//! Client configuration.
//!
//! The configuration is a plain immutable value, validated once by
//! [`ClientConfig::new`] and shared read-only by every request afterwards.
//!
//! - [`ClientOptions`]: tunable settings with public fields and defaults
//! - [`ClientConfig`]: the validated endpoint, key and derived header values
//! - [`AccountEndpoint`], [`AuthKey`]: validated newtypes
//! - [`ApiVersion`]: the protocol version sent on every request
//!
//! # Example
//!
//! ```rust
//! use cosmos_client::{ClientConfig, ClientOptions};
//!
//! let config = ClientConfig::new(
//!     "https://myaccount.documents.azure.com:443/",
//!     "c2VjcmV0LWtleQ==",
//!     ClientOptions {
//!         application_name: Some("inventory-service".to_string()),
//!         ..ClientOptions::default()
//!     },
//! )
//! .unwrap();
//!
//! assert!(config.user_agent().ends_with("inventory-service"));
//! ```

mod newtypes;
mod version;

use std::time::Duration;

pub use newtypes::{AccountEndpoint, AuthKey};
pub use version::ApiVersion;

use crate::error::ConfigError;
use crate::models::ConsistencyLevel;
use crate::pipeline::auth::decode_master_key;

/// Crate version from Cargo.toml.
pub const SDK_VERSION: &str = env!("CARGO_PKG_VERSION");

const MAX_RETRY_ATTEMPTS_LIMIT: u32 = 100;

/// Tunable client settings.
///
/// Construct with struct-update syntax over [`ClientOptions::default`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClientOptions {
    /// Suffix appended to the user agent.
    pub application_name: Option<String>,
    /// Consistency level requested on every operation, if weaker than the
    /// account default.
    pub consistency_level: Option<ConsistencyLevel>,
    /// How many times a throttled (429) request is retried.
    pub max_retry_attempts_on_throttle: u32,
    /// Upper bound on the cumulative time spent waiting between throttle retries.
    pub max_retry_wait: Duration,
    /// Timeout applied by the default transport to each network call.
    pub request_timeout: Duration,
    /// Protocol version header value.
    pub api_version: ApiVersion,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            application_name: None,
            consistency_level: None,
            max_retry_attempts_on_throttle: 9,
            max_retry_wait: Duration::from_secs(30),
            request_timeout: Duration::from_secs(60),
            api_version: ApiVersion::latest(),
        }
    }
}

/// Validated, immutable client configuration.
///
/// Derived values such as the user agent are computed once here and passed
/// down explicitly instead of living in module-level globals.
#[derive(Clone, Debug)]
pub struct ClientConfig {
    endpoint: AccountEndpoint,
    auth_key: AuthKey,
    options: ClientOptions,
    user_agent: String,
}

// Verify ClientConfig is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<ClientConfig>();
};

impl ClientConfig {
    /// Validates the endpoint, key and options.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the endpoint is malformed, the key is empty
    /// or not base64, or an option is out of range.
    pub fn new(
        endpoint: impl Into<String>,
        auth_key: impl Into<String>,
        options: ClientOptions,
    ) -> Result<Self, ConfigError> {
        let endpoint = AccountEndpoint::new(endpoint)?;
        let auth_key = AuthKey::new(auth_key)?;
        if !auth_key.is_resource_token() {
            decode_master_key(auth_key.as_ref())?;
        }

        if options.max_retry_attempts_on_throttle > MAX_RETRY_ATTEMPTS_LIMIT {
            return Err(ConfigError::InvalidOption {
                name: "max_retry_attempts_on_throttle",
                reason: format!("must not exceed {MAX_RETRY_ATTEMPTS_LIMIT}"),
            });
        }
        if options.request_timeout.is_zero() {
            return Err(ConfigError::InvalidOption {
                name: "request_timeout",
                reason: "must be greater than zero".to_string(),
            });
        }
        if let Some(name) = options.application_name.as_deref() {
            if name.chars().any(char::is_control) {
                return Err(ConfigError::InvalidOption {
                    name: "application_name",
                    reason: "must not contain control characters".to_string(),
                });
            }
        }

        let user_agent = Self::build_user_agent(options.application_name.as_deref());

        Ok(Self {
            endpoint,
            auth_key,
            options,
            user_agent,
        })
    }

    fn build_user_agent(application_name: Option<&str>) -> String {
        let base = format!(
            "cosmos-client-rust/{SDK_VERSION} {}/{}",
            std::env::consts::OS,
            std::env::consts::ARCH
        );
        match application_name {
            Some(name) if !name.is_empty() => format!("{base} {name}"),
            _ => base,
        }
    }

    /// Returns the account endpoint.
    #[must_use]
    pub const fn endpoint(&self) -> &AccountEndpoint {
        &self.endpoint
    }

    /// Returns the auth key.
    #[must_use]
    pub const fn auth_key(&self) -> &AuthKey {
        &self.auth_key
    }

    /// Returns the options the configuration was built from.
    #[must_use]
    pub const fn options(&self) -> &ClientOptions {
        &self.options
    }

    /// Returns the user agent sent on every request.
    #[must_use]
    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    /// Returns the protocol version.
    #[must_use]
    pub const fn api_version(&self) -> &ApiVersion {
        &self.options.api_version
    }
}
