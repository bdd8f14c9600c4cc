//! Configuration error types.
//!
//! All configuration constructors return `Result<T, ConfigError>` so invalid
//! settings are rejected once, when the client is set up, rather than on the
//! first request.
//!
//! # Example
//!
//! ```rust
//! use cosmos_client::{AuthKey, ConfigError};
//!
//! let result = AuthKey::new("");
//! assert!(matches!(result, Err(ConfigError::EmptyAuthKey)));
//! ```

use thiserror::Error;

/// Errors that can occur while building a client configuration.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The account key or resource token was empty.
    #[error("Auth key cannot be empty. Please provide an account key or resource token.")]
    EmptyAuthKey,

    /// The master key is not valid base64.
    #[error("Auth key is not a valid base64 master key.")]
    InvalidAuthKey,

    /// The account endpoint is not an absolute http(s) URL.
    #[error("Invalid account endpoint '{endpoint}'. Expected an absolute URL such as 'https://myaccount.documents.azure.com:443/'.")]
    InvalidAccountEndpoint {
        /// The endpoint that was provided.
        endpoint: String,
    },

    /// The protocol version string is malformed.
    #[error("Invalid API version '{version}'. Expected format: 'YYYY-MM-DD' (e.g., '2018-12-31').")]
    InvalidApiVersion {
        /// The invalid version string that was provided.
        version: String,
    },

    /// A client option is out of range.
    #[error("Invalid option '{name}': {reason}")]
    InvalidOption {
        /// The option name.
        name: &'static str,
        /// Why the value was rejected.
        reason: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_endpoint_error_message() {
        let error = ConfigError::InvalidAccountEndpoint {
            endpoint: "not a url".to_string(),
        };
        let message = error.to_string();
        assert!(message.contains("not a url"));
        assert!(message.contains("absolute URL"));
    }

    #[test]
    fn test_invalid_option_names_the_option() {
        let error = ConfigError::InvalidOption {
            name: "max_retry_attempts_on_throttle",
            reason: "must not exceed 100".to_string(),
        };
        assert!(error.to_string().contains("max_retry_attempts_on_throttle"));
    }

    #[test]
    fn test_error_implements_std_error() {
        let error = ConfigError::EmptyAuthKey;
        let _: &dyn std::error::Error = &error;
    }
}
