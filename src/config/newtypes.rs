//! Validated newtype wrappers for configuration values.
//!
//! These types validate their contents on construction so the rest of the
//! crate can assume a well-formed endpoint and a non-empty key.

use crate::error::ConfigError;
use std::fmt;

/// A validated account endpoint URL.
///
/// The endpoint must carry an `http` or `https` scheme and a host. A
/// trailing slash is normalized away so resource paths can be joined with a
/// single `/`.
///
/// # Example
///
/// ```rust
/// use cosmos_client::AccountEndpoint;
///
/// let endpoint = AccountEndpoint::new("https://myaccount.documents.azure.com:443/").unwrap();
/// assert_eq!(endpoint.as_ref(), "https://myaccount.documents.azure.com:443");
/// assert_eq!(endpoint.host_name(), "myaccount.documents.azure.com");
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AccountEndpoint {
    url: String,
    host_start: usize,
    host_end: usize,
}

impl AccountEndpoint {
    /// Creates a new validated account endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidAccountEndpoint`] if the URL has no
    /// http(s) scheme or no host.
    pub fn new(url: impl Into<String>) -> Result<Self, ConfigError> {
        let url = url.into();
        let url = url.trim().trim_end_matches('/').to_string();
        let invalid = || ConfigError::InvalidAccountEndpoint {
            endpoint: url.clone(),
        };

        let scheme_end = url.find("://").ok_or_else(invalid)?;
        let scheme = url[..scheme_end].to_ascii_lowercase();
        if scheme != "http" && scheme != "https" {
            return Err(invalid());
        }

        let host_start = scheme_end + 3;
        let remainder = &url[host_start..];
        let host_end = remainder
            .find([':', '/', '?', '#'])
            .map_or(url.len(), |i| host_start + i);
        if host_end == host_start {
            return Err(invalid());
        }

        Ok(Self {
            url,
            host_start,
            host_end,
        })
    }

    /// Returns the host name portion of the endpoint.
    #[must_use]
    pub fn host_name(&self) -> &str {
        &self.url[self.host_start..self.host_end]
    }

    /// Joins a resource path onto the endpoint.
    #[must_use]
    pub fn join(&self, path: &str) -> String {
        let path = path.trim_start_matches('/');
        if path.is_empty() {
            format!("{}/", self.url)
        } else {
            format!("{}/{path}", self.url)
        }
    }
}

impl AsRef<str> for AccountEndpoint {
    fn as_ref(&self) -> &str {
        &self.url
    }
}

impl fmt::Display for AccountEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.url)
    }
}

/// An account master key or resource token.
///
/// The `Debug` implementation masks the value so keys never end up in logs.
///
/// # Example
///
/// ```rust
/// use cosmos_client::AuthKey;
///
/// let key = AuthKey::new("c2VjcmV0").unwrap();
/// assert_eq!(format!("{:?}", key), "AuthKey(*****)");
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct AuthKey(String);

impl AuthKey {
    /// Creates a new auth key.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::EmptyAuthKey`] if the key is empty.
    pub fn new(key: impl Into<String>) -> Result<Self, ConfigError> {
        let key = key.into();
        if key.trim().is_empty() {
            return Err(ConfigError::EmptyAuthKey);
        }
        Ok(Self(key))
    }

    /// Returns `true` if this looks like a resource token rather than a
    /// base64 master key.
    #[must_use]
    pub fn is_resource_token(&self) -> bool {
        self.0.starts_with("type=resource")
    }
}

impl AsRef<str> for AuthKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AuthKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AuthKey(*****)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_trims_trailing_slash() {
        let endpoint = AccountEndpoint::new("https://acct.documents.azure.com/").unwrap();
        assert_eq!(endpoint.as_ref(), "https://acct.documents.azure.com");
    }

    #[test]
    fn test_endpoint_extracts_host_before_port() {
        let endpoint = AccountEndpoint::new("https://localhost:8081").unwrap();
        assert_eq!(endpoint.host_name(), "localhost");
    }

    #[test]
    fn test_endpoint_rejects_missing_scheme_and_host() {
        assert!(AccountEndpoint::new("acct.documents.azure.com").is_err());
        assert!(AccountEndpoint::new("ftp://acct.documents.azure.com").is_err());
        assert!(AccountEndpoint::new("https://").is_err());
        assert!(AccountEndpoint::new("").is_err());
    }

    #[test]
    fn test_endpoint_join() {
        let endpoint = AccountEndpoint::new("https://acct.documents.azure.com:443/").unwrap();
        assert_eq!(
            endpoint.join("dbs/db1/colls"),
            "https://acct.documents.azure.com:443/dbs/db1/colls"
        );
        assert_eq!(endpoint.join(""), "https://acct.documents.azure.com:443/");
    }

    #[test]
    fn test_auth_key_masks_debug() {
        let key = AuthKey::new("super-secret").unwrap();
        assert_eq!(format!("{key:?}"), "AuthKey(*****)");
        assert!(!format!("{key:?}").contains("super-secret"));
    }

    #[test]
    fn test_auth_key_rejects_blank() {
        assert_eq!(AuthKey::new("   "), Err(ConfigError::EmptyAuthKey));
    }

    #[test]
    fn test_resource_token_detection() {
        let token = AuthKey::new("type=resource&ver=1.0&sig=abc").unwrap();
        assert!(token.is_resource_token());
        assert!(!AuthKey::new("bWFzdGVy").unwrap().is_resource_token());
    }
}
