//! Service protocol version definitions.

use crate::error::ConfigError;
use std::fmt;
use std::str::FromStr;

/// The protocol version sent in the `x-ms-version` header.
///
/// # Example
///
/// ```rust
/// use cosmos_client::ApiVersion;
///
/// let version: ApiVersion = "2018-12-31".parse().unwrap();
/// assert_eq!(version, ApiVersion::latest());
/// assert_eq!(version.to_string(), "2018-12-31");
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ApiVersion {
    /// Version 2018-06-18.
    V2018_06_18,
    /// Version 2018-09-17.
    V2018_09_17,
    /// Version 2018-12-31, the version this client is written against.
    V2018_12_31,
    /// Any other well-formed `YYYY-MM-DD` version string.
    Custom(String),
}

impl ApiVersion {
    /// Returns the version the client speaks by default.
    #[must_use]
    pub const fn latest() -> Self {
        Self::V2018_12_31
    }

    fn is_well_formed(s: &str) -> bool {
        let parts: Vec<&str> = s.split('-').collect();
        parts.len() == 3
            && parts[0].len() == 4
            && parts[1].len() == 2
            && parts[2].len() == 2
            && parts.iter().all(|p| p.chars().all(|c| c.is_ascii_digit()))
    }
}

impl Default for ApiVersion {
    fn default() -> Self {
        Self::latest()
    }
}

impl fmt::Display for ApiVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::V2018_06_18 => f.write_str("2018-06-18"),
            Self::V2018_09_17 => f.write_str("2018-09-17"),
            Self::V2018_12_31 => f.write_str("2018-12-31"),
            Self::Custom(version) => f.write_str(version),
        }
    }
}

impl FromStr for ApiVersion {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "2018-06-18" => Ok(Self::V2018_06_18),
            "2018-09-17" => Ok(Self::V2018_09_17),
            "2018-12-31" => Ok(Self::V2018_12_31),
            other if Self::is_well_formed(other) => Ok(Self::Custom(other.to_string())),
            other => Err(ConfigError::InvalidApiVersion {
                version: other.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_versions_round_trip_through_display() {
        for version in [
            ApiVersion::V2018_06_18,
            ApiVersion::V2018_09_17,
            ApiVersion::V2018_12_31,
        ] {
            let parsed: ApiVersion = version.to_string().parse().unwrap();
            assert_eq!(parsed, version);
        }
    }

    #[test]
    fn test_custom_version_accepted_when_well_formed() {
        let version: ApiVersion = "2020-07-15".parse().unwrap();
        assert_eq!(version, ApiVersion::Custom("2020-07-15".to_string()));
    }

    #[test]
    fn test_malformed_version_rejected() {
        assert!(matches!(
            "2020-7-15".parse::<ApiVersion>(),
            Err(ConfigError::InvalidApiVersion { .. })
        ));
        assert!("latest".parse::<ApiVersion>().is_err());
    }
}
