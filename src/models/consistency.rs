//! Account consistency settings.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The consistency levels the service supports, strongest first.
///
/// Serializes as the variant name, not an ordinal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConsistencyLevel {
    /// Linearizable reads.
    Strong,
    /// Reads lag writes by at most a configured prefix count or interval.
    BoundedStaleness,
    /// Read-your-writes within a session token.
    Session,
    /// No ordering guarantee.
    Eventual,
    /// Reads never see out-of-order writes.
    ConsistentPrefix,
}

impl ConsistencyLevel {
    /// Returns the header value for `x-ms-consistency-level`.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Strong => "Strong",
            Self::BoundedStaleness => "BoundedStaleness",
            Self::Session => "Session",
            Self::Eventual => "Eventual",
            Self::ConsistentPrefix => "ConsistentPrefix",
        }
    }
}

impl fmt::Display for ConsistencyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The consistency policy of a database account.
///
/// Staleness bounds only carry meaning when the level is
/// [`ConsistencyLevel::BoundedStaleness`].
///
/// # Example
///
/// ```rust
/// use cosmos_client::models::{AccountConsistency, ConsistencyLevel};
///
/// let json = r#"{"DefaultConsistencyLevel":"BoundedStaleness","MaxStalenessPrefix":200,"MaxStalenessIntervalInSeconds":10}"#;
/// let consistency: AccountConsistency = serde_json::from_str(json).unwrap();
/// assert_eq!(consistency.default_consistency_level, ConsistencyLevel::BoundedStaleness);
/// assert_eq!(consistency.max_staleness_prefix, 200);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountConsistency {
    /// The account-wide default consistency level.
    #[serde(
        rename = "DefaultConsistencyLevel",
        alias = "defaultConsistencyLevel",
        default = "AccountConsistency::default_level"
    )]
    pub default_consistency_level: ConsistencyLevel,
    /// Maximum lag in versions for bounded staleness.
    #[serde(
        rename = "MaxStalenessPrefix",
        alias = "maxStalenessPrefix",
        default = "AccountConsistency::default_prefix"
    )]
    pub max_staleness_prefix: u32,
    /// Maximum lag in seconds for bounded staleness.
    #[serde(
        rename = "MaxStalenessIntervalInSeconds",
        alias = "maxIntervalInSeconds",
        default = "AccountConsistency::default_interval"
    )]
    pub max_staleness_interval_in_seconds: u32,
}

impl AccountConsistency {
    /// Default staleness prefix applied when the service omits it.
    pub const DEFAULT_MAX_STALENESS_PREFIX: u32 = 100;
    /// Default staleness interval applied when the service omits it.
    pub const DEFAULT_MAX_STALENESS_INTERVAL: u32 = 5;

    const fn default_level() -> ConsistencyLevel {
        ConsistencyLevel::Session
    }

    const fn default_prefix() -> u32 {
        Self::DEFAULT_MAX_STALENESS_PREFIX
    }

    const fn default_interval() -> u32 {
        Self::DEFAULT_MAX_STALENESS_INTERVAL
    }
}

impl Default for AccountConsistency {
    fn default() -> Self {
        Self {
            default_consistency_level: Self::default_level(),
            max_staleness_prefix: Self::default_prefix(),
            max_staleness_interval_in_seconds: Self::default_interval(),
        }
    }
}
