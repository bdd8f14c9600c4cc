//! Administrative resource models.
//!
//! These are the metadata payloads decoded with the properties serializer.
//! Item payloads are caller-defined types and never live here.
//!
//! Every resource carries the service-maintained [`SystemProperties`]
//! (`_rid`, `_etag`, `_ts`, `_self`), which are skipped on serialization when
//! absent so that create requests only send what the caller set.

mod consistency;
mod indexing;

pub use consistency::{AccountConsistency, ConsistencyLevel};
pub use indexing::{
    CompositePath, CompositePathSortOrder, IndexPath, IndexingMode, IndexingPolicy,
    PartitionKeyDefinition, PartitionKind,
};

use serde::{Deserialize, Serialize};

/// Service-maintained fields common to every resource.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemProperties {
    /// Resource id assigned by the service.
    #[serde(rename = "_rid", default, skip_serializing_if = "Option::is_none")]
    pub resource_id: Option<String>,
    /// Entity tag used for optimistic concurrency.
    #[serde(rename = "_etag", default, skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,
    /// Last-modified timestamp in epoch seconds.
    #[serde(rename = "_ts", default, skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<i64>,
    /// Self link.
    #[serde(rename = "_self", default, skip_serializing_if = "Option::is_none")]
    pub self_link: Option<String>,
}

/// Properties of a database.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseProperties {
    /// Database id.
    pub id: String,
    /// Service-maintained fields.
    #[serde(flatten)]
    pub system: SystemProperties,
}

impl DatabaseProperties {
    /// Creates properties carrying only an id.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            system: SystemProperties::default(),
        }
    }
}

/// Properties of a container.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerProperties {
    /// Container id.
    pub id: String,
    /// Partition key definition.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partition_key: Option<PartitionKeyDefinition>,
    /// Indexing policy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub indexing_policy: Option<IndexingPolicy>,
    /// Default time-to-live in seconds; `-1` means items never expire.
    #[serde(
        rename = "defaultTtl",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub default_time_to_live: Option<i32>,
    /// Service-maintained fields.
    #[serde(flatten)]
    pub system: SystemProperties,
}

impl ContainerProperties {
    /// Creates properties for a container partitioned on `partition_key_path`.
    #[must_use]
    pub fn new(id: impl Into<String>, partition_key_path: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            partition_key: Some(PartitionKeyDefinition::new(partition_key_path)),
            ..Self::default()
        }
    }
}

/// Properties of a user.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProperties {
    /// User id.
    pub id: String,
    /// Link to the user's permission feed.
    #[serde(rename = "_permissions", default, skip_serializing_if = "Option::is_none")]
    pub permissions_link: Option<String>,
    /// Service-maintained fields.
    #[serde(flatten)]
    pub system: SystemProperties,
}

/// Access granted by a permission.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PermissionMode {
    /// Read-only access.
    #[default]
    Read,
    /// Full access.
    All,
}

/// Properties of a permission.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PermissionProperties {
    /// Permission id.
    pub id: String,
    /// Access mode.
    pub permission_mode: PermissionMode,
    /// Link of the resource the permission applies to.
    pub resource: String,
    /// Resource token issued by the service.
    #[serde(rename = "_token", default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    /// Service-maintained fields.
    #[serde(flatten)]
    pub system: SystemProperties,
}

/// Provisioned throughput content of an offer.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OfferContent {
    /// Request units per second.
    pub offer_throughput: i32,
}

/// Throughput (offer) settings of a database or container.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThroughputProperties {
    /// Offer id.
    #[serde(default)]
    pub id: String,
    /// Offer schema version.
    #[serde(default)]
    pub offer_version: String,
    /// `_rid` of the database or container this offer applies to.
    #[serde(default)]
    pub offer_resource_id: String,
    /// Self link of the database or container this offer applies to.
    #[serde(default)]
    pub resource: String,
    /// Throughput content.
    #[serde(default)]
    pub content: OfferContent,
    /// Service-maintained fields.
    #[serde(flatten)]
    pub system: SystemProperties,
}

impl ThroughputProperties {
    /// Returns the provisioned request units per second.
    #[must_use]
    pub const fn throughput(&self) -> i32 {
        self.content.offer_throughput
    }
}

/// Properties of a stored procedure.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredProcedureProperties {
    /// Stored procedure id.
    pub id: String,
    /// JavaScript body.
    pub body: String,
    /// Service-maintained fields.
    #[serde(flatten)]
    pub system: SystemProperties,
}

/// When a trigger runs relative to its operation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TriggerType {
    /// Runs before the operation.
    #[default]
    Pre,
    /// Runs after the operation.
    Post,
}

/// Operation a trigger is bound to.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TriggerOperation {
    /// Every operation.
    #[default]
    All,
    /// Creates.
    Create,
    /// Replaces.
    Replace,
    /// Deletes.
    Delete,
    /// Upserts.
    Upsert,
}

/// Properties of a trigger.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TriggerProperties {
    /// Trigger id.
    pub id: String,
    /// JavaScript body.
    pub body: String,
    /// Pre or post trigger.
    pub trigger_type: TriggerType,
    /// Bound operation.
    pub trigger_operation: TriggerOperation,
    /// Service-maintained fields.
    #[serde(flatten)]
    pub system: SystemProperties,
}

/// Properties of a user-defined function.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserDefinedFunctionProperties {
    /// Function id.
    pub id: String,
    /// JavaScript body.
    pub body: String,
    /// Service-maintained fields.
    #[serde(flatten)]
    pub system: SystemProperties,
}

/// A regional endpoint of the account.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountRegion {
    /// Region name.
    pub name: String,
    /// Endpoint serving this region.
    pub database_account_endpoint: String,
}

/// Database account metadata returned from the account root.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountProperties {
    /// Account id.
    #[serde(default)]
    pub id: String,
    /// Regions accepting writes.
    #[serde(default)]
    pub writable_locations: Vec<AccountRegion>,
    /// Regions serving reads.
    #[serde(default)]
    pub readable_locations: Vec<AccountRegion>,
    /// Account consistency policy.
    #[serde(default)]
    pub user_consistency_policy: AccountConsistency,
}
