//! Container partitioning and indexing descriptors.

use serde::{Deserialize, Serialize};

/// Sort order of one path in a composite index.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompositePathSortOrder {
    /// Ascending order.
    #[default]
    #[serde(alias = "ascending")]
    Ascending,
    /// Descending order.
    #[serde(alias = "descending")]
    Descending,
}

/// One path of a composite index.
///
/// A query such as `SELECT * FROM c ORDER BY c.age, c.height` needs a
/// composite index over `/age` and `/height`. Wild cards are not allowed.
///
/// # Example
///
/// ```rust
/// use cosmos_client::models::{CompositePath, CompositePathSortOrder};
///
/// let path = CompositePath {
///     path: "/age".to_string(),
///     order: CompositePathSortOrder::Descending,
/// };
/// let json = serde_json::to_string(&path).unwrap();
/// assert_eq!(json, r#"{"Path":"/age","Order":"Descending"}"#);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompositePath {
    /// Document path used for composite indexing.
    #[serde(rename = "Path", alias = "path")]
    pub path: String,
    /// Sort order for this path.
    #[serde(rename = "Order", alias = "order", default)]
    pub order: CompositePathSortOrder,
}

/// How the container keeps its index up to date.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexingMode {
    /// Index updated synchronously with writes.
    #[default]
    Consistent,
    /// Index updated asynchronously.
    Lazy,
    /// No index.
    None,
}

/// An included or excluded index path.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexPath {
    /// The path pattern, e.g. `/*` or `/name/?`.
    pub path: String,
}

/// Indexing policy of a container.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexingPolicy {
    /// Whether documents are indexed automatically.
    #[serde(default = "default_automatic")]
    pub automatic: bool,
    /// Index maintenance mode.
    #[serde(default)]
    pub indexing_mode: IndexingMode,
    /// Paths included in the index.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub included_paths: Vec<IndexPath>,
    /// Paths excluded from the index.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub excluded_paths: Vec<IndexPath>,
    /// Composite indexes, each an ordered list of paths.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub composite_indexes: Vec<Vec<CompositePath>>,
}

const fn default_automatic() -> bool {
    true
}

impl Default for IndexingPolicy {
    fn default() -> Self {
        Self {
            automatic: true,
            indexing_mode: IndexingMode::Consistent,
            included_paths: Vec::new(),
            excluded_paths: Vec::new(),
            composite_indexes: Vec::new(),
        }
    }
}

/// Partitioning scheme of a partition key definition.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PartitionKind {
    /// Hash partitioning.
    #[default]
    Hash,
    /// Range partitioning.
    Range,
}

/// Partition key definition of a container.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartitionKeyDefinition {
    /// Partition key paths, e.g. `["/tenantId"]`.
    pub paths: Vec<String>,
    /// Partitioning scheme.
    #[serde(default)]
    pub kind: PartitionKind,
}

impl PartitionKeyDefinition {
    /// Creates a hash partition key definition over a single path.
    #[must_use]
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            paths: vec![path.into()],
            kind: PartitionKind::Hash,
        }
    }
}
