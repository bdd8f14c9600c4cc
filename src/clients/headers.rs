//! Header names used on the wire.
//!
//! Response header names are compared in lower case; the transport lowercases
//! every name it receives.

pub const ACCEPT: &str = "accept";
pub const ACTIVITY_ID: &str = "x-ms-activity-id";
pub const AUTHORIZATION: &str = "authorization";
pub const CONSISTENCY_LEVEL: &str = "x-ms-consistency-level";
pub const CONTENT_TYPE: &str = "content-type";
pub const CONTINUATION: &str = "x-ms-continuation";
pub const DATE: &str = "x-ms-date";
pub const ENABLE_CROSS_PARTITION_QUERY: &str = "x-ms-documentdb-query-enablecrosspartition";
pub const ETAG: &str = "etag";
pub const IF_MATCH: &str = "if-match";
pub const IF_NONE_MATCH: &str = "if-none-match";
pub const INDEX_UTILIZATION: &str = "x-ms-cosmos-index-utilization";
pub const IS_QUERY: &str = "x-ms-documentdb-isquery";
pub const IS_UPSERT: &str = "x-ms-documentdb-is-upsert";
pub const ITEM_COUNT: &str = "x-ms-item-count";
pub const MAX_ITEM_COUNT: &str = "x-ms-max-item-count";
pub const OFFER_THROUGHPUT: &str = "x-ms-offer-throughput";
pub const PARTITION_KEY: &str = "x-ms-documentdb-partitionkey";
pub const POPULATE_QUERY_METRICS: &str = "x-ms-documentdb-populatequerymetrics";
pub const QUERY_METRICS: &str = "x-ms-documentdb-query-metrics";
pub const REQUEST_CHARGE: &str = "x-ms-request-charge";
pub const RETRY_AFTER_MS: &str = "x-ms-retry-after-ms";
pub const SESSION_TOKEN: &str = "x-ms-session-token";
pub const USER_AGENT: &str = "user-agent";
pub const VERSION: &str = "x-ms-version";

pub const APPLICATION_JSON: &str = "application/json";
pub const APPLICATION_QUERY_JSON: &str = "application/query+json";
