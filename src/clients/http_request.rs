//! Request types for the handler chain.
//!
//! A [`RequestMessage`] is built per logical operation from a
//! [`ResourceKind`], an [`OperationKind`] and a resource address, then
//! enriched with operation-specific headers before it enters the pipeline.
//! Each request owns all of its per-call state; handlers never share it.

use std::collections::HashMap;
use std::fmt;

use serde::Serialize;

use crate::clients::errors::CosmosError;
use crate::clients::headers;
use crate::models::ConsistencyLevel;
use crate::serializer::SerializerRole;

/// HTTP methods used by the service.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HttpMethod {
    /// HTTP GET.
    Get,
    /// HTTP POST.
    Post,
    /// HTTP PUT.
    Put,
    /// HTTP DELETE.
    Delete,
}

impl HttpMethod {
    /// Returns the lower-case verb used when signing requests.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "get",
            Self::Post => "post",
            Self::Put => "put",
            Self::Delete => "delete",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The kinds of resource the service exposes.
///
/// The kind selects the routing segment, the feed envelope key and the
/// [`SerializerRole`] used to decode responses.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    /// The database account root.
    DatabaseAccount,
    /// A database.
    Database,
    /// A container (document collection).
    Container,
    /// A user-defined item (document).
    Item,
    /// A database user.
    User,
    /// A permission granted to a user.
    Permission,
    /// A throughput offer.
    Throughput,
    /// A stored procedure.
    StoredProcedure,
    /// A pre or post trigger.
    Trigger,
    /// A user-defined function.
    UserDefinedFunction,
    /// A generic query or read-feed result set whose element type the caller
    /// chooses.
    Feed,
}

impl ResourceKind {
    /// Returns the serializer role used to decode this kind.
    ///
    /// The mapping is static: every administrative kind decodes with the
    /// properties serializer, items and generic feeds with the user
    /// serializer. Stored procedure *execution results* are user payloads and
    /// are decoded with [`SerializerRole::User`] by the response factory
    /// regardless of this mapping.
    #[must_use]
    pub const fn serializer_role(&self) -> SerializerRole {
        match self {
            Self::Item | Self::Feed => SerializerRole::User,
            Self::DatabaseAccount
            | Self::Database
            | Self::Container
            | Self::User
            | Self::Permission
            | Self::Throughput
            | Self::StoredProcedure
            | Self::Trigger
            | Self::UserDefinedFunction => SerializerRole::Properties,
        }
    }

    /// Returns the URI segment naming a collection of this kind.
    #[must_use]
    pub const fn path_segment(&self) -> &'static str {
        match self {
            Self::DatabaseAccount => "",
            Self::Database => "dbs",
            Self::Container => "colls",
            Self::Item | Self::Feed => "docs",
            Self::User => "users",
            Self::Permission => "permissions",
            Self::Throughput => "offers",
            Self::StoredProcedure => "sprocs",
            Self::Trigger => "triggers",
            Self::UserDefinedFunction => "udfs",
        }
    }

    /// Returns the key under which a feed response lists resources of this kind.
    #[must_use]
    pub const fn feed_key(&self) -> &'static str {
        match self {
            Self::DatabaseAccount => "DatabaseAccounts",
            Self::Database => "Databases",
            Self::Container => "DocumentCollections",
            Self::Item | Self::Feed => "Documents",
            Self::User => "Users",
            Self::Permission => "Permissions",
            Self::Throughput => "Offers",
            Self::StoredProcedure => "StoredProcedures",
            Self::Trigger => "Triggers",
            Self::UserDefinedFunction => "UserDefinedFunctions",
        }
    }

    /// Human-readable name used in errors and logs.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::DatabaseAccount => "DatabaseAccount",
            Self::Database => "Database",
            Self::Container => "Container",
            Self::Item => "Item",
            Self::User => "User",
            Self::Permission => "Permission",
            Self::Throughput => "Throughput",
            Self::StoredProcedure => "StoredProcedure",
            Self::Trigger => "Trigger",
            Self::UserDefinedFunction => "UserDefinedFunction",
            Self::Feed => "Feed",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The logical operations that can be performed on a resource.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OperationKind {
    /// Create a resource under a parent.
    Create,
    /// Read one resource.
    Read,
    /// Enumerate the resources under a parent.
    ReadFeed,
    /// Run a query against the resources under a parent.
    Query,
    /// Replace one resource.
    Replace,
    /// Delete one resource.
    Delete,
    /// Execute a stored procedure.
    Execute,
}

impl OperationKind {
    /// Returns the HTTP method that carries this operation.
    #[must_use]
    pub const fn http_method(&self) -> HttpMethod {
        match self {
            Self::Create | Self::Query | Self::Execute => HttpMethod::Post,
            Self::Read | Self::ReadFeed => HttpMethod::Get,
            Self::Replace => HttpMethod::Put,
            Self::Delete => HttpMethod::Delete,
        }
    }

    /// Returns `true` if the operation addresses the feed under a parent
    /// rather than a single resource.
    #[must_use]
    pub const fn targets_feed(&self) -> bool {
        matches!(self, Self::Create | Self::ReadFeed | Self::Query)
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Create => "Create",
            Self::Read => "Read",
            Self::ReadFeed => "ReadFeed",
            Self::Query => "Query",
            Self::Replace => "Replace",
            Self::Delete => "Delete",
            Self::Execute => "Execute",
        };
        f.write_str(name)
    }
}

/// A partition key value.
///
/// # Example
///
/// ```rust
/// use cosmos_client::clients::PartitionKey;
///
/// let key = PartitionKey::from("tenant-1");
/// assert_eq!(key.to_header_value(), r#"["tenant-1"]"#);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct PartitionKey(serde_json::Value);

impl PartitionKey {
    /// Returns the JSON array form sent in the partition key header.
    #[must_use]
    pub fn to_header_value(&self) -> String {
        serde_json::Value::Array(vec![self.0.clone()]).to_string()
    }
}

impl From<&str> for PartitionKey {
    fn from(value: &str) -> Self {
        Self(serde_json::Value::from(value))
    }
}

impl From<String> for PartitionKey {
    fn from(value: String) -> Self {
        Self(serde_json::Value::from(value))
    }
}

impl From<i64> for PartitionKey {
    fn from(value: i64) -> Self {
        Self(serde_json::Value::from(value))
    }
}

impl From<bool> for PartitionKey {
    fn from(value: bool) -> Self {
        Self(serde_json::Value::from(value))
    }
}

/// Per-operation request options.
///
/// # Example
///
/// ```rust
/// use cosmos_client::clients::RequestOptions;
///
/// // Pin a read to the session of an earlier write
/// let options = RequestOptions {
///     session_token: Some("0:1#42".to_string()),
///     ..RequestOptions::default()
/// };
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RequestOptions {
    /// Session token returned by an earlier response.
    pub session_token: Option<String>,
    /// Consistency level override for this operation.
    pub consistency_level: Option<ConsistencyLevel>,
    /// Only apply the write if the resource still has this etag.
    pub if_match_etag: Option<String>,
    /// Only return the resource if its etag differs.
    pub if_none_match_etag: Option<String>,
    /// Ask the service to return query execution metrics.
    pub populate_query_metrics: bool,
}

impl RequestOptions {
    /// Writes these options onto a request's headers.
    pub fn apply(&self, request: &mut RequestMessage) {
        if let Some(token) = &self.session_token {
            request.set_session_token(token);
        }
        if let Some(level) = self.consistency_level {
            request.set_header(headers::CONSISTENCY_LEVEL, level.as_str());
        }
        if let Some(etag) = &self.if_match_etag {
            request.set_header(headers::IF_MATCH, etag);
        }
        if let Some(etag) = &self.if_none_match_etag {
            request.set_header(headers::IF_NONE_MATCH, etag);
        }
        if self.populate_query_metrics {
            request.set_header(headers::POPULATE_QUERY_METRICS, "true");
        }
    }
}

/// A request travelling through the handler chain.
#[derive(Clone, Debug)]
pub struct RequestMessage {
    /// HTTP method derived from the operation.
    pub method: HttpMethod,
    /// Kind of resource addressed.
    pub resource_kind: ResourceKind,
    /// Logical operation.
    pub operation: OperationKind,
    /// Path relative to the account endpoint.
    pub path: String,
    /// Resource link used when signing the request.
    pub resource_link: String,
    /// Request headers; later writes replace earlier ones.
    pub headers: HashMap<String, String>,
    /// Encoded payload.
    pub body: Option<Vec<u8>>,
}

impl RequestMessage {
    /// Creates a request for `operation` on `kind`.
    ///
    /// `address` is the parent link for feed operations (create, read feed,
    /// query) and the resource's own link otherwise.
    ///
    /// # Example
    ///
    /// ```rust
    /// use cosmos_client::clients::{OperationKind, RequestMessage, ResourceKind};
    ///
    /// let create = RequestMessage::new(ResourceKind::Container, OperationKind::Create, "dbs/db1");
    /// assert_eq!(create.path, "dbs/db1/colls");
    /// assert_eq!(create.resource_link, "dbs/db1");
    ///
    /// let read = RequestMessage::new(ResourceKind::Container, OperationKind::Read, "dbs/db1/colls/c1");
    /// assert_eq!(read.path, "dbs/db1/colls/c1");
    /// ```
    #[must_use]
    pub fn new(kind: ResourceKind, operation: OperationKind, address: impl Into<String>) -> Self {
        let address = address.into();
        let address = address.trim_matches('/').to_string();
        let path = if operation.targets_feed() && !kind.path_segment().is_empty() {
            if address.is_empty() {
                kind.path_segment().to_string()
            } else {
                format!("{address}/{}", kind.path_segment())
            }
        } else {
            address.clone()
        };

        let mut request = Self {
            method: operation.http_method(),
            resource_kind: kind,
            operation,
            path,
            resource_link: address,
            headers: HashMap::new(),
            body: None,
        };
        if operation == OperationKind::Query {
            request.set_header(headers::IS_QUERY, "true");
            request.set_header(headers::CONTENT_TYPE, headers::APPLICATION_QUERY_JSON);
        }
        request
    }

    /// Sets a header, replacing any earlier value.
    pub fn set_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.headers.insert(name.into().to_ascii_lowercase(), value.into());
    }

    /// Returns a header value.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Attaches an encoded JSON payload.
    pub fn set_body(&mut self, body: Vec<u8>) {
        if self.operation != OperationKind::Query {
            self.set_header(headers::CONTENT_TYPE, headers::APPLICATION_JSON);
        }
        self.body = Some(body);
    }

    /// Adds the provisioned throughput header used when creating databases
    /// and containers.
    pub fn add_throughput_header(&mut self, throughput: Option<i32>) {
        if let Some(throughput) = throughput {
            self.set_header(headers::OFFER_THROUGHPUT, throughput.to_string());
        }
    }

    /// Adds the continuation token of the page to fetch.
    pub fn fill_continuation_token(&mut self, continuation: Option<&str>) {
        if let Some(token) = continuation.filter(|t| !t.is_empty()) {
            self.set_header(headers::CONTINUATION, token);
        }
    }

    /// Adds the page size.
    pub fn fill_max_item_count(&mut self, max_item_count: Option<u32>) {
        if let Some(count) = max_item_count {
            self.set_header(headers::MAX_ITEM_COUNT, count.to_string());
        }
    }

    /// Routes the request to one logical partition.
    pub fn set_partition_key(&mut self, partition_key: &PartitionKey) {
        self.set_header(headers::PARTITION_KEY, partition_key.to_header_value());
    }

    /// Pins the request to a session.
    pub fn set_session_token(&mut self, token: &str) {
        self.set_header(headers::SESSION_TOKEN, token);
    }

    /// Marks a create request as an upsert.
    pub fn mark_upsert(&mut self) {
        self.set_header(headers::IS_UPSERT, "true");
    }
}

/// A parameterized query.
///
/// # Example
///
/// ```rust
/// use cosmos_client::clients::QueryDefinition;
///
/// let query = QueryDefinition::new("SELECT * FROM c WHERE c.status = @status")
///     .with_parameter("@status", "active");
/// assert_eq!(query.parameters().len(), 1);
/// ```
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct QueryDefinition {
    query: String,
    parameters: Vec<QueryParameter>,
}

/// A named query parameter.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct QueryParameter {
    name: String,
    value: serde_json::Value,
}

impl QueryDefinition {
    /// Creates a query with no parameters.
    #[must_use]
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            parameters: Vec::new(),
        }
    }

    /// Binds a parameter; a later binding of the same name wins.
    #[must_use]
    pub fn with_parameter(mut self, name: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        let name = name.into();
        self.parameters.retain(|p| p.name != name);
        self.parameters.push(QueryParameter {
            name,
            value: value.into(),
        });
        self
    }

    /// Returns the query text.
    #[must_use]
    pub fn query_text(&self) -> &str {
        &self.query
    }

    /// Returns the bound parameters as `(name, value)` pairs.
    #[must_use]
    pub fn parameters(&self) -> Vec<(&str, &serde_json::Value)> {
        self.parameters
            .iter()
            .map(|p| (p.name.as_str(), &p.value))
            .collect()
    }

    /// Encodes the query as the service's query JSON document.
    ///
    /// # Errors
    ///
    /// Returns [`CosmosError::Serialization`] if a parameter value cannot be encoded.
    pub fn to_body(&self) -> Result<Vec<u8>, CosmosError> {
        serde_json::to_vec(self)
            .map_err(|e| CosmosError::serialization(ResourceKind::Feed, e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_http_methods() {
        assert_eq!(OperationKind::Create.http_method(), HttpMethod::Post);
        assert_eq!(OperationKind::Query.http_method(), HttpMethod::Post);
        assert_eq!(OperationKind::Execute.http_method(), HttpMethod::Post);
        assert_eq!(OperationKind::Read.http_method(), HttpMethod::Get);
        assert_eq!(OperationKind::ReadFeed.http_method(), HttpMethod::Get);
        assert_eq!(OperationKind::Replace.http_method(), HttpMethod::Put);
        assert_eq!(OperationKind::Delete.http_method(), HttpMethod::Delete);
    }

    #[test]
    fn test_database_feed_lives_at_root() {
        let request = RequestMessage::new(ResourceKind::Database, OperationKind::ReadFeed, "");
        assert_eq!(request.path, "dbs");
        assert_eq!(request.resource_link, "");
    }

    #[test]
    fn test_execute_targets_the_procedure_itself() {
        let request = RequestMessage::new(
            ResourceKind::StoredProcedure,
            OperationKind::Execute,
            "/dbs/db1/colls/c1/sprocs/bulk/",
        );
        assert_eq!(request.path, "dbs/db1/colls/c1/sprocs/bulk");
        assert_eq!(request.resource_link, request.path);
        assert_eq!(request.method, HttpMethod::Post);
    }

    #[test]
    fn test_query_sets_query_headers() {
        let request = RequestMessage::new(ResourceKind::Item, OperationKind::Query, "dbs/d/colls/c");
        assert_eq!(request.header(headers::IS_QUERY), Some("true"));
        assert_eq!(
            request.header("Content-Type"),
            Some(headers::APPLICATION_QUERY_JSON)
        );
    }

    #[test]
    fn test_enrichers_only_write_present_values() {
        let mut request = RequestMessage::new(ResourceKind::Database, OperationKind::Create, "");
        request.add_throughput_header(None);
        request.fill_continuation_token(Some(""));
        request.fill_max_item_count(None);
        assert!(request.headers.is_empty());

        request.add_throughput_header(Some(400));
        request.fill_continuation_token(Some("+RID:abc"));
        request.fill_max_item_count(Some(10));
        assert_eq!(request.header(headers::OFFER_THROUGHPUT), Some("400"));
        assert_eq!(request.header(headers::CONTINUATION), Some("+RID:abc"));
        assert_eq!(request.header(headers::MAX_ITEM_COUNT), Some("10"));
    }

    #[test]
    fn test_request_options_apply() {
        let options = RequestOptions {
            session_token: Some("0:5".to_string()),
            consistency_level: Some(ConsistencyLevel::Eventual),
            if_match_etag: Some("\"etag\"".to_string()),
            if_none_match_etag: None,
            populate_query_metrics: true,
        };
        let mut request = RequestMessage::new(ResourceKind::Item, OperationKind::Read, "dbs/d/colls/c/docs/i");
        options.apply(&mut request);

        assert_eq!(request.header(headers::SESSION_TOKEN), Some("0:5"));
        assert_eq!(request.header(headers::CONSISTENCY_LEVEL), Some("Eventual"));
        assert_eq!(request.header(headers::IF_MATCH), Some("\"etag\""));
        assert_eq!(request.header(headers::POPULATE_QUERY_METRICS), Some("true"));
        assert!(request.header(headers::IF_NONE_MATCH).is_none());
    }

    #[test]
    fn test_query_definition_body() {
        let query = QueryDefinition::new("SELECT * FROM c WHERE c.n = @n")
            .with_parameter("@n", 1)
            .with_parameter("@n", 2);
        let body: serde_json::Value = serde_json::from_slice(&query.to_body().unwrap()).unwrap();
        assert_eq!(
            body,
            serde_json::json!({
                "query": "SELECT * FROM c WHERE c.n = @n",
                "parameters": [{"name": "@n", "value": 2}]
            })
        );
    }

    #[test]
    fn test_serializer_role_matrix() {
        use SerializerRole::{Properties, User};
        let expected = [
            (ResourceKind::Database, Properties),
            (ResourceKind::Container, Properties),
            (ResourceKind::User, Properties),
            (ResourceKind::Permission, Properties),
            (ResourceKind::Throughput, Properties),
            (ResourceKind::StoredProcedure, Properties),
            (ResourceKind::Trigger, Properties),
            (ResourceKind::UserDefinedFunction, Properties),
            (ResourceKind::DatabaseAccount, Properties),
            (ResourceKind::Item, User),
            (ResourceKind::Feed, User),
        ];
        for (kind, role) in expected {
            assert_eq!(kind.serializer_role(), role, "{kind}");
        }
    }
}
