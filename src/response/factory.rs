//! Materialization of raw responses into typed results.
//!
//! Every materialize operation follows the same steps:
//!
//! 1. Await the pending raw response, racing it against cancellation.
//! 2. Success gate: a status outside 200-299 becomes
//!    [`CosmosError::Response`] and the body is never decoded.
//! 3. An absent body yields `None` (single resources) or an empty page
//!    (feeds).
//! 4. Otherwise the body is decoded with the serializer for the resource
//!    kind's [`SerializerRole`].
//!
//! The raw response is owned by the factory for the whole call and dropped
//! before it returns, so its content stream is released exactly once on
//! every path, including decode failures.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::clients::{
    CosmosError, RawResponse, ResourceKind, ResponseError, ResponseVariant, SerializationError,
};
use crate::models::{
    AccountProperties, ContainerProperties, DatabaseProperties, PermissionProperties,
    StoredProcedureProperties, ThroughputProperties, TriggerProperties, UserDefinedFunctionProperties,
    UserProperties,
};
use crate::resources::{Container, Database, User};
use crate::response::{FeedResponse, ProxyResponse, Response};
use crate::serializer::{self, CosmosSerializer, JsonSerializer, SerializerRole};

/// Turns raw responses into typed results.
///
/// Holds the two serializers: the built-in properties serializer for
/// administrative metadata, and the user serializer for item payloads.
///
/// # Example
///
/// ```rust
/// use std::collections::HashMap;
/// use std::sync::Arc;
/// use cosmos_client::clients::RawResponse;
/// use cosmos_client::response::ResponseFactory;
/// use cosmos_client::serializer::JsonSerializer;
/// use tokio_util::sync::CancellationToken;
///
/// # tokio_test::block_on(async {
/// let factory = ResponseFactory::new(Arc::new(JsonSerializer));
/// let raw = RawResponse::new(200, "OK", HashMap::new(), Some(br#"{"id":"o1"}"#.to_vec()));
///
/// let response = factory
///     .item::<serde_json::Value>(async { Ok(raw) }, &CancellationToken::new())
///     .await
///     .unwrap();
/// assert_eq!(response.resource().unwrap()["id"], "o1");
/// # });
/// ```
#[derive(Clone)]
pub struct ResponseFactory {
    properties: Arc<dyn CosmosSerializer>,
    user: Arc<dyn CosmosSerializer>,
}

impl ResponseFactory {
    /// Creates a factory with the built-in properties serializer and the
    /// given user serializer.
    #[must_use]
    pub fn new(user: Arc<dyn CosmosSerializer>) -> Self {
        Self::with_serializers(Arc::new(JsonSerializer), user)
    }

    /// Creates a factory with explicit serializers for both roles.
    #[must_use]
    pub fn with_serializers(
        properties: Arc<dyn CosmosSerializer>,
        user: Arc<dyn CosmosSerializer>,
    ) -> Self {
        Self { properties, user }
    }

    /// Returns the serializer for a role.
    #[must_use]
    pub fn serializer(&self, role: SerializerRole) -> &dyn CosmosSerializer {
        match role {
            SerializerRole::Properties => self.properties.as_ref(),
            SerializerRole::User => self.user.as_ref(),
        }
    }

    async fn process_message<F, R>(
        pending: F,
        cancel: &CancellationToken,
        materialize: impl FnOnce(RawResponse) -> Result<R, CosmosError>,
    ) -> Result<R, CosmosError>
    where
        F: Future<Output = Result<RawResponse, CosmosError>>,
    {
        let raw = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(CosmosError::Cancelled),
            result = pending => result?,
        };

        if !raw.is_success() {
            let error = ResponseError::from_response(&raw);
            tracing::debug!(status = error.status, reason = %error.reason, "request failed");
            return Err(error.into());
        }

        materialize(raw)
    }

    fn decode_single<T: DeserializeOwned>(
        &self,
        raw: &RawResponse,
        kind: ResourceKind,
        role: SerializerRole,
    ) -> Result<Response<T>, CosmosError> {
        let resource = match raw.content() {
            Some(bytes) => Some(serializer::decode(self.serializer(role), kind, bytes)?),
            None => None,
        };
        Ok(Response::from_raw(raw, resource))
    }

    fn decode_feed<T: DeserializeOwned>(
        &self,
        raw: &RawResponse,
        kind: ResourceKind,
        role: SerializerRole,
    ) -> Result<FeedResponse<T>, CosmosError> {
        let Some(bytes) = raw.content() else {
            return Ok(FeedResponse::from_raw(raw, Vec::new()));
        };

        let tree = self
            .serializer(role)
            .from_bytes(bytes)
            .map_err(|message| SerializationError { kind, message })?;

        let documents = match raw.variant() {
            ResponseVariant::Query(_) | ResponseVariant::ReadFeed => envelope(kind, tree)?,
            ResponseVariant::Resource => match tree {
                Value::Array(items) => items,
                other => envelope(kind, other)?,
            },
        };

        let items = documents
            .into_iter()
            .map(|value| serializer::decode_value(kind, value))
            .collect::<Result<Vec<T>, _>>()?;

        Ok(FeedResponse::from_raw(raw, items))
    }

    async fn single<T: DeserializeOwned>(
        &self,
        pending: impl Future<Output = Result<RawResponse, CosmosError>>,
        kind: ResourceKind,
        role: SerializerRole,
        cancel: &CancellationToken,
    ) -> Result<Response<T>, CosmosError> {
        Self::process_message(pending, cancel, |raw| self.decode_single(&raw, kind, role)).await
    }

    async fn of_kind<T: DeserializeOwned>(
        &self,
        pending: impl Future<Output = Result<RawResponse, CosmosError>>,
        kind: ResourceKind,
        cancel: &CancellationToken,
    ) -> Result<Response<T>, CosmosError> {
        self.single(pending, kind, kind.serializer_role(), cancel).await
    }

    /// Materializes a database response and pairs it with its proxy.
    ///
    /// # Errors
    ///
    /// Returns [`CosmosError::Response`] on a non-success status,
    /// [`CosmosError::Serialization`] on a malformed body, or
    /// [`CosmosError::Cancelled`].
    pub async fn database(
        &self,
        pending: impl Future<Output = Result<RawResponse, CosmosError>>,
        proxy: Database,
        cancel: &CancellationToken,
    ) -> Result<ProxyResponse<Database, DatabaseProperties>, CosmosError> {
        let response = self.of_kind(pending, ResourceKind::Database, cancel).await?;
        Ok(ProxyResponse::new(proxy, response))
    }

    /// Materializes a container response and pairs it with its proxy.
    ///
    /// # Errors
    ///
    /// Same as [`ResponseFactory::database`].
    pub async fn container(
        &self,
        pending: impl Future<Output = Result<RawResponse, CosmosError>>,
        proxy: Container,
        cancel: &CancellationToken,
    ) -> Result<ProxyResponse<Container, ContainerProperties>, CosmosError> {
        let response = self.of_kind(pending, ResourceKind::Container, cancel).await?;
        Ok(ProxyResponse::new(proxy, response))
    }

    /// Materializes a user response and pairs it with its proxy.
    ///
    /// # Errors
    ///
    /// Same as [`ResponseFactory::database`].
    pub async fn user(
        &self,
        pending: impl Future<Output = Result<RawResponse, CosmosError>>,
        proxy: User,
        cancel: &CancellationToken,
    ) -> Result<ProxyResponse<User, UserProperties>, CosmosError> {
        let response = self.of_kind(pending, ResourceKind::User, cancel).await?;
        Ok(ProxyResponse::new(proxy, response))
    }

    /// Materializes a permission response.
    ///
    /// # Errors
    ///
    /// Same as [`ResponseFactory::database`].
    pub async fn permission(
        &self,
        pending: impl Future<Output = Result<RawResponse, CosmosError>>,
        cancel: &CancellationToken,
    ) -> Result<Response<PermissionProperties>, CosmosError> {
        self.of_kind(pending, ResourceKind::Permission, cancel).await
    }

    /// Materializes a throughput (offer) response.
    ///
    /// # Errors
    ///
    /// Same as [`ResponseFactory::database`].
    pub async fn throughput(
        &self,
        pending: impl Future<Output = Result<RawResponse, CosmosError>>,
        cancel: &CancellationToken,
    ) -> Result<Response<ThroughputProperties>, CosmosError> {
        self.of_kind(pending, ResourceKind::Throughput, cancel).await
    }

    /// Materializes a stored procedure definition.
    ///
    /// # Errors
    ///
    /// Same as [`ResponseFactory::database`].
    pub async fn stored_procedure(
        &self,
        pending: impl Future<Output = Result<RawResponse, CosmosError>>,
        cancel: &CancellationToken,
    ) -> Result<Response<StoredProcedureProperties>, CosmosError> {
        self.of_kind(pending, ResourceKind::StoredProcedure, cancel).await
    }

    /// Materializes the result of executing a stored procedure.
    ///
    /// The result is a user payload and always decodes with the user
    /// serializer.
    ///
    /// # Errors
    ///
    /// Same as [`ResponseFactory::database`].
    pub async fn stored_procedure_execute<T: DeserializeOwned>(
        &self,
        pending: impl Future<Output = Result<RawResponse, CosmosError>>,
        cancel: &CancellationToken,
    ) -> Result<Response<T>, CosmosError> {
        self.single(pending, ResourceKind::StoredProcedure, SerializerRole::User, cancel)
            .await
    }

    /// Materializes a trigger definition.
    ///
    /// # Errors
    ///
    /// Same as [`ResponseFactory::database`].
    pub async fn trigger(
        &self,
        pending: impl Future<Output = Result<RawResponse, CosmosError>>,
        cancel: &CancellationToken,
    ) -> Result<Response<TriggerProperties>, CosmosError> {
        self.of_kind(pending, ResourceKind::Trigger, cancel).await
    }

    /// Materializes a user-defined function definition.
    ///
    /// # Errors
    ///
    /// Same as [`ResponseFactory::database`].
    pub async fn user_defined_function(
        &self,
        pending: impl Future<Output = Result<RawResponse, CosmosError>>,
        cancel: &CancellationToken,
    ) -> Result<Response<UserDefinedFunctionProperties>, CosmosError> {
        self.of_kind(pending, ResourceKind::UserDefinedFunction, cancel)
            .await
    }

    /// Materializes an item with the user serializer.
    ///
    /// # Errors
    ///
    /// Same as [`ResponseFactory::database`].
    pub async fn item<T: DeserializeOwned>(
        &self,
        pending: impl Future<Output = Result<RawResponse, CosmosError>>,
        cancel: &CancellationToken,
    ) -> Result<Response<T>, CosmosError> {
        self.of_kind(pending, ResourceKind::Item, cancel).await
    }

    /// Materializes the database account metadata.
    ///
    /// # Errors
    ///
    /// Same as [`ResponseFactory::database`].
    pub async fn account(
        &self,
        pending: impl Future<Output = Result<RawResponse, CosmosError>>,
        cancel: &CancellationToken,
    ) -> Result<Response<AccountProperties>, CosmosError> {
        self.of_kind(pending, ResourceKind::DatabaseAccount, cancel)
            .await
    }

    /// Materializes one page of a read-feed or query.
    ///
    /// The page's documents are read from the envelope array named by
    /// `kind` (for example `Databases` or `Documents`). Feeds decode with
    /// the user serializer unless `use_properties_serializer` is set, which
    /// administrative feeds (throughput offers, databases, containers) must
    /// do so that a custom item serializer never parses service metadata.
    ///
    /// # Errors
    ///
    /// Same as [`ResponseFactory::database`]; a body without the expected
    /// envelope array is a [`CosmosError::Serialization`].
    pub async fn feed<T: DeserializeOwned>(
        &self,
        pending: impl Future<Output = Result<RawResponse, CosmosError>>,
        kind: ResourceKind,
        use_properties_serializer: bool,
        cancel: &CancellationToken,
    ) -> Result<FeedResponse<T>, CosmosError> {
        let role = if use_properties_serializer {
            SerializerRole::Properties
        } else {
            SerializerRole::User
        };
        Self::process_message(pending, cancel, |raw| self.decode_feed(&raw, kind, role)).await
    }
}

/// Pulls the document array out of a feed envelope such as
/// `{"_rid": "...", "Documents": [...], "_count": 2}`.
fn envelope(kind: ResourceKind, tree: Value) -> Result<Vec<Value>, CosmosError> {
    let key = kind.feed_key();
    match tree {
        Value::Object(mut map) => match map.remove(key) {
            Some(Value::Array(items)) => Ok(items),
            Some(Value::Null) | None => Err(CosmosError::serialization(
                kind,
                format!("feed response has no '{key}' array"),
            )),
            Some(_) => Err(CosmosError::serialization(
                kind,
                format!("feed response field '{key}' is not an array"),
            )),
        },
        _ => Err(CosmosError::serialization(kind, "feed response is not a JSON object")),
    }
}

impl fmt::Debug for ResponseFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResponseFactory")
            .field("properties", &self.properties)
            .field("user", &self.user)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Counts decode calls so tests can prove which role was used.
    #[derive(Debug, Default)]
    struct Counting {
        decodes: AtomicUsize,
    }

    impl CosmosSerializer for Counting {
        fn to_bytes(&self, value: &Value) -> Result<Vec<u8>, String> {
            JsonSerializer.to_bytes(value)
        }

        fn from_bytes(&self, bytes: &[u8]) -> Result<Value, String> {
            self.decodes.fetch_add(1, Ordering::SeqCst);
            JsonSerializer.from_bytes(bytes)
        }
    }

    fn factory() -> (ResponseFactory, Arc<Counting>, Arc<Counting>) {
        let properties = Arc::new(Counting::default());
        let user = Arc::new(Counting::default());
        let factory = ResponseFactory::with_serializers(properties.clone(), user.clone());
        (factory, properties, user)
    }

    fn ok(status: u16, body: &str) -> RawResponse {
        RawResponse::new(status, "OK", HashMap::new(), Some(body.as_bytes().to_vec()))
    }

    #[tokio::test]
    async fn test_permission_uses_properties_role() {
        let (factory, properties, user) = factory();
        let raw = ok(200, r#"{"id":"p1","permissionMode":"Read","resource":"dbs/d/colls/c"}"#);

        let response = factory
            .permission(async { Ok(raw) }, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(response.resource().unwrap().id, "p1");
        assert_eq!(properties.decodes.load(Ordering::SeqCst), 1);
        assert_eq!(user.decodes.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_execute_result_uses_user_role() {
        let (factory, properties, user) = factory();
        let raw = ok(200, r#"{"processed":3}"#);

        let response: Response<Value> = factory
            .stored_procedure_execute(async { Ok(raw) }, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(response.resource().unwrap()["processed"], 3);
        assert_eq!(user.decodes.load(Ordering::SeqCst), 1);
        assert_eq!(properties.decodes.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_failure_never_decodes() {
        let (factory, properties, user) = factory();
        let raw = RawResponse::new(
            409,
            "Conflict",
            HashMap::new(),
            Some(br#"{"code":"Conflict","message":"exists"}"#.to_vec()),
        );

        let error = factory
            .trigger(async { Ok(raw) }, &CancellationToken::new())
            .await
            .unwrap_err();

        assert_eq!(error.status(), Some(409));
        assert_eq!(properties.decodes.load(Ordering::SeqCst), 0);
        assert_eq!(user.decodes.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_empty_single_body_is_none_even_for_collections() {
        let (factory, _, user) = factory();
        let raw = RawResponse::new(200, "OK", HashMap::new(), None);

        let response: Response<Vec<Value>> = factory
            .stored_procedure_execute(async { Ok(raw) }, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(response.status(), 200);
        assert!(response.resource().is_none());
        assert_eq!(user.decodes.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_empty_feed_body_is_empty_page() {
        let (factory, _, _) = factory();
        let raw = RawResponse::new(200, "OK", HashMap::new(), None).with_variant(ResponseVariant::ReadFeed);

        let page: FeedResponse<Value> = factory
            .feed(async { Ok(raw) }, ResourceKind::Item, false, &CancellationToken::new())
            .await
            .unwrap();

        assert!(page.is_empty());
    }

    #[tokio::test]
    async fn test_feed_flag_selects_role() {
        let (factory, properties, user) = factory();
        let body = r#"{"_rid":"","Offers":[{"id":"o1","offerVersion":"V2","content":{"offerThroughput":400}}],"_count":1}"#;
        let raw = ok(200, body).with_variant(ResponseVariant::Query(Default::default()));

        let page: FeedResponse<ThroughputProperties> = factory
            .feed(async { Ok(raw) }, ResourceKind::Throughput, true, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(page.count(), 1);
        assert_eq!(page[0].throughput(), 400);
        assert_eq!(properties.decodes.load(Ordering::SeqCst), 1);
        assert_eq!(user.decodes.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_feed_without_envelope_is_serialization_error() {
        let (factory, _, _) = factory();
        let raw = ok(200, r#"{"_rid":"x"}"#).with_variant(ResponseVariant::ReadFeed);

        let result: Result<FeedResponse<Value>, _> = factory
            .feed(async { Ok(raw) }, ResourceKind::Item, false, &CancellationToken::new())
            .await;

        assert!(matches!(result, Err(CosmosError::Serialization(_))));
    }

    #[tokio::test]
    async fn test_untagged_feed_accepts_bare_array() {
        let (factory, _, _) = factory();
        let raw = ok(200, "[1,2,3]");

        let page: FeedResponse<u32> = factory
            .feed(async { Ok(raw) }, ResourceKind::Feed, false, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(page.into_inner(), vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_cancel_before_response_is_cancelled() {
        let (factory, _, _) = factory();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = factory
            .stored_procedure(std::future::pending::<Result<RawResponse, CosmosError>>(), &cancel)
            .await;

        assert!(matches!(result, Err(CosmosError::Cancelled)));
    }

    #[tokio::test]
    async fn test_transport_error_propagates() {
        let (factory, _, _) = factory();
        let result = factory
            .throughput(
                async { Err(CosmosError::invalid_argument("id", "bad")) },
                &CancellationToken::new(),
            )
            .await;
        assert!(matches!(result, Err(CosmosError::InvalidArgument { .. })));
    }
}
