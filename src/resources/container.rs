//! The container proxy and item operations.

use std::fmt;
use std::sync::Arc;

use serde::de::{DeserializeOwned, IgnoredAny};
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::clients::{
    CosmosError, OperationKind, PartitionKey, QueryDefinition, RequestOptions, ResourceKind,
};
use crate::context::ClientContext;
use crate::feed::{FeedIterator, FeedOptions};
use crate::models::{ContainerProperties, ThroughputProperties};
use crate::resources::{
    build_request, child_link, read_offer, replace_offer, resource_id_of, validate_id, Scripts,
};
use crate::response::{ProxyResponse, Response};

/// A handle to one container.
///
/// Item payloads are encoded and decoded with the client's user serializer.
///
/// # Example
///
/// ```rust,ignore
/// #[derive(Serialize, Deserialize)]
/// struct Order { id: String, tenant: String, total: u32 }
///
/// let orders = client.database("shop").container("orders");
/// let created = orders
///     .create_item(&order, &PartitionKey::from("tenant-1"), None, &cancel)
///     .await?;
///
/// // Read it back pinned to the same session
/// let options = RequestOptions {
///     session_token: created.session_token().map(String::from),
///     ..RequestOptions::default()
/// };
/// let read = orders
///     .read_item::<Order>(&order.id, &PartitionKey::from("tenant-1"), Some(options), &cancel)
///     .await?;
/// ```
#[derive(Clone)]
pub struct Container {
    context: Arc<ClientContext>,
    id: String,
    database_id: String,
    link: String,
}

impl Container {
    pub(crate) fn new(context: Arc<ClientContext>, database_link: &str, id: impl Into<String>) -> Self {
        let id = id.into();
        let link = child_link(database_link, ResourceKind::Container, &id);
        let database_id = database_link
            .rsplit('/')
            .next()
            .unwrap_or_default()
            .to_string();
        Self {
            context,
            id,
            database_id,
            link,
        }
    }

    /// Container id.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Name-based link, `dbs/{db}/colls/{id}`.
    #[must_use]
    pub fn link(&self) -> &str {
        &self.link
    }

    /// Returns the stored procedures, triggers and user-defined functions of
    /// this container.
    #[must_use]
    pub fn scripts(&self) -> Scripts {
        Scripts::new(Arc::clone(&self.context), &self.link)
    }

    fn validate(&self) -> Result<(), CosmosError> {
        validate_id("database id", &self.database_id)?;
        validate_id("container id", &self.id)
    }

    /// Reads the container properties.
    ///
    /// # Errors
    ///
    /// Returns [`CosmosError::InvalidArgument`] for an invalid id, and
    /// otherwise the errors of the response factory.
    pub async fn read(
        &self,
        options: Option<RequestOptions>,
        cancel: &CancellationToken,
    ) -> Result<ProxyResponse<Self, ContainerProperties>, CosmosError> {
        self.send_container(OperationKind::Read, None, options, cancel)
            .await
    }

    /// Replaces the container properties (indexing policy, default TTL).
    ///
    /// # Errors
    ///
    /// Same as [`Container::read`]; the id in `properties` must match.
    pub async fn replace(
        &self,
        properties: &ContainerProperties,
        options: Option<RequestOptions>,
        cancel: &CancellationToken,
    ) -> Result<ProxyResponse<Self, ContainerProperties>, CosmosError> {
        if properties.id != self.id {
            return Err(CosmosError::invalid_argument(
                "properties",
                format!("id '{}' does not match container '{}'", properties.id, self.id),
            ));
        }
        let body = self.context.encode(ResourceKind::Container, properties)?;
        self.send_container(OperationKind::Replace, Some(body), options, cancel)
            .await
    }

    /// Deletes the container and its items.
    ///
    /// # Errors
    ///
    /// Same as [`Container::read`].
    pub async fn delete(
        &self,
        options: Option<RequestOptions>,
        cancel: &CancellationToken,
    ) -> Result<ProxyResponse<Self, ContainerProperties>, CosmosError> {
        self.send_container(OperationKind::Delete, None, options, cancel)
            .await
    }

    async fn send_container(
        &self,
        operation: OperationKind,
        body: Option<Vec<u8>>,
        options: Option<RequestOptions>,
        cancel: &CancellationToken,
    ) -> Result<ProxyResponse<Self, ContainerProperties>, CosmosError> {
        self.validate()?;
        let mut request =
            build_request(ResourceKind::Container, operation, &self.link, options.as_ref());
        if let Some(body) = body {
            request.set_body(body);
        }
        self.context
            .factory()
            .container(self.context.send(request, cancel), self.clone(), cancel)
            .await
    }

    /// Creates an item.
    ///
    /// # Errors
    ///
    /// Returns [`CosmosError::InvalidArgument`] for an invalid container,
    /// [`CosmosError::Serialization`] if the item cannot be encoded, and
    /// otherwise the errors of the response factory (409 if the id exists).
    pub async fn create_item<T>(
        &self,
        item: &T,
        partition_key: &PartitionKey,
        options: Option<RequestOptions>,
        cancel: &CancellationToken,
    ) -> Result<Response<T>, CosmosError>
    where
        T: Serialize + DeserializeOwned + Sync,
    {
        self.write_item(OperationKind::Create, &self.link, item, partition_key, options, false, cancel)
            .await
    }

    /// Creates an item or replaces the existing one with the same id.
    ///
    /// # Errors
    ///
    /// Same as [`Container::create_item`].
    pub async fn upsert_item<T>(
        &self,
        item: &T,
        partition_key: &PartitionKey,
        options: Option<RequestOptions>,
        cancel: &CancellationToken,
    ) -> Result<Response<T>, CosmosError>
    where
        T: Serialize + DeserializeOwned + Sync,
    {
        self.write_item(OperationKind::Create, &self.link, item, partition_key, options, true, cancel)
            .await
    }

    /// Replaces the item `id`.
    ///
    /// Set `if_match_etag` in `options` for optimistic concurrency.
    ///
    /// # Errors
    ///
    /// Same as [`Container::create_item`], plus [`CosmosError::InvalidArgument`]
    /// for an invalid item id.
    pub async fn replace_item<T>(
        &self,
        id: &str,
        item: &T,
        partition_key: &PartitionKey,
        options: Option<RequestOptions>,
        cancel: &CancellationToken,
    ) -> Result<Response<T>, CosmosError>
    where
        T: Serialize + DeserializeOwned + Sync,
    {
        validate_id("item id", id)?;
        let link = child_link(&self.link, ResourceKind::Item, id);
        self.write_item(OperationKind::Replace, &link, item, partition_key, options, false, cancel)
            .await
    }

    #[allow(clippy::too_many_arguments)]
    async fn write_item<T>(
        &self,
        operation: OperationKind,
        address: &str,
        item: &T,
        partition_key: &PartitionKey,
        options: Option<RequestOptions>,
        upsert: bool,
        cancel: &CancellationToken,
    ) -> Result<Response<T>, CosmosError>
    where
        T: Serialize + DeserializeOwned + Sync,
    {
        self.validate()?;
        let mut request = build_request(ResourceKind::Item, operation, address, options.as_ref());
        request.set_partition_key(partition_key);
        if upsert {
            request.mark_upsert();
        }
        request.set_body(self.context.encode(ResourceKind::Item, item)?);

        self.context
            .factory()
            .item(self.context.send(request, cancel), cancel)
            .await
    }

    /// Reads the item `id`.
    ///
    /// # Errors
    ///
    /// Returns [`CosmosError::InvalidArgument`] for an invalid id, a 404
    /// [`CosmosError::Response`] if the item does not exist, and otherwise
    /// the errors of the response factory.
    pub async fn read_item<T: DeserializeOwned>(
        &self,
        id: &str,
        partition_key: &PartitionKey,
        options: Option<RequestOptions>,
        cancel: &CancellationToken,
    ) -> Result<Response<T>, CosmosError> {
        self.validate()?;
        validate_id("item id", id)?;
        let link = child_link(&self.link, ResourceKind::Item, id);
        let mut request =
            build_request(ResourceKind::Item, OperationKind::Read, &link, options.as_ref());
        request.set_partition_key(partition_key);

        self.context
            .factory()
            .item(self.context.send(request, cancel), cancel)
            .await
    }

    /// Deletes the item `id`.
    ///
    /// # Errors
    ///
    /// Same as [`Container::read_item`].
    pub async fn delete_item(
        &self,
        id: &str,
        partition_key: &PartitionKey,
        options: Option<RequestOptions>,
        cancel: &CancellationToken,
    ) -> Result<Response<()>, CosmosError> {
        self.validate()?;
        validate_id("item id", id)?;
        let link = child_link(&self.link, ResourceKind::Item, id);
        let mut request =
            build_request(ResourceKind::Item, OperationKind::Delete, &link, options.as_ref());
        request.set_partition_key(partition_key);

        let response = self
            .context
            .factory()
            .item::<IgnoredAny>(self.context.send(request, cancel), cancel)
            .await?;
        Ok(response.map(|_| ()))
    }

    /// Queries the items of this container.
    ///
    /// # Errors
    ///
    /// Returns [`CosmosError::InvalidArgument`] for an invalid container.
    pub fn query_items<T: DeserializeOwned>(
        &self,
        query: QueryDefinition,
        options: FeedOptions,
    ) -> Result<FeedIterator<T>, CosmosError> {
        self.validate()?;
        Ok(self
            .context
            .feed(ResourceKind::Item, self.link.as_str(), Some(query), options))
    }

    /// Enumerates every item of this container.
    ///
    /// # Errors
    ///
    /// Returns [`CosmosError::InvalidArgument`] for an invalid container.
    pub fn read_items<T: DeserializeOwned>(
        &self,
        options: FeedOptions,
    ) -> Result<FeedIterator<T>, CosmosError> {
        self.validate()?;
        Ok(self
            .context
            .feed(ResourceKind::Item, self.link.as_str(), None, options))
    }

    /// Reads the throughput provisioned on this container.
    ///
    /// # Errors
    ///
    /// Returns a 404 [`CosmosError::Response`] if the container has no
    /// dedicated throughput, and otherwise the errors of [`Container::read`].
    pub async fn read_throughput(
        &self,
        cancel: &CancellationToken,
    ) -> Result<ThroughputProperties, CosmosError> {
        let rid = self.resource_id(cancel).await?;
        read_offer(&self.context, &rid, cancel).await
    }

    /// Changes the throughput provisioned on this container.
    ///
    /// # Errors
    ///
    /// Same as [`Container::read_throughput`].
    pub async fn replace_throughput(
        &self,
        throughput: i32,
        cancel: &CancellationToken,
    ) -> Result<Response<ThroughputProperties>, CosmosError> {
        let rid = self.resource_id(cancel).await?;
        replace_offer(&self.context, &rid, throughput, cancel).await
    }

    async fn resource_id(&self, cancel: &CancellationToken) -> Result<String, CosmosError> {
        let response = self.read(None, cancel).await?;
        let properties = response.resource().ok_or_else(|| {
            CosmosError::serialization(ResourceKind::Container, "container response has no body")
        })?;
        resource_id_of(ResourceKind::Container, &properties.system)
    }
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Container").field("link", &self.link).finish()
    }
}
