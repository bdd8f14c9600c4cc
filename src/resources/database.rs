//! The database proxy.

use std::fmt;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::clients::{CosmosError, OperationKind, QueryDefinition, RequestOptions, ResourceKind};
use crate::context::ClientContext;
use crate::feed::{FeedIterator, FeedOptions};
use crate::models::{ContainerProperties, DatabaseProperties, ThroughputProperties, UserProperties};
use crate::resources::{
    build_request, child_link, read_offer, replace_offer, resource_id_of, validate_id, Container,
    User,
};
use crate::response::{ProxyResponse, Response};

/// A handle to one database.
///
/// # Example
///
/// ```rust,ignore
/// use cosmos_client::models::ContainerProperties;
///
/// let database = client.database("shop");
/// let created = database
///     .create_container(ContainerProperties::new("orders", "/tenantId"), Some(400), None, &cancel)
///     .await?;
/// let orders = created.proxy().clone();
/// ```
#[derive(Clone)]
pub struct Database {
    context: Arc<ClientContext>,
    id: String,
    link: String,
}

impl Database {
    pub(crate) fn new(context: Arc<ClientContext>, id: impl Into<String>) -> Self {
        let id = id.into();
        let link = child_link("", ResourceKind::Database, &id);
        Self { context, id, link }
    }

    /// Database id.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Name-based link, `dbs/{id}`.
    #[must_use]
    pub fn link(&self) -> &str {
        &self.link
    }

    /// Returns a proxy for a container in this database.
    #[must_use]
    pub fn container(&self, id: impl Into<String>) -> Container {
        Container::new(Arc::clone(&self.context), &self.link, id)
    }

    /// Returns a proxy for a user of this database.
    #[must_use]
    pub fn user(&self, id: impl Into<String>) -> User {
        User::new(Arc::clone(&self.context), &self.link, id)
    }

    /// Reads the database properties.
    ///
    /// # Errors
    ///
    /// Returns [`CosmosError::InvalidArgument`] for an invalid id, and
    /// otherwise the errors of the response factory.
    pub async fn read(
        &self,
        options: Option<RequestOptions>,
        cancel: &CancellationToken,
    ) -> Result<ProxyResponse<Self, DatabaseProperties>, CosmosError> {
        validate_id("database id", &self.id)?;
        let request = build_request(
            ResourceKind::Database,
            OperationKind::Read,
            &self.link,
            options.as_ref(),
        );
        self.context
            .factory()
            .database(self.context.send(request, cancel), self.clone(), cancel)
            .await
    }

    /// Deletes the database and everything in it.
    ///
    /// # Errors
    ///
    /// Same as [`Database::read`].
    pub async fn delete(
        &self,
        options: Option<RequestOptions>,
        cancel: &CancellationToken,
    ) -> Result<ProxyResponse<Self, DatabaseProperties>, CosmosError> {
        validate_id("database id", &self.id)?;
        let request = build_request(
            ResourceKind::Database,
            OperationKind::Delete,
            &self.link,
            options.as_ref(),
        );
        self.context
            .factory()
            .database(self.context.send(request, cancel), self.clone(), cancel)
            .await
    }

    /// Creates a container, optionally provisioning dedicated throughput.
    ///
    /// # Errors
    ///
    /// Returns [`CosmosError::InvalidArgument`] for an invalid database or
    /// container id, and otherwise the errors of the response factory.
    pub async fn create_container(
        &self,
        properties: ContainerProperties,
        throughput: Option<i32>,
        options: Option<RequestOptions>,
        cancel: &CancellationToken,
    ) -> Result<ProxyResponse<Container, ContainerProperties>, CosmosError> {
        validate_id("database id", &self.id)?;
        validate_id("container id", &properties.id)?;

        let mut request = build_request(
            ResourceKind::Container,
            OperationKind::Create,
            &self.link,
            options.as_ref(),
        );
        request.add_throughput_header(throughput);
        request.set_body(self.context.encode(ResourceKind::Container, &properties)?);

        let proxy = self.container(properties.id.as_str());
        self.context
            .factory()
            .container(self.context.send(request, cancel), proxy, cancel)
            .await
    }

    /// Enumerates the containers of this database.
    ///
    /// # Errors
    ///
    /// Returns [`CosmosError::InvalidArgument`] for an invalid database id.
    pub fn read_containers(
        &self,
        options: FeedOptions,
    ) -> Result<FeedIterator<ContainerProperties>, CosmosError> {
        self.query_containers(None, options)
    }

    /// Queries the containers of this database; `None` reads the whole feed.
    ///
    /// # Errors
    ///
    /// Returns [`CosmosError::InvalidArgument`] for an invalid database id.
    pub fn query_containers(
        &self,
        query: Option<QueryDefinition>,
        options: FeedOptions,
    ) -> Result<FeedIterator<ContainerProperties>, CosmosError> {
        validate_id("database id", &self.id)?;
        Ok(self
            .context
            .feed(ResourceKind::Container, self.link.as_str(), query, options))
    }

    /// Creates a user in this database.
    ///
    /// # Errors
    ///
    /// Returns [`CosmosError::InvalidArgument`] for an invalid database or
    /// user id, and otherwise the errors of the response factory.
    pub async fn create_user(
        &self,
        id: impl Into<String>,
        options: Option<RequestOptions>,
        cancel: &CancellationToken,
    ) -> Result<ProxyResponse<User, UserProperties>, CosmosError> {
        let id = id.into();
        validate_id("database id", &self.id)?;
        validate_id("user id", &id)?;

        let properties = UserProperties {
            id: id.clone(),
            ..UserProperties::default()
        };
        let mut request = build_request(
            ResourceKind::User,
            OperationKind::Create,
            &self.link,
            options.as_ref(),
        );
        request.set_body(self.context.encode(ResourceKind::User, &properties)?);

        self.context
            .factory()
            .user(self.context.send(request, cancel), self.user(id), cancel)
            .await
    }

    /// Queries the users of this database; `None` reads the whole feed.
    ///
    /// # Errors
    ///
    /// Returns [`CosmosError::InvalidArgument`] for an invalid database id.
    pub fn query_users(
        &self,
        query: Option<QueryDefinition>,
        options: FeedOptions,
    ) -> Result<FeedIterator<UserProperties>, CosmosError> {
        validate_id("database id", &self.id)?;
        Ok(self
            .context
            .feed(ResourceKind::User, self.link.as_str(), query, options))
    }

    /// Reads the throughput provisioned on this database.
    ///
    /// # Errors
    ///
    /// Returns a 404 [`CosmosError::Response`] if the database has no
    /// dedicated throughput, and otherwise the errors of [`Database::read`].
    pub async fn read_throughput(
        &self,
        cancel: &CancellationToken,
    ) -> Result<ThroughputProperties, CosmosError> {
        let rid = self.resource_id(cancel).await?;
        read_offer(&self.context, &rid, cancel).await
    }

    /// Changes the throughput provisioned on this database.
    ///
    /// # Errors
    ///
    /// Same as [`Database::read_throughput`].
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
            CosmosError::serialization(ResourceKind::Database, "database response has no body")
        })?;
        resource_id_of(ResourceKind::Database, &properties.system)
    }
}

impl fmt::Debug for Database {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Database").field("link", &self.link).finish()
    }
}
