//! The root client.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::clients::{CosmosError, OperationKind, QueryDefinition, RequestOptions, ResourceKind};
use crate::config::{AccountEndpoint, ClientConfig};
use crate::context::{ClientContext, Collaborators};
use crate::feed::{FeedIterator, FeedOptions};
use crate::models::{AccountProperties, ConsistencyLevel, DatabaseProperties};
use crate::resources::{build_request, validate_id, Database};
use crate::response::{ProxyResponse, Response};

/// Entry point for talking to one database account.
///
/// The client owns the handler chain, the response factory and the
/// consistency cache; every proxy it hands out shares them. Cloning the
/// client is cheap.
///
/// # Thread Safety
///
/// `CosmosClient` is `Send + Sync` and is meant to be created once and
/// shared.
///
/// # Example
///
/// ```rust,ignore
/// use cosmos_client::{ClientConfig, ClientOptions, CosmosClient};
/// use cosmos_client::models::DatabaseProperties;
/// use tokio_util::sync::CancellationToken;
///
/// let config = ClientConfig::new(
///     "https://myaccount.documents.azure.com:443/",
///     std::env::var("COSMOS_KEY")?,
///     ClientOptions::default(),
/// )?;
/// let client = CosmosClient::new(config)?;
/// let cancel = CancellationToken::new();
///
/// let created = client
///     .create_database(DatabaseProperties::new("shop"), Some(400), None, &cancel)
///     .await?;
/// println!("created {} ({} RU)", created.proxy().id(), created.request_charge());
/// ```
#[derive(Clone, Debug)]
pub struct CosmosClient {
    context: Arc<ClientContext>,
}

// Verify CosmosClient is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<CosmosClient>();
};

impl CosmosClient {
    /// Creates a client with the default collaborators.
    ///
    /// # Errors
    ///
    /// Returns [`CosmosError::Transport`] if the HTTP client cannot be
    /// built, or [`CosmosError::Config`] if the key cannot be decoded.
    pub fn new(config: ClientConfig) -> Result<Self, CosmosError> {
        Self::with_collaborators(config, Collaborators::default())
    }

    /// Creates a client with injected collaborators.
    ///
    /// # Errors
    ///
    /// Same as [`CosmosClient::new`].
    pub fn with_collaborators(
        config: ClientConfig,
        collaborators: Collaborators,
    ) -> Result<Self, CosmosError> {
        let context = ClientContext::new(config, collaborators)?;
        Ok(Self {
            context: Arc::new(context),
        })
    }

    /// The account endpoint this client talks to.
    #[must_use]
    pub fn endpoint(&self) -> &AccountEndpoint {
        self.context.config().endpoint()
    }

    /// Returns a proxy for a database. No request is sent.
    #[must_use]
    pub fn database(&self, id: impl Into<String>) -> Database {
        Database::new(Arc::clone(&self.context), id)
    }

    /// Creates a database, optionally provisioning shared throughput.
    ///
    /// # Errors
    ///
    /// Returns [`CosmosError::InvalidArgument`] for an invalid id, a 409
    /// [`CosmosError::Response`] if it already exists, and otherwise the
    /// errors of the response factory.
    pub async fn create_database(
        &self,
        properties: DatabaseProperties,
        throughput: Option<i32>,
        options: Option<RequestOptions>,
        cancel: &CancellationToken,
    ) -> Result<ProxyResponse<Database, DatabaseProperties>, CosmosError> {
        validate_id("database id", &properties.id)?;

        let mut request = build_request(
            ResourceKind::Database,
            OperationKind::Create,
            "",
            options.as_ref(),
        );
        request.add_throughput_header(throughput);
        request.set_body(self.context.encode(ResourceKind::Database, &properties)?);

        let proxy = self.database(properties.id.as_str());
        self.context
            .factory()
            .database(self.context.send(request, cancel), proxy, cancel)
            .await
    }

    /// Enumerates the databases of the account.
    #[must_use]
    pub fn read_databases(&self, options: FeedOptions) -> FeedIterator<DatabaseProperties> {
        self.query_databases(None, options)
    }

    /// Queries the databases of the account; `None` reads the whole feed.
    #[must_use]
    pub fn query_databases(
        &self,
        query: Option<QueryDefinition>,
        options: FeedOptions,
    ) -> FeedIterator<DatabaseProperties> {
        self.context.feed(ResourceKind::Database, "", query, options)
    }

    /// Reads the database account metadata.
    ///
    /// This always goes to the service; use
    /// [`CosmosClient::account_consistency_level`] for the memoized level.
    ///
    /// # Errors
    ///
    /// Returns the errors of the response factory.
    pub async fn read_account(
        &self,
        cancel: &CancellationToken,
    ) -> Result<Response<AccountProperties>, CosmosError> {
        let request = build_request(ResourceKind::DatabaseAccount, OperationKind::Read, "", None);
        self.context
            .factory()
            .account(self.context.send(request, cancel), cancel)
            .await
    }

    /// Returns the account's default consistency level.
    ///
    /// The first call fetches account metadata; later calls are served from
    /// the client's cache.
    ///
    /// # Errors
    ///
    /// Returns the fetch error if the first read fails, or
    /// [`CosmosError::Cancelled`]. Failures are not cached.
    pub async fn account_consistency_level(
        &self,
        cancel: &CancellationToken,
    ) -> Result<ConsistencyLevel, CosmosError> {
        self.context
            .consistency()
            .account_consistency_level(cancel)
            .await
    }
}
