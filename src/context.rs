//! Shared client state.
//!
//! One [`ClientContext`] is built per client and shared by every proxy
//! through an `Arc`. Everything in it is read-only after construction except
//! the consistency cache's single memoized value.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::clients::{CosmosError, QueryDefinition, RawResponse, RequestMessage, ResourceKind, Transport};
use crate::config::ClientConfig;
use crate::consistency::{AccountMetadataReader, ConsistencyCache, GatewayAccountReader};
use crate::feed::{FeedIterator, FeedOptions};
use crate::pipeline::{PipelineBuilder, RequestHandler, RequestInvoker};
use crate::response::ResponseFactory;
use crate::serializer::{self, CosmosSerializer, SerializerRole};

/// Collaborators injected when a client is constructed.
///
/// Every field is optional; the defaults are the gateway transport, no
/// custom handlers, plain JSON for items and an account reader that goes
/// through the client's own handler chain.
///
/// # Example
///
/// ```rust,ignore
/// use std::sync::Arc;
/// use cosmos_client::{ClientConfig, ClientOptions, Collaborators, CosmosClient};
///
/// let config = ClientConfig::new("https://localhost:8081", key, ClientOptions::default())?;
/// let client = CosmosClient::with_collaborators(
///     config,
///     Collaborators {
///         handlers: vec![Arc::new(TenantTagging)],
///         user_serializer: Some(Arc::new(MyItemSerializer)),
///         ..Collaborators::default()
///     },
/// )?;
/// ```
#[derive(Debug, Default)]
pub struct Collaborators {
    /// Terminal transport.
    pub transport: Option<Arc<dyn Transport>>,
    /// Custom handlers, run after diagnostics and before retry.
    pub handlers: Vec<Arc<dyn RequestHandler>>,
    /// Serializer for item payloads and stored procedure results.
    pub user_serializer: Option<Arc<dyn CosmosSerializer>>,
    /// Source of account metadata for the consistency cache.
    pub account_reader: Option<Arc<dyn AccountMetadataReader>>,
}

/// State shared by a client and all of its proxies.
pub(crate) struct ClientContext {
    config: ClientConfig,
    invoker: RequestInvoker,
    factory: ResponseFactory,
    consistency: ConsistencyCache,
}

impl ClientContext {
    pub(crate) fn new(config: ClientConfig, collaborators: Collaborators) -> Result<Self, CosmosError> {
        let Collaborators {
            transport,
            handlers,
            user_serializer,
            account_reader,
        } = collaborators;

        let transport: Arc<dyn Transport> = match transport {
            Some(transport) => transport,
            None => Arc::new(crate::clients::GatewayTransport::new(&config)?),
        };
        let invoker = PipelineBuilder::build_default(&config, handlers, transport)?;

        let user_serializer: Arc<dyn CosmosSerializer> = match user_serializer {
            Some(serializer) => serializer,
            None => Arc::new(serializer::JsonSerializer),
        };
        let factory = ResponseFactory::new(user_serializer);

        let account_reader: Arc<dyn AccountMetadataReader> = match account_reader {
            Some(reader) => reader,
            None => Arc::new(GatewayAccountReader::new(invoker.clone(), factory.clone())),
        };
        let consistency = ConsistencyCache::new(account_reader);

        tracing::debug!(
            endpoint = %config.endpoint(),
            handlers = ?invoker.handler_names(),
            "client context initialized"
        );

        Ok(Self {
            config,
            invoker,
            factory,
            consistency,
        })
    }

    pub(crate) const fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub(crate) const fn factory(&self) -> &ResponseFactory {
        &self.factory
    }

    pub(crate) const fn consistency(&self) -> &ConsistencyCache {
        &self.consistency
    }

    /// Sends a request through the chain.
    pub(crate) async fn send(
        &self,
        request: RequestMessage,
        cancel: &CancellationToken,
    ) -> Result<RawResponse, CosmosError> {
        self.invoker.invoke(request, cancel).await
    }

    /// Encodes a payload with the serializer of `kind`'s role.
    pub(crate) fn encode<T: Serialize + ?Sized>(
        &self,
        kind: ResourceKind,
        value: &T,
    ) -> Result<Vec<u8>, CosmosError> {
        serializer::encode(self.factory.serializer(kind.serializer_role()), kind, value)
    }

    /// Encodes a payload with the user serializer regardless of kind.
    pub(crate) fn encode_user<T: Serialize + ?Sized>(
        &self,
        kind: ResourceKind,
        value: &T,
    ) -> Result<Vec<u8>, CosmosError> {
        serializer::encode(self.factory.serializer(SerializerRole::User), kind, value)
    }

    /// Starts a feed over `kind` resources under `address`.
    pub(crate) fn feed<T: serde::de::DeserializeOwned>(
        &self,
        kind: ResourceKind,
        address: impl Into<String>,
        query: Option<QueryDefinition>,
        options: FeedOptions,
    ) -> FeedIterator<T> {
        FeedIterator::new(
            self.invoker.clone(),
            self.factory.clone(),
            kind,
            address,
            query,
            options,
        )
    }
}

impl fmt::Debug for ClientContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientContext")
            .field("endpoint", self.config.endpoint())
            .field("invoker", &self.invoker)
            .field("consistency", &self.consistency)
            .finish_non_exhaustive()
    }
}
