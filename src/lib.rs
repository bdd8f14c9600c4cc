//! # Cosmos Client
//!
//! An async client for a partitioned JSON document database service,
//! built around an ordered request pipeline and a typed response layer.
//!
//! ## Overview
//!
//! This crate provides:
//! - Validated configuration via [`ClientConfig`] and [`ClientOptions`]
//! - A handler chain with diagnostics, throttle retry, default headers and
//!   master-key or resource-token authorization, via [`pipeline`]
//! - Pluggable JSON serialization with separate roles for service metadata
//!   and user payloads, via [`serializer`]
//! - Typed responses and feed pages built by the [`response::ResponseFactory`]
//! - Continuation-driven paging with [`FeedIterator`]
//! - A memoized, single-flight read of the account default consistency level
//! - Resource proxies for databases, containers, items, users, permissions,
//!   throughput offers and server-side scripts
//!
//! ## Quick Start
//!
//! ```rust
//! use cosmos_client::{ClientConfig, ClientOptions};
//!
//! let config = ClientConfig::new(
//!     "https://myaccount.documents.azure.com:443/",
//!     "c2VjcmV0LWtleQ==",
//!     ClientOptions::default(),
//! )
//! .unwrap();
//!
//! assert_eq!(config.endpoint().host_name(), "myaccount.documents.azure.com");
//! ```
//!
//! ## Working With Items
//!
//! ```rust,ignore
//! use cosmos_client::{CosmosClient, FeedOptions, PartitionKey, QueryDefinition};
//! use tokio_util::sync::CancellationToken;
//!
//! let client = CosmosClient::new(config)?;
//! let cancel = CancellationToken::new();
//! let orders = client.database("shop").container("orders");
//!
//! orders
//!     .create_item(&order, &PartitionKey::from("tenant-1"), None, &cancel)
//!     .await?;
//!
//! let query = QueryDefinition::new("SELECT * FROM c WHERE c.total > @min")
//!     .with_parameter("@min", 100);
//! let mut pages = orders.query_items::<Order>(query, FeedOptions::default())?;
//! while pages.has_more_results() {
//!     for order in pages.read_next(&cancel).await? {
//!         println!("{}", order.id);
//!     }
//! }
//! ```
//!
//! ## Design Principles
//!
//! - **No global state**: configuration and derived values live on the client
//! - **Fail-fast validation**: configuration is validated on construction,
//!   resource ids before any request is sent
//! - **Thread-safe**: the client, its proxies and the pipeline are `Send + Sync`
//! - **Cancellable**: every network operation takes a `CancellationToken`
//! - **Injectable**: transport, handlers, serializer and account reader can be
//!   replaced through [`Collaborators`]

pub mod clients;
pub mod config;
pub mod consistency;
pub mod error;
pub mod feed;
pub mod models;
pub mod pipeline;
pub mod resources;
pub mod response;
pub mod serializer;

mod client;
mod context;

// Re-export public types at crate root for convenience
pub use client::CosmosClient;
pub use config::{AccountEndpoint, ApiVersion, AuthKey, ClientConfig, ClientOptions};
pub use context::Collaborators;
pub use error::ConfigError;

// Re-export request and response types
pub use clients::{
    CosmosError, PartitionKey, QueryDefinition, RequestOptions, ResponseError, UsageFault,
};
pub use feed::{FeedIterator, FeedOptions};
pub use response::{FeedResponse, ProxyResponse, Response};
