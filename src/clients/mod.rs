//! Protocol-level client types.
//!
//! This module holds the request and response model that flows through the
//! handler chain, plus the terminal transport:
//!
//! - [`RequestMessage`]: one request, built from a [`ResourceKind`] and an
//!   [`OperationKind`]
//! - [`RequestOptions`]: per-operation headers (session, consistency, etags)
//! - [`RawResponse`]: the unmaterialized response with its [`ResponseVariant`]
//! - [`Transport`], [`GatewayTransport`]: the network seam
//! - [`CosmosError`]: the unified operation error
//!
//! # Example
//!
//! ```rust
//! use cosmos_client::clients::{OperationKind, PartitionKey, RequestMessage, ResourceKind};
//!
//! let mut request = RequestMessage::new(
//!     ResourceKind::Item,
//!     OperationKind::Read,
//!     "dbs/shop/colls/orders/docs/order-1",
//! );
//! request.set_partition_key(&PartitionKey::from("tenant-1"));
//! assert_eq!(request.path, "dbs/shop/colls/orders/docs/order-1");
//! ```

mod errors;
pub mod headers;
mod http_client;
mod http_request;
mod http_response;

pub use errors::{CosmosError, ResponseError, SerializationError, UsageFault};
pub use http_client::{GatewayTransport, Transport};
pub use http_request::{
    HttpMethod, OperationKind, PartitionKey, QueryDefinition, QueryParameter, RequestMessage,
    RequestOptions, ResourceKind,
};
pub use http_response::{ContentStream, Diagnostics, QueryMetadata, RawResponse, ResponseVariant};
