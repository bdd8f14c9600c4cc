//! Resource proxies.
//!
//! A proxy is a cheap handle naming one resource; creating it performs no
//! I/O. Operations on it build a request, send it through the client's
//! handler chain and hand the raw response to the response factory.
//!
//! ```text
//! CosmosClient
//! └── Database
//!     ├── Container
//!     │   └── Scripts (stored procedures, triggers, UDFs)
//!     └── User
//! ```
//!
//! Identifiers are validated when an operation runs, before any request is
//! sent.

mod container;
mod database;
mod path;
mod scripts;
mod user;

use tokio_util::sync::CancellationToken;

use crate::clients::{
    CosmosError, OperationKind, QueryDefinition, RequestMessage, RequestOptions, ResourceKind,
    ResponseError,
};
use crate::context::ClientContext;
use crate::feed::FeedOptions;
use crate::models::{SystemProperties, ThroughputProperties};
use crate::response::Response;

pub use container::Container;
pub use database::Database;
pub use path::{child_link, validate_id};
pub use scripts::Scripts;
pub use user::User;

/// Finds the throughput offer of the resource with `resource_id` (`_rid`).
///
/// Offers are administrative metadata, so the query decodes with the
/// properties serializer even when a custom item serializer is configured.
async fn read_offer(
    context: &ClientContext,
    resource_id: &str,
    cancel: &CancellationToken,
) -> Result<ThroughputProperties, CosmosError> {
    let query = QueryDefinition::new("SELECT * FROM root r WHERE r.offerResourceId = @rid")
        .with_parameter("@rid", resource_id);
    let mut offers = context.feed::<ThroughputProperties>(
        ResourceKind::Throughput,
        "",
        Some(query),
        FeedOptions::default(),
    );

    while offers.has_more_results() {
        let page = offers.read_next(cancel).await?;
        if let Some(offer) = page.into_inner().into_iter().next() {
            return Ok(offer);
        }
    }

    Err(ResponseError {
        status: 404,
        reason: "Not Found".to_string(),
        message: Some(format!("No throughput offer exists for resource '{resource_id}'.")),
        activity_id: None,
        diagnostics: crate::clients::Diagnostics::default(),
    }
    .into())
}

/// Replaces the throughput of the resource with `resource_id`.
async fn replace_offer(
    context: &ClientContext,
    resource_id: &str,
    throughput: i32,
    cancel: &CancellationToken,
) -> Result<Response<ThroughputProperties>, CosmosError> {
    let mut offer = read_offer(context, resource_id, cancel).await?;
    offer.content.offer_throughput = throughput;

    let offer_rid = offer
        .system
        .resource_id
        .clone()
        .unwrap_or_else(|| offer.id.clone());
    let mut request = RequestMessage::new(
        ResourceKind::Throughput,
        OperationKind::Replace,
        format!("offers/{offer_rid}"),
    );
    request.set_body(context.encode(ResourceKind::Throughput, &offer)?);

    context
        .factory()
        .throughput(context.send(request, cancel), cancel)
        .await
}

/// Builds a request and applies the caller's per-operation options.
pub(crate) fn build_request(
    kind: ResourceKind,
    operation: OperationKind,
    address: &str,
    options: Option<&RequestOptions>,
) -> RequestMessage {
    let mut request = RequestMessage::new(kind, operation, address);
    if let Some(options) = options {
        options.apply(&mut request);
    }
    request
}

/// The `_rid` of a resource read back from the service.
fn resource_id_of(kind: ResourceKind, system: &SystemProperties) -> Result<String, CosmosError> {
    system
        .resource_id
        .clone()
        .ok_or_else(|| CosmosError::serialization(kind, "response has no _rid"))
}
