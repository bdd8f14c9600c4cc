//! Paged enumeration of feeds and query results.
//!
//! A [`FeedIterator`] walks a read-feed or query one page at a time. Each
//! [`FeedIterator::read_next`] call sends the continuation token returned by
//! the previous page; when a page arrives without one the iterator is
//! exhausted and further calls fail with [`UsageFault::FeedExhausted`].
//!
//! `read_next` takes `&mut self`, so pages are always requested in order and
//! never concurrently from the same iterator. Iterators cannot be rewound;
//! start a new one to enumerate again, or resume from a saved token with
//! [`FeedOptions::continuation`].
//!
//! # Example
//!
//! ```rust,ignore
//! use cosmos_client::clients::QueryDefinition;
//! use cosmos_client::feed::FeedOptions;
//!
//! let query = QueryDefinition::new("SELECT * FROM c WHERE c.status = @s").with_parameter("@s", "open");
//! let mut orders = container.query_items::<Order>(query, FeedOptions::default())?;
//!
//! while orders.has_more_results() {
//!     let page = orders.read_next(&cancel).await?;
//!     for order in page.iter() {
//!         println!("{}", order.id);
//!     }
//! }
//! ```

use std::fmt;
use std::marker::PhantomData;

use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;

use crate::clients::{
    headers, CosmosError, OperationKind, PartitionKey, QueryDefinition, RequestMessage,
    RequestOptions, ResourceKind, UsageFault,
};
use crate::pipeline::RequestInvoker;
use crate::response::{FeedResponse, ResponseFactory};
use crate::serializer::SerializerRole;

/// Options for a read-feed or query enumeration.
#[derive(Clone, Debug, Default)]
pub struct FeedOptions {
    /// Maximum items per page; the service default applies when unset.
    pub max_item_count: Option<u32>,
    /// Continuation token to resume from.
    pub continuation: Option<String>,
    /// Restricts the enumeration to one logical partition.
    pub partition_key: Option<PartitionKey>,
    /// Allows a query to fan out across partitions.
    pub enable_cross_partition_query: bool,
    /// Session, consistency and metrics options sent on every page.
    pub request: RequestOptions,
}

/// Whether another page can be requested.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FeedState {
    /// Another page may exist.
    HasMore,
    /// The service signalled the end of the feed.
    Exhausted,
}

/// Paging state of one enumeration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FeedCursor {
    continuation: Option<String>,
    max_item_count: Option<u32>,
    state: FeedState,
}

impl FeedCursor {
    /// Creates a cursor positioned before the first page, or at `continuation`.
    #[must_use]
    pub fn new(continuation: Option<String>, max_item_count: Option<u32>) -> Self {
        Self {
            continuation: continuation.filter(|t| !t.is_empty()),
            max_item_count,
            state: FeedState::HasMore,
        }
    }

    /// Token the next page will be requested with.
    #[must_use]
    pub fn continuation(&self) -> Option<&str> {
        self.continuation.as_deref()
    }

    /// Requested page size.
    #[must_use]
    pub const fn max_item_count(&self) -> Option<u32> {
        self.max_item_count
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> FeedState {
        self.state
    }

    /// Moves past a received page.
    fn advance(&mut self, next: Option<&str>) {
        match next.filter(|t| !t.is_empty()) {
            Some(token) => self.continuation = Some(token.to_string()),
            None => {
                self.continuation = None;
                self.state = FeedState::Exhausted;
            }
        }
    }
}

/// Cursor over the pages of a feed.
pub struct FeedIterator<T> {
    invoker: RequestInvoker,
    factory: ResponseFactory,
    kind: ResourceKind,
    address: String,
    query: Option<QueryDefinition>,
    options: FeedOptions,
    cursor: FeedCursor,
    _marker: PhantomData<fn() -> T>,
}

impl<T: DeserializeOwned> FeedIterator<T> {
    /// Creates an iterator over the `kind` feed under `address`.
    ///
    /// With a `query` each page is a query request, otherwise a plain read
    /// feed. Administrative kinds decode with the properties serializer;
    /// items and generic feeds with the user serializer.
    #[must_use]
    pub fn new(
        invoker: RequestInvoker,
        factory: ResponseFactory,
        kind: ResourceKind,
        address: impl Into<String>,
        query: Option<QueryDefinition>,
        options: FeedOptions,
    ) -> Self {
        let cursor = FeedCursor::new(options.continuation.clone(), options.max_item_count);
        Self {
            invoker,
            factory,
            kind,
            address: address.into(),
            query,
            options,
            cursor,
            _marker: PhantomData,
        }
    }

    /// Returns `true` until a page arrives without a continuation token.
    #[must_use]
    pub fn has_more_results(&self) -> bool {
        self.cursor.state() == FeedState::HasMore
    }

    /// Current paging state.
    #[must_use]
    pub const fn cursor(&self) -> &FeedCursor {
        &self.cursor
    }

    /// Fetches the next page.
    ///
    /// On error the cursor does not move, so the same page can be requested
    /// again.
    ///
    /// # Errors
    ///
    /// Returns [`UsageFault::FeedExhausted`] once the feed is exhausted, and
    /// otherwise the errors of [`ResponseFactory::feed`].
    pub async fn read_next(&mut self, cancel: &CancellationToken) -> Result<FeedResponse<T>, CosmosError> {
        if !self.has_more_results() {
            return Err(UsageFault::FeedExhausted.into());
        }

        let request = self.next_request()?;
        let use_properties = self.kind.serializer_role() == SerializerRole::Properties;
        let page = self
            .factory
            .feed(self.invoker.invoke(request, cancel), self.kind, use_properties, cancel)
            .await?;

        self.cursor.advance(page.continuation());
        tracing::debug!(
            resource = %self.kind,
            items = page.count(),
            has_more = self.has_more_results(),
            "feed page received"
        );
        Ok(page)
    }

    fn next_request(&self) -> Result<RequestMessage, CosmosError> {
        let operation = if self.query.is_some() {
            OperationKind::Query
        } else {
            OperationKind::ReadFeed
        };
        let mut request = RequestMessage::new(self.kind, operation, self.address.as_str());

        self.options.request.apply(&mut request);
        if let Some(partition_key) = &self.options.partition_key {
            request.set_partition_key(partition_key);
        }
        if self.options.enable_cross_partition_query {
            request.set_header(headers::ENABLE_CROSS_PARTITION_QUERY, "true");
        }
        request.fill_max_item_count(self.cursor.max_item_count());
        request.fill_continuation_token(self.cursor.continuation());
        if let Some(query) = &self.query {
            request.set_body(query.to_body()?);
        }
        Ok(request)
    }
}

impl<T> fmt::Debug for FeedIterator<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FeedIterator")
            .field("kind", &self.kind)
            .field("address", &self.address)
            .field("query", &self.query)
            .field("cursor", &self.cursor)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cursor_starts_with_more_results() {
        let cursor = FeedCursor::new(None, Some(10));
        assert_eq!(cursor.state(), FeedState::HasMore);
        assert!(cursor.continuation().is_none());
        assert_eq!(cursor.max_item_count(), Some(10));
    }

    #[test]
    fn test_cursor_follows_tokens_then_exhausts() {
        let mut cursor = FeedCursor::new(None, None);
        cursor.advance(Some("t1"));
        assert_eq!(cursor.continuation(), Some("t1"));
        assert_eq!(cursor.state(), FeedState::HasMore);

        cursor.advance(Some(""));
        assert_eq!(cursor.state(), FeedState::Exhausted);
        assert!(cursor.continuation().is_none());
    }

    #[test]
    fn test_cursor_resumes_from_saved_token() {
        let cursor = FeedCursor::new(Some("saved".to_string()), None);
        assert_eq!(cursor.continuation(), Some("saved"));
        assert_eq!(FeedCursor::new(Some(String::new()), None).continuation(), None);
    }
}
