//! Account default consistency, fetched once per client.
//!
//! The [`ConsistencyCache`] asks an [`AccountMetadataReader`] for the account
//! properties the first time the consistency level is needed and memoizes
//! the result for the lifetime of the client. There is no invalidation path.
//!
//! The fetch is single-flight: concurrent first callers wait on the same
//! in-flight read instead of racing their own. A failed or cancelled fetch is
//! not memoized, so the next call tries again.
//!
//! # Example
//!
//! ```rust,ignore
//! let level = client.account_consistency_level(&cancel).await?;
//! if level == ConsistencyLevel::Session {
//!     // carry session tokens between requests
//! }
//! ```

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::OnceCell;
use tokio_util::sync::CancellationToken;

use crate::clients::{CosmosError, OperationKind, RequestMessage, ResourceKind};
use crate::models::{AccountConsistency, AccountProperties, ConsistencyLevel};
use crate::pipeline::RequestInvoker;
use crate::response::ResponseFactory;

/// Fetches account metadata.
#[async_trait]
pub trait AccountMetadataReader: Send + Sync + fmt::Debug {
    /// Reads the database account properties.
    ///
    /// # Errors
    ///
    /// Returns whatever error the underlying fetch produced.
    async fn read_account(&self, cancel: &CancellationToken) -> Result<AccountProperties, CosmosError>;
}

/// Reads account metadata from the account root through the handler chain.
#[derive(Debug, Clone)]
pub struct GatewayAccountReader {
    invoker: RequestInvoker,
    factory: ResponseFactory,
}

impl GatewayAccountReader {
    /// Creates a reader sharing the client's chain and factory.
    #[must_use]
    pub const fn new(invoker: RequestInvoker, factory: ResponseFactory) -> Self {
        Self { invoker, factory }
    }
}

#[async_trait]
impl AccountMetadataReader for GatewayAccountReader {
    async fn read_account(&self, cancel: &CancellationToken) -> Result<AccountProperties, CosmosError> {
        let request = RequestMessage::new(ResourceKind::DatabaseAccount, OperationKind::Read, "");
        let response = self
            .factory
            .account(self.invoker.invoke(request, cancel), cancel)
            .await?;
        response.into_inner().ok_or_else(|| {
            CosmosError::serialization(ResourceKind::DatabaseAccount, "account response has no body")
        })
    }
}

/// Memoized account consistency settings.
pub struct ConsistencyCache {
    reader: Arc<dyn AccountMetadataReader>,
    cached: OnceCell<AccountConsistency>,
}

impl ConsistencyCache {
    /// Creates an empty cache backed by `reader`.
    #[must_use]
    pub fn new(reader: Arc<dyn AccountMetadataReader>) -> Self {
        Self {
            reader,
            cached: OnceCell::new(),
        }
    }

    /// Returns the account consistency policy, fetching it on first use.
    ///
    /// # Errors
    ///
    /// Returns the reader's error on a failed fetch, or
    /// [`CosmosError::Cancelled`] if `cancel` fires first. Neither is cached.
    pub async fn account_consistency(
        &self,
        cancel: &CancellationToken,
    ) -> Result<&AccountConsistency, CosmosError> {
        if let Some(consistency) = self.cached.get() {
            tracing::trace!(level = %consistency.default_consistency_level, "consistency cache hit");
            return Ok(consistency);
        }

        // A caller waiting on another caller's fetch still honors its own token.
        let fetch = self.cached.get_or_try_init(|| async {
            tracing::debug!("fetching account consistency");
            let account = self.reader.read_account(cancel).await?;
            Ok::<_, CosmosError>(account.user_consistency_policy)
        });

        tokio::select! {
            biased;
            () = cancel.cancelled() => Err(CosmosError::Cancelled),
            result = fetch => result,
        }
    }

    /// Returns the account's default consistency level.
    ///
    /// # Errors
    ///
    /// Same as [`ConsistencyCache::account_consistency`].
    pub async fn account_consistency_level(
        &self,
        cancel: &CancellationToken,
    ) -> Result<ConsistencyLevel, CosmosError> {
        Ok(self
            .account_consistency(cancel)
            .await?
            .default_consistency_level)
    }

    /// Returns the memoized value without fetching.
    #[must_use]
    pub fn cached(&self) -> Option<&AccountConsistency> {
        self.cached.get()
    }
}

impl fmt::Debug for ConsistencyCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConsistencyCache")
            .field("reader", &self.reader)
            .field("cached", &self.cached.get())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug, Default)]
    struct Flaky {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl AccountMetadataReader for Flaky {
        async fn read_account(&self, _cancel: &CancellationToken) -> Result<AccountProperties, CosmosError> {
            if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
                return Err(CosmosError::invalid_argument("endpoint", "unreachable"));
            }
            let mut account = AccountProperties::default();
            account.user_consistency_policy.default_consistency_level = ConsistencyLevel::Strong;
            Ok(account)
        }
    }

    #[tokio::test]
    async fn test_failure_is_not_cached() {
        let reader = Arc::new(Flaky::default());
        let cache = ConsistencyCache::new(reader.clone());
        let cancel = CancellationToken::new();

        assert!(cache.account_consistency_level(&cancel).await.is_err());
        assert!(cache.cached().is_none());

        let level = cache.account_consistency_level(&cancel).await.unwrap();
        assert_eq!(level, ConsistencyLevel::Strong);
        assert_eq!(reader.calls.load(Ordering::SeqCst), 2);
    }
}
