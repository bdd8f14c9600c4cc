//! The request handler chain.
//!
//! Every operation travels through an ordered, immutable sequence of
//! [`RequestHandler`]s ending in a [`Transport`]. Each handler receives the
//! request and a [`Next`] continuation; it can rewrite the request, call
//! `next.run(...)` zero or more times, and decorate the response:
//!
//! ```text
//! Diagnostics -> [custom...] -> Retry -> DefaultHeaders -> Authorization -> Transport
//! ```
//!
//! The chain is assembled once by [`PipelineBuilder`] into a
//! [`RequestInvoker`], which is cheap to clone and safe to call from many
//! tasks at once. Handlers keep no per-call state outside the request they
//! are handed.
//!
//! Errors raised anywhere in the chain propagate straight to the caller;
//! there is no unwind step. A response that is dropped on the way out
//! releases its content stream.
//!
//! # Example
//!
//! ```rust,ignore
//! use async_trait::async_trait;
//! use cosmos_client::clients::{CosmosError, RawResponse, RequestMessage};
//! use cosmos_client::pipeline::{Next, RequestHandler};
//!
//! #[derive(Debug)]
//! struct Tagging;
//!
//! #[async_trait]
//! impl RequestHandler for Tagging {
//!     fn name(&self) -> &'static str {
//!         "tagging"
//!     }
//!
//!     async fn send(&self, mut request: RequestMessage, next: Next<'_>) -> Result<RawResponse, CosmosError> {
//!         request.set_header("x-tenant", "blue");
//!         next.run(request).await
//!     }
//! }
//! ```

pub mod auth;
mod handlers;

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::clients::{CosmosError, RawResponse, RequestMessage, Transport};
use crate::config::ClientConfig;
use crate::error::ConfigError;

pub use handlers::{AuthorizationHandler, DefaultHeadersHandler, DiagnosticsHandler, RetryHandler};

/// One stage of the handler chain.
#[async_trait]
pub trait RequestHandler: Send + Sync + fmt::Debug {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Processes `request`, usually forwarding it with `next.run(request)`.
    ///
    /// # Errors
    ///
    /// Any error returned here propagates to the caller of the operation.
    async fn send(&self, request: RequestMessage, next: Next<'_>) -> Result<RawResponse, CosmosError>;
}

/// The remainder of the chain after the current handler.
///
/// `Next` is `Copy`, so a handler that retries can call [`Next::run`] more
/// than once.
#[derive(Clone, Copy)]
pub struct Next<'a> {
    handlers: &'a [Arc<dyn RequestHandler>],
    transport: &'a dyn Transport,
    cancel: &'a CancellationToken,
}

impl<'a> Next<'a> {
    /// Cancellation token of the operation being processed.
    #[must_use]
    pub const fn cancellation(&self) -> &'a CancellationToken {
        self.cancel
    }

    /// Runs the rest of the chain.
    ///
    /// The terminal step races the transport call against cancellation, so a
    /// cancelled operation stops waiting on the network promptly and never
    /// sees a partially received response. Responses to queries and feed
    /// reads are tagged here, so transports return them untagged.
    ///
    /// # Errors
    ///
    /// Returns [`CosmosError::Cancelled`] if the token fires first, otherwise
    /// whatever the downstream handlers or the transport return.
    pub async fn run(self, request: RequestMessage) -> Result<RawResponse, CosmosError> {
        if self.cancel.is_cancelled() {
            return Err(CosmosError::Cancelled);
        }

        match self.handlers.split_first() {
            Some((handler, rest)) => {
                let next = Next {
                    handlers: rest,
                    ..self
                };
                handler.send(request, next).await
            }
            None => {
                let operation = request.operation;
                let response = tokio::select! {
                    biased;
                    () = self.cancel.cancelled() => return Err(CosmosError::Cancelled),
                    result = self.transport.send(request) => result?,
                };
                Ok(response.tagged_for(operation))
            }
        }
    }
}

impl fmt::Debug for Next<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Next")
            .field("remaining", &self.handlers.len())
            .field("transport", &self.transport)
            .finish_non_exhaustive()
    }
}

/// The assembled chain: the single entry point every operation goes through.
///
/// # Thread Safety
///
/// `RequestInvoker` is `Send + Sync` and cheap to clone; clones share the
/// same handlers and transport.
#[derive(Clone)]
pub struct RequestInvoker {
    handlers: Arc<[Arc<dyn RequestHandler>]>,
    transport: Arc<dyn Transport>,
}

// Verify RequestInvoker is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<RequestInvoker>();
};

impl RequestInvoker {
    /// Sends `request` through every handler and the transport.
    ///
    /// # Errors
    ///
    /// Returns [`CosmosError::Cancelled`] when `cancel` fires before a
    /// response arrives, or any error raised by a handler or the transport.
    /// Non-success statuses are returned as `Ok`; the response factory
    /// applies the success gate.
    pub async fn invoke(
        &self,
        request: RequestMessage,
        cancel: &CancellationToken,
    ) -> Result<RawResponse, CosmosError> {
        let next = Next {
            handlers: &self.handlers,
            transport: self.transport.as_ref(),
            cancel,
        };
        next.run(request).await
    }

    /// Names of the handlers, in execution order.
    #[must_use]
    pub fn handler_names(&self) -> Vec<&'static str> {
        self.handlers.iter().map(|h| h.name()).collect()
    }
}

impl fmt::Debug for RequestInvoker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestInvoker")
            .field("handlers", &self.handler_names())
            .field("transport", &self.transport)
            .finish()
    }
}

/// Composes handler chains.
#[derive(Debug)]
pub struct PipelineBuilder;

impl PipelineBuilder {
    /// Freezes an ordered handler sequence in front of `transport`.
    #[must_use]
    pub fn build(
        handlers: impl IntoIterator<Item = Arc<dyn RequestHandler>>,
        transport: Arc<dyn Transport>,
    ) -> RequestInvoker {
        RequestInvoker {
            handlers: handlers.into_iter().collect(),
            transport,
        }
    }

    /// Builds the client's standard chain with `custom` handlers placed after
    /// diagnostics and before retry.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidAuthKey`] if the master key cannot be
    /// decoded.
    pub fn build_default(
        config: &ClientConfig,
        custom: impl IntoIterator<Item = Arc<dyn RequestHandler>>,
        transport: Arc<dyn Transport>,
    ) -> Result<RequestInvoker, ConfigError> {
        let options = config.options();

        let mut handlers: Vec<Arc<dyn RequestHandler>> = vec![Arc::new(DiagnosticsHandler)];
        handlers.extend(custom);
        handlers.push(Arc::new(RetryHandler::new(
            options.max_retry_attempts_on_throttle,
            options.max_retry_wait,
        )));
        handlers.push(Arc::new(DefaultHeadersHandler::new(config)));
        handlers.push(Arc::new(AuthorizationHandler::new(config.auth_key())?));

        Ok(Self::build(handlers, transport))
    }
}
