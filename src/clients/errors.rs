//! Operation error types.
//!
//! Every operation in the crate returns [`CosmosError`]. Its variants
//! separate the four failure classes callers branch on:
//!
//! - [`CosmosError::InvalidArgument`]: rejected before any network call
//! - [`CosmosError::Response`]: the service answered with a non-2xx status
//! - [`CosmosError::Serialization`]: a 2xx body could not be decoded
//! - [`CosmosError::Usage`]: the API was driven incorrectly
//!
//! plus [`CosmosError::Cancelled`] and [`CosmosError::Transport`] for calls
//! that never produced a response.
//!
//! # Example
//!
//! ```rust,ignore
//! use cosmos_client::CosmosError;
//!
//! match container.read_item::<Order>("order-1", &"tenant-1".into(), None, &cancel).await {
//!     Ok(response) => println!("{:?}", response.resource()),
//!     Err(CosmosError::Response(e)) if e.status == 404 => println!("missing"),
//!     Err(CosmosError::Response(e)) if e.is_transient() => println!("retry later"),
//!     Err(e) => return Err(e.into()),
//! }
//! ```

use thiserror::Error;

use crate::clients::http_request::ResourceKind;
use crate::clients::http_response::{Diagnostics, RawResponse};
use crate::error::ConfigError;

/// The service answered with a status outside 200-299.
#[derive(Debug, Clone, Error)]
#[error("Response status code does not indicate success: {status} Reason: ({reason}).")]
pub struct ResponseError {
    /// HTTP status code.
    pub status: u16,
    /// HTTP reason phrase.
    pub reason: String,
    /// Error message from the response body, if any.
    pub message: Option<String>,
    /// Activity id of the failed request.
    pub activity_id: Option<String>,
    /// Diagnostics captured for the failed request.
    pub diagnostics: Diagnostics,
}

impl ResponseError {
    /// Builds the error from a failed response without consuming its body
    /// through a serializer.
    #[must_use]
    pub fn from_response(response: &RawResponse) -> Self {
        let message = response.content().and_then(|bytes| {
            serde_json::from_slice::<serde_json::Value>(bytes)
                .ok()
                .and_then(|body| body.get("message").and_then(|m| m.as_str()).map(String::from))
        });

        Self {
            status: response.status(),
            reason: response.reason().to_string(),
            message,
            activity_id: response.activity_id().map(String::from),
            diagnostics: response.diagnostics().clone(),
        }
    }

    /// Returns `true` for statuses worth retrying later.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self.status, 408 | 410 | 429 | 449 | 500 | 503)
    }
}

/// A successful response body could not be decoded.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Failed to decode {kind} payload: {message}")]
pub struct SerializationError {
    /// Kind of resource being decoded or encoded.
    pub kind: ResourceKind,
    /// Underlying serializer message.
    pub message: String,
}

/// The API was driven in a way it does not support.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum UsageFault {
    /// `read_next` was called on an exhausted feed iterator.
    #[error("The feed iterator has no more results. Check has_more_results() before calling read_next().")]
    FeedExhausted,
}

/// Unified error type for all operations.
#[derive(Debug, Error)]
pub enum CosmosError {
    /// A required input was missing or malformed.
    #[error("Invalid argument '{name}': {reason}")]
    InvalidArgument {
        /// Parameter name.
        name: &'static str,
        /// Why it was rejected.
        reason: String,
    },

    /// Non-success status from the service.
    #[error(transparent)]
    Response(#[from] ResponseError),

    /// Decode or encode failure.
    #[error(transparent)]
    Serialization(#[from] SerializationError),

    /// Misuse of the API.
    #[error(transparent)]
    Usage(#[from] UsageFault),

    /// The operation was cancelled before a response was received.
    #[error("The operation was cancelled.")]
    Cancelled,

    /// Network or connection failure in the default transport.
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Invalid configuration.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl CosmosError {
    /// Shorthand for [`CosmosError::InvalidArgument`].
    #[must_use]
    pub fn invalid_argument(name: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            name,
            reason: reason.into(),
        }
    }

    /// Shorthand for [`CosmosError::Serialization`].
    #[must_use]
    pub fn serialization(kind: ResourceKind, message: impl Into<String>) -> Self {
        Self::Serialization(SerializationError {
            kind,
            message: message.into(),
        })
    }

    /// Returns the service status code if this is a response error.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Response(e) => Some(e.status),
            _ => None,
        }
    }
}

// Verify CosmosError is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<CosmosError>();
};
