//! The terminal transport.
//!
//! [`Transport`] is the seam where the network call happens; it sits at the
//! end of the handler chain. [`GatewayTransport`] is the default
//! implementation over `reqwest`. Tests inject in-memory transports instead.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::clients::errors::CosmosError;
use crate::clients::http_request::{HttpMethod, RequestMessage};
use crate::clients::http_response::RawResponse;
use crate::config::{AccountEndpoint, ClientConfig};

/// Sends one request and returns the raw response.
///
/// Implementations return `Ok` for every response the service produced,
/// including non-2xx statuses; the success gate lives in the response factory.
#[async_trait]
pub trait Transport: Send + Sync + std::fmt::Debug {
    /// Performs the network call.
    async fn send(&self, request: RequestMessage) -> Result<RawResponse, CosmosError>;
}

/// HTTP transport talking to the account's gateway endpoint.
///
/// # Thread Safety
///
/// `GatewayTransport` is `Send + Sync`; one instance is shared by every
/// operation of a client.
#[derive(Debug)]
pub struct GatewayTransport {
    client: reqwest::Client,
    endpoint: AccountEndpoint,
}

// Verify GatewayTransport is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<GatewayTransport>();
};

impl GatewayTransport {
    /// Creates a transport for the configured endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`CosmosError::Transport`] if the HTTP client cannot be built
    /// (for example when TLS initialization fails).
    pub fn new(config: &ClientConfig) -> Result<Self, CosmosError> {
        let client = reqwest::Client::builder()
            .use_rustls_tls()
            .timeout(config.options().request_timeout)
            .build()?;

        Ok(Self {
            client,
            endpoint: config.endpoint().clone(),
        })
    }

    /// Returns the endpoint requests are sent to.
    #[must_use]
    pub const fn endpoint(&self) -> &AccountEndpoint {
        &self.endpoint
    }

    /// Parses response headers into a multi-value map keyed by lower-case name.
    fn parse_response_headers(headers: &reqwest::header::HeaderMap) -> HashMap<String, Vec<String>> {
        let mut result: HashMap<String, Vec<String>> = HashMap::new();
        for (name, value) in headers {
            let key = name.as_str().to_lowercase();
            let value = value.to_str().unwrap_or_default().to_string();
            result.entry(key).or_default().push(value);
        }
        result
    }
}

#[async_trait]
impl Transport for GatewayTransport {
    async fn send(&self, request: RequestMessage) -> Result<RawResponse, CosmosError> {
        let url = self.endpoint.join(&request.path);

        let mut builder = match request.method {
            HttpMethod::Get => self.client.get(&url),
            HttpMethod::Post => self.client.post(&url),
            HttpMethod::Put => self.client.put(&url),
            HttpMethod::Delete => self.client.delete(&url),
        };
        for (key, value) in &request.headers {
            builder = builder.header(key, value);
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        tracing::debug!(
            method = %request.method,
            path = %request.path,
            resource = %request.resource_kind,
            operation = %request.operation,
            "sending request"
        );

        let res = builder.send().await?;
        let status = res.status();
        let headers = Self::parse_response_headers(res.headers());
        let body = res.bytes().await?.to_vec();

        let reason = status.canonical_reason().unwrap_or_default();

        Ok(RawResponse::new(status.as_u16(), reason, headers, Some(body)))
    }
}
