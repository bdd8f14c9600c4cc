//! The built-in handlers of the default chain.

use std::fmt;
use std::time::{Duration, Instant};

use async_trait::async_trait;

use crate::clients::{headers, CosmosError, RawResponse, RequestMessage, ResourceKind};
use crate::config::{AuthKey, ClientConfig};
use crate::error::ConfigError;
use crate::models::ConsistencyLevel;
use crate::pipeline::auth;
use crate::pipeline::{Next, RequestHandler};

/// Wait used when a throttled response carries no retry-after header.
const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(1);

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// Stamps an activity id on the request and records timing and attempt
/// counts on the response diagnostics.
#[derive(Debug, Default)]
pub struct DiagnosticsHandler;

#[async_trait]
impl RequestHandler for DiagnosticsHandler {
    fn name(&self) -> &'static str {
        "diagnostics"
    }

    async fn send(&self, mut request: RequestMessage, next: Next<'_>) -> Result<RawResponse, CosmosError> {
        let activity_id = request
            .header(headers::ACTIVITY_ID)
            .map_or_else(|| uuid::Uuid::new_v4().to_string(), String::from);
        request.set_header(headers::ACTIVITY_ID, activity_id.as_str());

        let kind = request.resource_kind;
        let operation = request.operation;
        let started = Instant::now();
        let mut response = next.run(request).await?;
        let elapsed = started.elapsed();

        let diagnostics = response.diagnostics_mut();
        diagnostics.set_activity_id(activity_id.as_str());
        diagnostics.set_elapsed(elapsed);
        if diagnostics.attempts() == 0 {
            diagnostics.set_attempts(1);
        }

        tracing::debug!(
            activity_id = %activity_id,
            resource = %kind,
            operation = %operation,
            status = response.status(),
            elapsed_ms = millis(elapsed),
            "operation completed"
        );

        Ok(response)
    }
}

/// Retries throttled requests.
///
/// Status 429 waits for `x-ms-retry-after-ms` (or one second when absent);
/// 449 ("retry with") uses the same policy. After `max_attempts` retries, or
/// once the next wait would push the cumulative wait past `max_wait`, the
/// last response is returned as-is for the factory to turn into an error.
#[derive(Debug)]
pub struct RetryHandler {
    max_attempts: u32,
    max_wait: Duration,
}

impl RetryHandler {
    /// Creates a retry handler.
    #[must_use]
    pub const fn new(max_attempts: u32, max_wait: Duration) -> Self {
        Self {
            max_attempts,
            max_wait,
        }
    }

    const fn is_throttled(status: u16) -> bool {
        matches!(status, 429 | 449)
    }
}

#[async_trait]
impl RequestHandler for RetryHandler {
    fn name(&self) -> &'static str {
        "retry"
    }

    async fn send(&self, request: RequestMessage, next: Next<'_>) -> Result<RawResponse, CosmosError> {
        let mut attempt: u32 = 0;
        let mut waited = Duration::ZERO;

        loop {
            attempt += 1;
            let mut response = next.run(request.clone()).await?;

            let retries_left = attempt <= self.max_attempts;
            if !Self::is_throttled(response.status()) || !retries_left {
                response.diagnostics_mut().set_attempts(attempt);
                return Ok(response);
            }

            let delay = response.retry_after().unwrap_or(DEFAULT_RETRY_DELAY);
            if waited + delay > self.max_wait {
                response.diagnostics_mut().set_attempts(attempt);
                return Ok(response);
            }

            tracing::warn!(
                status = response.status(),
                attempt,
                delay_ms = millis(delay),
                path = %request.path,
                "request throttled, retrying"
            );
            drop(response);

            tokio::select! {
                () = next.cancellation().cancelled() => return Err(CosmosError::Cancelled),
                () = tokio::time::sleep(delay) => {}
            }
            waited += delay;
        }
    }
}

/// Adds the headers every request carries.
///
/// A consistency level set on the request itself wins over the client-wide
/// one.
#[derive(Debug)]
pub struct DefaultHeadersHandler {
    user_agent: String,
    version: String,
    consistency_level: Option<ConsistencyLevel>,
}

impl DefaultHeadersHandler {
    /// Captures the header values from the client configuration.
    #[must_use]
    pub fn new(config: &ClientConfig) -> Self {
        Self {
            user_agent: config.user_agent().to_string(),
            version: config.api_version().to_string(),
            consistency_level: config.options().consistency_level,
        }
    }
}

#[async_trait]
impl RequestHandler for DefaultHeadersHandler {
    fn name(&self) -> &'static str {
        "default-headers"
    }

    async fn send(&self, mut request: RequestMessage, next: Next<'_>) -> Result<RawResponse, CosmosError> {
        request.set_header(headers::USER_AGENT, self.user_agent.as_str());
        request.set_header(headers::VERSION, self.version.as_str());
        request.set_header(headers::ACCEPT, headers::APPLICATION_JSON);
        if let Some(level) = self.consistency_level {
            if request.header(headers::CONSISTENCY_LEVEL).is_none() {
                request.set_header(headers::CONSISTENCY_LEVEL, level.as_str());
            }
        }
        next.run(request).await
    }
}

enum Credential {
    MasterKey(Vec<u8>),
    ResourceToken(String),
}

/// Signs each request with the account key, or attaches the resource token.
///
/// Runs last so every retry gets a fresh `x-ms-date` and signature.
pub struct AuthorizationHandler {
    credential: Credential,
}

impl AuthorizationHandler {
    /// Prepares the signing credential.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidAuthKey`] if a master key is not base64.
    pub fn new(key: &AuthKey) -> Result<Self, ConfigError> {
        let credential = if key.is_resource_token() {
            Credential::ResourceToken(key.as_ref().to_string())
        } else {
            Credential::MasterKey(auth::decode_master_key(key.as_ref())?)
        };
        Ok(Self { credential })
    }

    /// Link the signature covers. Offers are addressed by resource id, which
    /// is signed in lower case.
    fn signing_link(request: &RequestMessage) -> String {
        match request.resource_kind {
            ResourceKind::Throughput => request
                .resource_link
                .rsplit('/')
                .next()
                .unwrap_or_default()
                .to_lowercase(),
            _ => request.resource_link.clone(),
        }
    }

    fn rfc1123_now() -> String {
        chrono::Utc::now()
            .format("%a, %d %b %Y %H:%M:%S GMT")
            .to_string()
    }
}

impl fmt::Debug for AuthorizationHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.credential {
            Credential::MasterKey(_) => "master-key",
            Credential::ResourceToken(_) => "resource-token",
        };
        f.debug_struct("AuthorizationHandler")
            .field("credential", &kind)
            .finish()
    }
}

#[async_trait]
impl RequestHandler for AuthorizationHandler {
    fn name(&self) -> &'static str {
        "authorization"
    }

    async fn send(&self, mut request: RequestMessage, next: Next<'_>) -> Result<RawResponse, CosmosError> {
        let date = Self::rfc1123_now();
        let token = match &self.credential {
            Credential::MasterKey(key) => auth::master_key_token(
                key,
                request.method.as_str(),
                request.resource_kind.path_segment(),
                &Self::signing_link(&request),
                &date,
            ),
            Credential::ResourceToken(token) => auth::resource_token(token),
        };
        request.set_header(headers::DATE, date);
        request.set_header(headers::AUTHORIZATION, token);
        next.run(request).await
    }
}
