//! Raw response types returned by the transport.
//!
//! A [`RawResponse`] is the unmaterialized protocol result: status, reason,
//! headers, an optional content stream and opaque [`Diagnostics`]. It is
//! owned by whoever awaited it; its content stream is released exactly once,
//! when the response is dropped, on every exit path.

use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use crate::clients::headers;
use crate::clients::http_request::OperationKind;

/// Diagnostics gathered while a request travelled through the pipeline.
///
/// The contents are informational; the core never branches on them.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Diagnostics {
    activity_id: Option<String>,
    elapsed: Option<Duration>,
    attempts: u32,
}

impl Diagnostics {
    /// Client-generated activity id of the logical operation.
    #[must_use]
    pub fn activity_id(&self) -> Option<&str> {
        self.activity_id.as_deref()
    }

    /// Wall-clock time spent in the pipeline.
    #[must_use]
    pub const fn elapsed(&self) -> Option<Duration> {
        self.elapsed
    }

    /// Number of times the request reached the transport.
    #[must_use]
    pub const fn attempts(&self) -> u32 {
        self.attempts
    }

    pub(crate) fn set_activity_id(&mut self, activity_id: impl Into<String>) {
        self.activity_id = Some(activity_id.into());
    }

    pub(crate) fn set_elapsed(&mut self, elapsed: Duration) {
        self.elapsed = Some(elapsed);
    }

    pub(crate) fn set_attempts(&mut self, attempts: u32) {
        self.attempts = attempts;
    }
}

/// Query execution metadata carried by query responses.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct QueryMetadata {
    /// Raw `x-ms-documentdb-query-metrics` value.
    pub query_metrics: Option<String>,
    /// Raw `x-ms-cosmos-index-utilization` value.
    pub index_utilization: Option<String>,
}

impl QueryMetadata {
    /// Extracts query metadata from response headers.
    #[must_use]
    pub fn from_headers(headers: &HashMap<String, Vec<String>>) -> Self {
        let last = |name: &str| headers.get(name).and_then(|v| v.last()).cloned();
        Self {
            query_metrics: last(headers::QUERY_METRICS),
            index_utilization: last(headers::INDEX_UTILIZATION),
        }
    }
}

/// Explicit tag describing what shape of response this is.
///
/// Set by the handler chain's terminal step from the operation that produced
/// the response, so that feed materialization can dispatch on it with a
/// `match`. Transports may leave it as [`ResponseVariant::Resource`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum ResponseVariant {
    /// A single resource or an empty acknowledgement.
    #[default]
    Resource,
    /// A page of a read-feed enumeration.
    ReadFeed,
    /// A page of query results.
    Query(QueryMetadata),
}

type ReleaseHook = Box<dyn FnOnce() + Send + Sync>;

/// Response body bytes plus the hook that returns the underlying
/// connection resource.
pub struct ContentStream {
    bytes: Vec<u8>,
    release: Option<ReleaseHook>,
}

impl ContentStream {
    fn new(bytes: Vec<u8>) -> Self {
        Self {
            bytes,
            release: None,
        }
    }

    /// Returns the buffered body bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

impl Drop for ContentStream {
    fn drop(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl fmt::Debug for ContentStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContentStream")
            .field("len", &self.bytes.len())
            .field("releasable", &self.release.is_some())
            .finish()
    }
}

/// An unmaterialized response from the service.
///
/// # Example
///
/// ```rust
/// use std::collections::HashMap;
/// use cosmos_client::clients::RawResponse;
///
/// let mut headers = HashMap::new();
/// headers.insert("x-ms-continuation".to_string(), vec!["+RID:abc".to_string()]);
///
/// let response = RawResponse::new(200, "OK", headers, Some(br#"{"Documents":[]}"#.to_vec()));
/// assert!(response.is_success());
/// assert_eq!(response.continuation(), Some("+RID:abc"));
/// ```
#[derive(Debug)]
pub struct RawResponse {
    status: u16,
    reason: String,
    headers: HashMap<String, Vec<String>>,
    content: Option<ContentStream>,
    diagnostics: Diagnostics,
    variant: ResponseVariant,
}

impl RawResponse {
    /// Creates a response. Header names are lower-cased; an empty body is
    /// treated as no content.
    #[must_use]
    pub fn new(
        status: u16,
        reason: impl Into<String>,
        headers: HashMap<String, Vec<String>>,
        body: Option<Vec<u8>>,
    ) -> Self {
        let headers = headers
            .into_iter()
            .fold(HashMap::new(), |mut acc: HashMap<String, Vec<String>>, (k, v)| {
                acc.entry(k.to_ascii_lowercase()).or_default().extend(v);
                acc
            });

        Self {
            status,
            reason: reason.into(),
            headers,
            content: body.filter(|b| !b.is_empty()).map(ContentStream::new),
            diagnostics: Diagnostics::default(),
            variant: ResponseVariant::Resource,
        }
    }

    /// Tags the response shape.
    #[must_use]
    pub fn with_variant(mut self, variant: ResponseVariant) -> Self {
        self.variant = variant;
        self
    }

    /// Registers a hook run exactly once when the content stream is released.
    ///
    /// Responses without content have nothing to release and ignore the hook
    /// after running it immediately.
    #[must_use]
    pub fn with_release_hook(mut self, hook: impl FnOnce() + Send + Sync + 'static) -> Self {
        match self.content.as_mut() {
            Some(content) => content.release = Some(Box::new(hook)),
            None => hook(),
        }
        self
    }

    /// Tags the response shape from the operation that produced it.
    ///
    /// A variant already set by the transport is kept.
    #[must_use]
    pub(crate) fn tagged_for(self, operation: OperationKind) -> Self {
        if self.variant != ResponseVariant::Resource {
            return self;
        }
        let variant = match operation {
            OperationKind::Query => ResponseVariant::Query(QueryMetadata::from_headers(&self.headers)),
            OperationKind::ReadFeed => ResponseVariant::ReadFeed,
            _ => return self,
        };
        self.with_variant(variant)
    }

    /// Returns `true` if the status is in the 200-299 range.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status <= 299
    }

    /// HTTP status code.
    #[must_use]
    pub const fn status(&self) -> u16 {
        self.status
    }

    /// HTTP reason phrase.
    #[must_use]
    pub fn reason(&self) -> &str {
        &self.reason
    }

    /// All response headers, keyed by lower-case name.
    #[must_use]
    pub const fn headers(&self) -> &HashMap<String, Vec<String>> {
        &self.headers
    }

    /// Returns the last value received for a header.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .and_then(|values| values.last())
            .map(String::as_str)
    }

    /// Body bytes, or `None` when the response has no content.
    #[must_use]
    pub fn content(&self) -> Option<&[u8]> {
        self.content.as_ref().map(ContentStream::as_bytes)
    }

    /// Response shape tag.
    #[must_use]
    pub const fn variant(&self) -> &ResponseVariant {
        &self.variant
    }

    /// Diagnostics for this response.
    #[must_use]
    pub const fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    /// Mutable diagnostics, for handlers decorating the response.
    pub fn diagnostics_mut(&mut self) -> &mut Diagnostics {
        &mut self.diagnostics
    }

    /// Continuation token for the next page; empty values count as absent.
    #[must_use]
    pub fn continuation(&self) -> Option<&str> {
        self.header(headers::CONTINUATION).filter(|t| !t.is_empty())
    }

    /// Session token to send on later requests.
    #[must_use]
    pub fn session_token(&self) -> Option<&str> {
        self.header(headers::SESSION_TOKEN)
    }

    /// Service activity id.
    #[must_use]
    pub fn activity_id(&self) -> Option<&str> {
        self.header(headers::ACTIVITY_ID)
    }

    /// Entity tag of the returned resource.
    #[must_use]
    pub fn etag(&self) -> Option<&str> {
        self.header(headers::ETAG)
    }

    /// Request units consumed by the operation.
    #[must_use]
    pub fn request_charge(&self) -> f64 {
        self.header(headers::REQUEST_CHARGE)
            .and_then(|v| v.parse().ok())
            .unwrap_or_default()
    }

    /// Back-off requested by a throttled response.
    #[must_use]
    pub fn retry_after(&self) -> Option<Duration> {
        self.header(headers::RETRY_AFTER_MS)
            .and_then(|v| v.parse::<u64>().ok())
            .map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn headers(pairs: &[(&str, &str)]) -> HashMap<String, Vec<String>> {
        let mut map: HashMap<String, Vec<String>> = HashMap::new();
        for (k, v) in pairs {
            map.entry((*k).to_string()).or_default().push((*v).to_string());
        }
        map
    }

    #[test]
    fn test_is_success_boundaries() {
        for status in [200, 201, 204, 299] {
            assert!(RawResponse::new(status, "", HashMap::new(), None).is_success());
        }
        for status in [100, 199, 300, 304, 404, 500] {
            assert!(!RawResponse::new(status, "", HashMap::new(), None).is_success());
        }
    }

    #[test]
    fn test_empty_body_is_no_content() {
        let response = RawResponse::new(200, "OK", HashMap::new(), Some(Vec::new()));
        assert!(response.content().is_none());
    }

    #[test]
    fn test_header_lookup_is_case_insensitive_and_last_wins() {
        let response = RawResponse::new(
            200,
            "OK",
            headers(&[("X-MS-Session-Token", "0:1"), ("x-ms-session-token", "0:2")]),
            None,
        );
        assert_eq!(response.session_token(), Some("0:2"));
        assert_eq!(response.headers()["x-ms-session-token"].len(), 2);
    }

    #[test]
    fn test_empty_continuation_is_absent() {
        let response = RawResponse::new(200, "OK", headers(&[("x-ms-continuation", "")]), None);
        assert!(response.continuation().is_none());
    }

    #[test]
    fn test_numeric_headers() {
        let response = RawResponse::new(
            429,
            "Too Many Requests",
            headers(&[("x-ms-request-charge", "2.5"), ("x-ms-retry-after-ms", "150")]),
            None,
        );
        assert!((response.request_charge() - 2.5).abs() < f64::EPSILON);
        assert_eq!(response.retry_after(), Some(Duration::from_millis(150)));
    }

    #[test]
    fn test_release_hook_runs_once_on_drop() {
        let released = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&released);
        let response = RawResponse::new(200, "OK", HashMap::new(), Some(b"{}".to_vec()))
            .with_release_hook(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            });

        assert_eq!(released.load(Ordering::SeqCst), 0);
        drop(response);
        assert_eq!(released.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_query_metadata_from_headers() {
        let metadata = QueryMetadata::from_headers(&headers(&[(
            "x-ms-documentdb-query-metrics",
            "totalExecutionTimeInMs=0.5",
        )]));
        assert_eq!(
            metadata.query_metrics.as_deref(),
            Some("totalExecutionTimeInMs=0.5")
        );
        assert!(metadata.index_utilization.is_none());
    }

    #[test]
    fn test_tagged_for_follows_operation() {
        let query = RawResponse::new(
            200,
            "OK",
            headers(&[("x-ms-documentdb-query-metrics", "totalExecutionTimeInMs=0.5")]),
            None,
        )
        .tagged_for(OperationKind::Query);
        match query.variant() {
            ResponseVariant::Query(metadata) => {
                assert_eq!(metadata.query_metrics.as_deref(), Some("totalExecutionTimeInMs=0.5"));
            }
            other => panic!("expected a query variant, got {other:?}"),
        }

        let feed = RawResponse::new(200, "OK", HashMap::new(), None).tagged_for(OperationKind::ReadFeed);
        assert_eq!(feed.variant(), &ResponseVariant::ReadFeed);

        let read = RawResponse::new(200, "OK", HashMap::new(), None).tagged_for(OperationKind::Read);
        assert_eq!(read.variant(), &ResponseVariant::Resource);
    }

    #[test]
    fn test_tagged_for_keeps_transport_variant() {
        let response = RawResponse::new(200, "OK", HashMap::new(), None)
            .with_variant(ResponseVariant::ReadFeed)
            .tagged_for(OperationKind::Query);
        assert_eq!(response.variant(), &ResponseVariant::ReadFeed);
    }
}
