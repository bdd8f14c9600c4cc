//! Typed operation results.
//!
//! A raw response that passed the success gate is wrapped into one of:
//!
//! - [`Response<T>`]: a single decoded resource plus response metadata
//! - [`ProxyResponse<P, T>`]: a [`Response<T>`] paired with a proxy for the
//!   resource it describes (for example a `Database` with its properties)
//! - [`FeedResponse<T>`]: one page of a read-feed or query
//!
//! All three are produced by the [`ResponseFactory`]; nothing else
//! constructs them from a failed response.
//!
//! # Example
//!
//! ```rust,ignore
//! let response = container.read_item::<Order>("order-1", &"tenant-1".into(), None, &cancel).await?;
//!
//! println!("charge: {} RU", response.request_charge());
//! if let Some(order) = response.resource() {
//!     println!("total: {}", order.total);
//! }
//!
//! // Pin a later read to this session
//! let session = response.session_token().map(String::from);
//! ```

mod factory;

use std::collections::HashMap;
use std::ops::Deref;

use crate::clients::{headers, Diagnostics, QueryMetadata, RawResponse, ResponseVariant};

pub use factory::ResponseFactory;

fn last<'a>(headers: &'a HashMap<String, Vec<String>>, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|values| values.last())
        .map(String::as_str)
}

/// A decoded single-resource result.
///
/// `resource` is `None` when the service answered with a success status and
/// no body, as delete operations do. This holds for every `T`, collections
/// included; only [`FeedResponse`] turns an empty body into an empty page.
#[derive(Debug, Clone)]
pub struct Response<T> {
    status: u16,
    headers: HashMap<String, Vec<String>>,
    diagnostics: Diagnostics,
    resource: Option<T>,
}

impl<T> Response<T> {
    pub(crate) fn from_raw(raw: &RawResponse, resource: Option<T>) -> Self {
        Self {
            status: raw.status(),
            headers: raw.headers().clone(),
            diagnostics: raw.diagnostics().clone(),
            resource,
        }
    }

    /// HTTP status code.
    #[must_use]
    pub const fn status(&self) -> u16 {
        self.status
    }

    /// Response headers, keyed by lower-case name.
    #[must_use]
    pub const fn headers(&self) -> &HashMap<String, Vec<String>> {
        &self.headers
    }

    /// Returns the last value received for a header.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        last(&self.headers, &name.to_ascii_lowercase())
    }

    /// Pipeline diagnostics.
    #[must_use]
    pub const fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    /// The decoded resource, or `None` if the response had no body.
    #[must_use]
    pub const fn resource(&self) -> Option<&T> {
        self.resource.as_ref()
    }

    /// Consumes the response and returns the decoded resource.
    #[must_use]
    pub fn into_inner(self) -> Option<T> {
        self.resource
    }

    /// Session token to pass on later requests for read-your-writes.
    #[must_use]
    pub fn session_token(&self) -> Option<&str> {
        last(&self.headers, headers::SESSION_TOKEN)
    }

    /// Entity tag of the resource.
    #[must_use]
    pub fn etag(&self) -> Option<&str> {
        last(&self.headers, headers::ETAG)
    }

    /// Service activity id.
    #[must_use]
    pub fn activity_id(&self) -> Option<&str> {
        last(&self.headers, headers::ACTIVITY_ID)
    }

    /// Request units consumed.
    #[must_use]
    pub fn request_charge(&self) -> f64 {
        last(&self.headers, headers::REQUEST_CHARGE)
            .and_then(|v| v.parse().ok())
            .unwrap_or_default()
    }

    /// Maps the decoded resource, keeping the metadata.
    #[must_use]
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Response<U> {
        Response {
            status: self.status,
            headers: self.headers,
            diagnostics: self.diagnostics,
            resource: self.resource.map(f),
        }
    }
}

/// A resource response paired with a proxy for further operations.
///
/// Dereferences to the inner [`Response`].
///
/// # Example
///
/// ```rust,ignore
/// let created = client.create_database("shop", None, &cancel).await?;
/// let container = created.proxy().container("orders");
/// println!("rid: {:?}", created.resource().and_then(|p| p.system.resource_id.as_deref()));
/// ```
#[derive(Debug, Clone)]
pub struct ProxyResponse<P, T> {
    proxy: P,
    response: Response<T>,
}

impl<P, T> ProxyResponse<P, T> {
    pub(crate) const fn new(proxy: P, response: Response<T>) -> Self {
        Self { proxy, response }
    }

    /// The proxy addressing the resource.
    #[must_use]
    pub const fn proxy(&self) -> &P {
        &self.proxy
    }

    /// Splits into the proxy and the response.
    #[must_use]
    pub fn into_parts(self) -> (P, Response<T>) {
        (self.proxy, self.response)
    }
}

impl<P, T> Deref for ProxyResponse<P, T> {
    type Target = Response<T>;

    fn deref(&self) -> &Self::Target {
        &self.response
    }
}

/// One page of a feed.
///
/// Dereferences to the page's items, so it can be iterated and indexed
/// directly.
///
/// # Example
///
/// ```rust,ignore
/// let page = iterator.read_next(&cancel).await?;
/// for order in page.iter() {
///     println!("{}", order.id);
/// }
/// println!("{} items, more: {}", page.count(), page.continuation().is_some());
/// ```
#[derive(Debug, Clone)]
pub struct FeedResponse<T> {
    status: u16,
    headers: HashMap<String, Vec<String>>,
    diagnostics: Diagnostics,
    items: Vec<T>,
    query_metadata: Option<QueryMetadata>,
}

impl<T> FeedResponse<T> {
    pub(crate) fn from_raw(raw: &RawResponse, items: Vec<T>) -> Self {
        let query_metadata = match raw.variant() {
            ResponseVariant::Query(metadata) => Some(metadata.clone()),
            ResponseVariant::ReadFeed | ResponseVariant::Resource => None,
        };
        Self {
            status: raw.status(),
            headers: raw.headers().clone(),
            diagnostics: raw.diagnostics().clone(),
            items,
            query_metadata,
        }
    }

    /// HTTP status code.
    #[must_use]
    pub const fn status(&self) -> u16 {
        self.status
    }

    /// Response headers, keyed by lower-case name.
    #[must_use]
    pub const fn headers(&self) -> &HashMap<String, Vec<String>> {
        &self.headers
    }

    /// Pipeline diagnostics.
    #[must_use]
    pub const fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    /// Number of items on this page.
    #[must_use]
    pub fn count(&self) -> usize {
        self.items.len()
    }

    /// Token for the next page; `None` on the last page.
    #[must_use]
    pub fn continuation(&self) -> Option<&str> {
        last(&self.headers, headers::CONTINUATION).filter(|t| !t.is_empty())
    }

    /// Session token to pass on later requests.
    #[must_use]
    pub fn session_token(&self) -> Option<&str> {
        last(&self.headers, headers::SESSION_TOKEN)
    }

    /// Request units consumed by this page.
    #[must_use]
    pub fn request_charge(&self) -> f64 {
        last(&self.headers, headers::REQUEST_CHARGE)
            .and_then(|v| v.parse().ok())
            .unwrap_or_default()
    }

    /// Query execution metadata, present only on query pages.
    #[must_use]
    pub const fn query_metadata(&self) -> Option<&QueryMetadata> {
        self.query_metadata.as_ref()
    }

    /// Consumes the page and returns its items.
    #[must_use]
    pub fn into_inner(self) -> Vec<T> {
        self.items
    }
}

impl<T> Deref for FeedResponse<T> {
    type Target = [T];

    fn deref(&self) -> &Self::Target {
        &self.items
    }
}

impl<T> IntoIterator for FeedResponse<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(pairs: &[(&str, &str)]) -> RawResponse {
        let mut headers: HashMap<String, Vec<String>> = HashMap::new();
        for (k, v) in pairs {
            headers.entry((*k).to_string()).or_default().push((*v).to_string());
        }
        RawResponse::new(200, "OK", headers, None)
    }

    #[test]
    fn test_response_metadata_accessors() {
        let response = Response::from_raw(
            &raw(&[
                ("x-ms-session-token", "0:7"),
                ("etag", "\"00aa\""),
                ("x-ms-request-charge", "5.71"),
            ]),
            Some(1),
        );
        assert_eq!(response.session_token(), Some("0:7"));
        assert_eq!(response.etag(), Some("\"00aa\""));
        assert!((response.request_charge() - 5.71).abs() < f64::EPSILON);
        assert_eq!(response.header("ETag"), Some("\"00aa\""));
    }

    #[test]
    fn test_response_map_keeps_metadata() {
        let response = Response::from_raw(&raw(&[("x-ms-session-token", "0:1")]), Some(2));
        let mapped = response.map(|n| n * 10);
        assert_eq!(mapped.resource(), Some(&20));
        assert_eq!(mapped.session_token(), Some("0:1"));
    }

    #[test]
    fn test_feed_response_derefs_to_items() {
        let page = FeedResponse::from_raw(&raw(&[("x-ms-continuation", "")]), vec!["a", "b"]);
        assert_eq!(page.len(), 2);
        assert_eq!(page[1], "b");
        assert_eq!(page.count(), 2);
        assert!(page.continuation().is_none());
        assert!(page.query_metadata().is_none());
    }

    #[test]
    fn test_query_page_carries_metadata() {
        let raw = raw(&[]).with_variant(ResponseVariant::Query(QueryMetadata {
            query_metrics: Some("m".to_string()),
            index_utilization: None,
        }));
        let page: FeedResponse<u8> = FeedResponse::from_raw(&raw, Vec::new());
        assert_eq!(
            page.query_metadata().and_then(|m| m.query_metrics.as_deref()),
            Some("m")
        );
    }
}
