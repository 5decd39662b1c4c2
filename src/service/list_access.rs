//! Windowed access to server-side activity streams
//!
//! A [`PagedListAccess`] describes one query (identity, stream kind, extra
//! parameters) and turns every [`load`](PagedListAccess::load) into a fresh
//! `offset`/`limit` request. Nothing is cached between calls.
//!
//! # Consistency
//!
//! [`size`](PagedListAccess::size) and `load` are independent round trips and
//! the stream may change in between. `size()` followed by `load(0, size)` can
//! legitimately return fewer (or different) items than counted.

use std::fmt;
use std::marker::PhantomData;

use serde::Deserialize;

use super::{decode_many, QueryParams};
use crate::error::{CodecError, Result, ServiceError};
use crate::model::{Activity, Record};
use crate::net::client::{segment, SocialClient};
use crate::net::http::{AuthPolicy, HttpGateway};

const SERVICE: &str = "activity_stream";

/// Which stream of an identity to read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum StreamKind {
    /// Activities posted by or to the identity
    #[default]
    User,
    /// Activities of the spaces the identity belongs to
    Spaces,
    /// Activities of the identity's connections
    Connections,
    /// Everything the identity follows
    Feed,
}

impl StreamKind {
    pub const ALL: [StreamKind; 4] = [
        StreamKind::User,
        StreamKind::Spaces,
        StreamKind::Connections,
        StreamKind::Feed,
    ];

    /// Path segment of the listing endpoint
    pub fn as_str(self) -> &'static str {
        match self {
            StreamKind::User => "user",
            StreamKind::Spaces => "spaces",
            StreamKind::Connections => "connections",
            StreamKind::Feed => "feed",
        }
    }
}

impl fmt::Display for StreamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Half-open range `[start, end)` of a server-side collection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    start: usize,
    end: usize,
}

impl Window {
    /// A window ending before it starts is empty
    pub fn new(start: usize, end: usize) -> Self {
        Self {
            start,
            end: end.max(start),
        }
    }

    pub fn start(&self) -> usize {
        self.start
    }

    pub fn end(&self) -> usize {
        self.end
    }

    /// Number of items requested
    pub fn limit(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.limit() == 0
    }

    /// Drop anything past the window's limit
    pub fn clamp<T>(&self, mut items: Vec<T>) -> Vec<T> {
        if items.len() > self.limit() {
            tracing::debug!(
                "Server returned {} items for a window of {}, truncating",
                items.len(),
                self.limit()
            );
            items.truncate(self.limit());
        }
        items
    }
}

#[derive(Deserialize)]
struct CountResponse {
    #[serde(alias = "size")]
    count: u64,
}

/// Paged view over one identity's activity stream
#[derive(Clone)]
pub struct PagedListAccess<R: Record = Activity> {
    client: SocialClient,
    http: HttpGateway,
    identity_id: String,
    kind: StreamKind,
    params: QueryParams,
    _record: PhantomData<fn() -> R>,
}

impl<R: Record> PagedListAccess<R> {
    pub fn new(client: SocialClient, identity_id: impl Into<String>, kind: StreamKind) -> Self {
        Self::with_params(client, identity_id, kind, QueryParams::new())
    }

    pub fn with_params(
        client: SocialClient,
        identity_id: impl Into<String>,
        kind: StreamKind,
        params: QueryParams,
    ) -> Self {
        Self {
            http: client.gateway(SERVICE),
            client,
            identity_id: identity_id.into(),
            kind,
            params,
            _record: PhantomData,
        }
    }

    pub fn identity_id(&self) -> &str {
        &self.identity_id
    }

    pub fn kind(&self) -> StreamKind {
        self.kind
    }

    pub fn params(&self) -> &QueryParams {
        &self.params
    }

    /// Load items `[start, end)` in server order
    ///
    /// Never returns more than `end - start` items; fewer near the end of
    /// the stream. An empty window returns without a request.
    pub async fn load(&self, start: usize, end: usize) -> Result<Vec<R>> {
        let window = Window::new(start, end);
        if window.is_empty() {
            return Ok(Vec::new());
        }

        tracing::debug!(
            "Loading {} stream of {} [{}, {})",
            self.kind,
            self.identity_id,
            window.start(),
            window.end()
        );

        let offset = window.start().to_string();
        let limit = window.limit().to_string();
        let query = self
            .params
            .iter()
            .chain([("offset", offset.as_str()), ("limit", limit.as_str())]);

        let body = self.fetch(query).await?;
        let items = decode_many(SERVICE, &body)?;
        Ok(window.clamp(items))
    }

    /// Total number of items in the stream, as counted by the server right now
    pub async fn size(&self) -> Result<usize> {
        let query = self.params.iter().chain([("count", "t")]);
        let body = self.fetch(query).await?;

        let response: CountResponse = serde_json::from_str(&body)
            .map_err(|e| ServiceError::parse(SERVICE, CodecError::Parse(e)))?;
        usize::try_from(response.count).map_err(|_| {
            ServiceError::invalid_response(SERVICE, format!("count {} out of range", response.count))
                .into()
        })
    }

    /// Load the whole stream `page_size` items at a time until a short page
    pub async fn load_all(&self, page_size: usize) -> Result<Vec<R>> {
        let page_size = page_size.max(1);
        let mut all_items = Vec::new();
        let mut offset = 0;

        loop {
            let page = self.load(offset, offset.saturating_add(page_size)).await?;
            let count = page.len();
            all_items.extend(page);

            if count < page_size {
                break;
            }
            offset = offset.saturating_add(page_size);
        }

        Ok(all_items)
    }

    async fn fetch<'a>(&self, query: impl IntoIterator<Item = (&'a str, &'a str)>) -> Result<String> {
        let path = format!(
            "activity_stream/{}/{}.json",
            segment(SERVICE, &self.identity_id)?,
            self.kind
        );
        let url = self.client.api_url_with_query(SERVICE, &path, query)?;
        let session = self.client.current_session();
        Ok(self
            .http
            .get(url.as_str(), AuthPolicy::BasicAuth, &session)
            .await?)
    }
}

impl<R: Record> fmt::Debug for PagedListAccess<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PagedListAccess")
            .field("record", &R::NAME)
            .field("identity_id", &self.identity_id)
            .field("kind", &self.kind)
            .field("params", &self.params)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClientConfig;

    #[test]
    fn test_window_bounds() {
        let window = Window::new(10, 15);
        assert_eq!(window.limit(), 5);
        assert!(!window.is_empty());

        let inverted = Window::new(15, 10);
        assert_eq!(inverted.limit(), 0);
        assert!(inverted.is_empty());
    }

    #[test]
    fn test_window_clamp() {
        let window = Window::new(0, 2);
        assert_eq!(window.clamp(vec![1, 2, 3]), vec![1, 2]);
        assert_eq!(window.clamp(vec![1]), vec![1]);
    }

    #[test]
    fn test_stream_kind_paths() {
        let paths: Vec<_> = StreamKind::ALL.iter().map(|k| k.as_str()).collect();
        assert_eq!(paths, vec!["user", "spaces", "connections", "feed"]);
    }

    #[tokio::test]
    async fn test_empty_window_needs_no_server() {
        // Nothing listens on this port; an empty window must not try to connect
        let client = SocialClient::new(ClientConfig::new("http://127.0.0.1:1")).unwrap();
        let access: PagedListAccess = PagedListAccess::new(client, "root", StreamKind::Feed);
        assert!(access.load(5, 5).await.unwrap().is_empty());
        assert!(access.load(5, 2).await.unwrap().is_empty());
    }

    #[test]
    fn test_count_alias() {
        let count: CountResponse = serde_json::from_str(r#"{"size": 7}"#).unwrap();
        assert_eq!(count.count, 7);
    }
}
