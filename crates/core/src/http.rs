//! Request and response values exchanged between the host, the agent and the
//! network.

use bytes::Bytes;

/// An outbound request as seen by the interception layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    /// HTTP method, compared case-insensitively.
    pub method: String,
    /// Absolute URL or origin-relative path.
    pub url: String,
    /// Accept header, if the caller sent one.
    pub accept: Option<String>,
}

impl Request {
    /// A GET request with no Accept header.
    pub fn get(url: impl Into<String>) -> Self {
        Self { method: "GET".to_string(), url: url.into(), accept: None }
    }

    /// Builder-style Accept header.
    pub fn with_accept(mut self, accept: impl Into<String>) -> Self {
        self.accept = Some(accept.into());
        self
    }
}

/// Response payload: status, a minimal header set, and the body bytes.
///
/// Stored responses are immutable; a re-fetch replaces the whole entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
}

impl Response {
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        Self { status, headers: Vec::new(), body: body.into() }
    }

    /// Synthetic 503 with an empty body, the last resort of network-first.
    pub fn service_unavailable() -> Self {
        Self::new(503, Bytes::new())
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Only plain 200 responses are written to a bucket.
    pub fn is_cacheable(&self) -> bool {
        self.status == 200
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_builder() {
        let req = Request::get("/admin").with_accept("text/html");
        assert_eq!(req.method, "GET");
        assert_eq!(req.accept.as_deref(), Some("text/html"));
    }

    #[test]
    fn test_header_lookup() {
        let resp = Response::new(200, "ok").with_header("Content-Type", "text/css");
        assert_eq!(resp.header("content-type"), Some("text/css"));
        assert_eq!(resp.header("etag"), None);
    }

    #[test]
    fn test_only_200_is_cacheable() {
        assert!(Response::new(200, "").is_cacheable());
        assert!(!Response::new(204, "").is_cacheable());
        assert!(!Response::service_unavailable().is_cacheable());
    }
}
