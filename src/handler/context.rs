//! Request context
//!
//! Everything a handler reads about the inbound request, captured once and
//! passed in explicitly.

use hyper::body::Bytes;
use hyper::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use hyper::http::request::Parts;
use std::net::SocketAddr;

use super::params::{collect_params, Params};
use crate::http::Verb;

/// Inbound request state, read-only after construction
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub verb: Verb,
    /// Path plus query string, exactly as received
    pub raw_uri: String,
    pub https: bool,
    pub headers: HeaderMap,
    pub params: Params,
    pub body: Bytes,
    pub remote_addr: Option<SocketAddr>,
}

impl RequestContext {
    /// Build a context directly, mostly for embedding and tests
    ///
    /// Parameters come from the query string of `raw_uri`; use the `with_*`
    /// methods to add a body or headers.
    pub fn new(verb: Verb, raw_uri: impl Into<String>) -> Self {
        let raw_uri = raw_uri.into();
        let params = collect_params(query_of(&raw_uri), None, &[]);
        Self {
            verb,
            raw_uri,
            https: false,
            headers: HeaderMap::new(),
            params,
            body: Bytes::new(),
            remote_addr: None,
        }
    }

    /// Build the context from hyper request parts and the collected body
    pub fn from_parts(parts: &Parts, body: Bytes, remote_addr: Option<SocketAddr>) -> Self {
        let raw_uri = parts
            .uri
            .path_and_query()
            .map_or_else(|| parts.uri.path().to_string(), |pq| pq.as_str().to_string());
        let content_type = parts.headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok());
        let params = collect_params(parts.uri.query(), content_type, &body);

        Self {
            verb: Verb::from(&parts.method),
            https: detect_https(parts),
            raw_uri,
            headers: parts.headers.clone(),
            params,
            body,
            remote_addr,
        }
    }

    /// Attach a raw body, merging its pairs when it is form-encoded
    #[must_use]
    pub fn with_body(mut self, content_type: &str, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self.params = collect_params(query_of(&self.raw_uri), Some(content_type), &self.body);
        if let Ok(value) = HeaderValue::from_str(content_type) {
            self.headers.insert(CONTENT_TYPE, value);
        }
        self
    }

    #[must_use]
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    #[must_use]
    pub fn with_https(mut self, https: bool) -> Self {
        self.https = https;
        self
    }

    #[must_use]
    pub fn with_remote_addr(mut self, addr: SocketAddr) -> Self {
        self.remote_addr = Some(addr);
        self
    }
}

fn query_of(raw_uri: &str) -> Option<&str> {
    raw_uri.split_once('?').map(|(_, q)| q)
}

/// HTTPS when the URI says so, a proxy forwarded it, or a CGI-style
/// `HTTPS` header is present and not `off`
fn detect_https(parts: &Parts) -> bool {
    if parts.uri.scheme_str() == Some("https") {
        return true;
    }
    if header_str(parts, "x-forwarded-proto").is_some_and(|p| p.trim().eq_ignore_ascii_case("https")) {
        return true;
    }
    header_str(parts, "https").is_some_and(|v| !v.trim().is_empty() && !v.trim().eq_ignore_ascii_case("off"))
}

fn header_str<'a>(parts: &'a Parts, name: &str) -> Option<&'a str> {
    parts.headers.get(name).and_then(|v| v.to_str().ok())
}
