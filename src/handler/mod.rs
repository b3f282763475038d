//! Request handler module
//!
//! `RequestHandler` is the per-request base: built once from the endpoint
//! configuration and the captured request, it derives the resource
//! segments and the parameter map, then `run` dispatches to the endpoint's
//! verb hook. Every hook ends in exactly one response value.

pub mod context;
pub mod endpoint;
pub mod file;
pub mod params;
pub mod segments;

use hyper::body::Bytes;
use hyper::header::HeaderMap;
use hyper::StatusCode;
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;

use crate::config::EndpointConfig;
use crate::http::{self, ApiResponse, Verb};
use crate::logger;

pub use context::RequestContext;
pub use endpoint::{Endpoint, HandlerResult};
pub use params::Params;

/// State of one request, from capture to response
#[derive(Debug)]
pub struct RequestHandler {
    config: Arc<EndpointConfig>,
    https: bool,
    verb: Verb,
    raw_uri: String,
    segments: Vec<String>,
    params: Params,
    headers: HeaderMap,
    body: Bytes,
}

impl RequestHandler {
    /// Capture the request and run the endpoint's `init` hook
    ///
    /// Reads nothing beyond `ctx` and sends nothing.
    pub fn new<E: Endpoint>(config: Arc<EndpointConfig>, ctx: RequestContext, endpoint: &E) -> Self {
        let segments = segments::extract_segments(
            &ctx.raw_uri,
            &config.base_uri,
            &config.first_resource_separator,
        );

        let mut handler = Self {
            config,
            https: ctx.https,
            verb: ctx.verb,
            raw_uri: ctx.raw_uri,
            segments,
            params: ctx.params,
            headers: ctx.headers,
            body: ctx.body,
        };
        endpoint.init(&mut handler);
        handler
    }

    /// Dispatch to the hook matching the verb
    ///
    /// Unsupported verbs get a 400; a hook error becomes a 500 carrying the
    /// error text.
    pub async fn run<E: Endpoint>(&self, endpoint: &E) -> ApiResponse {
        logger::log_debug(&format!(
            "Dispatching {} {} segments={:?}",
            self.verb, self.raw_uri, self.segments
        ));

        let result = match &self.verb {
            Verb::Get => endpoint.get(self).await,
            Verb::Post => endpoint.post(self).await,
            Verb::Put => endpoint.put(self).await,
            Verb::Patch => endpoint.patch(self).await,
            Verb::Delete => endpoint.delete(self).await,
            Verb::Options => endpoint.options(self).await,
            Verb::Other(name) => {
                logger::log_warning(&format!("Unsupported method: {name} {}", self.raw_uri));
                return http::build_error_response(
                    &format!("unsupported method: {name}"),
                    StatusCode::BAD_REQUEST,
                );
            }
        };

        result.unwrap_or_else(|e| {
            logger::log_error(&format!("{} {} failed: {e}", self.verb, self.raw_uri));
            http::build_error_response(&e.to_string(), StatusCode::INTERNAL_SERVER_ERROR)
        })
    }

    /// 200 JSON response
    pub fn send_json<T: Serialize + ?Sized>(&self, payload: &T) -> HandlerResult {
        self.send_json_with_status(payload, StatusCode::OK)
    }

    pub fn send_json_with_status<T: Serialize + ?Sized>(
        &self,
        payload: &T,
        status: StatusCode,
    ) -> HandlerResult {
        Ok(http::build_json_response(payload, status)?)
    }

    /// 400 `{"error": message}` response
    pub fn send_error(&self, message: &str) -> HandlerResult {
        self.send_error_with_status(message, StatusCode::BAD_REQUEST)
    }

    pub fn send_error_with_status(&self, message: &str, status: StatusCode) -> HandlerResult {
        Ok(http::build_error_response(message, status))
    }

    /// Stream a file as a download; see [`file::send_file`]
    pub async fn send_file(
        &self,
        path: impl AsRef<Path>,
        download_name: &str,
        size: Option<u64>,
        mime_type: Option<&str>,
    ) -> HandlerResult {
        file::send_file(path.as_ref(), download_name, size, mime_type).await
    }

    /// The whole raw body; no size limit applies at this level
    pub const fn read_request_body(&self) -> &Bytes {
        &self.body
    }

    /// Look up a parameter, see [`params::lookup`]
    pub fn get_param<'a>(
        &'a self,
        name: &str,
        default: Option<&'a str>,
        fallback: Option<&'a Params>,
    ) -> Option<&'a str> {
        params::lookup(&self.params, name, default, fallback)
    }

    pub fn param(&self, name: &str) -> Option<&str> {
        self.get_param(name, None, None)
    }

    pub fn config(&self) -> &EndpointConfig {
        &self.config
    }

    pub const fn is_https(&self) -> bool {
        self.https
    }

    pub const fn verb(&self) -> &Verb {
        &self.verb
    }

    pub fn raw_uri(&self) -> &str {
        &self.raw_uri
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn segment(&self, index: usize) -> Option<&str> {
        self.segments.get(index).map(String::as_str)
    }

    pub const fn params(&self) -> &Params {
        &self.params
    }

    /// For `init` hooks that normalise or inject parameters
    pub fn params_mut(&mut self) -> &mut Params {
        &mut self.params
    }

    pub const fn headers(&self) -> &HeaderMap {
        &self.headers
    }
}
