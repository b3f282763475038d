// Connection handling module
// Accepts a TCP connection, serves HTTP/1.1 on it and turns every request into one handler run

use http_body_util::{BodyExt, Limited};
use hyper::body::{Body, Bytes};
use hyper::header::{HeaderMap, HeaderValue, CONTENT_LENGTH, REFERER, SERVER, USER_AGENT};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, StatusCode};
use hyper_util::rt::{TokioIo, TokioTimer};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::{AppState, HttpConfig};
use crate::handler::{Endpoint, RequestContext, RequestHandler};
use crate::http::{build_error_response, ApiResponse};
use crate::logger::{self, AccessLogEntry};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Accept a connection unless the connection cap is reached, then serve it
/// on its own task.
pub fn accept_connection<E: Endpoint + 'static>(
    stream: tokio::net::TcpStream,
    peer_addr: SocketAddr,
    state: &Arc<AppState>,
    endpoint: &Arc<E>,
) {
    // Increment first, then check, so concurrent accepts cannot both slip under the cap
    let prev_count = state.active_connections.fetch_add(1, Ordering::SeqCst);

    if let Some(max_conn) = state.config.server.max_connections {
        if prev_count >= usize::try_from(max_conn).unwrap_or(usize::MAX) {
            state.active_connections.fetch_sub(1, Ordering::SeqCst);
            logger::log_warning(&format!(
                "Max connections reached: {prev_count}/{max_conn}. Rejected {peer_addr}"
            ));
            drop(stream);
            return;
        }
    }

    logger::log_debug(&format!("Accepted connection from {peer_addr}"));
    serve_connection(stream, peer_addr, Arc::clone(state), Arc::clone(endpoint));
}

fn serve_connection<E: Endpoint + 'static>(
    stream: tokio::net::TcpStream,
    peer_addr: SocketAddr,
    state: Arc<AppState>,
    endpoint: Arc<E>,
) {
    tokio::spawn(async move {
        let io = TokioIo::new(stream);
        let timeout = Duration::from_secs(state.config.server.request_timeout);

        // The timeout covers reading request headers (including keep-alive
        // idle time); streamed response bodies are never cut off
        let mut builder = http1::Builder::new();
        builder
            .timer(TokioTimer::new())
            .header_read_timeout(timeout)
            .keep_alive(true);

        let service_state = Arc::clone(&state);
        let conn = builder.serve_connection(
            io,
            service_fn(move |req| {
                handle_request(
                    req,
                    Some(peer_addr),
                    Arc::clone(&service_state),
                    Arc::clone(&endpoint),
                )
            }),
        );

        if let Err(err) = conn.await {
            if err.is_timeout() {
                logger::log_warning(&format!(
                    "Connection from {peer_addr} sent no request within {} seconds",
                    timeout.as_secs()
                ));
            } else {
                logger::log_connection_error(&err);
            }
        }

        state.active_connections.fetch_sub(1, Ordering::SeqCst);
    });
}

/// Turn one HTTP request into a `RequestHandler` run
///
/// Oversized bodies are refused with 413 before the handler is built. The
/// response gets the server-wide headers and an access log line.
pub async fn handle_request<B, E>(
    req: Request<B>,
    peer_addr: Option<SocketAddr>,
    state: Arc<AppState>,
    endpoint: Arc<E>,
) -> Result<ApiResponse, Infallible>
where
    B: Body + Send,
    B::Data: Send,
    B::Error: Into<BoxError>,
    E: Endpoint,
{
    let started = Instant::now();
    let (parts, body) = req.into_parts();
    let max_body_size = state.config.http.max_body_size;

    let (mut response, https) = if let Some(resp) = check_body_size(&parts.headers, max_body_size) {
        (resp, false)
    } else {
        match collect_body(body, max_body_size).await {
            Ok(bytes) => {
                let ctx = RequestContext::from_parts(&parts, bytes, peer_addr);
                let handler = RequestHandler::new(Arc::clone(&state.endpoint), ctx, endpoint.as_ref());
                let response = handler.run(endpoint.as_ref()).await;
                (response, handler.is_https())
            }
            Err(resp) => (resp, false),
        }
    };

    apply_server_headers(&mut response, &state.config.http);

    if state.config.logging.access_log {
        let mut entry = AccessLogEntry::new(
            peer_addr.map_or_else(|| "-".to_string(), |a| a.ip().to_string()),
            parts.method.to_string(),
            parts.uri.path().to_string(),
        );
        entry.query = parts.uri.query().map(ToString::to_string);
        entry.http_version = http_version(parts.version).to_string();
        entry.https = https;
        entry.status = response.status().as_u16();
        entry.body_bytes = header_u64(response.headers(), CONTENT_LENGTH.as_str()).unwrap_or(0);
        entry.referer = header_string(&parts.headers, REFERER.as_str());
        entry.user_agent = header_string(&parts.headers, USER_AGENT.as_str());
        entry.request_time_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);
        logger::log_access(&entry, &state.config.logging.access_log_format);
    }

    Ok(response)
}

/// Refuse early when the declared `Content-Length` exceeds the limit
fn check_body_size(headers: &HeaderMap, max_body_size: u64) -> Option<ApiResponse> {
    let content_length = headers.get(CONTENT_LENGTH)?;
    match content_length.to_str().ok().map(str::parse::<u64>) {
        Some(Ok(size)) if size > max_body_size => {
            logger::log_warning(&format!(
                "Request body too large: {size} bytes (max: {max_body_size})"
            ));
            Some(payload_too_large())
        }
        Some(Ok(_)) => None,
        _ => {
            logger::log_warning("Invalid Content-Length header, relying on streamed limit");
            None
        }
    }
}

/// Read the whole body, enforcing the limit even without `Content-Length`
async fn collect_body<B>(body: B, max_body_size: u64) -> Result<Bytes, ApiResponse>
where
    B: Body + Send,
    B::Data: Send,
    B::Error: Into<BoxError>,
{
    let limit = usize::try_from(max_body_size).unwrap_or(usize::MAX);
    match Limited::new(body, limit).collect().await {
        Ok(collected) => Ok(collected.to_bytes()),
        Err(e) if e.is::<http_body_util::LengthLimitError>() => {
            logger::log_warning(&format!("Request body exceeded {max_body_size} bytes"));
            Err(payload_too_large())
        }
        Err(e) => {
            logger::log_warning(&format!("Failed to read request body: {e}"));
            Err(build_error_response(
                "failed to read request body",
                StatusCode::BAD_REQUEST,
            ))
        }
    }
}

fn payload_too_large() -> ApiResponse {
    build_error_response("request body too large", StatusCode::PAYLOAD_TOO_LARGE)
}

fn apply_server_headers(response: &mut ApiResponse, http: &HttpConfig) {
    let headers = response.headers_mut();
    if let Ok(value) = HeaderValue::from_str(&http.server_name) {
        headers.insert(SERVER, value);
    }
    if http.enable_cors {
        headers.insert(
            "Access-Control-Allow-Origin",
            HeaderValue::from_static("*"),
        );
    }
}

const fn http_version(version: hyper::Version) -> &'static str {
    match version {
        hyper::Version::HTTP_09 => "0.9",
        hyper::Version::HTTP_10 => "1.0",
        hyper::Version::HTTP_2 => "2",
        hyper::Version::HTTP_3 => "3",
        _ => "1.1",
    }
}

fn header_string(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(ToString::to_string)
}

fn header_u64(headers: &HeaderMap, name: &str) -> Option<u64> {
    headers.get(name)?.to_str().ok()?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::handler::HandlerResult;
    use http_body_util::Full;
    use serde_json::{json, Value};

    struct Echo;

    impl Endpoint for Echo {
        async fn get(&self, handler: &RequestHandler) -> HandlerResult {
            handler.send_json(&json!({ "segments": handler.segments() }))
        }

        async fn post(&self, handler: &RequestHandler) -> HandlerResult {
            handler.send_json(&json!({
                "name": handler.param("name"),
                "bytes": handler.read_request_body().len(),
            }))
        }

        async fn put(&self, handler: &RequestHandler) -> HandlerResult {
            handler.send_error("read-only")
        }

        async fn patch(&self, handler: &RequestHandler) -> HandlerResult {
            handler.send_error("read-only")
        }

        async fn delete(&self, handler: &RequestHandler) -> HandlerResult {
            handler.send_error("read-only")
        }

        async fn options(&self, handler: &RequestHandler) -> HandlerResult {
            handler.send_json(&["GET", "POST"])
        }
    }

    fn state(max_body_size: u64, enable_cors: bool) -> Arc<AppState> {
        let mut cfg = Config::load_from("/nonexistent/restpoint-config").unwrap();
        cfg.http.max_body_size = max_body_size;
        cfg.http.enable_cors = enable_cors;
        cfg.logging.access_log = false;
        Arc::new(AppState::new(&cfg))
    }

    async fn send(req: Request<Full<Bytes>>, state: Arc<AppState>) -> (ApiResponse, Value) {
        let response = handle_request(req, None, state, Arc::new(Echo)).await.unwrap();
        let (parts, body) = response.into_parts();
        let bytes = body.collect().await.unwrap().to_bytes();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (ApiResponse::from_parts(parts, crate::http::empty_body()), value)
    }

    #[tokio::test]
    async fn test_request_reaches_endpoint() {
        let req = Request::builder()
            .uri("/api/widgets/42?x=1")
            .body(Full::new(Bytes::new()))
            .unwrap();
        let (response, body) = send(req, state(1024, false)).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body, json!({ "segments": ["widgets", "42"] }));
        assert_eq!(response.headers()[SERVER], "restpoint/0.1");
        assert!(response.headers().get("Access-Control-Allow-Origin").is_none());
    }

    #[tokio::test]
    async fn test_form_post_params() {
        let req = Request::builder()
            .method("POST")
            .uri("/api/people?name=query")
            .header("content-type", "application/x-www-form-urlencoded")
            .body(Full::new(Bytes::from_static(b"name=Ren%C3%A9e")))
            .unwrap();
        let (_, body) = send(req, state(1024, true)).await;
        assert_eq!(body, json!({ "name": "Renée", "bytes": 15 }));
    }

    #[tokio::test]
    async fn test_declared_oversized_body_rejected() {
        let req = Request::builder()
            .method("POST")
            .uri("/api/upload")
            .header("content-length", "4096")
            .body(Full::new(Bytes::from(vec![b'x'; 4096])))
            .unwrap();
        let (response, body) = send(req, state(16, false)).await;
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(body["error"], "request body too large");
    }

    #[tokio::test]
    async fn test_undeclared_oversized_body_rejected() {
        let req = Request::builder()
            .method("POST")
            .uri("/api/upload")
            .body(Full::new(Bytes::from(vec![b'x'; 64])))
            .unwrap();
        let (response, _) = send(req, state(16, false)).await;
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn test_cors_header_when_enabled() {
        let req = Request::builder()
            .method("OPTIONS")
            .uri("/api")
            .body(Full::new(Bytes::new()))
            .unwrap();
        let (response, _) = send(req, state(1024, true)).await;
        assert_eq!(response.headers()["Access-Control-Allow-Origin"], "*");
    }

    #[test]
    fn test_version_labels() {
        assert_eq!(http_version(hyper::Version::HTTP_10), "1.0");
        assert_eq!(http_version(hyper::Version::HTTP_11), "1.1");
    }
}
