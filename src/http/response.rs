//! HTTP response building module
//!
//! Builders for the three response shapes an endpoint can produce: JSON
//! payloads, JSON error payloads and file attachments. Builder failures are
//! logged and degrade to an empty 500 instead of panicking.

use crate::logger;
use http_body_util::{combinators::UnsyncBoxBody, BodyExt, Empty, Full};
use hyper::body::Bytes;
use hyper::{Response, StatusCode};
use serde::Serialize;

/// Body type shared by buffered JSON and streamed file responses
pub type ResponseBody = UnsyncBoxBody<Bytes, std::io::Error>;

/// Terminal response value returned by endpoint hooks
pub type ApiResponse = Response<ResponseBody>;

pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Wrap an in-memory buffer as a response body
pub fn full_body(data: impl Into<Bytes>) -> ResponseBody {
    Full::new(data.into()).map_err(|never| match never {}).boxed_unsync()
}

pub fn empty_body() -> ResponseBody {
    Empty::<Bytes>::new().map_err(|never| match never {}).boxed_unsync()
}

/// Serialize `payload` as compact JSON with the given status
///
/// `serde_json` leaves non-ASCII characters unescaped, so UTF-8 text goes
/// out as written.
pub fn build_json_response<T>(payload: &T, status: StatusCode) -> Result<ApiResponse, serde_json::Error>
where
    T: Serialize + ?Sized,
{
    let json = serde_json::to_vec(payload)?;
    Ok(json_bytes_response(status, json))
}

/// Build `{"error": message}` with the given status
pub fn build_error_response(message: &str, status: StatusCode) -> ApiResponse {
    let body = serde_json::json!({ "error": message });
    json_bytes_response(status, body.to_string().into_bytes())
}

fn json_bytes_response(status: StatusCode, json: Vec<u8>) -> ApiResponse {
    let content_length = json.len();
    Response::builder()
        .status(status)
        .header("Content-Type", JSON_CONTENT_TYPE)
        .header("Content-Length", content_length)
        .body(full_body(json))
        .unwrap_or_else(|e| {
            log_build_error(status.as_str(), &e);
            internal_error_fallback()
        })
}

/// Build a download response around an already-prepared body
///
/// Sets the attachment and no-cache headers browsers expect for a forced
/// download.
pub fn build_attachment_response(
    body: ResponseBody,
    download_name: &str,
    mime_type: &str,
    size: u64,
) -> ApiResponse {
    Response::builder()
        .status(StatusCode::OK)
        .header("Content-Description", "File Transfer")
        .header("Content-Type", mime_type)
        .header("Content-Disposition", content_disposition(download_name))
        .header("Content-Transfer-Encoding", "binary")
        .header("Expires", "0")
        .header("Cache-Control", "must-revalidate")
        .header("Pragma", "public")
        .header("Content-Length", size)
        .body(body)
        .unwrap_or_else(|e| {
            log_build_error("attachment", &e);
            internal_error_fallback()
        })
}

/// `attachment; filename="..."` with quotes and control characters removed
fn content_disposition(download_name: &str) -> String {
    let safe: String = download_name
        .chars()
        .filter(|c| *c != '"' && *c != '\\' && !c.is_control())
        .collect();
    format!("attachment; filename=\"{safe}\"")
}

fn internal_error_fallback() -> ApiResponse {
    let mut response = Response::new(empty_body());
    *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
    response
}

/// Log response build error
fn log_build_error(kind: &str, error: &hyper::http::Error) {
    logger::log_error(&format!("Failed to build {kind} response: {error}"));
}
