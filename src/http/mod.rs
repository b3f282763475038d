//! HTTP protocol layer module
//!
//! Verb mapping, MIME detection and response builders, decoupled from the
//! handler and the server loop.

pub mod method;
pub mod mime;
pub mod response;

// Re-export commonly used types
pub use method::Verb;
pub use response::{
    build_attachment_response, build_error_response, build_json_response, empty_body, full_body,
    ApiResponse, ResponseBody,
};
