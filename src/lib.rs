//! restpoint: a per-verb REST endpoint base on top of hyper
//!
//! An endpoint implements [`handler::Endpoint`]; for every request the
//! server builds a [`handler::RequestHandler`] from the mount configuration
//! and the captured request, and [`handler::RequestHandler::run`] dispatches
//! to the hook for the request's verb.

pub mod api;
pub mod config;
pub mod error;
pub mod handler;
pub mod http;
pub mod logger;
pub mod server;

pub use config::{Config, EndpointConfig};
pub use error::{HandlerError, ServerError};
pub use handler::{Endpoint, HandlerResult, RequestContext, RequestHandler};
