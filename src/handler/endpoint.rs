//! Endpoint trait
//!
//! An endpoint implements one hook per supported verb. Each hook produces
//! exactly one response value or fails; `RequestHandler::run` picks the hook
//! and turns failures into 500 responses.

use std::future::Future;

use super::RequestHandler;
use crate::error::HandlerError;
use crate::http::ApiResponse;

pub type HandlerResult = Result<ApiResponse, HandlerError>;

pub trait Endpoint: Send + Sync {
    /// Called once the handler has captured the request, before dispatch
    fn init(&self, _handler: &mut RequestHandler) {}

    fn get(&self, handler: &RequestHandler) -> impl Future<Output = HandlerResult> + Send;

    fn post(&self, handler: &RequestHandler) -> impl Future<Output = HandlerResult> + Send;

    fn put(&self, handler: &RequestHandler) -> impl Future<Output = HandlerResult> + Send;

    fn patch(&self, handler: &RequestHandler) -> impl Future<Output = HandlerResult> + Send;

    fn delete(&self, handler: &RequestHandler) -> impl Future<Output = HandlerResult> + Send;

    fn options(&self, handler: &RequestHandler) -> impl Future<Output = HandlerResult> + Send;
}
