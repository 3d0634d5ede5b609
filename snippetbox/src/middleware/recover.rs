//! Last-resort panic boundary

use super::chain::{Handler, Interceptor};
use crate::error::status_response;
use async_trait::async_trait;
use axum::{
    extract::Request,
    http::{header::CONNECTION, HeaderValue, StatusCode},
    response::Response,
};
use futures_util::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;

/// Turns a panic in any inner stage into a generic 500 response
///
/// The panic payload is logged server-side only. The response carries
/// `Connection: close` so the connection is not reused afterwards.
#[derive(Debug, Clone, Copy, Default)]
pub struct RecoverPanic;

#[async_trait]
impl Interceptor for RecoverPanic {
    async fn intercept(&self, request: Request, next: Handler) -> Response {
        let method = request.method().clone();
        let uri = request.uri().clone();

        match AssertUnwindSafe(next.run(request)).catch_unwind().await {
            Ok(response) => response,
            Err(panic) => {
                tracing::error!(
                    %method,
                    %uri,
                    panic = panic_message(panic.as_ref()),
                    "recovered from panic while handling request"
                );
                let mut response = status_response(StatusCode::INTERNAL_SERVER_ERROR);
                response
                    .headers_mut()
                    .insert(CONNECTION, HeaderValue::from_static("close"));
                response
            }
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(message) = panic.downcast_ref::<&'static str>() {
        message
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message
    } else {
        "non-string panic payload"
    }
}
