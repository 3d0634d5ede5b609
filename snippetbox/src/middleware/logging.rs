//! Access logging

use super::chain::{Handler, Interceptor};
use async_trait::async_trait;
use axum::{
    extract::{ConnectInfo, Request},
    response::Response,
};
use std::net::SocketAddr;
use std::time::Instant;

/// Logs every request and the status it was answered with
#[derive(Debug, Clone, Copy, Default)]
pub struct LogRequest;

#[async_trait]
impl Interceptor for LogRequest {
    async fn intercept(&self, request: Request, next: Handler) -> Response {
        let remote_addr = request
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map_or_else(|| "-".to_string(), |ConnectInfo(addr)| addr.to_string());
        let method = request.method().clone();
        let uri = request.uri().clone();

        tracing::info!(
            %remote_addr,
            version = ?request.version(),
            %method,
            %uri,
            "request"
        );

        let started = Instant::now();
        let response = next.run(request).await;

        tracing::info!(
            %method,
            %uri,
            status = response.status().as_u16(),
            latency = ?started.elapsed(),
            "response"
        );
        response
    }
}
