//! Interceptor composition
//!
//! ```rust
//! use async_trait::async_trait;
//! use axum::{extract::Request, response::{IntoResponse, Response}};
//! use snippetbox::middleware::{Chain, Handler, Interceptor};
//!
//! struct Tag(&'static str);
//!
//! #[async_trait]
//! impl Interceptor for Tag {
//!     async fn intercept(&self, request: Request, next: Handler) -> Response {
//!         let mut response = next.run(request).await;
//!         response.headers_mut().append("x-tag", self.0.parse().unwrap());
//!         response
//!     }
//! }
//!
//! let handler = Chain::new()
//!     .with(Tag("outer"))
//!     .with(Tag("inner"))
//!     .then(Handler::new(|_req| async { "ok".into_response() }));
//! ```

use async_trait::async_trait;
use axum::{
    extract::Request,
    response::{IntoResponse, Response},
};
use futures_util::future::BoxFuture;
use std::convert::Infallible;
use std::future::Future;
use std::sync::Arc;
use std::task::{Context, Poll};
use tower::{Service, ServiceExt};

type HandlerFn = dyn Fn(Request) -> BoxFuture<'static, Response> + Send + Sync;

/// A type-erased async request handler
///
/// Cloning is cheap. A `Handler` is also a [`tower::Service`], so it can be
/// mounted directly on an axum router.
#[derive(Clone)]
pub struct Handler {
    inner: Arc<HandlerFn>,
}

impl std::fmt::Debug for Handler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Handler").finish_non_exhaustive()
    }
}

impl Handler {
    /// Wrap an async function
    pub fn new<F, Fut>(f: F) -> Self
    where
        F: Fn(Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Response> + Send + 'static,
    {
        let inner: Arc<HandlerFn> =
            Arc::new(move |request: Request| -> BoxFuture<'static, Response> {
                Box::pin(f(request))
            });
        Self { inner }
    }

    /// Wrap an infallible tower service such as a router or method router
    pub fn from_service<S>(service: S) -> Self
    where
        S: Service<Request, Error = Infallible> + Clone + Send + Sync + 'static,
        S::Response: IntoResponse,
        S::Future: Send + 'static,
    {
        Self::new(move |request| {
            let service = service.clone();
            async move {
                match service.oneshot(request).await {
                    Ok(response) => response.into_response(),
                    Err(never) => match never {},
                }
            }
        })
    }

    /// Handle one request
    pub fn run(&self, request: Request) -> BoxFuture<'static, Response> {
        (self.inner)(request)
    }
}

impl Service<Request> for Handler {
    type Response = Response;
    type Error = Infallible;
    type Future = BoxFuture<'static, Result<Response, Infallible>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, request: Request) -> Self::Future {
        let future = self.run(request);
        Box::pin(async move { Ok(future.await) })
    }
}

/// One stage of the pipeline
///
/// An interceptor may forward the request to `next` (possibly after changing
/// it), post-process the response `next` returns, or answer on its own
/// without calling `next` at all.
#[async_trait]
pub trait Interceptor: Send + Sync + 'static {
    /// Process `request`, usually by delegating to `next`
    async fn intercept(&self, request: Request, next: Handler) -> Response;
}

/// An ordered list of interceptors
#[derive(Clone, Default)]
pub struct Chain {
    interceptors: Vec<Arc<dyn Interceptor>>,
}

impl std::fmt::Debug for Chain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Chain")
            .field("len", &self.interceptors.len())
            .finish()
    }
}

impl Chain {
    /// An empty chain
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an interceptor inside the ones already present
    #[must_use]
    pub fn with(mut self, interceptor: impl Interceptor) -> Self {
        self.interceptors.push(Arc::new(interceptor));
        self
    }

    /// A copy of this chain with one more interceptor; `self` is unchanged
    #[must_use]
    pub fn append(&self, interceptor: impl Interceptor) -> Self {
        self.clone().with(interceptor)
    }

    /// A copy of this chain followed by every interceptor of `other`
    #[must_use]
    pub fn extend(&self, other: &Self) -> Self {
        let mut chain = self.clone();
        chain.interceptors.extend(other.interceptors.iter().cloned());
        chain
    }

    /// Number of interceptors
    #[must_use]
    pub fn len(&self) -> usize {
        self.interceptors.len()
    }

    /// Whether the chain is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.interceptors.is_empty()
    }

    /// Wrap `endpoint` so that the first interceptor runs outermost
    #[must_use]
    pub fn then(&self, endpoint: Handler) -> Handler {
        self.interceptors
            .iter()
            .rev()
            .fold(endpoint, |next, interceptor| {
                let interceptor = Arc::clone(interceptor);
                Handler::new(move |request| {
                    let interceptor = Arc::clone(&interceptor);
                    let next = next.clone();
                    async move { interceptor.intercept(request, next).await }
                })
            })
    }
}
