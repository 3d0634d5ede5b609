//! CSRF protection for application routes
//!
//! Each session holds a single token. Safe requests make sure it exists and
//! expose it to handlers through the [`CsrfToken`] extension so pages can
//! embed it in their forms. State-changing requests must echo the token back,
//! either in the `x-csrf-token` header or in the `_csrf_token` form field,
//! or they are rejected with 403 before reaching the handler.
//!
//! The guard reads the token from the session, so the
//! [`SessionManager`](super::SessionManager) must run before it.

use super::chain::{Handler, Interceptor};
use super::session::request_session;
use crate::auth::session::CSRF_TOKEN;
use crate::auth::Session;
use crate::error::{status_response, AppError};
use async_trait::async_trait;
use axum::{
    body::Body,
    extract::Request,
    http::{header::CONTENT_TYPE, Method, StatusCode},
    response::{IntoResponse, Response},
};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use rand::Rng;

/// CSRF token header name
pub const CSRF_HEADER_NAME: &str = "x-csrf-token";

/// CSRF token form field name
pub const CSRF_FORM_FIELD: &str = "_csrf_token";

/// CSRF token string (base64url-encoded 32-byte random value)
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CsrfToken(String);

impl CsrfToken {
    /// Generate a new random token
    #[must_use]
    pub fn generate() -> Self {
        let mut bytes = [0u8; 32];
        rand::thread_rng().fill(&mut bytes);
        Self(URL_SAFE_NO_PAD.encode(bytes))
    }

    /// Wrap an existing token value
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Get the token as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Compare against a submitted value without short-circuiting on content
    #[must_use]
    pub fn matches(&self, submitted: &str) -> bool {
        let expected = self.0.as_bytes();
        let submitted = submitted.as_bytes();
        if expected.len() != submitted.len() {
            return false;
        }
        expected
            .iter()
            .zip(submitted)
            .fold(0u8, |acc, (a, b)| acc | (a ^ b))
            == 0
    }
}

impl std::fmt::Display for CsrfToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// CSRF guard configuration
#[derive(Clone, Debug)]
pub struct CsrfConfig {
    /// Header name for the token (default: "x-csrf-token")
    pub header_name: String,
    /// Form field name for the token (default: "_csrf_token")
    pub form_field: String,
    /// Skip validation for these paths
    pub skip_paths: Vec<String>,
    /// Largest urlencoded body buffered to look for the form field
    pub max_body_bytes: usize,
}

impl Default for CsrfConfig {
    fn default() -> Self {
        Self {
            header_name: CSRF_HEADER_NAME.to_string(),
            form_field: CSRF_FORM_FIELD.to_string(),
            skip_paths: vec![],
            max_body_bytes: 2 * 1024 * 1024,
        }
    }
}

impl CsrfConfig {
    /// Create new CSRF config with default values
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a path to skip CSRF validation
    #[must_use]
    pub fn skip_path(mut self, path: impl Into<String>) -> Self {
        self.skip_paths.push(path.into());
        self
    }

    /// Limit the buffered body size
    #[must_use]
    pub const fn max_body_bytes(mut self, limit: usize) -> Self {
        self.max_body_bytes = limit;
        self
    }
}

/// Issues and verifies the per-session CSRF token
#[derive(Debug, Clone, Default)]
pub struct CsrfGuard {
    config: CsrfConfig,
}

impl CsrfGuard {
    /// Guard with custom configuration
    #[must_use]
    pub const fn new(config: CsrfConfig) -> Self {
        Self { config }
    }

    fn ensure_token(session: &Session) -> Result<CsrfToken, AppError> {
        if let Some(token) = session.get_string(CSRF_TOKEN) {
            return Ok(CsrfToken(token));
        }
        let token = CsrfToken::generate();
        session.put(CSRF_TOKEN, token.as_str())?;
        Ok(token)
    }

    /// Find the submitted token, buffering a form body if needed
    ///
    /// Returns the request with its body restored.
    async fn submitted_token(&self, request: Request) -> Result<(Request, Option<String>), AppError> {
        if let Some(value) = request.headers().get(self.config.header_name.as_str()) {
            let token = value.to_str().ok().map(str::to_string);
            return Ok((request, token));
        }

        if !is_urlencoded(&request) {
            return Ok((request, None));
        }

        let (parts, body) = request.into_parts();
        let bytes = axum::body::to_bytes(body, self.config.max_body_bytes)
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, "could not buffer form body for CSRF check");
                AppError::bad_request()
            })?;

        let token = url::form_urlencoded::parse(&bytes)
            .find(|(name, _)| name == self.config.form_field.as_str())
            .map(|(_, value)| value.into_owned());

        Ok((Request::from_parts(parts, Body::from(bytes)), token))
    }
}

#[async_trait]
impl Interceptor for CsrfGuard {
    async fn intercept(&self, request: Request, next: Handler) -> Response {
        let Some(session) = request_session(&request) else {
            tracing::error!("CSRF guard requires the session manager to run first");
            return status_response(StatusCode::INTERNAL_SERVER_ERROR);
        };

        let skip = is_method_safe(request.method())
            || self
                .config
                .skip_paths
                .iter()
                .any(|path| path == request.uri().path());

        let (mut request, token) = if skip {
            match Self::ensure_token(&session) {
                Ok(token) => (request, token),
                Err(e) => return e.into_response(),
            }
        } else {
            let Some(expected) = session.get_string(CSRF_TOKEN).map(CsrfToken) else {
                tracing::warn!(method = %request.method(), uri = %request.uri(), "CSRF token missing from session");
                return csrf_rejection();
            };

            let (request, submitted) = match self.submitted_token(request).await {
                Ok(found) => found,
                Err(e) => return e.into_response(),
            };

            match submitted {
                Some(submitted) if expected.matches(&submitted) => (request, expected),
                Some(_) => {
                    tracing::warn!(method = %request.method(), uri = %request.uri(), "CSRF token mismatch");
                    return csrf_rejection();
                }
                None => {
                    tracing::warn!(method = %request.method(), uri = %request.uri(), "CSRF token missing from request");
                    return csrf_rejection();
                }
            }
        };

        request.extensions_mut().insert(token);
        next.run(request).await
    }
}

/// Check if HTTP method is considered safe (doesn't modify state)
const fn is_method_safe(method: &Method) -> bool {
    matches!(
        *method,
        Method::GET | Method::HEAD | Method::OPTIONS | Method::TRACE
    )
}

fn is_urlencoded(request: &Request) -> bool {
    request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(';').next())
        .is_some_and(|mime| {
            mime.trim()
                .eq_ignore_ascii_case("application/x-www-form-urlencoded")
        })
}

fn csrf_rejection() -> Response {
    status_response(StatusCode::FORBIDDEN)
}
