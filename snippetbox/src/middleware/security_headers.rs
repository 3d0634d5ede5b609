//! Security headers interceptor
//!
//! Adds security-related HTTP headers to every response:
//! - X-Frame-Options: Prevent clickjacking
//! - X-Content-Type-Options: Prevent MIME sniffing
//! - X-XSS-Protection: Enable browser XSS filtering
//! - Strict-Transport-Security: Enforce HTTPS
//! - Content-Security-Policy: Control resource loading
//! - Referrer-Policy: Control referrer information

use super::chain::{Handler, Interceptor};
use crate::config::{HeaderPolicy, SecuritySettings};
use async_trait::async_trait;
use axum::{
    extract::Request,
    http::{header, HeaderMap, HeaderName, HeaderValue},
    response::Response,
};
use std::fmt;

/// Which security headers to send
///
/// Preset configurations:
/// - `default()`: the headers every page gets
/// - `strict()`: adds HSTS and a same-origin CSP
/// - `development()`: relaxed framing and CSP, no HSTS
///
/// [`SecurityHeadersConfig::for_policy`] picks one from the configured
/// [`HeaderPolicy`].
#[derive(Debug, Clone)]
pub struct SecurityHeadersConfig {
    /// X-Frame-Options header
    pub frame_options: Option<FrameOptions>,

    /// X-Content-Type-Options: nosniff
    pub content_type_options: bool,

    /// X-XSS-Protection header
    /// - Some(true): Enable with mode=block
    /// - Some(false): Enable without mode=block
    /// - None: Disable header
    pub xss_protection: Option<bool>,

    /// Strict-Transport-Security header
    pub hsts: Option<HstsConfig>,

    /// Content-Security-Policy header
    pub csp: Option<String>,

    /// Referrer-Policy header
    pub referrer_policy: Option<ReferrerPolicy>,
}

/// Frame options for X-Frame-Options header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOptions {
    /// Prevent all framing (DENY)
    Deny,
    /// Allow framing from same origin (SAMEORIGIN)
    SameOrigin,
}

impl fmt::Display for FrameOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Deny => write!(f, "DENY"),
            Self::SameOrigin => write!(f, "SAMEORIGIN"),
        }
    }
}

/// HSTS configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HstsConfig {
    /// Max age in seconds
    pub max_age: u32,
    /// Include subdomains
    pub include_subdomains: bool,
    /// Include in browser preload list
    pub preload: bool,
}

impl HstsConfig {
    /// One year, subdomains, preload
    #[must_use]
    pub const fn strict() -> Self {
        Self {
            max_age: 31_536_000,
            include_subdomains: true,
            preload: true,
        }
    }

}

impl fmt::Display for HstsConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "max-age={}", self.max_age)?;
        if self.include_subdomains {
            write!(f, "; includeSubDomains")?;
        }
        if self.preload {
            write!(f, "; preload")?;
        }
        Ok(())
    }
}

/// Referrer policy options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferrerPolicy {
    /// No referrer information
    NoReferrer,
    /// Same origin only
    SameOrigin,
    /// Origin only, never on downgrade
    StrictOrigin,
    /// Full URL on same origin, origin on cross-origin, nothing on downgrade
    StrictOriginWhenCrossOrigin,
}

impl fmt::Display for ReferrerPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoReferrer => write!(f, "no-referrer"),
            Self::SameOrigin => write!(f, "same-origin"),
            Self::StrictOrigin => write!(f, "strict-origin"),
            Self::StrictOriginWhenCrossOrigin => write!(f, "strict-origin-when-cross-origin"),
        }
    }
}

impl Default for SecurityHeadersConfig {
    /// - X-Frame-Options: DENY
    /// - X-Content-Type-Options: nosniff
    /// - X-XSS-Protection: 1; mode=block
    /// - Referrer-Policy: strict-origin-when-cross-origin
    fn default() -> Self {
        Self {
            frame_options: Some(FrameOptions::Deny),
            content_type_options: true,
            xss_protection: Some(true),
            hsts: None,
            csp: None,
            referrer_policy: Some(ReferrerPolicy::StrictOriginWhenCrossOrigin),
        }
    }
}

impl SecurityHeadersConfig {
    /// Production configuration served over HTTPS
    ///
    /// The defaults plus HSTS and `Content-Security-Policy` restricted to
    /// same-origin resources and the web font host used by the layout.
    #[must_use]
    pub fn strict() -> Self {
        Self {
            hsts: Some(HstsConfig::strict()),
            csp: Some(
                "default-src 'self'; style-src 'self' fonts.googleapis.com; font-src fonts.gstatic.com"
                    .to_string(),
            ),
            ..Self::default()
        }
    }

    /// Relaxed configuration for local development
    #[must_use]
    pub fn development() -> Self {
        Self {
            frame_options: Some(FrameOptions::SameOrigin),
            content_type_options: true,
            xss_protection: None,
            hsts: None,
            csp: None,
            referrer_policy: Some(ReferrerPolicy::StrictOriginWhenCrossOrigin),
        }
    }

    /// Preset named by `policy`
    #[must_use]
    pub fn for_policy(policy: HeaderPolicy) -> Self {
        match policy {
            HeaderPolicy::Standard => Self::default(),
            HeaderPolicy::Strict => Self::strict(),
            HeaderPolicy::Development => Self::development(),
        }
    }

    fn apply(&self, headers: &mut HeaderMap) {
        if let Some(frame_options) = self.frame_options {
            insert(headers, header::X_FRAME_OPTIONS, &frame_options.to_string());
        }

        if self.content_type_options {
            insert(headers, header::X_CONTENT_TYPE_OPTIONS, "nosniff");
        }

        if let Some(block_mode) = self.xss_protection {
            let value = if block_mode { "1; mode=block" } else { "1" };
            insert(headers, header::X_XSS_PROTECTION, value);
        }

        if let Some(hsts) = self.hsts {
            insert(headers, header::STRICT_TRANSPORT_SECURITY, &hsts.to_string());
        }

        if let Some(csp) = &self.csp {
            insert(headers, header::CONTENT_SECURITY_POLICY, csp);
        }

        if let Some(policy) = self.referrer_policy {
            insert(headers, header::REFERRER_POLICY, &policy.to_string());
        }
    }
}

fn insert(headers: &mut HeaderMap, name: HeaderName, value: &str) {
    match HeaderValue::from_str(value) {
        Ok(value) => {
            headers.insert(name, value);
        }
        Err(_) => tracing::warn!(header = %name, "skipping invalid security header value"),
    }
}

/// Adds the configured security headers to every response
#[derive(Debug, Clone)]
pub struct SecureHeaders {
    config: SecurityHeadersConfig,
}

impl SecureHeaders {
    /// Send the headers described by `config`
    #[must_use]
    pub const fn new(config: SecurityHeadersConfig) -> Self {
        Self { config }
    }

    /// Send the preset chosen in the security settings
    #[must_use]
    pub fn from_settings(settings: &SecuritySettings) -> Self {
        Self::new(SecurityHeadersConfig::for_policy(settings.header_policy))
    }
}

#[async_trait]
impl Interceptor for SecureHeaders {
    async fn intercept(&self, request: Request, next: Handler) -> Response {
        let mut response = next.run(request).await;
        self.config.apply(response.headers_mut());
        response
    }
}
