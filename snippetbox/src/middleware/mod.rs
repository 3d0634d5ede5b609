//! The request pipeline
//!
//! Every request passes through an ordered [`Chain`] of [`Interceptor`]s
//! before reaching its endpoint [`Handler`]. Two chains are assembled in
//! [`routes`](crate::routes):
//!
//! - the standard chain wraps everything, static files included:
//!   [`RecoverPanic`] then [`LogRequest`] then [`SecureHeaders`]
//! - the dynamic chain wraps application pages:
//!   [`SessionManager`] then [`CsrfGuard`] then [`Authenticate`], with
//!   [`RequireAuthentication`] appended for protected pages
//!
//! The first interceptor added to a chain runs outermost.

pub mod auth;
pub mod chain;
pub mod csrf;
pub mod logging;
pub mod recover;
pub mod security_headers;
pub mod session;

pub use auth::{Authenticate, RequireAuthentication, LOGIN_PATH};
pub use chain::{Chain, Handler, Interceptor};
pub use csrf::{CsrfConfig, CsrfGuard, CsrfToken, CSRF_FORM_FIELD, CSRF_HEADER_NAME};
pub use logging::LogRequest;
pub use recover::RecoverPanic;
pub use security_headers::{
    FrameOptions, HstsConfig, ReferrerPolicy, SecureHeaders, SecurityHeadersConfig,
};
pub use session::{SessionCookie, SessionManager};
