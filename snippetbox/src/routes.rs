//! Route table and chain assembly
//!
//! | Method | Path              | Chain                        |
//! |--------|-------------------|------------------------------|
//! | GET    | `/`               | dynamic                      |
//! | GET    | `/snippet/{id}`   | dynamic                      |
//! | GET    | `/snippet/create` | dynamic + authentication     |
//! | POST   | `/snippet/create` | dynamic + authentication     |
//! | GET    | `/user/signup`    | dynamic                      |
//! | POST   | `/user/signup`    | dynamic                      |
//! | GET    | `/user/login`     | dynamic                      |
//! | POST   | `/user/login`     | dynamic                      |
//! | POST   | `/user/logout`    | dynamic + authentication     |
//! | GET    | `/static/*`       | standard only                |
//!
//! The standard chain wraps the whole router, static files included. Form
//! bodies share one size limit, `security.max_form_bytes`, in the CSRF guard
//! and in the [`Form`](crate::forms::Form) extractor.

use crate::config::SecuritySettings;
use crate::handlers;
use crate::middleware::{
    Authenticate, Chain, CsrfConfig, CsrfGuard, Handler, LogRequest, RecoverPanic,
    RequireAuthentication, SecureHeaders, SessionCookie, SessionManager,
};
use crate::state::AppState;
use axum::{
    extract::DefaultBodyLimit,
    handler::Handler as AxumHandler,
    routing::{get_service, post_service},
    Router,
};
use std::sync::Arc;
use tower_http::services::ServeDir;

/// Interceptors applied to every request
#[must_use]
pub fn standard_chain(security: &SecuritySettings) -> Chain {
    Chain::new()
        .with(RecoverPanic)
        .with(LogRequest)
        .with(SecureHeaders::from_settings(security))
}

/// Interceptors applied to application pages
#[must_use]
pub fn dynamic_chain(state: &AppState) -> Chain {
    let security = &state.config().security;
    Chain::new()
        .with(SessionManager::new(
            state.sessions().clone(),
            SessionCookie::from_settings(security),
        ))
        .with(CsrfGuard::new(
            CsrfConfig::new().max_body_bytes(security.max_form_bytes),
        ))
        .with(Authenticate::new(Arc::clone(state.users())))
}

/// Bind an axum handler to the application state
fn endpoint<H, T>(state: &AppState, handler: H) -> Handler
where
    H: AxumHandler<T, AppState>,
    T: 'static,
{
    Handler::from_service(handler.with_state(state.clone()))
}

/// Build the application router
pub fn routes(state: &AppState) -> Router {
    let dynamic = dynamic_chain(state);
    let protected = dynamic.append(RequireAuthentication::new());

    let app = Router::new()
        .route(
            "/",
            get_service(dynamic.then(endpoint(state, handlers::home))),
        )
        .route(
            "/snippet/create",
            get_service(protected.then(endpoint(state, handlers::create_snippet_form)))
                .post_service(protected.then(endpoint(state, handlers::create_snippet))),
        )
        .route(
            "/snippet/{id}",
            get_service(dynamic.then(endpoint(state, handlers::show_snippet))),
        )
        .route(
            "/user/signup",
            get_service(dynamic.then(endpoint(state, handlers::signup_user_form)))
                .post_service(dynamic.then(endpoint(state, handlers::signup_user))),
        )
        .route(
            "/user/login",
            get_service(dynamic.then(endpoint(state, handlers::login_user_form)))
                .post_service(dynamic.then(endpoint(state, handlers::login_user))),
        )
        .route(
            "/user/logout",
            post_service(protected.then(endpoint(state, handlers::logout_user))),
        )
        .nest_service("/static", ServeDir::new(&state.config().server.static_dir))
        .fallback(handlers::not_found)
        .layer(DefaultBodyLimit::max(state.config().security.max_form_bytes));

    Router::new().fallback_service(standard_chain(&state.config().security).then(Handler::from_service(app)))
}
