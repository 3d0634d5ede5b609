//! snippetbox: server-rendered snippet sharing
//!
//! Anonymous visitors browse short-lived text snippets; registered users sign
//! up, log in and create new ones. Every request flows through an explicit
//! interceptor pipeline:
//!
//! ```text
//! recover -> log -> secure-headers -> route match
//!     -> session-load -> csrf-guard -> authenticate [-> require-authentication]
//!     -> handler -> form validation -> store -> renderer
//!     -> session-save on the way out
//! ```
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use snippetbox::{config::SnippetboxConfig, routes, state::AppState};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let state = AppState::connect(SnippetboxConfig::default()).await?;
//!     let app = routes::routes(&state);
//!
//!     let listener = tokio::net::TcpListener::bind("127.0.0.1:4000").await?;
//!     axum::serve(listener, app).await?;
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod config;
pub mod error;
pub mod forms;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod observability;
pub mod routes;
pub mod state;
pub mod template;

pub mod prelude {
    //! Convenience re-exports for common types and traits

    pub use crate::auth::{AuthState, Session, SessionStore};
    pub use crate::config::SnippetboxConfig;
    pub use crate::error::AppError;
    pub use crate::forms::{Form, FormErrors};
    pub use crate::middleware::{Chain, Handler, Interceptor};
    pub use crate::models::{Snippet, SnippetStore, StoreError, User, UserStore};
    pub use crate::state::AppState;
    pub use crate::template::{PageContext, Renderer, TemplateData};
}
