//! Page rendering
//!
//! Pages are compiled askama templates. The [`Renderer`] is a fixed table from
//! page name to render function, built once at startup and read-only after
//! that. Handlers fill a [`TemplateData`] with what the page needs and hand it
//! to [`PageContext::render`], which adds the per-request defaults (current
//! year, flash message, authentication status, CSRF token).

pub mod filters;
mod pages;

use crate::auth::session::FLASH;
use crate::auth::{AuthState, Session};
use crate::forms::Form;
use crate::middleware::CsrfToken;
use crate::models::Snippet;
use axum::{extract::FromRequestParts, http::request::Parts, response::Html};
use chrono::{Datelike, Utc};
use std::collections::HashMap;
use std::convert::Infallible;
use thiserror::Error;

/// Home page listing the latest snippets
pub const HOME_PAGE: &str = "home.page.html";
/// Single snippet page
pub const SHOW_PAGE: &str = "show.page.html";
/// Snippet creation form
pub const CREATE_PAGE: &str = "create.page.html";
/// Signup form
pub const SIGNUP_PAGE: &str = "signup.page.html";
/// Login form
pub const LOGIN_PAGE: &str = "login.page.html";

type RenderFn = fn(&TemplateData) -> askama::Result<String>;

/// Rendering errors
#[derive(Debug, Error)]
pub enum RenderError {
    /// No page registered under the name
    #[error("the template {0} does not exist")]
    UnknownTemplate(String),

    /// Template execution failed
    #[error("template error: {0}")]
    Template(#[from] askama::Error),
}

/// Everything a page may display
#[derive(Debug, Clone, Default)]
pub struct TemplateData {
    /// Year shown in the footer
    pub current_year: i32,
    /// One-time message from the previous request
    pub flash: String,
    /// Whether an active user is logged in
    pub is_authenticated: bool,
    /// Token embedded in every form
    pub csrf_token: String,
    /// Submitted values and validation messages
    pub form: Form,
    /// Snippet shown on the show page
    pub snippet: Option<Snippet>,
    /// Snippets listed on the home page
    pub snippets: Vec<Snippet>,
}

impl TemplateData {
    /// Data carrying a form
    #[must_use]
    pub fn with_form(form: Form) -> Self {
        Self {
            form,
            ..Self::default()
        }
    }

    /// Data carrying one snippet
    #[must_use]
    pub fn with_snippet(snippet: Snippet) -> Self {
        Self {
            snippet: Some(snippet),
            ..Self::default()
        }
    }

    /// Data carrying a list of snippets
    #[must_use]
    pub fn with_snippets(snippets: Vec<Snippet>) -> Self {
        Self {
            snippets,
            ..Self::default()
        }
    }
}

/// Fixed table of renderable pages
#[derive(Clone)]
pub struct Renderer {
    pages: HashMap<&'static str, RenderFn>,
}

impl std::fmt::Debug for Renderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<_> = self.pages.keys().collect();
        names.sort();
        f.debug_struct("Renderer").field("pages", &names).finish()
    }
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer {
    /// Build the table of every application page
    #[must_use]
    pub fn new() -> Self {
        let pages: [(&'static str, RenderFn); 5] = [
            (HOME_PAGE, pages::home),
            (SHOW_PAGE, pages::show),
            (CREATE_PAGE, pages::create),
            (SIGNUP_PAGE, pages::signup),
            (LOGIN_PAGE, pages::login),
        ];
        Self {
            pages: pages.into_iter().collect(),
        }
    }

    /// Whether a page is registered under `name`
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.pages.contains_key(name)
    }

    /// Render a page
    ///
    /// The page is rendered completely before anything is returned, so a
    /// failing template never produces a half-written response.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::UnknownTemplate`] for an unregistered name and
    /// [`RenderError::Template`] if the template fails to execute.
    pub fn render(&self, name: &str, data: &TemplateData) -> Result<Html<String>, RenderError> {
        let render = self
            .pages
            .get(name)
            .ok_or_else(|| RenderError::UnknownTemplate(name.to_string()))?;
        Ok(Html(render(data)?))
    }
}

/// Per-request page defaults
///
/// Extracting never fails; a request that bypassed the session or CSRF
/// stages simply renders without a flash message or token.
#[derive(Debug, Clone, Default)]
pub struct PageContext {
    session: Option<Session>,
    auth: AuthState,
    csrf_token: Option<CsrfToken>,
}

impl PageContext {
    /// Add the per-request defaults to `data` and render `name`
    ///
    /// The flash message is popped from the session here, so it is shown on
    /// exactly one rendered page.
    ///
    /// # Errors
    ///
    /// Propagates [`Renderer::render`] failures.
    pub fn render(
        &self,
        renderer: &Renderer,
        name: &str,
        mut data: TemplateData,
    ) -> Result<Html<String>, RenderError> {
        data.current_year = Utc::now().year();
        data.is_authenticated = self.auth.is_authenticated();
        if let Some(token) = &self.csrf_token {
            data.csrf_token = token.as_str().to_string();
        }
        if let Some(session) = &self.session {
            data.flash = session.pop_string(FLASH);
        }
        renderer.render(name, &data)
    }
}

impl<S> FromRequestParts<S> for PageContext
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self {
            session: parts.extensions.get::<Session>().cloned(),
            auth: parts.extensions.get::<AuthState>().copied().unwrap_or_default(),
            csrf_token: parts.extensions.get::<CsrfToken>().cloned(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn snippet() -> Snippet {
        let created = Utc::now();
        Snippet {
            id: 3,
            title: "An old silent pond".to_string(),
            content: "A frog jumps <in>".to_string(),
            created,
            expires: created + Duration::days(7),
        }
    }

    #[test]
    fn test_every_page_is_registered() {
        let renderer = Renderer::new();
        for name in [HOME_PAGE, SHOW_PAGE, CREATE_PAGE, SIGNUP_PAGE, LOGIN_PAGE] {
            assert!(renderer.contains(name), "{name} missing");
        }
    }

    #[test]
    fn test_unknown_page() {
        let err = Renderer::new()
            .render("missing.page.html", &TemplateData::default())
            .unwrap_err();
        assert!(matches!(err, RenderError::UnknownTemplate(name) if name == "missing.page.html"));
    }

    #[test]
    fn test_show_page_escapes_content() {
        let Html(html) = Renderer::new()
            .render(SHOW_PAGE, &TemplateData::with_snippet(snippet()))
            .unwrap();
        assert!(html.contains("An old silent pond"));
        assert!(html.contains("A frog jumps &lt;in&gt;"));
        assert!(html.contains("#3"));
    }

    #[test]
    fn test_form_errors_are_rendered() {
        let mut form = Form::from_pairs([("title", "")]);
        form.required(&["title"]);
        let Html(html) = Renderer::new()
            .render(CREATE_PAGE, &TemplateData::with_form(form))
            .unwrap();
        assert!(html.contains("This field is required"));
    }

    #[test]
    fn test_page_context_pops_flash_once() {
        let session = Session::fresh();
        session.put(FLASH, "Saved!").unwrap();
        let ctx = PageContext {
            session: Some(session.clone()),
            auth: AuthState::Authenticated(1),
            csrf_token: Some(CsrfToken::new("tok")),
        };
        let renderer = Renderer::new();

        let Html(first) = ctx.render(&renderer, HOME_PAGE, TemplateData::default()).unwrap();
        assert!(first.contains("Saved!"));
        assert!(first.contains(r#"value="tok""#));

        let Html(second) = ctx.render(&renderer, HOME_PAGE, TemplateData::default()).unwrap();
        assert!(!second.contains("Saved!"));
        assert!(!session.exists(FLASH));
    }

    #[test]
    fn test_anonymous_nav() {
        let Html(html) = PageContext::default()
            .render(&Renderer::new(), HOME_PAGE, TemplateData::default())
            .unwrap();
        assert!(html.contains("/user/login"));
        assert!(!html.contains("/user/logout"));
    }
}
