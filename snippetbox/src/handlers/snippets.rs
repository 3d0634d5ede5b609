//! Snippet pages

use crate::auth::session::FLASH;
use crate::auth::Session;
use crate::error::AppError;
use crate::forms::Form;
use crate::state::AppState;
use crate::template::{PageContext, TemplateData, CREATE_PAGE, HOME_PAGE, SHOW_PAGE};
use axum::{
    extract::{Path, State},
    response::{Html, IntoResponse, Redirect, Response},
};

/// Allowed snippet lifetimes in days
pub const EXPIRY_CHOICES: [&str; 3] = ["365", "7", "1"];

/// Longest accepted snippet title
pub const TITLE_MAX_CHARS: usize = 100;

/// List the latest snippets
pub async fn home(
    State(state): State<AppState>,
    page: PageContext,
) -> Result<Html<String>, AppError> {
    let snippets = state.snippets().latest().await?;
    Ok(page.render(state.renderer(), HOME_PAGE, TemplateData::with_snippets(snippets))?)
}

/// Show one snippet
///
/// Non-numeric and non-positive IDs are answered with 404, like unknown ones.
pub async fn show_snippet(
    State(state): State<AppState>,
    Path(id): Path<String>,
    page: PageContext,
) -> Result<Html<String>, AppError> {
    let id = match id.parse::<i64>() {
        Ok(id) if id >= 1 => id,
        _ => return Err(AppError::NotFound),
    };

    let snippet = state.snippets().get(id).await?;
    Ok(page.render(state.renderer(), SHOW_PAGE, TemplateData::with_snippet(snippet))?)
}

/// Blank snippet form
pub async fn create_snippet_form(
    State(state): State<AppState>,
    page: PageContext,
) -> Result<Html<String>, AppError> {
    Ok(page.render(state.renderer(), CREATE_PAGE, TemplateData::with_form(Form::empty()))?)
}

/// Validate and store a new snippet
///
/// The title is stored trimmed, as it was measured.
pub async fn create_snippet(
    State(state): State<AppState>,
    page: PageContext,
    session: Session,
    mut form: Form,
) -> Result<Response, AppError> {
    form.required(&["title", "content", "expires"]);
    form.max_length("title", TITLE_MAX_CHARS);
    form.permitted_values("expires", &EXPIRY_CHOICES);

    if !form.valid() {
        let html = page.render(state.renderer(), CREATE_PAGE, TemplateData::with_form(form))?;
        return Ok(html.into_response());
    }

    let expires_in_days: i64 = form
        .get("expires")
        .parse()
        .map_err(|_| AppError::bad_request())?;
    let id = state
        .snippets()
        .insert(form.get("title").trim(), form.get("content"), expires_in_days)
        .await?;

    tracing::info!(snippet_id = id, "snippet created");
    session.put(FLASH, "Snippet successfully created!")?;
    Ok(Redirect::to(&format!("/snippet/{id}")).into_response())
}
