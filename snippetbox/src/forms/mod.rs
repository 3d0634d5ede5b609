//! Submitted form values and the validation rules run over them
//!
//! A [`Form`] wraps the decoded `application/x-www-form-urlencoded` body of a
//! request together with a [`FormErrors`] collection. Rules only ever add
//! messages; a form is valid exactly when no rule has added one.
//!
//! ```rust
//! use snippetbox::forms::{Form, EMAIL_RX};
//!
//! let mut form = Form::from_pairs([("email", "not-an-email"), ("password", "short")]);
//! form.required(&["email", "password"]);
//! form.matches_pattern("email", &EMAIL_RX);
//! form.min_length("password", 10);
//!
//! assert!(!form.valid());
//! assert_eq!(form.errors.first("email"), "This field is invalid");
//! ```
//!
//! Rules other than [`Form::required`] ignore blank values, so an empty or
//! whitespace-only field reports only that it is required.
//!
//! The extractor reads the body under axum's `DefaultBodyLimit`, which the
//! router sets to the configured form size.

mod error;

pub use error::FormErrors;

use crate::error::AppError;
use axum::{
    body::Bytes,
    extract::{FromRequest, Request},
    http::header::CONTENT_TYPE,
};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

/// Email syntax accepted at signup
pub static EMAIL_RX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$",
    )
    .unwrap_or_else(|e| unreachable!("email pattern is valid: {e}"))
});

const REQUIRED: &str = "This field is required";
const INVALID: &str = "This field is invalid";

/// Submitted values and their validation messages
#[derive(Debug, Clone, Default)]
pub struct Form {
    values: HashMap<String, Vec<String>>,
    /// Messages added by the rules run so far
    pub errors: FormErrors,
}

impl Form {
    /// A form with no values, for rendering a blank page
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build from decoded key/value pairs; repeated keys keep every value
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        let mut values: HashMap<String, Vec<String>> = HashMap::new();
        for (key, value) in pairs {
            values.entry(key.into()).or_default().push(value.into());
        }
        Self {
            values,
            errors: FormErrors::new(),
        }
    }

    /// Decode an urlencoded body
    #[must_use]
    pub fn from_urlencoded(body: &[u8]) -> Self {
        Self::from_pairs(url::form_urlencoded::parse(body).into_owned())
    }

    /// First submitted value for `field`, or an empty string
    #[must_use]
    pub fn get(&self, field: &str) -> &str {
        self.values
            .get(field)
            .and_then(|values| values.first())
            .map_or("", String::as_str)
    }

    /// Every submitted value for `field`
    #[must_use]
    pub fn get_all(&self, field: &str) -> &[String] {
        self.values.get(field).map_or(&[], Vec::as_slice)
    }

    /// Each field must be present and non-blank after trimming
    pub fn required(&mut self, fields: &[&str]) {
        for field in fields {
            if self.is_blank(field) {
                self.errors.add(*field, REQUIRED);
            }
        }
    }

    /// The trimmed value must have at most `max` characters
    pub fn max_length(&mut self, field: &str, max: usize) {
        let Some(len) = self.trimmed_len(field) else {
            return;
        };
        if len > max {
            self.errors.add(
                field,
                format!("This field is too long (maximum is {max} characters)"),
            );
        }
    }

    /// The trimmed value must have at least `min` characters
    pub fn min_length(&mut self, field: &str, min: usize) {
        let Some(len) = self.trimmed_len(field) else {
            return;
        };
        if len < min {
            self.errors.add(
                field,
                format!("This field is too short (minimum is {min} characters)"),
            );
        }
    }

    /// The value must equal one of `allowed` exactly
    pub fn permitted_values(&mut self, field: &str, allowed: &[&str]) {
        if self.is_blank(field) {
            return;
        }
        if !allowed.contains(&self.get(field)) {
            self.errors.add(field, INVALID);
        }
    }

    /// The value must match `pattern`
    pub fn matches_pattern(&mut self, field: &str, pattern: &Regex) {
        if self.is_blank(field) {
            return;
        }
        if !pattern.is_match(self.get(field)) {
            self.errors.add(field, INVALID);
        }
    }

    /// Whether no rule has reported a problem
    #[must_use]
    pub fn valid(&self) -> bool {
        self.errors.is_empty()
    }

    fn is_blank(&self, field: &str) -> bool {
        self.get(field).trim().is_empty()
    }

    fn trimmed_len(&self, field: &str) -> Option<usize> {
        let value = self.get(field).trim();
        if value.is_empty() {
            return None;
        }
        Some(value.chars().count())
    }
}

impl<S> FromRequest<S> for Form
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let urlencoded = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.split(';').next())
            .is_some_and(|mime| {
                mime.trim()
                    .eq_ignore_ascii_case("application/x-www-form-urlencoded")
            });
        if !urlencoded {
            tracing::debug!("form submitted with unexpected content type");
            return Err(AppError::bad_request());
        }

        let body = Bytes::from_request(req, state).await.map_err(|e| {
            tracing::debug!(error = %e, "failed to read form body");
            AppError::bad_request()
        })?;

        Ok(Self::from_urlencoded(&body))
    }
}
