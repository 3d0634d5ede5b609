//! Per-field validation messages

use std::collections::HashMap;

/// Validation messages keyed by field name, in the order they were added
///
/// # Examples
///
/// ```rust
/// use snippetbox::forms::FormErrors;
///
/// let mut errors = FormErrors::new();
/// errors.add("email", "This field is required");
/// errors.add("email", "This field is invalid");
///
/// assert_eq!(errors.for_field("email").len(), 2);
/// assert_eq!(errors.get("email"), Some("This field is required"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormErrors {
    errors: HashMap<String, Vec<String>>,
}

impl FormErrors {
    /// Create an empty collection
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message for a field
    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.entry(field.into()).or_default().push(message.into());
    }

    /// First message for a field
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&str> {
        self.errors
            .get(field)
            .and_then(|messages| messages.first())
            .map(String::as_str)
    }

    /// First message for a field, or an empty string
    #[must_use]
    pub fn first(&self, field: &str) -> &str {
        self.get(field).unwrap_or_default()
    }

    /// All messages for a field
    #[must_use]
    pub fn for_field(&self, field: &str) -> &[String] {
        self.errors.get(field).map_or(&[], Vec::as_slice)
    }

    /// Whether a field has any message
    #[must_use]
    pub fn has(&self, field: &str) -> bool {
        self.errors.contains_key(field)
    }

    /// Total number of messages
    #[must_use]
    pub fn count(&self) -> usize {
        self.errors.values().map(Vec::len).sum()
    }

    /// Whether there are no messages at all
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Iterate over fields and their messages
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.errors.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_accumulate_in_order() {
        let mut errors = FormErrors::new();
        errors.add("title", "first");
        errors.add("title", "second");
        errors.add("content", "third");

        assert_eq!(errors.for_field("title"), ["first", "second"]);
        assert_eq!(errors.count(), 3);
        assert!(errors.has("content"));
    }

    #[test]
    fn test_missing_field() {
        let errors = FormErrors::new();
        assert!(errors.is_empty());
        assert_eq!(errors.get("title"), None);
        assert_eq!(errors.first("title"), "");
        assert!(errors.for_field("title").is_empty());
    }
}
