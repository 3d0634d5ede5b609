//! Helper filters available to every page template

use chrono::{DateTime, Utc};

/// Format a timestamp as `02 Jan 2006 at 15:04`
///
/// Usage in templates: `{{ snippet.created|human_date }}`
///
/// # Errors
///
/// Never fails; the signature is the one askama expects of a filter.
#[allow(clippy::unnecessary_wraps)]
pub fn human_date(date: &DateTime<Utc>) -> askama::Result<String> {
    Ok(date.format("%d %b %Y at %H:%M").to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_human_date() {
        let date = Utc.with_ymd_and_hms(2024, 3, 7, 9, 5, 0).unwrap();
        assert_eq!(human_date(&date).unwrap(), "07 Mar 2024 at 09:05");
    }
}
