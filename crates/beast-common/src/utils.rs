//! Shared utility functions with zero-cost abstractions.

use chrono::{DateTime, Utc};

/// Formats a timestamp for display.
#[must_use]
pub fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

/// Keeps only characters allowed in thread name slugs (`[A-Za-z0-9_-]`).
#[must_use]
pub fn slug(input: &str) -> String {
    input
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
        .collect()
}

/// Truncates a string to at most `max_chars` characters.
#[must_use]
pub fn truncate_chars(input: &str, max_chars: usize) -> String {
    input.chars().take(max_chars).collect()
}

/// Truncates a string to a maximum length with ellipsis.
#[must_use]
pub fn truncate_string(input: &str, max_length: usize) -> String {
    if input.chars().count() <= max_length {
        input.to_string()
    } else {
        format!("{}...", truncate_chars(input, max_length.saturating_sub(3)))
    }
}

/// Fills the `{user}` and `{server}` placeholders of a welcome template.
#[must_use]
pub fn render_welcome_template(template: &str, user_mention: &str, server_name: &str) -> String {
    template
        .replace("{user}", user_mention)
        .replace("{server}", server_name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_format_timestamp() {
        let timestamp = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        let formatted = format_timestamp(timestamp);
        assert_eq!(formatted, "2024-01-01 12:00:00 UTC");
    }

    #[test]
    fn test_slug() {
        assert_eq!(slug("Login geht nicht!"), "Logingehtnicht");
        assert_eq!(slug("a_b-c ä"), "a_b-c");
    }

    #[test]
    fn test_truncate_string() {
        let input = "This is a very long string that should be truncated";
        let truncated = truncate_string(input, 20);
        assert_eq!(truncated, "This is a very lo...");

        let short = "Short";
        let not_truncated = truncate_string(short, 20);
        assert_eq!(not_truncated, "Short");

        assert_eq!(truncate_string("äöüäöüäöü", 6), "äöü...");
    }

    #[test]
    fn test_welcome_template() {
        let rendered = render_welcome_template("Hi {user}, welcome to {server}! {user}", "<@1>", "Den");
        assert_eq!(rendered, "Hi <@1>, welcome to Den! <@1>");
    }
}
