//! Text helpers shared by config, filters and the HTTP client.

const MAX_ERROR_BODY_CHARS: usize = 180;

/// Trim optional text; blank input becomes `None`
pub fn normalize_text_option(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Response body squeezed onto one line and capped for error messages
pub fn compact_text(value: &str) -> String {
    value
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .chars()
        .take(MAX_ERROR_BODY_CHARS)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_text_option_drops_blank_values() {
        assert_eq!(normalize_text_option(None), None);
        assert_eq!(normalize_text_option(Some(" \t ".to_string())), None);
        assert_eq!(
            normalize_text_option(Some(" Acme ".to_string())).as_deref(),
            Some("Acme")
        );
    }

    #[test]
    fn compact_text_flattens_and_caps_bodies() {
        assert_eq!(
            compact_text("<html>\n  <body>Bad Gateway</body>\n</html>"),
            "<html> <body>Bad Gateway</body> </html>"
        );
        assert_eq!(compact_text(&"x".repeat(500)).len(), MAX_ERROR_BODY_CHARS);
    }
}
