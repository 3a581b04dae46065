const MAX_ERROR_LENGTH: usize = 2_000;

/// Truncate to at most `max_chars` characters, on a char boundary.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

pub fn truncate_error(error: &str) -> String {
    let truncated = truncate_chars(error, MAX_ERROR_LENGTH);
    if truncated.len() < error.len() {
        format!("{}...", truncated)
    } else {
        error.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_chars_ascii() {
        assert_eq!(truncate_chars("Compute Engine", 7), "Compute");
        assert_eq!(truncate_chars("short", 45), "short");
    }

    #[test]
    fn test_truncate_chars_multibyte() {
        assert_eq!(truncate_chars("Größe", 3), "Grö");
    }

    #[test]
    fn test_truncate_error() {
        let long = "x".repeat(MAX_ERROR_LENGTH + 10);
        let out = truncate_error(&long);
        assert!(out.ends_with("..."));
        assert_eq!(out.len(), MAX_ERROR_LENGTH + 3);
        assert_eq!(truncate_error("boom"), "boom");
    }
}
