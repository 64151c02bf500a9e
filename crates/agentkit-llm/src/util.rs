//! Shared helpers for provider clients

/// Minimum key length to display partial key
const MIN_KEY_LENGTH_FOR_PARTIAL_DISPLAY: usize = 8;

/// Number of characters shown at each end of a masked key
const KEY_MASK_VISIBLE_CHARS: usize = 4;

/// Mask an API key for safe display in logs.
///
/// Shows the first and last 4 characters for keys longer than 8 characters,
/// otherwise "****". Counts characters, not bytes, so a non-ASCII value
/// cannot split a char boundary.
#[must_use]
pub fn mask_api_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= MIN_KEY_LENGTH_FOR_PARTIAL_DISPLAY {
        return "****".to_string();
    }
    let head: String = chars[..KEY_MASK_VISIBLE_CHARS].iter().collect();
    let tail: String = chars[chars.len() - KEY_MASK_VISIBLE_CHARS..].iter().collect();
    format!("{head}...{tail}")
}

/// Sanitize a provider error message before it crosses the router boundary.
///
/// Credential-shaped errors are replaced with a generic message so API keys
/// can never leak through error strings; long messages are truncated.
#[must_use]
pub fn sanitize_api_error(error: &str) -> String {
    let lower = error.to_lowercase();

    if lower.contains("api key")
        || lower.contains("api_key")
        || lower.contains("apikey")
        || lower.contains("bearer")
        || lower.contains("unauthorized")
        || lower.contains("authentication")
    {
        return "API authentication error. Please check your API key configuration.".to_string();
    }

    if error.len() > 300 {
        let prefix: String = error.chars().take(300).collect();
        return format!("{prefix}...(truncated)");
    }

    error.to_string()
}

/// Truncate a string to at most `max_chars` characters, on a char boundary
#[must_use]
pub fn truncate_chars(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_api_key_long() {
        assert_eq!(mask_api_key("sk-1234567890abcdef"), "sk-1...cdef");
    }

    #[test]
    fn test_mask_api_key_short() {
        assert_eq!(mask_api_key("short"), "****");
        assert_eq!(mask_api_key(""), "****");
    }

    #[test]
    fn test_mask_api_key_non_ascii() {
        assert_eq!(mask_api_key("ключ-1234567890-ключ"), "ключ...ключ");
        assert_eq!(mask_api_key("日本語キー"), "****");
    }

    #[test]
    fn test_sanitize_credential_error() {
        let sanitized = sanitize_api_error("Invalid api key provided: sk-123");
        assert!(!sanitized.contains("sk-123"));
    }

    #[test]
    fn test_sanitize_passthrough() {
        assert_eq!(sanitize_api_error("connection refused"), "connection refused");
    }

    #[test]
    fn test_sanitize_truncates_long_errors() {
        let long = "x".repeat(500);
        let sanitized = sanitize_api_error(&long);
        assert!(sanitized.ends_with("...(truncated)"));
        assert!(sanitized.len() < 400);
    }

    #[test]
    fn test_truncate_chars() {
        assert_eq!(truncate_chars("hello", 10), "hello");
        assert_eq!(truncate_chars("hello world", 5), "hello");
        // Multi-byte safety
        assert_eq!(truncate_chars("日本語テスト", 3), "日本語");
    }
}
