//! Credential redaction for display

/// Number of leading characters of a token shown by [`redact_token`].
pub const TOKEN_PREVIEW_CHARS: usize = 12;

/// Shorten a token to a recognisable prefix, e.g. `eyJhbGciOiJF...`.
///
/// Tokens shorter than the preview are fully masked.
#[must_use]
pub fn redact_token(token: &str) -> String {
    redact_with_preview(token, TOKEN_PREVIEW_CHARS)
}

/// Like [`redact_token`] with a caller-chosen preview length
#[must_use]
pub fn redact_with_preview(token: &str, preview: usize) -> String {
    let len = token.chars().count();
    if len <= preview {
        return "*".repeat(len.max(3));
    }
    let head: String = token.chars().take(preview).collect();
    format!("{head}...")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_long_token_truncated() {
        let token = "eyJhbGciOiJFZERTQSJ9.payload.signature";
        assert_eq!(redact_token(token), "eyJhbGciOiJF...");
    }

    #[test]
    fn test_short_token_masked() {
        assert_eq!(redact_token("abc"), "***");
        assert_eq!(redact_token(""), "***");
    }

    #[test]
    fn test_multibyte_boundary() {
        assert_eq!(redact_with_preview("ééééé", 2), "éé...");
    }
}
