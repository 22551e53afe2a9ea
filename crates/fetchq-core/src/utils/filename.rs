//! Filenames for `Content-Disposition` headers.

/// Used when sanitizing leaves nothing behind.
pub const FALLBACK_FILENAME: &str = "download.mp4";

/// Restrict a worker-reported filename to ASCII letters, digits,
/// underscore, space, dot and hyphen.
///
/// Anything else becomes `_`; surrounding whitespace is trimmed. The result
/// is always a valid header value.
#[must_use]
pub fn attachment_filename(name: &str) -> String {
    let mapped: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '_' | ' ' | '.' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();

    let trimmed = mapped.trim();
    if trimmed.is_empty() || trimmed.chars().all(|c| c == '.') {
        FALLBACK_FILENAME.to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replaces_disallowed_characters() {
        assert_eq!(
            attachment_filename("Rick Astley - Never Gonna Give You Up (Video).mp4"),
            "Rick Astley - Never Gonna Give You Up _Video_.mp4"
        );
        assert_eq!(attachment_filename("a/b\"c.mp4"), "a_b_c.mp4");
    }

    #[test]
    fn non_ascii_and_control_chars_are_replaced() {
        assert_eq!(attachment_filename("Café\n.mp4"), "Caf__.mp4");
    }

    #[test]
    fn trims_whitespace_and_falls_back_when_empty() {
        assert_eq!(attachment_filename("  clip.mp4  "), "clip.mp4");
        assert_eq!(attachment_filename("   "), FALLBACK_FILENAME);
        assert_eq!(attachment_filename(".."), FALLBACK_FILENAME);
    }
}
