//! Best-effort text detection for decoded output.

/// View decoded bytes as UTF-8 text if they plausibly are text.
///
/// Returns `None` when the bytes contain a NUL or any invalid UTF-8
/// sequence; callers then keep the raw bytes.
pub fn best_effort_text(data: &[u8]) -> Option<&str> {
    if data.contains(&0) {
        return None;
    }
    std::str::from_utf8(data).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_ascii() {
        assert_eq!(best_effort_text(b"hello world\n"), Some("hello world\n"));
    }

    #[test]
    fn test_multibyte_utf8() {
        let s = "héllo wörld ✓";
        assert_eq!(best_effort_text(s.as_bytes()), Some(s));
    }

    #[test]
    fn test_nul_byte_rejected() {
        assert_eq!(best_effort_text(b"bin\x00ary"), None);
    }

    #[test]
    fn test_invalid_sequence_rejected() {
        assert_eq!(best_effort_text(&[0x68, 0x69, 0xC3]), None);
        assert_eq!(best_effort_text(&[0xFF, 0xFE]), None);
    }

    #[test]
    fn test_empty_is_text() {
        assert_eq!(best_effort_text(b""), Some(""));
    }
}
