//! Lexical helpers over raw recognizer output.
//!
//! Everything here is pure and works on the text exactly as the recognizer
//! returned it; no OCR letter/digit substitution is attempted.

/// Text with every ASCII space removed (tabs and newlines are kept).
pub fn strip_spaces(text: &str) -> String {
    text.chars().filter(|c| *c != ' ').collect()
}

/// Extract the first number-like token: optional sign, digits, and an optional
/// `.` followed by at least one digit.
///
/// Spaces are removed first so `"+ 4 5.5"` yields `"+45.5"`. Only the leftmost
/// token is returned; anything after it is ignored.
pub fn extract_number(text: &str) -> Option<String> {
    let s = strip_spaces(text);
    let bytes = s.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        let c = bytes[i];
        let signed = (c == b'+' || c == b'-')
            && bytes.get(i + 1).is_some_and(|b| b.is_ascii_digit());
        if c.is_ascii_digit() || signed {
            let start = i;
            if signed {
                i += 1;
            }
            while i < bytes.len() && bytes[i].is_ascii_digit() {
                i += 1;
            }
            // A trailing '.' only belongs to the token when a digit follows it.
            if bytes.get(i) == Some(&b'.') && bytes.get(i + 1).is_some_and(|b| b.is_ascii_digit())
            {
                i += 1;
                while i < bytes.len() && bytes[i].is_ascii_digit() {
                    i += 1;
                }
            }
            return Some(s[start..i].to_string());
        }
        i += 1;
    }
    None
}

/// `true` when the space-stripped text opens with `+` or `-` directly followed
/// by a digit, e.g. `"+12.5"` or `"- 3"`.
pub fn has_sign_prefix(text: &str) -> bool {
    let s = strip_spaces(text);
    let mut chars = s.chars();
    matches!(
        (chars.next(), chars.next()),
        (Some('+' | '-'), Some(d)) if d.is_ascii_digit()
    )
}

/// Best-effort temperature unit detection: a `c` anywhere (case-insensitive) or
/// one of `glyphs` (degree-sign variants).
pub fn has_temperature_hint(text: &str, glyphs: &[String]) -> bool {
    let lower = text.to_lowercase();
    lower.contains('c') || glyphs.iter().any(|g| !g.is_empty() && lower.contains(g.as_str()))
}

/// Best-effort depth unit detection: an `m` anywhere (case-insensitive).
pub fn has_depth_hint(text: &str) -> bool {
    text.to_lowercase().contains('m')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn degree() -> Vec<String> {
        vec!["°".to_string()]
    }

    #[test]
    fn extract_number_takes_first_token() {
        assert_eq!(extract_number("T=37.5C 12").as_deref(), Some("37.5"));
        assert_eq!(extract_number("ab-12cd").as_deref(), Some("-12"));
        assert_eq!(extract_number("+ 4 5.5").as_deref(), Some("+45.5"));
        assert_eq!(extract_number("no digits"), None);
        assert_eq!(extract_number(""), None);
    }

    #[test]
    fn extract_number_ignores_dangling_sign_and_dot() {
        assert_eq!(extract_number("+x7").as_deref(), Some("7"));
        assert_eq!(extract_number("12.").as_deref(), Some("12"));
        assert_eq!(extract_number("12.a5").as_deref(), Some("12"));
        assert_eq!(extract_number(".5").as_deref(), Some("5"));
        assert_eq!(extract_number("--3").as_deref(), Some("-3"));
    }

    #[test]
    fn sign_prefix_requires_leading_signed_digit() {
        assert!(has_sign_prefix("+12.5"));
        assert!(has_sign_prefix(" - 3"));
        assert!(!has_sign_prefix("12"));
        assert!(!has_sign_prefix("a+12"));
        assert!(!has_sign_prefix("+"));
        assert!(!has_sign_prefix("+a"));
    }

    #[test]
    fn unit_hints() {
        assert!(has_temperature_hint("37.5C", &degree()));
        assert!(has_temperature_hint("37°", &degree()));
        assert!(!has_temperature_hint("37.5", &degree()));
        assert!(!has_temperature_hint("37°", &[]));
        assert!(has_depth_hint("12.4M"));
        assert!(!has_depth_hint("12.4"));
    }
}
