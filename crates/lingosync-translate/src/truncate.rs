//! Length-limit transforms for App Store metadata fields.
//!
//! The store enforces hard character limits on several fields; these
//! transforms cut translated text down to size without leaving partial
//! keywords or mid-word cuts behind. All lengths are counted in characters,
//! not bytes, so multi-byte scripts truncate correctly.

/// Maximum length of the localized name and subtitle fields.
pub const APP_INFO_TEXT_LIMIT: usize = 30;

/// Default maximum length of the keywords field.
pub const KEYWORD_LIMIT: usize = 100;

/// Greedily keeps whole comma-separated keywords within `max_length`.
///
/// Items are trimmed and re-joined with `", "`; each item after the first
/// costs its own length plus two separator characters. Accumulation stops at
/// the first item that would push the total past `max_length`, so keywords are
/// never cut mid-item. Empty input returns an empty string.
pub fn truncate_keywords(keywords: &str, max_length: usize) -> String {
    if keywords.is_empty() {
        return String::new();
    }

    let mut kept: Vec<&str> = Vec::new();
    let mut total = 0usize;

    for keyword in keywords.split(',') {
        let keyword = keyword.trim();
        let added = keyword.chars().count() + if kept.is_empty() { 0 } else { 2 };
        if total + added > max_length {
            break;
        }
        kept.push(keyword);
        total += added;
    }

    kept.join(", ")
}

/// Shortens a name or subtitle to at most `max_length` characters.
///
/// A `" - "` separator marks a tagline; when one is present the text is
/// reduced to the left side plus a trailing `" -"` whenever that fits,
/// dropping the tagline entirely. Text without a tagline is returned
/// unchanged while within the limit; over the limit it is cut at the last
/// word boundary that leaves room for an ellipsis, or hard-cut when there
/// is no such boundary.
pub fn truncate_app_info_text(text: &str, max_length: usize) -> String {
    if let Some((left, _tagline)) = text.split_once(" - ") {
        let kept = format!("{left} -");
        if kept.chars().count() <= max_length.saturating_sub(3) {
            return kept;
        }
        return left.chars().take(max_length).collect();
    }

    if text.chars().count() <= max_length {
        return text.to_string();
    }

    let head: String = text.chars().take(max_length.saturating_sub(3)).collect();
    match head.rfind(' ') {
        Some(idx) => format!("{}...", &head[..idx]),
        None => format!("{head}..."),
    }
}
