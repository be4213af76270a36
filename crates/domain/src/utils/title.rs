//! Pure string utility functions for title extraction and manipulation

use crate::constants::{MAX_TITLE_LENGTH, TITLE_TRUNCATE_SUFFIX, UNTITLED_CONVERSATION};

/// Truncate long titles to a maximum length with ellipsis.
///
/// Lengths are counted in characters so multi-byte text is never split.
///
/// # Examples
///
/// ```
/// use pslang_domain::utils::title::truncate_title;
///
/// assert_eq!(truncate_title("Short Title"), "Short Title");
///
/// let long = "x".repeat(200);
/// assert_eq!(truncate_title(&long).chars().count(), 80);
/// ```
#[must_use]
pub fn truncate_title(title: &str) -> String {
    if title.chars().count() > MAX_TITLE_LENGTH {
        let keep = MAX_TITLE_LENGTH - TITLE_TRUNCATE_SUFFIX.chars().count();
        let head: String = title.chars().take(keep).collect();
        format!("{}{}", head.trim_end(), TITLE_TRUNCATE_SUFFIX)
    } else {
        title.to_string()
    }
}

/// First non-empty line of `text`, trimmed.
#[must_use]
pub fn first_line(text: &str) -> Option<&str> {
    text.lines().map(str::trim).find(|line| !line.is_empty())
}

/// Pick a display title: the first candidate with visible text, truncated,
/// or the untitled placeholder.
///
/// ```
/// use pslang_domain::utils::title::title_or_untitled;
///
/// assert_eq!(title_or_untitled([None, Some("  "), Some("Hello\nworld")]), "Hello");
/// assert_eq!(title_or_untitled([None]), "Untitled conversation");
/// ```
#[must_use]
pub fn title_or_untitled<'a, I>(candidates: I) -> String
where
    I: IntoIterator<Item = Option<&'a str>>,
{
    candidates
        .into_iter()
        .flatten()
        .find_map(first_line)
        .map_or_else(|| UNTITLED_CONVERSATION.to_string(), truncate_title)
}
