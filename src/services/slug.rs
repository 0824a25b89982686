//! URL slugs derived from titles

use once_cell::sync::Lazy;
use regex::Regex;

static NON_ALPHANUMERIC: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^a-z0-9]+").expect("slug pattern is valid"));

/// Lower-case the title, collapse every run of characters outside `[a-z0-9]`
/// into one hyphen and trim hyphens from both ends.
///
/// "Top 10 Tips!!" becomes "top-10-tips". Non-ASCII letters are dropped.
pub fn generate_slug(title: &str) -> String {
    let lowered = title.to_lowercase();
    NON_ALPHANUMERIC
        .replace_all(&lowered, "-")
        .trim_matches('-')
        .to_string()
}
