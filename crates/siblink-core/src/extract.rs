//! Wikilink extraction.
//!
//! Recognises `[[identifier]]` and `[[identifier|alias]]` on a single line and
//! yields the identifier portion only. Matching is case-sensitive and does not
//! validate the identifier; anything other than `]` and `|` is accepted
//! between the delimiters. Unmatched or malformed brackets yield nothing.

use regex::{CaptureMatches, Regex};
use std::sync::LazyLock;

static WIKILINK_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[\[([^\]|]+)(?:\|[^\]|]+)?\]\]").expect("wikilink regex")
});

/// Lazy iterator over the reference tokens of one line.
///
/// Restartable by calling [`extract_references`] again on the same line.
pub struct ReferenceTokens<'a> {
    captures: CaptureMatches<'static, 'a>,
}

impl<'a> Iterator for ReferenceTokens<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        self.captures
            .by_ref()
            .find_map(|cap| cap.get(1).map(|m| m.as_str()))
    }
}

/// Extract reference tokens from `line`, left to right, non-overlapping.
pub fn extract_references(line: &str) -> ReferenceTokens<'_> {
    ReferenceTokens {
        captures: WIKILINK_REGEX.captures_iter(line),
    }
}

/// Canonical reference literal for a token: the token wrapped back into
/// wikilink syntax.
pub fn reference_literal(token: &str) -> String {
    format!("[[{}]]", token)
}
