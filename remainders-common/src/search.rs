//! Search phrase sanitization
//!
//! User input from the search endpoint is untrusted and ends up as a regex
//! fragment at the record-source level. It is reduced in two stages:
//!
//! 1. drop every character that is not graphic (controls, format characters,
//!    line/paragraph separators; plain spaces survive this stage)
//! 2. keep only the leading run of `[0-9A-Za-z.@-]`
//!
//! Everything from the first disallowed character on is discarded, so
//! `bob<script>@x.com` becomes `bob`.

use regex::{Regex, RegexBuilder};

use crate::{Error, Result};

/// Sanitized, non-empty search phrase
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchPhrase(String);

impl SearchPhrase {
    /// Sanitize `raw`; fails with [`Error::SanitizationEmpty`] if nothing is left
    pub fn parse(raw: &str) -> Result<Self> {
        let phrase = sanitize(raw);
        if phrase.is_empty() {
            return Err(Error::SanitizationEmpty);
        }
        Ok(Self(phrase))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Case-insensitive, multiline regex over a packed `to` field.
    ///
    /// `.` keeps its regex meaning here, matching the store's `$regex`
    /// semantics; `-` and `@` are literals outside a character class.
    pub fn query_regex(&self) -> Result<Regex> {
        RegexBuilder::new(&self.0)
            .case_insensitive(true)
            .multi_line(true)
            .build()
            .map_err(|e| Error::Internal(format!("search pattern: {}", e)))
    }

    /// Post fan-out check: plain substring of a resolved recipient address
    pub fn matches_recipient(&self, to: &str) -> bool {
        to.contains(self.0.as_str())
    }
}

impl std::fmt::Display for SearchPhrase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Two-stage sanitization; idempotent
pub fn sanitize(raw: &str) -> String {
    raw.chars()
        .filter(|c| is_graphic(*c))
        .take_while(|c| is_phrase_char(*c))
        .collect()
}

/// Allowed phrase alphabet: `[0-9A-Za-z.@-]`
fn is_phrase_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '.' | '@' | '-')
}

/// Printable character, including the ASCII space
fn is_graphic(c: char) -> bool {
    if c == ' ' {
        return true;
    }
    !(c.is_control() || c.is_whitespace() || is_format_char(c))
}

fn is_format_char(c: char) -> bool {
    matches!(
        c,
        '\u{00AD}'
            | '\u{061C}'
            | '\u{180E}'
            | '\u{200B}'..='\u{200F}'
            | '\u{202A}'..='\u{202E}'
            | '\u{2060}'..='\u{2064}'
            | '\u{2066}'..='\u{206F}'
            | '\u{FEFF}'
            | '\u{FFF9}'..='\u{FFFB}'
    )
}
