//! Packed recipient field parser
//!
//! Packed format: `<structural>#role#<prefix>@<email>#role#<prefix>@<email>...`
//!
//! The part before the first delimiter is structural and always discarded.
//! Each remaining non-empty segment is split at its first `@`: the left side
//! is the role/id prefix (e.g. `student1234`), the right side is the email.

/// Delimiter joining recipient segments
pub const RECIPIENT_DELIMITER: &str = "#role#";

/// Separator between role/id prefix and email within a segment
pub const PREFIX_SEPARATOR: char = '@';

/// One raw segment of a packed recipient field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecipientSegment<'a> {
    /// Role/id prefix, e.g. `teacher42`
    pub prefix: &'a str,
    pub email: &'a str,
}

/// Recipient after role detection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecipientDescriptor {
    pub role: String,
    /// Identifier appended to the slug prefix; may be empty
    pub numeric_id: String,
    pub email: String,
}

/// Segment that does not split into prefix and email
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MalformedSegment(pub String);

/// Split a packed `to` field into segments, in field order
///
/// Returns the first offending segment if any segment lacks the separator.
/// Nothing is returned for a record that has a bad segment, even if other
/// segments were fine.
pub fn parse_recipients(packed: &str) -> Result<Vec<RecipientSegment<'_>>, MalformedSegment> {
    packed
        .split(RECIPIENT_DELIMITER)
        .skip(1)
        .filter(|segment| !segment.is_empty())
        .map(|segment| {
            segment
                .split_once(PREFIX_SEPARATOR)
                .map(|(prefix, email)| RecipientSegment { prefix, email })
                .ok_or_else(|| MalformedSegment(segment.to_string()))
        })
        .collect()
}
