//! Role configuration table
//!
//! Maps a role token to the slug prefix used for that role's recipients.
//! An empty prefix is a valid mapping and means "this role gets no slug".
//! The table is built once from configuration and never mutated.

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Default key for anonymous / unauthenticated-account recipients
pub const DEFAULT_ANONYMOUS_KEY: &str = "anonymous";

/// One role → prefix mapping
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleEntry {
    pub token: String,
    #[serde(default)]
    pub prefix: String,
}

impl RoleEntry {
    pub fn new(token: impl Into<String>, prefix: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            prefix: prefix.into(),
        }
    }
}

/// Immutable role token → slug prefix table
///
/// Entry order is significant: the substring detector tests keywords in
/// table order and the first hit wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleTable {
    entries: Vec<RoleEntry>,
    anonymous_key: String,
}

impl RoleTable {
    /// Build a table, validating tokens
    ///
    /// The anonymous key always resolves: if `entries` has no mapping for it,
    /// one with an empty prefix is appended.
    pub fn new(entries: Vec<RoleEntry>, anonymous_key: impl Into<String>) -> Result<Self> {
        let anonymous_key = anonymous_key.into();
        if anonymous_key.is_empty() {
            return Err(Error::Config("anonymous role key must not be empty".to_string()));
        }

        let mut seen: Vec<&str> = Vec::with_capacity(entries.len());
        for entry in &entries {
            if entry.token.is_empty() {
                return Err(Error::Config("role token must not be empty".to_string()));
            }
            if seen.contains(&entry.token.as_str()) {
                return Err(Error::Config(format!("duplicate role token: {}", entry.token)));
            }
            seen.push(&entry.token);
        }

        let mut entries = entries;
        if !entries.iter().any(|e| e.token == anonymous_key) {
            entries.push(RoleEntry::new(anonymous_key.clone(), ""));
        }

        Ok(Self {
            entries,
            anonymous_key,
        })
    }

    /// Prefix configured for `role`, `None` when the role is unknown
    pub fn lookup(&self, role: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| e.token == role)
            .map(|e| e.prefix.as_str())
    }

    /// Role tokens in configuration order
    pub fn tokens(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.token.as_str())
    }

    pub fn anonymous_key(&self) -> &str {
        &self.anonymous_key
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for RoleTable {
    /// Roles the sending side writes into packed recipient fields.
    /// Only student and parent recipients get a profile slug.
    fn default() -> Self {
        Self {
            entries: default_role_entries(),
            anonymous_key: DEFAULT_ANONYMOUS_KEY.to_string(),
        }
    }
}

/// Built-in role entries, also used when the config file has no roles
///
/// An empty prefix yields no slug, so slugged roles carry a non-empty prefix.
pub fn default_role_entries() -> Vec<RoleEntry> {
    vec![
        RoleEntry::new("teacher", ""),
        RoleEntry::new("student", "profiles/students/"),
        RoleEntry::new("parent", "profiles/students/"),
        RoleEntry::new("personel", ""),
        RoleEntry::new(DEFAULT_ANONYMOUS_KEY, ""),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_known_and_unknown() {
        let table = RoleTable::new(vec![RoleEntry::new("teacher", "T")], "anonymous").unwrap();

        assert_eq!(table.lookup("teacher"), Some("T"));
        assert_eq!(table.lookup("student"), None);
    }

    #[test]
    fn test_anonymous_key_defaults_to_empty_prefix() {
        let table = RoleTable::new(vec![RoleEntry::new("teacher", "T")], "guest").unwrap();

        assert_eq!(table.lookup("guest"), Some(""));
        assert_eq!(table.anonymous_key(), "guest");
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_configured_anonymous_prefix_is_kept() {
        let table = RoleTable::new(
            vec![RoleEntry::new("anonymous", "guests/")],
            DEFAULT_ANONYMOUS_KEY,
        )
        .unwrap();

        assert_eq!(table.lookup("anonymous"), Some("guests/"));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_duplicate_tokens_rejected() {
        let result = RoleTable::new(
            vec![RoleEntry::new("teacher", "A"), RoleEntry::new("teacher", "B")],
            "anonymous",
        );
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_empty_token_rejected() {
        let result = RoleTable::new(vec![RoleEntry::new("", "A")], "anonymous");
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_default_table_order() {
        let table = RoleTable::default();
        let tokens: Vec<&str> = table.tokens().collect();
        assert_eq!(tokens, vec!["teacher", "student", "parent", "personel", "anonymous"]);
    }
}
