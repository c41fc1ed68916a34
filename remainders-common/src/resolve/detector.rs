//! Role detection strategies
//!
//! Two detection policies exist for the role/id prefix of a segment:
//!
//! - [`SubstringMembership`]: the prefix *contains* one of the configured role
//!   tokens. First token in table order wins. The identifier is whatever is
//!   left after removing that token (`student1234` → `1234`).
//! - [`TokenExtraction`]: the role is the leading run of lowercase letters and
//!   the identifier is the first run of digits (`teacher42x` → `teacher`, `42`).
//!
//! Either way an unknown role yields `None`, which drops the recipient.

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::roles::RoleTable;

static LEADING_ROLE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-z]+").expect("static regex"));
static DIGIT_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"[0-9]+").expect("static regex"));

/// Result of classifying a segment prefix
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleMatch {
    /// Role token as it appears in the role table
    pub role: String,
    /// Identifier appended to the slug prefix (may be empty)
    pub identifier: String,
}

/// Strategy for turning a segment prefix into a role and identifier
pub trait RoleDetector: Send + Sync + fmt::Debug {
    /// Policy name for logging
    fn name(&self) -> &'static str;

    /// Classify `prefix`; `None` if no configured role applies
    fn detect(&self, prefix: &str, roles: &RoleTable) -> Option<RoleMatch>;
}

/// Selectable detection policy (configuration value)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RolePolicy {
    /// Role keyword contained anywhere in the prefix
    Substring,
    /// Leading lowercase token, looked up verbatim
    #[default]
    Token,
}

impl RolePolicy {
    /// Detector implementing this policy
    pub fn detector(self) -> Box<dyn RoleDetector> {
        match self {
            RolePolicy::Substring => Box::new(SubstringMembership),
            RolePolicy::Token => Box::new(TokenExtraction),
        }
    }
}

impl fmt::Display for RolePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RolePolicy::Substring => write!(f, "substring"),
            RolePolicy::Token => write!(f, "token"),
        }
    }
}

/// Role keyword membership test over the whole prefix
#[derive(Debug, Clone, Copy, Default)]
pub struct SubstringMembership;

impl RoleDetector for SubstringMembership {
    fn name(&self) -> &'static str {
        "substring"
    }

    fn detect(&self, prefix: &str, roles: &RoleTable) -> Option<RoleMatch> {
        let role = roles.tokens().find(|token| prefix.contains(token))?;

        // every role keyword is stripped, not just the matched one
        let identifier = roles
            .tokens()
            .fold(prefix.to_string(), |rest, token| rest.replace(token, ""));

        Some(RoleMatch {
            role: role.to_string(),
            identifier,
        })
    }
}

/// Leading lowercase token plus first digit run
#[derive(Debug, Clone, Copy, Default)]
pub struct TokenExtraction;

impl RoleDetector for TokenExtraction {
    fn name(&self) -> &'static str {
        "token"
    }

    fn detect(&self, prefix: &str, roles: &RoleTable) -> Option<RoleMatch> {
        let role = LEADING_ROLE.find(prefix)?.as_str();
        roles.lookup(role)?;

        let identifier = DIGIT_RUN
            .find(prefix)
            .map(|m| m.as_str().to_string())
            .unwrap_or_default();

        Some(RoleMatch {
            role: role.to_string(),
            identifier,
        })
    }
}
