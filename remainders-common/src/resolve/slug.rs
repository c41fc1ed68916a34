//! Slug resolution
//!
//! A slug is the per-recipient path fragment substituted into a message
//! template: the role's configured prefix followed by the identifier.

use super::detector::RoleMatch;
use super::roles::RoleTable;

/// Outcome of resolving a recognised role
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Slug {
    /// Prefix + identifier
    Resolved(String),
    /// Role maps to an empty prefix; placeholder is cleared
    NoSlug,
}

/// Resolve `role` against the table
///
/// Returns `None` when the role is not in the table (recipient is dropped).
pub fn resolve_slug(roles: &RoleTable, role: &RoleMatch) -> Option<Slug> {
    let prefix = roles.lookup(&role.role)?;

    if prefix.is_empty() {
        return Some(Slug::NoSlug);
    }

    Some(Slug::Resolved(format!("{}{}", prefix, role.identifier)))
}
