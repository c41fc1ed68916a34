//! Message fan-out engine
//!
//! Expands one [`StoredRecord`] into one [`ResolvedRecord`] per recipient,
//! substituting each recipient's slug into the message template.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use super::detector::{RoleDetector, RolePolicy};
use super::parser::{parse_recipients, MalformedSegment, RecipientDescriptor};
use super::roles::RoleTable;
use super::slug::{resolve_slug, Slug};
use crate::models::{ResolvedRecord, StoredRecord};
use crate::{Error, Result};

/// Placeholder token in message templates
pub const SLUG_TOKEN: &str = "#SLUG#";

/// Placeholder token used together with the substring policy
pub const SLUG_PATH_TOKEN: &str = "#SLUG#/";

/// Placeholder substitution rule
///
/// The token is replaced by `slug + suffix` when a slug exists and by the
/// empty string otherwise, so `#SLUG#/` never leaves a dangling `/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Placeholder {
    pub token: String,
    #[serde(default)]
    pub suffix: String,
}

impl Placeholder {
    /// `#SLUG#` → slug
    pub fn slug() -> Self {
        Self {
            token: SLUG_TOKEN.to_string(),
            suffix: String::new(),
        }
    }

    /// `#SLUG#/` → slug + `/`, or nothing
    pub fn slug_path() -> Self {
        Self {
            token: SLUG_PATH_TOKEN.to_string(),
            suffix: "/".to_string(),
        }
    }

    /// Default placeholder for a detection policy
    pub fn for_policy(policy: RolePolicy) -> Self {
        match policy {
            RolePolicy::Substring => Self::slug_path(),
            RolePolicy::Token => Self::slug(),
        }
    }

    /// Replace every occurrence of the token in `template`
    pub fn render(&self, template: &str, slug: &Slug) -> String {
        let replacement = match slug {
            Slug::Resolved(value) => format!("{}{}", value, self.suffix),
            Slug::NoSlug => String::new(),
        };
        template.replace(&self.token, &replacement)
    }
}

/// Recipient resolution + fan-out over an immutable role table
#[derive(Debug, Clone)]
pub struct FanoutEngine {
    roles: Arc<RoleTable>,
    detector: Arc<dyn RoleDetector>,
    placeholder: Placeholder,
}

impl FanoutEngine {
    pub fn new(
        roles: Arc<RoleTable>,
        detector: Arc<dyn RoleDetector>,
        placeholder: Placeholder,
    ) -> Result<Self> {
        if placeholder.token.is_empty() {
            return Err(Error::Config("placeholder token must not be empty".to_string()));
        }

        Ok(Self {
            roles,
            detector,
            placeholder,
        })
    }

    /// Engine for `policy` with that policy's default placeholder
    pub fn with_policy(roles: RoleTable, policy: RolePolicy) -> Self {
        Self {
            roles: Arc::new(roles),
            detector: Arc::from(policy.detector()),
            placeholder: Placeholder::for_policy(policy),
        }
    }

    pub fn roles(&self) -> &RoleTable {
        &self.roles
    }

    pub fn placeholder(&self) -> &Placeholder {
        &self.placeholder
    }

    /// Parse and classify the recipients of `record`
    ///
    /// Recipients whose role is not in the table are left out. A malformed
    /// segment fails the whole record.
    pub fn recipients(&self, record: &StoredRecord) -> Result<Vec<(RecipientDescriptor, Slug)>> {
        let segments = parse_recipients(&record.to).map_err(|MalformedSegment(segment)| {
            Error::MalformedRecipientSegment {
                record: record.diagnostic_id(),
                segment,
            }
        })?;

        let mut recipients = Vec::with_capacity(segments.len());
        for segment in segments {
            let resolved = self
                .detector
                .detect(segment.prefix, &self.roles)
                .and_then(|role| resolve_slug(&self.roles, &role).map(|slug| (role, slug)));

            match resolved {
                Some((role, slug)) => recipients.push((
                    RecipientDescriptor {
                        role: role.role,
                        numeric_id: role.identifier,
                        email: segment.email.to_string(),
                    },
                    slug,
                )),
                None => debug!(
                    record = %record.diagnostic_id(),
                    prefix = segment.prefix,
                    policy = self.detector.name(),
                    "Dropping recipient with unresolved role"
                ),
            }
        }

        Ok(recipients)
    }

    /// One resolved record per recipient, in segment order
    pub fn fan_out(&self, record: &StoredRecord) -> Result<Vec<ResolvedRecord>> {
        let recipients = self.recipients(record)?;

        Ok(recipients
            .into_iter()
            .map(|(recipient, slug)| ResolvedRecord {
                to: recipient.email,
                title: record.title.clone(),
                message: self.placeholder.render(&record.message, &slug),
                kind: record.kind.clone(),
                updated_at: record.updated_at,
            })
            .collect())
    }

    /// Fan out a batch, flattening while keeping source order
    ///
    /// Stops at the first malformed record; no partial output.
    pub fn fan_out_all(&self, records: &[StoredRecord]) -> Result<Vec<ResolvedRecord>> {
        let mut resolved = Vec::new();
        for record in records {
            match self.fan_out(record) {
                Ok(batch) => resolved.extend(batch),
                Err(e) => {
                    error!("Fan-out aborted: {}", e);
                    return Err(e);
                }
            }
        }
        Ok(resolved)
    }
}
