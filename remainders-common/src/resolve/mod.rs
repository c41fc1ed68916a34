//! Recipient resolution and message fan-out
//!
//! A stored record addresses a batch of recipients through one packed `to`
//! field. Resolution runs in four steps:
//!
//! 1. [`parser`] splits the packed field into segments (role/id prefix + email)
//! 2. [`detector`] classifies the prefix into a role and identifier
//! 3. [`slug`] looks the role up in the [`RoleTable`] and builds the slug
//! 4. [`fanout`] substitutes the slug into the message, one record per recipient
//!
//! Malformed segments fail the whole record. Unknown roles only drop the
//! recipient they belong to.

pub mod detector;
pub mod fanout;
pub mod parser;
pub mod roles;
pub mod slug;

pub use detector::{RoleDetector, RoleMatch, RolePolicy, SubstringMembership, TokenExtraction};
pub use fanout::{FanoutEngine, Placeholder};
pub use parser::{parse_recipients, RecipientDescriptor, RecipientSegment};
pub use roles::{RoleEntry, RoleTable};
pub use slug::{resolve_slug, Slug};
