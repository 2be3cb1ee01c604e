//! Release lifecycle core: validation, transactional create/update/
//! delete with all-or-nothing requirement persistence, the one-hour
//! edit window, and version-ordered listing.

pub mod lifecycle;
pub mod query;
pub mod requirements;
pub mod validate;

use std::collections::BTreeMap;

use crate::entity::release;

pub use lifecycle::{create, delete, editable, update};
pub use query::{all, count, get};

/// A requirement mapping as callers hand it in and get it back:
/// dependency package name to optional constraint string. `None` means
/// any version.
pub type RequirementMap = BTreeMap<String, Option<String>>;

/// A committed release together with its resolved requirement mapping.
/// Create, update and get always return this fully populated value;
/// nothing mutates a shared object graph.
#[derive(Debug, Clone, PartialEq)]
pub struct ReleaseWithRequirements {
    pub release: release::Model,
    pub requirements: RequirementMap,
}
