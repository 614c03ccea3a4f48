//! Permission names and permission sets.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Create webhooks.
pub const CREATE_WEBHOOKS: &str = "create.webhooks";
/// Read webhooks.
pub const READ_WEBHOOKS: &str = "read.webhooks";
/// Update webhooks.
pub const UPDATE_WEBHOOKS: &str = "update.webhooks";
/// Archive webhooks.
pub const ARCHIVE_WEBHOOKS: &str = "archive.webhooks";

/// A set of granted permission names.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PermissionSet(BTreeSet<String>);

impl PermissionSet {
    /// An empty set.
    #[must_use]
    pub const fn empty() -> Self {
        Self(BTreeSet::new())
    }

    /// Whether `permission` is granted.
    #[must_use]
    pub fn has(&self, permission: &str) -> bool {
        self.0.contains(permission)
    }

    /// Whether no permission is granted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for PermissionSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}
