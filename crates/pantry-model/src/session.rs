//! The authenticated caller and what they may do.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::permissions::PermissionSet;
use crate::validation::{Validate, ValidationContext, ValidationError, Validator};

static NO_PERMISSIONS: PermissionSet = PermissionSet::empty();

/// Lifecycle state of a user account.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountStatus {
    /// Registered but not yet verified.
    #[default]
    Unverified,
    /// In good standing.
    Good,
    /// Banned by an admin.
    Banned,
    /// Closed by the user.
    Terminated,
}

/// The user behind a session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Requester {
    /// User ID.
    pub user_id: String,
    /// Account state.
    pub account_status: AccountStatus,
    /// Service-wide permissions.
    pub service_permissions: PermissionSet,
}

/// An authenticated session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionContext {
    /// The caller.
    pub requester: Requester,
    /// The household the caller is acting in.
    #[serde(rename = "activeHouseholdID")]
    pub active_household_id: String,
    /// Permissions per household ID.
    pub household_permissions: BTreeMap<String, PermissionSet>,
}

impl SessionContext {
    /// The caller's user ID.
    #[must_use]
    pub fn user_id(&self) -> &str {
        &self.requester.user_id
    }

    /// Permissions in the active household.
    #[must_use]
    pub fn active_household_permissions(&self) -> &PermissionSet {
        self.household_permissions
            .get(&self.active_household_id)
            .unwrap_or(&NO_PERMISSIONS)
    }

    /// Whether `permission` is granted service-wide or in the active household.
    #[must_use]
    pub fn has_permission(&self, permission: &str) -> bool {
        self.requester.service_permissions.has(permission)
            || self.active_household_permissions().has(permission)
    }

    /// Whether the account may act at all.
    #[must_use]
    pub fn is_in_good_standing(&self) -> bool {
        matches!(
            self.requester.account_status,
            AccountStatus::Good | AccountStatus::Unverified
        )
    }
}

/// Input of the permission check endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserPermissionsRequest {
    /// Permission names to check.
    pub permissions: Vec<String>,
}

impl Validate for UserPermissionsRequest {
    fn validate(&self, _ctx: &ValidationContext<'_>) -> Result<(), ValidationError> {
        Validator::new()
            .not_empty("permissions", &self.permissions)
            .finish()
    }
}

/// Output of the permission check endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserPermissionsResponse {
    /// Whether each requested permission is held.
    pub permissions: BTreeMap<String, bool>,
}

impl UserPermissionsResponse {
    /// Check every permission in `request` against `session`.
    #[must_use]
    pub fn check(session: &SessionContext, request: &UserPermissionsRequest) -> Self {
        let permissions = request
            .permissions
            .iter()
            .map(|p| (p.clone(), session.has_permission(p)))
            .collect();
        Self { permissions }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::permissions::{ARCHIVE_WEBHOOKS, CREATE_WEBHOOKS};

    fn session() -> SessionContext {
        let mut household_permissions = BTreeMap::new();
        household_permissions.insert(
            "h1".to_owned(),
            [CREATE_WEBHOOKS].into_iter().collect::<PermissionSet>(),
        );
        household_permissions.insert("h2".to_owned(), PermissionSet::empty());
        SessionContext {
            requester: Requester {
                user_id: "u1".to_owned(),
                account_status: AccountStatus::Good,
                service_permissions: PermissionSet::empty(),
            },
            active_household_id: "h1".to_owned(),
            household_permissions,
        }
    }

    #[test]
    fn test_should_resolve_active_household_permissions() {
        let mut session = session();
        assert!(session.has_permission(CREATE_WEBHOOKS));
        session.active_household_id = "h2".to_owned();
        assert!(!session.has_permission(CREATE_WEBHOOKS));
        session.active_household_id = "missing".to_owned();
        assert!(session.active_household_permissions().is_empty());
    }

    #[test]
    fn test_should_check_requested_permissions() {
        let request = UserPermissionsRequest {
            permissions: vec![CREATE_WEBHOOKS.to_owned(), ARCHIVE_WEBHOOKS.to_owned()],
        };
        let response = UserPermissionsResponse::check(&session(), &request);
        assert!(response.permissions[CREATE_WEBHOOKS]);
        assert!(!response.permissions[ARCHIVE_WEBHOOKS]);
    }

    #[test]
    fn test_should_reject_banned_accounts() {
        let mut session = session();
        assert!(session.is_in_good_standing());
        session.requester.account_status = AccountStatus::Banned;
        assert!(!session.is_in_good_standing());
    }
}
