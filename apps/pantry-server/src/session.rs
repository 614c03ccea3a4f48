//! Development session fetcher.
//!
//! Trusts identity headers set by the caller. Only suitable behind a proxy
//! that authenticates and rewrites them, or for local runs.

use http::request::Parts;

use pantry_http::{SessionContextFetcher, SessionError};
use pantry_model::{AccountStatus, PermissionSet, Requester, SessionContext};

/// Header naming the calling user.
pub const USER_ID_HEADER: &str = "x-pantry-user-id";
/// Header naming the active household.
pub const HOUSEHOLD_ID_HEADER: &str = "x-pantry-household-id";
/// Comma-separated permissions held in the active household.
pub const PERMISSIONS_HEADER: &str = "x-pantry-permissions";

/// Builds a [`SessionContext`] from `X-Pantry-*` request headers.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeaderSessionFetcher;

fn header<'a>(parts: &'a Parts, name: &str) -> Result<Option<&'a str>, SessionError> {
    let Some(value) = parts.headers.get(name) else {
        return Ok(None);
    };
    let value = value
        .to_str()
        .map_err(|_| SessionError::Invalid(format!("{name} is not valid ASCII")))?
        .trim();
    Ok((!value.is_empty()).then_some(value))
}

impl SessionContextFetcher for HeaderSessionFetcher {
    fn fetch_session(&self, parts: &Parts) -> Result<SessionContext, SessionError> {
        let user_id = header(parts, USER_ID_HEADER)?.ok_or(SessionError::Missing)?;
        let household_id = header(parts, HOUSEHOLD_ID_HEADER)?
            .ok_or_else(|| SessionError::Invalid(format!("{HOUSEHOLD_ID_HEADER} is required")))?;

        let permissions: PermissionSet = header(parts, PERMISSIONS_HEADER)?
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .collect();

        Ok(SessionContext {
            requester: Requester {
                user_id: user_id.to_owned(),
                account_status: AccountStatus::Good,
                service_permissions: PermissionSet::empty(),
            },
            active_household_id: household_id.to_owned(),
            household_permissions: [(household_id.to_owned(), permissions)].into_iter().collect(),
        })
    }
}
