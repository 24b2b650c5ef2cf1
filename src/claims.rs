//! Access decisions over a signed-in user's profile.
//!
//! [`ClaimsEvaluator`] borrows the profiles the host session holds and
//! answers role, privilege, group and org questions. It never mutates them
//! and keeps no state of its own.
//!
//! Bulk checks (`has_any_privilege`, `has_all_privileges`, `is_in_any_role`,
//! `is_in_any_org`) accept any [`ClaimList`]. When the argument is not a
//! list (only possible with untyped JSON input) a warning is logged and the
//! check answers `false`, which is indistinguishable from "not granted".

use serde_json::Value as JsonValue;

use crate::config::ProviderConfig;
use crate::response::rest_root;
use crate::types::{AppLocation, OrgProfile, UserProfile};
use crate::url_utils;

/// Argument of the bulk checks.
pub trait ClaimList {
    /// The entries, or `None` if the value is not a list at all.
    ///
    /// Entries that are not strings are `None` and never match.
    fn entries(&self) -> Option<Vec<Option<&str>>>;
}

impl<S: AsRef<str>> ClaimList for [S] {
    fn entries(&self) -> Option<Vec<Option<&str>>> {
        Some(self.iter().map(|s| Some(s.as_ref())).collect())
    }
}

impl<S: AsRef<str>, const N: usize> ClaimList for [S; N] {
    fn entries(&self) -> Option<Vec<Option<&str>>> {
        self.as_slice().entries()
    }
}

impl<S: AsRef<str>> ClaimList for Vec<S> {
    fn entries(&self) -> Option<Vec<Option<&str>>> {
        self.as_slice().entries()
    }
}

impl ClaimList for JsonValue {
    fn entries(&self) -> Option<Vec<Option<&str>>> {
        self.as_array()
            .map(|items| items.iter().map(JsonValue::as_str).collect())
    }
}

impl<T: ClaimList + ?Sized> ClaimList for &T {
    fn entries(&self) -> Option<Vec<Option<&str>>> {
        (**self).entries()
    }
}

/// Read-only claims queries over a profile snapshot.
///
/// ```rust,ignore
/// let claims = ClaimsEvaluator::new(&config).with_user(&user).with_org(&org);
/// if claims.is_admin() || claims.has_privilege("portal:admin:viewUsers") {
///     // ...
/// }
/// ```
#[derive(Debug, Clone, Copy)]
pub struct ClaimsEvaluator<'a> {
    config: &'a ProviderConfig,
    user: Option<&'a UserProfile>,
    org: Option<&'a OrgProfile>,
    location: Option<&'a AppLocation>,
}

impl<'a> ClaimsEvaluator<'a> {
    /// Evaluator with no signed-in user.
    #[must_use]
    pub fn new(config: &'a ProviderConfig) -> Self {
        Self {
            config,
            user: None,
            org: None,
            location: None,
        }
    }

    /// Attach the signed-in user. The evaluator then counts as authenticated.
    #[must_use]
    pub fn with_user(mut self, user: &'a UserProfile) -> Self {
        self.user = Some(user);
        self
    }

    /// Attach the user's org (`portals/self`).
    #[must_use]
    pub fn with_org(mut self, org: &'a OrgProfile) -> Self {
        self.org = Some(org);
        self
    }

    /// Attach the host page location, used for on-premise hub home links.
    #[must_use]
    pub fn with_location(mut self, location: &'a AppLocation) -> Self {
        self.location = Some(location);
        self
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    /// Full org administrator: `org_admin` with no custom role assigned.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.user.is_some_and(|user| {
            user.role.as_deref() == Some("org_admin")
                && user.role_id.as_deref().is_none_or(str::is_empty)
        })
    }

    /// ArcGIS users hold exactly one role.
    #[must_use]
    pub fn is_in_role(&self, role: &str) -> bool {
        self.user
            .is_some_and(|user| user.role.as_deref() == Some(role))
    }

    /// Whether the user belongs to `group_id`.
    ///
    /// Answers `false` when the profile carries no group list, which means it
    /// was fetched without groups.
    #[must_use]
    pub fn is_group_member(&self, group_id: &str) -> bool {
        let Some(groups) = self.user.and_then(|user| user.groups.as_ref()) else {
            tracing::debug!(
                group_id = %group_id,
                "is_group_member called on a profile without groups; enable loadGroups"
            );
            return false;
        };
        groups.iter().any(|group| group.id == group_id)
    }

    #[must_use]
    pub fn has_privilege(&self, privilege: &str) -> bool {
        self.user.is_some_and(|user| {
            user.privileges
                .as_deref()
                .unwrap_or_default()
                .iter()
                .any(|p| p == privilege)
        })
    }

    #[must_use]
    pub fn has_any_privilege<L: ClaimList + ?Sized>(&self, privileges: &L) -> bool {
        let Some(entries) = list_or_warn(privileges, "has_any_privilege", "has_privilege") else {
            return false;
        };
        entries
            .into_iter()
            .any(|p| p.is_some_and(|p| self.has_privilege(p)))
    }

    /// `true` only for a non-empty list whose every entry is held.
    #[must_use]
    pub fn has_all_privileges<L: ClaimList + ?Sized>(&self, privileges: &L) -> bool {
        let Some(entries) = list_or_warn(privileges, "has_all_privileges", "has_privilege") else {
            return false;
        };
        !entries.is_empty()
            && entries
                .into_iter()
                .all(|p| p.is_some_and(|p| self.has_privilege(p)))
    }

    #[must_use]
    pub fn is_in_any_role<L: ClaimList + ?Sized>(&self, roles: &L) -> bool {
        let Some(entries) = list_or_warn(roles, "is_in_any_role", "is_in_role") else {
            return false;
        };
        entries
            .into_iter()
            .any(|r| r.is_some_and(|r| self.is_in_role(r)))
    }

    #[must_use]
    pub fn is_in_org(&self, org_id: &str) -> bool {
        self.org.is_some_and(|org| org.id == org_id)
    }

    #[must_use]
    pub fn is_in_any_org<L: ClaimList + ?Sized>(&self, org_ids: &L) -> bool {
        let Some(entries) = list_or_warn(org_ids, "is_in_any_org", "is_in_org") else {
            return false;
        };
        entries
            .into_iter()
            .any(|o| o.is_some_and(|o| self.is_in_org(o)))
    }

    #[must_use]
    pub fn is_level_one(&self) -> bool {
        self.user
            .is_some_and(|user| user.level.as_deref() == Some("1"))
    }

    #[must_use]
    pub fn is_level_two(&self) -> bool {
        self.user
            .is_some_and(|user| user.level.as_deref() == Some("2"))
    }

    /// No org portal properties: a public account outside any org.
    #[must_use]
    pub fn is_public_user(&self) -> bool {
        self.org.is_none_or(|org| org.portal_properties.is_none())
    }

    #[must_use]
    pub fn is_community_org_user(&self) -> bool {
        self.subscription_type() == Some("Community")
    }

    #[must_use]
    pub fn is_esri_user(&self) -> bool {
        self.subscription_type() == Some("In House")
    }

    /// Scheme-less portal hostname.
    ///
    /// Before sign-in (or without org data) this is the configured portal URL
    /// without its scheme. Replaces the removed `portalHostName` and
    /// `orgPortalUrl` accessors.
    #[must_use]
    pub fn portal_hostname(&self) -> String {
        self.authenticated_org()
            .and_then(url_utils::portal_hostname)
            .unwrap_or_else(|| url_utils::strip_scheme(self.config.portal_url()).to_string())
    }

    /// Portal REST root.
    ///
    /// Before sign-in this is `<portal_hostname>/sharing/rest`, without a scheme.
    #[must_use]
    pub fn portal_rest_url(&self) -> String {
        self.authenticated_org()
            .and_then(url_utils::portal_rest_url)
            .unwrap_or_else(|| rest_root(&self.portal_hostname()))
    }

    /// Link to the user's hub home.
    ///
    /// On-premise portals use the current app's `#/home`; online orgs use the
    /// configured hub home or `https://<urlKey>.<hub domain>.arcgis.com`.
    /// `None` when the needed org data or app location is missing.
    #[must_use]
    pub fn user_hub_home(&self) -> Option<String> {
        let org = self.org?;
        if org.is_portal {
            return self
                .location
                .map(|location| format!("{}#/home", location.base_href()));
        }
        if let Some(home) = org.hub_home() {
            return Some(home.to_string());
        }
        let url_key = org.url_key.as_deref()?;
        let hub_base = url_utils::hub_base_from_portal_url(self.config.portal_url());
        Some(format!("https://{url_key}.{hub_base}.arcgis.com"))
    }

    fn authenticated_org(&self) -> Option<&'a OrgProfile> {
        if self.is_authenticated() { self.org } else { None }
    }

    fn subscription_type(&self) -> Option<&'a str> {
        self.org?.subscription_info.as_ref()?.kind.as_deref()
    }
}

fn list_or_warn<'l, L: ClaimList + ?Sized>(
    list: &'l L,
    operation: &str,
    single: &str,
) -> Option<Vec<Option<&'l str>>> {
    let entries = list.entries();
    if entries.is_none() {
        tracing::warn!(
            operation = %operation,
            "{operation} was not passed a list; use {single} instead"
        );
    }
    entries
}
