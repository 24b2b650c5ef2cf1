use derive_more::{Display, From, Into};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use url::Url;

use crate::error::Error;

/// ArcGIS application client ID (`apiKey` in host configuration).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Display, From, Into)]
#[serde(transparent)]
pub struct ClientId(pub String);

impl ClientId {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ClientId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// A value resolved for a URL parameter.
///
/// `Bool(false)` counts as a value; an empty `Str` does not.
#[derive(Debug, Clone, PartialEq, Eq, Display)]
pub enum ParamValue {
    Str(String),
    Bool(bool),
    Int(i64),
}

impl ParamValue {
    /// Whether this value should be sent at all.
    #[must_use]
    pub fn is_present(&self) -> bool {
        !matches!(self, Self::Str(s) if s.is_empty())
    }
}

impl From<&str> for ParamValue {
    fn from(s: &str) -> Self {
        Self::Str(s.to_owned())
    }
}

impl From<String> for ParamValue {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}

impl From<bool> for ParamValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<u32> for ParamValue {
    fn from(n: u32) -> Self {
        Self::Int(i64::from(n))
    }
}

/// Per-attempt options passed to [`ArcGisOAuth::open`](crate::oauth::ArcGisOAuth::open).
///
/// Keys keep insertion order, and every key left after the provider has
/// consumed its control options (`remoteServiceName`, `portalUrl`, `path`)
/// is sent as a URL parameter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestOptions(IndexMap<String, String>);

impl RequestOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an option, chaining.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(name, value);
        self
    }

    /// Insert or replace an option. A replaced key keeps its original position.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.insert(name.into(), value.into());
    }

    /// Remove an option, preserving the order of the rest.
    pub fn remove(&mut self, name: &str) -> Option<String> {
        self.0.shift_remove(name)
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for RequestOptions {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// Raw fields deposited by the redirect page and returned by the popup collaborator.
pub type AuthResponse = IndexMap<String, String>;

/// Session payload handed to the host session layer after a successful sign-in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[non_exhaustive]
pub struct NormalizedSession {
    pub properties: SessionProperties,
    pub provider: String,
    pub redirect_uri: String,
}

/// Credential and routing metadata of a [`NormalizedSession`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[non_exhaustive]
pub struct SessionProperties {
    /// Every field returned by the provider (`token`, `state`, `expires_in`, `username`, ...).
    #[serde(flatten)]
    pub auth: AuthResponse,
    pub client_id: ClientId,
    /// REST root of the portal, `<portalUrl>/sharing/rest`.
    pub portal: String,
    /// Always `false`: interactive sign-in never relies on web-tier credentials.
    pub with_credentials: bool,
    /// Always `"token"`.
    pub auth_type: String,
}

impl SessionProperties {
    /// Look up a provider-returned field.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&str> {
        self.auth.get(name).map(String::as_str)
    }

    #[must_use]
    pub fn token(&self) -> Option<&str> {
        self.field("token")
    }

    #[must_use]
    pub fn username(&self) -> Option<&str> {
        self.field("username")
    }
}

/// Portal user, as returned by `community/self`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[non_exhaustive]
pub struct UserProfile {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    /// Custom role assignment; present for members with a non-default role.
    #[serde(default)]
    pub role_id: Option<String>,
    /// Only populated when the profile was fetched with groups.
    #[serde(default)]
    pub groups: Option<Vec<Group>>,
    #[serde(default)]
    pub privileges: Option<Vec<String>>,
    #[serde(default)]
    pub level: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, JsonValue>,
}

impl UserProfile {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role = Some(role.into());
        self
    }

    #[must_use]
    pub fn with_role_id(mut self, role_id: impl Into<String>) -> Self {
        self.role_id = Some(role_id.into());
        self
    }

    #[must_use]
    pub fn with_groups(mut self, groups: Vec<Group>) -> Self {
        self.groups = Some(groups);
        self
    }

    #[must_use]
    pub fn with_privileges<S: Into<String>>(mut self, privileges: impl IntoIterator<Item = S>) -> Self {
        self.privileges = Some(privileges.into_iter().map(Into::into).collect());
        self
    }

    #[must_use]
    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.level = Some(level.into());
        self
    }
}

/// A group membership entry of a [`UserProfile`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub struct Group {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, JsonValue>,
}

impl Group {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: None,
            extra: Map::new(),
        }
    }
}

/// Portal organization, as returned by `portals/self`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[non_exhaustive]
pub struct OrgProfile {
    pub id: String,
    #[serde(default)]
    pub subscription_info: Option<SubscriptionInfo>,
    /// Free-form portal properties; absent for public (org-less) users.
    #[serde(default)]
    pub portal_properties: Option<JsonValue>,
    #[serde(default)]
    pub url_key: Option<String>,
    /// `true` for ArcGIS Enterprise (on-premise) portals.
    #[serde(default)]
    pub is_portal: bool,
    #[serde(default)]
    pub portal_hostname: Option<String>,
    #[serde(default)]
    pub custom_base_url: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, JsonValue>,
}

impl OrgProfile {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_subscription_type(mut self, kind: impl Into<String>) -> Self {
        self.subscription_info = Some(SubscriptionInfo {
            kind: Some(kind.into()),
        });
        self
    }

    #[must_use]
    pub fn with_portal_properties(mut self, properties: JsonValue) -> Self {
        self.portal_properties = Some(properties);
        self
    }

    #[must_use]
    pub fn with_url_key(mut self, url_key: impl Into<String>) -> Self {
        self.url_key = Some(url_key.into());
        self
    }

    #[must_use]
    pub fn with_custom_base_url(mut self, base: impl Into<String>) -> Self {
        self.custom_base_url = Some(base.into());
        self
    }

    #[must_use]
    pub fn with_portal_hostname(mut self, hostname: impl Into<String>) -> Self {
        self.portal_hostname = Some(hostname.into());
        self
    }

    #[must_use]
    pub fn with_is_portal(mut self, is_portal: bool) -> Self {
        self.is_portal = is_portal;
        self
    }

    /// `portalProperties.hub.settings.hubHome`, when set.
    #[must_use]
    pub fn hub_home(&self) -> Option<&str> {
        self.portal_properties
            .as_ref()?
            .pointer("/hub/settings/hubHome")?
            .as_str()
            .filter(|s| !s.is_empty())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[non_exhaustive]
pub struct SubscriptionInfo {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
}

/// Current URL of the host page.
///
/// Supplies the origin used for redirect URIs and iframe `parent`, and the
/// app base used for on-premise hub home links.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppLocation {
    href: Url,
}

impl AppLocation {
    #[must_use]
    pub fn new(href: Url) -> Self {
        Self { href }
    }

    /// Parse the page URL.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidUrl`] if `href` is not an absolute URL.
    pub fn parse(href: &str) -> Result<Self, Error> {
        Ok(Self::new(href.parse()?))
    }

    /// `scheme://host[:port]` of the page.
    #[must_use]
    pub fn origin(&self) -> String {
        self.href.origin().ascii_serialization()
    }

    /// The page URL without its fragment.
    #[must_use]
    pub fn base_href(&self) -> String {
        let mut base = self.href.clone();
        base.set_fragment(None);
        base.into()
    }

    #[must_use]
    pub fn href(&self) -> &Url {
        &self.href
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn param_value_presence() {
        assert!(ParamValue::Bool(false).is_present());
        assert!(ParamValue::Int(0).is_present());
        assert!(ParamValue::from("en-us").is_present());
        assert!(!ParamValue::from("").is_present());
    }

    #[test]
    fn param_value_display() {
        assert_eq!(ParamValue::Bool(false).to_string(), "false");
        assert_eq!(ParamValue::from(20160u32).to_string(), "20160");
        assert_eq!(ParamValue::from("token").to_string(), "token");
    }

    #[test]
    fn request_options_keep_insertion_order() {
        let mut options = RequestOptions::new()
            .with("b", "1")
            .with("a", "2")
            .with("c", "3");
        options.insert("b", "replaced");
        options.remove("a");

        let keys: Vec<_> = options.iter().collect();
        assert_eq!(keys, vec![("b", "replaced"), ("c", "3")]);
    }

    #[test]
    fn app_location_origin_and_base() {
        let location = AppLocation::parse("https://apps.example.com:8443/app/index.html#/sites").unwrap();
        assert_eq!(location.origin(), "https://apps.example.com:8443");
        assert_eq!(
            location.base_href(),
            "https://apps.example.com:8443/app/index.html"
        );
    }

    #[test]
    fn user_profile_from_portal_json() {
        let json = serde_json::json!({
            "username": "jsmith",
            "role": "org_publisher",
            "roleId": "abc123",
            "privileges": ["portal:user:createItem"],
            "level": "2",
            "groups": [{"id": "g1", "title": "Editors", "owner": "admin"}],
            "email": "jsmith@example.com"
        });
        let user: UserProfile = serde_json::from_value(json).unwrap();

        assert_eq!(user.role.as_deref(), Some("org_publisher"));
        assert_eq!(user.role_id.as_deref(), Some("abc123"));
        assert_eq!(user.groups.as_ref().unwrap()[0].id, "g1");
        assert_eq!(user.extra["email"], "jsmith@example.com");
    }

    #[test]
    fn org_profile_hub_home() {
        let org = OrgProfile::new("org1").with_portal_properties(serde_json::json!({
            "hub": {"settings": {"hubHome": "https://hub.example.com"}}
        }));
        assert_eq!(org.hub_home(), Some("https://hub.example.com"));
        assert_eq!(OrgProfile::new("org2").hub_home(), None);
    }

    #[test]
    fn org_profile_subscription_type_json() {
        let org: OrgProfile = serde_json::from_value(serde_json::json!({
            "id": "org1",
            "subscriptionInfo": {"type": "In House"},
            "urlKey": "acme",
            "customBaseUrl": "maps.arcgis.com"
        }))
        .unwrap();
        assert_eq!(
            org.subscription_info.unwrap().kind.as_deref(),
            Some("In House")
        );
        assert_eq!(org.url_key.as_deref(), Some("acme"));
        assert!(!org.is_portal);
    }
}
