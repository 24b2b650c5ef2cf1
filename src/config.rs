use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::types::{ClientId, ParamValue};

pub const DEFAULT_PORTAL_URL: &str = "https://www.arcgis.com";
pub const DEFAULT_AUTHORIZE_PATH: &str = "/sharing/oauth2/authorize";
pub const DEFAULT_EXPIRATION_MINUTES: u32 = 20160;
pub const DEFAULT_LOCALE: &str = "en-us";

/// URL parameters that must resolve to a value.
pub const REQUIRED_URL_PARAMS: [&str; 5] = [
    "response_type",
    "showSocialLogins",
    "display",
    "expiration",
    "locale",
];

/// URL parameters that are sent only when they resolve to a value.
pub const OPTIONAL_URL_PARAMS: [&str; 4] = [
    "client",
    "parent",
    "autoAccountCreateForSocial",
    "socialLoginProviderName",
];

/// Fields the redirect page must hand back.
pub const RESPONSE_PARAMS: [&str; 4] = ["token", "state", "expires_in", "username"];

/// How the sign-in page is shown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayMode {
    #[default]
    Default,
    Iframe,
}

impl DisplayMode {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Iframe => "iframe",
        }
    }
}

impl std::str::FromStr for DisplayMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "default" => Ok(Self::Default),
            "iframe" => Ok(Self::Iframe),
            other => Err(Error::Config(format!("unknown display mode: {other}"))),
        }
    }
}

/// ArcGIS provider configuration.
///
/// The client ID is the only required value and is a constructor parameter.
/// Everything else defaults to ArcGIS Online settings and can be overridden
/// with the `with_*` methods, loaded with [`from_env()`](ProviderConfig::from_env),
/// or deserialized from the host's provider block (`apiKey`, `portalUrl`, ...).
///
/// ```rust,ignore
/// let config = ProviderConfig::new("my-client-id")
///     .with_portal_url("https://myorg.maps.arcgis.com")
///     .with_display(DisplayMode::Iframe);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[non_exhaustive]
pub struct ProviderConfig {
    #[serde(rename = "apiKey")]
    pub(crate) client_id: ClientId,
    #[serde(default = "default_portal_url", deserialize_with = "deserialize_portal_url")]
    pub(crate) portal_url: String,
    #[serde(default = "default_path")]
    pub(crate) path: String,
    #[serde(default)]
    pub(crate) display: DisplayMode,
    #[serde(default = "default_expiration")]
    pub(crate) expiration: u32,
    #[serde(default = "default_locale")]
    pub(crate) locale: String,
    #[serde(default)]
    pub(crate) show_social_logins: bool,
    #[serde(default)]
    pub(crate) custom_redirect_uri: Option<String>,
    #[serde(default = "default_root_path")]
    pub(crate) root_path: String,
    #[serde(default = "default_true")]
    pub(crate) load_groups: bool,
    #[serde(default = "default_required")]
    pub(crate) required_url_params: Vec<String>,
    #[serde(default = "default_optional")]
    pub(crate) optional_url_params: Vec<String>,
    #[serde(default = "default_response")]
    pub(crate) response_params: Vec<String>,
    /// Additional parameter values, keyed by camelized parameter name.
    #[serde(default)]
    pub(crate) extra_params: BTreeMap<String, String>,
}

fn default_portal_url() -> String {
    DEFAULT_PORTAL_URL.into()
}

/// Portal URLs are stored without a trailing `/` so paths can be appended.
fn normalize_portal_url(url: &str) -> String {
    url.trim_end_matches('/').to_string()
}

fn deserialize_portal_url<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let url = String::deserialize(deserializer)?;
    Ok(normalize_portal_url(&url))
}

fn default_path() -> String {
    DEFAULT_AUTHORIZE_PATH.into()
}

fn default_expiration() -> u32 {
    DEFAULT_EXPIRATION_MINUTES
}

fn default_locale() -> String {
    DEFAULT_LOCALE.into()
}

fn default_root_path() -> String {
    "/".into()
}

fn default_true() -> bool {
    true
}

fn default_required() -> Vec<String> {
    REQUIRED_URL_PARAMS.iter().map(|s| (*s).to_string()).collect()
}

fn default_optional() -> Vec<String> {
    OPTIONAL_URL_PARAMS.iter().map(|s| (*s).to_string()).collect()
}

fn default_response() -> Vec<String> {
    RESPONSE_PARAMS.iter().map(|s| (*s).to_string()).collect()
}

impl ProviderConfig {
    /// Create a configuration for ArcGIS Online with the given client ID.
    #[must_use]
    pub fn new(client_id: impl Into<ClientId>) -> Self {
        Self {
            client_id: client_id.into(),
            portal_url: default_portal_url(),
            path: default_path(),
            display: DisplayMode::Default,
            expiration: DEFAULT_EXPIRATION_MINUTES,
            locale: default_locale(),
            show_social_logins: false,
            custom_redirect_uri: None,
            root_path: default_root_path(),
            load_groups: true,
            required_url_params: default_required(),
            optional_url_params: default_optional(),
            response_params: default_response(),
            extra_params: BTreeMap::new(),
        }
    }

    /// Create configuration from environment variables.
    ///
    /// # Required env vars
    /// - `ARCGIS_CLIENT_ID`: application client ID
    ///
    /// # Optional env vars
    /// - `ARCGIS_PORTAL_URL`: portal base URL (default `https://www.arcgis.com`)
    /// - `ARCGIS_DISPLAY`: `default` or `iframe`
    /// - `ARCGIS_EXPIRATION`: token expiration in minutes
    /// - `ARCGIS_LOCALE`: sign-in page locale
    /// - `ARCGIS_REDIRECT_URI`: custom redirect URI
    /// - `ARCGIS_SHOW_SOCIAL_LOGINS`: `"1"` or `"true"` to show social logins
    /// - `ARCGIS_LOAD_GROUPS`: `"0"` or `"false"` to skip user groups
    /// - `APP_ROOT_URL`: root path the host app is served from (default `/`)
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the client ID is missing or a value cannot be parsed.
    pub fn from_env() -> Result<Self, Error> {
        let client_id = std::env::var("ARCGIS_CLIENT_ID")
            .map_err(|_| Error::Config("ARCGIS_CLIENT_ID is required".into()))?;

        let mut config = Self::new(client_id);

        if let Ok(url) = std::env::var("ARCGIS_PORTAL_URL") {
            url.parse::<url::Url>()
                .map_err(|e| Error::Config(format!("ARCGIS_PORTAL_URL: {e}")))?;
            config = config.with_portal_url(url);
        }
        if let Ok(display) = std::env::var("ARCGIS_DISPLAY") {
            config = config.with_display(display.parse()?);
        }
        if let Ok(expiration) = std::env::var("ARCGIS_EXPIRATION") {
            let minutes = expiration
                .parse()
                .map_err(|e| Error::Config(format!("ARCGIS_EXPIRATION: {e}")))?;
            config = config.with_expiration(minutes);
        }
        if let Ok(locale) = std::env::var("ARCGIS_LOCALE") {
            config = config.with_locale(locale);
        }
        if let Ok(uri) = std::env::var("ARCGIS_REDIRECT_URI") {
            config = config.with_custom_redirect_uri(uri);
        }
        if let Ok(root) = std::env::var("APP_ROOT_URL") {
            config = config.with_root_path(root);
        }

        let flag = |name: &str| {
            std::env::var(name)
                .ok()
                .map(|v| matches!(v.as_str(), "1" | "true"))
        };
        if let Some(show) = flag("ARCGIS_SHOW_SOCIAL_LOGINS") {
            config = config.with_show_social_logins(show);
        }
        if let Some(load) = flag("ARCGIS_LOAD_GROUPS") {
            config = config.with_load_groups(load);
        }

        Ok(config)
    }

    /// Override the portal base URL. A trailing `/` is dropped.
    #[must_use]
    pub fn with_portal_url(mut self, url: impl Into<String>) -> Self {
        self.portal_url = normalize_portal_url(&url.into());
        self
    }

    /// Override the authorize path (default `/sharing/oauth2/authorize`).
    #[must_use]
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    #[must_use]
    pub fn with_display(mut self, display: DisplayMode) -> Self {
        self.display = display;
        self
    }

    /// Token expiration in minutes.
    #[must_use]
    pub fn with_expiration(mut self, minutes: u32) -> Self {
        self.expiration = minutes;
        self
    }

    #[must_use]
    pub fn with_locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = locale.into();
        self
    }

    #[must_use]
    pub fn with_show_social_logins(mut self, show: bool) -> Self {
        self.show_social_logins = show;
        self
    }

    /// Redirect to this URI instead of the bundled `redirect.html`.
    ///
    /// Useful when the app is served by another backend, or when several apps
    /// behind one proxy share a redirect page. An empty string means unset.
    #[must_use]
    pub fn with_custom_redirect_uri(mut self, uri: impl Into<String>) -> Self {
        let uri = uri.into();
        self.custom_redirect_uri = (!uri.is_empty()).then_some(uri);
        self
    }

    /// Root path the host app is served from (default `/`).
    #[must_use]
    pub fn with_root_path(mut self, root: impl Into<String>) -> Self {
        self.root_path = root.into();
        self
    }

    #[must_use]
    pub fn with_load_groups(mut self, load: bool) -> Self {
        self.load_groups = load;
        self
    }

    /// Replace the required URL parameter names.
    #[must_use]
    pub fn with_required_url_params<S: Into<String>>(
        mut self,
        params: impl IntoIterator<Item = S>,
    ) -> Self {
        self.required_url_params = params.into_iter().map(Into::into).collect();
        self
    }

    /// Replace the optional URL parameter names.
    #[must_use]
    pub fn with_optional_url_params<S: Into<String>>(
        mut self,
        params: impl IntoIterator<Item = S>,
    ) -> Self {
        self.optional_url_params = params.into_iter().map(Into::into).collect();
        self
    }

    /// Replace the response fields the redirect page must return.
    #[must_use]
    pub fn with_response_params<S: Into<String>>(
        mut self,
        params: impl IntoIterator<Item = S>,
    ) -> Self {
        self.response_params = params.into_iter().map(Into::into).collect();
        self
    }

    /// Set a value for a URL parameter, keyed by its camelized name
    /// (e.g. `socialLoginProviderName`).
    #[must_use]
    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra_params.insert(name.into(), value.into());
        self
    }

    #[must_use]
    pub fn client_id(&self) -> &ClientId {
        &self.client_id
    }

    #[must_use]
    pub fn portal_url(&self) -> &str {
        &self.portal_url
    }

    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    #[must_use]
    pub fn display(&self) -> DisplayMode {
        self.display
    }

    #[must_use]
    pub fn expiration(&self) -> u32 {
        self.expiration
    }

    #[must_use]
    pub fn locale(&self) -> &str {
        &self.locale
    }

    #[must_use]
    pub fn show_social_logins(&self) -> bool {
        self.show_social_logins
    }

    #[must_use]
    pub fn custom_redirect_uri(&self) -> Option<&str> {
        self.custom_redirect_uri.as_deref()
    }

    #[must_use]
    pub fn root_path(&self) -> &str {
        &self.root_path
    }

    #[must_use]
    pub fn load_groups(&self) -> bool {
        self.load_groups
    }

    #[must_use]
    pub fn required_url_params(&self) -> &[String] {
        &self.required_url_params
    }

    #[must_use]
    pub fn optional_url_params(&self) -> &[String] {
        &self.optional_url_params
    }

    #[must_use]
    pub fn response_params(&self) -> &[String] {
        &self.response_params
    }

    /// Value configured for a camelized parameter name.
    ///
    /// Built-in settings answer to their camelized names; anything else is
    /// looked up in the extra parameters.
    #[must_use]
    pub fn param(&self, name: &str) -> Option<ParamValue> {
        let value = match name {
            "responseType" => ParamValue::from("token"),
            "showSocialLogins" => ParamValue::from(self.show_social_logins),
            "display" => ParamValue::from(self.display.as_str()),
            "expiration" => ParamValue::from(self.expiration),
            "locale" => ParamValue::from(self.locale.as_str()),
            "clientId" => ParamValue::from(self.client_id.as_str()),
            "portalUrl" => ParamValue::from(self.portal_url.as_str()),
            _ => ParamValue::from(self.extra_params.get(name)?.as_str()),
        };
        value.is_present().then_some(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_target_arcgis_online() {
        let config = ProviderConfig::new("abc");

        assert_eq!(config.client_id().as_str(), "abc");
        assert_eq!(config.portal_url(), "https://www.arcgis.com");
        assert_eq!(config.path(), "/sharing/oauth2/authorize");
        assert_eq!(config.display(), DisplayMode::Default);
        assert_eq!(config.expiration(), 20160);
        assert_eq!(config.locale(), "en-us");
        assert_eq!(config.root_path(), "/");
        assert!(config.load_groups());
        assert_eq!(config.custom_redirect_uri(), None);
        assert_eq!(config.response_params(), RESPONSE_PARAMS);
    }

    #[test]
    fn portal_url_trailing_slash_dropped() {
        let config = ProviderConfig::new("abc").with_portal_url("https://x.arcgis.com/");
        assert_eq!(config.portal_url(), "https://x.arcgis.com");
    }

    #[test]
    fn deserialized_portal_url_trailing_slash_dropped() {
        let config: ProviderConfig = serde_json::from_value(serde_json::json!({
            "apiKey": "abc",
            "portalUrl": "https://x.arcgis.com/"
        }))
        .unwrap();

        assert_eq!(config.portal_url(), "https://x.arcgis.com");
        assert_eq!(
            config.param("portalUrl"),
            Some(ParamValue::from("https://x.arcgis.com"))
        );
    }

    #[test]
    fn empty_custom_redirect_is_unset() {
        let config = ProviderConfig::new("abc").with_custom_redirect_uri("");
        assert_eq!(config.custom_redirect_uri(), None);
    }

    #[test]
    fn param_lookup_uses_camelized_names() {
        let config = ProviderConfig::new("abc").with_param("socialLoginProviderName", "google");

        assert_eq!(config.param("responseType"), Some(ParamValue::from("token")));
        assert_eq!(config.param("showSocialLogins"), Some(ParamValue::Bool(false)));
        assert_eq!(config.param("expiration"), Some(ParamValue::Int(20160)));
        assert_eq!(
            config.param("socialLoginProviderName"),
            Some(ParamValue::from("google"))
        );
        assert_eq!(config.param("response_type"), None);
        assert_eq!(config.param("client"), None);
    }

    #[test]
    fn empty_extra_param_is_absent() {
        let config = ProviderConfig::new("abc").with_param("client", "");
        assert_eq!(config.param("client"), None);
    }

    #[test]
    fn deserializes_host_provider_block() {
        let config: ProviderConfig = serde_json::from_value(serde_json::json!({
            "apiKey": "arcgisonline",
            "portalUrl": "https://devext.arcgis.com",
            "loadGroups": true,
            "display": "iframe"
        }))
        .unwrap();

        assert_eq!(config.client_id().as_str(), "arcgisonline");
        assert_eq!(config.portal_url(), "https://devext.arcgis.com");
        assert_eq!(config.display(), DisplayMode::Iframe);
        assert_eq!(config.expiration(), 20160);
        assert_eq!(config.required_url_params(), REQUIRED_URL_PARAMS);
    }

    #[test]
    fn display_mode_parse() {
        assert_eq!("iframe".parse::<DisplayMode>().unwrap(), DisplayMode::Iframe);
        assert!("popup".parse::<DisplayMode>().is_err());
    }
}
