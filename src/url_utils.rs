//! Portal hostname and hub-domain helpers.

use crate::types::OrgProfile;

/// Drop a leading `http://` or `https://`.
#[must_use]
pub fn strip_scheme(url: &str) -> &str {
    url.strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))
        .unwrap_or(url)
}

/// Scheme-less hostname of an org's portal.
///
/// Enterprise portals report their hostname directly. Online orgs live at
/// `<urlKey>.<customBaseUrl>` (e.g. `acme.maps.arcgis.com`) when both parts
/// are known.
#[must_use]
pub fn portal_hostname(org: &OrgProfile) -> Option<String> {
    if !org.is_portal {
        if let (Some(key), Some(base)) = (&org.url_key, &org.custom_base_url) {
            return Some(format!("{key}.{base}"));
        }
    }
    org.portal_hostname
        .as_deref()
        .map(|host| strip_scheme(host).to_string())
}

/// `https://<hostname>/sharing/rest` for an org's portal.
#[must_use]
pub fn portal_rest_url(org: &OrgProfile) -> Option<String> {
    portal_hostname(org).map(|host| format!("https://{host}/sharing/rest"))
}

/// Hub subdomain matching the ArcGIS environment of `portal_url`.
#[must_use]
pub fn hub_base_from_portal_url(portal_url: &str) -> &'static str {
    if portal_url.contains("qaext.arcgis.com") || portal_url.contains(".mapsqa.arcgis.com") {
        "hubqa"
    } else if portal_url.contains("devext.arcgis.com")
        || portal_url.contains(".mapsdevext.arcgis.com")
    {
        "hubdev"
    } else {
        "hub"
    }
}
