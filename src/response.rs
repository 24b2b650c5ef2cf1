use crate::error::Error;
use crate::types::{AuthResponse, ClientId, NormalizedSession, SessionProperties};

/// Keys this crate sets on the session properties; provider values for them are dropped.
const AUGMENTED_KEYS: [&str; 4] = ["clientId", "portal", "withCredentials", "authType"];

/// Check a popup response and turn it into the session payload.
///
/// Every name in `response_params` must be present in `response`; otherwise
/// the provider's redirect contract changed and all missing names are
/// reported at once.
///
/// `clientId`, `portal`, `withCredentials` and `authType` are always set by
/// this function; values the provider returned under those names are replaced.
///
/// # Errors
///
/// Returns [`Error::Protocol`] listing every missing field.
pub fn validate(
    mut response: AuthResponse,
    response_params: &[String],
    client_id: &ClientId,
    portal_url: &str,
    provider_name: &str,
    redirect_uri: &str,
) -> Result<NormalizedSession, Error> {
    let missing: Vec<String> = response_params
        .iter()
        .filter(|param| !response.contains_key(param.as_str()))
        .cloned()
        .collect();

    if !missing.is_empty() {
        tracing::warn!(missing = ?missing, "Provider response is missing required fields");
        return Err(Error::Protocol { missing });
    }

    for key in AUGMENTED_KEYS {
        if response.shift_remove(key).is_some() {
            tracing::warn!(field = key, "Provider response field overwritten");
        }
    }

    tracing::debug!(provider = %provider_name, "Sign-in response validated");

    Ok(NormalizedSession {
        properties: SessionProperties {
            auth: response,
            client_id: client_id.clone(),
            portal: rest_root(portal_url),
            with_credentials: false,
            auth_type: "token".into(),
        },
        provider: provider_name.to_string(),
        redirect_uri: format!("{redirect_uri}?clientId={client_id}"),
    })
}

/// `<portalUrl>/sharing/rest`.
pub(crate) fn rest_root(portal_url: &str) -> String {
    format!("{}/sharing/rest", portal_url.trim_end_matches('/'))
}
