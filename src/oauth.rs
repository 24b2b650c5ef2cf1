use crate::config::{DisplayMode, ProviderConfig};
use crate::error::Error;
use crate::popup::{PopupRequest, PopupService};
use crate::query_string::{ParamSource, QueryStringBuilder};
use crate::response;
use crate::types::{AppLocation, NormalizedSession, ParamValue, RequestOptions};

/// Provider name reported in [`NormalizedSession::provider`].
pub const PROVIDER_NAME: &str = "arcgis-oauth-bearer";

/// Path of the static redirect page, relative to the app root.
pub const REDIRECT_PAGE: &str = "torii-provider-arcgis/redirect.html";

/// ArcGIS implicit-flow provider.
///
/// Holds only immutable configuration; each [`open`](ArcGisOAuth::open)
/// builds its own URL and options, so concurrent sign-in attempts do not
/// interfere.
pub struct ArcGisOAuth<P> {
    config: ProviderConfig,
    query: QueryStringBuilder,
    popup: P,
    location: AppLocation,
}

/// A prepared sign-in attempt: what will be sent to the popup collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub struct AuthorizationRequest {
    pub url: String,
    pub redirect_uri: String,
    pub options: RequestOptions,
    pub remote_service_name: Option<String>,
}

/// Config values plus the per-attempt redirect URI.
struct AttemptParams<'a> {
    config: &'a ProviderConfig,
    redirect_uri: &'a str,
}

impl ParamSource for AttemptParams<'_> {
    fn param(&self, name: &str) -> Option<ParamValue> {
        match name {
            "redirectUri" => Some(ParamValue::from(self.redirect_uri)),
            _ => self.config.param(name),
        }
    }
}

impl<P> ArcGisOAuth<P> {
    /// Create a provider.
    ///
    /// `location` is the host page's current URL; its origin is used for the
    /// redirect URI and for the iframe `parent` parameter.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the configured required and optional
    /// URL parameter lists overlap.
    pub fn new(config: ProviderConfig, popup: P, location: AppLocation) -> Result<Self, Error> {
        let query = QueryStringBuilder::new(
            config.required_url_params().iter().cloned(),
            config.optional_url_params().iter().cloned(),
        )?;
        Ok(Self {
            config,
            query,
            popup,
            location,
        })
    }

    #[must_use]
    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    #[must_use]
    pub fn location(&self) -> &AppLocation {
        &self.location
    }

    /// Where the provider redirects after sign-in.
    ///
    /// The configured custom redirect URI if any; otherwise the small static
    /// redirect page under the app root, which avoids booting the whole app
    /// inside the popup.
    #[must_use]
    pub fn redirect_uri(&self) -> String {
        if let Some(uri) = self.config.custom_redirect_uri().filter(|u| !u.is_empty()) {
            return uri.to_string();
        }
        let root = match self.config.root_path() {
            "" => "/",
            root => root,
        };
        format!("{}{root}{REDIRECT_PAGE}", self.location.origin())
    }

    /// Build the authorize URL and the options sent along with it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingParameter`] or [`Error::UncamelizedParameter`]
    /// if a required URL parameter cannot be resolved.
    pub fn prepare(&self, mut options: RequestOptions) -> Result<AuthorizationRequest, Error> {
        let remote_service_name = options.remove("remoteServiceName");

        let iframe = match options.get("display") {
            Some(display) => display == DisplayMode::Iframe.as_str(),
            None => self.config.display() == DisplayMode::Iframe,
        };
        if iframe {
            options.insert("parent", self.location.origin());
        }

        let redirect_uri = self.redirect_uri();
        let url = self.build_url(&mut options, &redirect_uri)?;

        Ok(AuthorizationRequest {
            url,
            redirect_uri,
            options,
            remote_service_name,
        })
    }

    /// `<portalUrl><path>?<query>`, honoring `portalUrl`/`path` overrides in
    /// `options` (which are consumed).
    fn build_url(&self, options: &mut RequestOptions, redirect_uri: &str) -> Result<String, Error> {
        let portal_url = options
            .remove("portalUrl")
            .unwrap_or_else(|| self.config.portal_url().to_string());
        let path = options
            .remove("path")
            .unwrap_or_else(|| self.config.path().to_string());

        let source = AttemptParams {
            config: &self.config,
            redirect_uri,
        };
        let qs = self.query.build(&source, options)?;

        Ok(format!("{portal_url}{path}?{qs}"))
    }
}

impl<P: PopupService> ArcGisOAuth<P> {
    /// Run one sign-in round-trip.
    ///
    /// Builds the authorize URL, hands it to the popup collaborator and
    /// validates what comes back.
    ///
    /// # Errors
    ///
    /// - [`Error::MissingParameter`] / [`Error::UncamelizedParameter`] if the URL cannot be built
    /// - [`Error::Popup`] with the collaborator's error, unchanged
    /// - [`Error::Protocol`] if the response lacks required fields
    pub async fn open(&self, options: RequestOptions) -> Result<NormalizedSession, Error> {
        let request = self.prepare(options)?;

        tracing::debug!(
            url = %request.url,
            remote_service = ?request.remote_service_name,
            "Opening ArcGIS sign-in"
        );

        let auth = self
            .popup
            .open(PopupRequest {
                url: request.url,
                expected_fields: self.config.response_params().to_vec(),
                options: request.options,
                remote_service_name: request.remote_service_name,
            })
            .await
            .map_err(Error::Popup)?;

        response::validate(
            auth,
            self.config.response_params(),
            self.config.client_id(),
            self.config.portal_url(),
            PROVIDER_NAME,
            &request.redirect_uri,
        )
    }
}
