use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::config::ProviderConfig;
use crate::error::Error;
use crate::response::rest_root;
use crate::types::{OrgProfile, UserProfile};

/// Fetches the signed-in user's profile and org from the portal REST API.
///
/// Only reads; the token comes from the host session.
pub struct PortalClient {
    rest_url: String,
    load_groups: bool,
    http: reqwest::Client,
}

/// Error envelope ArcGIS returns with a `200 OK` status.
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: PortalError,
}

#[derive(Debug, Deserialize)]
struct PortalError {
    #[serde(default)]
    code: Option<u16>,
    #[serde(default)]
    message: String,
}

impl PortalClient {
    #[must_use]
    pub fn new(config: &ProviderConfig) -> Self {
        Self {
            rest_url: rest_root(config.portal_url()),
            load_groups: config.load_groups(),
            http: reqwest::Client::new(),
        }
    }

    /// Use a custom HTTP client (for connection pool reuse or testing).
    #[must_use]
    pub fn with_http_client(mut self, client: reqwest::Client) -> Self {
        self.http = client;
        self
    }

    /// `<portalUrl>/sharing/rest`.
    #[must_use]
    pub fn rest_url(&self) -> &str {
        &self.rest_url
    }

    /// Fetch `community/self`.
    ///
    /// Groups are dropped when the provider is configured not to load them.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Http`] on network failure, or [`Error::Rest`] if the
    /// portal answers with an error.
    pub async fn fetch_user(&self, token: &str) -> Result<UserProfile, Error> {
        let mut user: UserProfile = self.get("community/self", token, "user request").await?;
        if !self.load_groups {
            user.groups = None;
        }
        Ok(user)
    }

    /// Fetch `portals/self`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Http`] on network failure, or [`Error::Rest`] if the
    /// portal answers with an error.
    pub async fn fetch_org(&self, token: &str) -> Result<OrgProfile, Error> {
        self.get("portals/self", token, "portal request").await
    }

    async fn get<T: DeserializeOwned>(
        &self,
        resource: &str,
        token: &str,
        operation: &'static str,
    ) -> Result<T, Error> {
        let response = self
            .http
            .get(format!("{}/{resource}", self.rest_url))
            .query(&[("f", "json"), ("token", token)])
            .send()
            .await?;

        let response = Self::ensure_success(response, operation).await?;
        let body: serde_json::Value = response.json().await?;

        if let Ok(envelope) = serde_json::from_value::<ErrorEnvelope>(body.clone()) {
            tracing::warn!(
                operation,
                code = ?envelope.error.code,
                message = %envelope.error.message,
                "Portal returned an error"
            );
            return Err(Error::Rest {
                operation,
                status: None,
                code: envelope.error.code,
                detail: envelope.error.message,
            });
        }

        serde_json::from_value(body).map_err(|e| Error::Rest {
            operation,
            status: None,
            code: None,
            detail: format!("unexpected response: {e}"),
        })
    }

    /// Checks HTTP response status; returns the response on success or an error with details.
    async fn ensure_success(
        response: reqwest::Response,
        operation: &'static str,
    ) -> Result<reqwest::Response, Error> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        Err(Error::Rest {
            operation,
            status: Some(status),
            code: None,
            detail: body,
        })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn client(server: &MockServer, load_groups: bool) -> PortalClient {
        let config = ProviderConfig::new("abc")
            .with_portal_url(server.uri())
            .with_load_groups(load_groups);
        PortalClient::new(&config)
    }

    #[test]
    fn rest_url_from_config() {
        let config = ProviderConfig::new("abc").with_portal_url("https://x.arcgis.com/");
        assert_eq!(
            PortalClient::new(&config).rest_url(),
            "https://x.arcgis.com/sharing/rest"
        );
    }

    #[tokio::test]
    async fn fetches_user_with_groups() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/sharing/rest/community/self"))
            .and(query_param("f", "json"))
            .and(query_param("token", "tok"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "username": "jsmith",
                "role": "org_admin",
                "privileges": ["portal:admin:viewUsers"],
                "groups": [{"id": "g1", "title": "Editors"}]
            })))
            .mount(&server)
            .await;

        let user = client(&server, true).fetch_user("tok").await.unwrap();
        assert_eq!(user.username.as_deref(), Some("jsmith"));
        assert_eq!(user.groups.unwrap()[0].id, "g1");
    }

    #[tokio::test]
    async fn drops_groups_when_not_loading_them() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/sharing/rest/community/self"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "username": "jsmith",
                "groups": [{"id": "g1"}]
            })))
            .mount(&server)
            .await;

        let user = client(&server, false).fetch_user("tok").await.unwrap();
        assert!(user.groups.is_none());
    }

    #[tokio::test]
    async fn fetches_org() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/sharing/rest/portals/self"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "org1",
                "urlKey": "acme",
                "customBaseUrl": "maps.arcgis.com",
                "isPortal": false,
                "subscriptionInfo": {"type": "Community"}
            })))
            .mount(&server)
            .await;

        let org = client(&server, true).fetch_org("tok").await.unwrap();
        assert_eq!(org.id, "org1");
        assert_eq!(org.url_key.as_deref(), Some("acme"));
    }

    #[tokio::test]
    async fn error_envelope_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/sharing/rest/portals/self"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "error": {"code": 498, "message": "Invalid token.", "details": []}
            })))
            .mount(&server)
            .await;

        let err = client(&server, true).fetch_org("bad").await.unwrap_err();
        assert!(matches!(
            err,
            Error::Rest { status: None, code: Some(498), ref detail, .. }
                if detail == "Invalid token."
        ));
    }

    #[tokio::test]
    async fn http_failure_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503).set_body_string("down"))
            .mount(&server)
            .await;

        let err = client(&server, true).fetch_user("tok").await.unwrap_err();
        assert!(matches!(
            err,
            Error::Rest { status: Some(503), code: None, operation: "user request", .. }
        ));
    }

    #[tokio::test]
    async fn unexpected_body_has_no_status_or_code() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/sharing/rest/portals/self"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 7})))
            .mount(&server)
            .await;

        let err = client(&server, true).fetch_org("tok").await.unwrap_err();
        assert!(matches!(
            err,
            Error::Rest { status: None, code: None, operation: "portal request", .. }
        ));
    }
}
