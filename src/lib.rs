#![doc = include_str!("../README.md")]

pub mod claims;
pub mod config;
pub mod error;
pub mod oauth;
pub mod popup;
pub mod query_string;
pub mod response;
#[cfg(feature = "rest")]
pub mod rest;
pub mod types;
pub mod url_utils;

// Re-exports for convenient access
pub use claims::{ClaimList, ClaimsEvaluator};
pub use config::{DisplayMode, ProviderConfig};
pub use error::{Error, PopupError};
pub use oauth::{ArcGisOAuth, AuthorizationRequest, PROVIDER_NAME, REDIRECT_PAGE};
pub use popup::{PopupRequest, PopupService};
pub use query_string::{ParamSource, QueryStringBuilder, camelize};
pub use response::validate as validate_response;
#[cfg(feature = "rest")]
pub use rest::PortalClient;
pub use types::{
    AppLocation, AuthResponse, ClientId, Group, NormalizedSession, OrgProfile, ParamValue,
    RequestOptions, SessionProperties, SubscriptionInfo, UserProfile,
};
