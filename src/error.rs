/// Error raised by a [`PopupService`](crate::popup::PopupService) implementation.
///
/// Opaque to this crate: it is carried through [`Error::Popup`] untouched.
pub type PopupError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// Invalid provider configuration (overlapping parameter lists, bad env values).
    #[error("Configuration error: {0}")]
    Config(String),

    /// A required URL parameter resolved to nothing and was not passed as an option.
    #[error("Missing url param: \"{name}\" (looked for a property named \"{camelized}\")")]
    MissingParameter { name: String, camelized: String },

    /// A required URL parameter was configured under its raw name instead of the camelized one.
    #[error(
        "Use camelized versions of url params (did not find \"{camelized}\" but did find \"{raw}\")"
    )]
    UncamelizedParameter { camelized: String, raw: String },

    /// The popup response is missing fields the provider is expected to return.
    #[error(
        "The response from the provider is missing these required response params: {}",
        missing.join(", ")
    )]
    Protocol { missing: Vec<String> },

    /// The popup collaborator failed (blocked popup, user cancel, polling failure).
    #[error(transparent)]
    Popup(PopupError),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The portal REST API answered with an error.
    #[cfg(feature = "rest")]
    #[error("Portal REST error during {operation}: {detail}")]
    Rest {
        operation: &'static str,
        /// HTTP status of a non-2xx response.
        status: Option<u16>,
        /// `error.code` from the JSON error body the portal sends with `200 OK`.
        code: Option<u16>,
        detail: String,
    },

    #[cfg(feature = "rest")]
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn protocol_error_lists_every_missing_field() {
        let err = Error::Protocol {
            missing: vec!["state".into(), "expires_in".into()],
        };
        assert!(err.to_string().ends_with("state, expires_in"));
    }

    #[test]
    fn popup_error_display_is_unchanged() {
        let inner: PopupError = "popup was blocked".into();
        let err = Error::Popup(inner);
        assert_eq!(err.to_string(), "popup was blocked");
    }
}
