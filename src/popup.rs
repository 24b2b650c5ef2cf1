use std::future::Future;

use crate::error::PopupError;
use crate::types::{AuthResponse, RequestOptions};

/// Everything a [`PopupService`] needs to run one sign-in round-trip.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub struct PopupRequest {
    /// Fully built authorize URL.
    pub url: String,
    /// Fields the redirect page is expected to deposit.
    pub expected_fields: Vec<String>,
    /// Options of this attempt, after control options were consumed.
    pub options: RequestOptions,
    /// Caller hint for how to show the sign-in page (e.g. `"popup"` or `"iframe"`).
    pub remote_service_name: Option<String>,
}

/// Host-provided popup/iframe driver.
///
/// Opens `request.url`, waits for the static redirect page to deposit the
/// response fragment somewhere it can read, and resolves with those fields.
/// A closed popup, a blocked window or a failed poll must surface as `Err`.
/// The provider does not time out, retry or wrap these errors.
///
/// # Example
///
/// ```rust,ignore
/// impl PopupService for BrowserPopup {
///     async fn open(&self, request: PopupRequest) -> Result<AuthResponse, PopupError> {
///         let window = self.open_window(&request.url)?;
///         let fields = self.poll_storage(&request.expected_fields).await?;
///         window.close();
///         Ok(fields)
///     }
/// }
/// ```
pub trait PopupService: Send + Sync {
    fn open(
        &self,
        request: PopupRequest,
    ) -> impl Future<Output = Result<AuthResponse, PopupError>> + Send;
}
