//! Hook for obtaining QR-code tickets from WeChat.
//!
//! Creating a QR code means calling WeChat's `qrcode/create` API with an
//! access token, which in turn has to be fetched and cached. ScanGate
//! keeps that I/O out of the login flow: it defines the [`QrCodeIssuer`]
//! trait, builds the request body, and the implementation does the call.
//! Production code wraps an HTTP client; tests use a stub.

use scangate_wechat::{QrCodeRequest, QrCodeTicket};

use crate::ScanGateError;

/// Turns a QR-code request into a ticket.
///
/// # Trait bounds
///
/// - `Send + Sync` → one issuer is shared by every request task.
/// - `'static` → it lives as long as the service.
///
/// # Example
///
/// ```rust
/// use scangate::{QrCodeIssuer, ScanGateError};
/// use scangate_wechat::{QrCodeRequest, QrCodeTicket};
///
/// /// Hands out a fake ticket without talking to WeChat.
/// struct OfflineIssuer;
///
/// impl QrCodeIssuer for OfflineIssuer {
///     async fn issue(
///         &self,
///         request: &QrCodeRequest,
///     ) -> Result<QrCodeTicket, ScanGateError> {
///         Ok(QrCodeTicket {
///             ticket: format!("offline-{}", request.scene()),
///             expire_seconds: request.expire_seconds,
///             ..QrCodeTicket::default()
///         })
///     }
/// }
/// ```
pub trait QrCodeIssuer: Send + Sync + 'static {
    /// Asks WeChat for a ticket for `request`.
    ///
    /// A response carrying a non-zero `errcode` may be returned as-is;
    /// the caller checks it with [`QrCodeTicket::into_result`].
    ///
    /// # Errors
    /// [`ScanGateError::QrCodeIssue`] when no ticket could be obtained.
    fn issue(
        &self,
        request: &QrCodeRequest,
    ) -> impl std::future::Future<Output = Result<QrCodeTicket, ScanGateError>> + Send;
}
