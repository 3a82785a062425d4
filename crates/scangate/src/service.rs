//! `ScanGate` builder and the controller-level login operations.
//!
//! This is the entry point for embedding scan-to-login in a web server.
//! It ties the layers together: WeChat wire types → webhook handler →
//! session store, with a [`QrCodeIssuer`] for the one outbound call.
//!
//! ```text
//! browser ── create_login_qrcode ──→ ScanGate ── issue ──→ QrCodeIssuer ──→ WeChat
//! browser ── login_status (poll) ──→ ScanGate ──→ SessionStore
//! WeChat  ── handle_message ───────→ ScanGate ──→ SessionStore
//! backend ── redeem_auth_code ─────→ ScanGate ──→ SessionStore
//! ```

use std::sync::Arc;

use scangate_session::{
    Clock, Reaper, ReaperHandle, SessionConfig, SessionStatus, SessionStore, SystemClock,
};
use scangate_wechat::{InboundMessage, QrCodeRequest, ReplyMessage};
use tracing::{debug, info, warn};

use crate::handler::handle_message;
use crate::{LoginStatus, QrCodeIssuer, QrLogin, ScanGateError};

/// Length of every auth code the store hands out (hex of 16 bytes).
pub const AUTH_CODE_LEN: usize = 32;

/// Builder for configuring a [`ScanGate`].
///
/// # Example
///
/// ```rust,ignore
/// use scangate::prelude::*;
///
/// let mut gate = ScanGateBuilder::new()
///     .wechat_token("my-token")
///     .build(my_issuer);
/// gate.start();
/// ```
pub struct ScanGateBuilder {
    session_config: SessionConfig,
    wechat_token: String,
    clock: Arc<dyn Clock>,
}

impl ScanGateBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            session_config: SessionConfig::default(),
            wechat_token: String::new(),
            clock: Arc::new(SystemClock),
        }
    }

    /// Sets the session lifetime and sweep interval.
    pub fn session_config(mut self, config: SessionConfig) -> Self {
        self.session_config = config;
        self
    }

    /// Sets the token configured on the Official Account's server settings
    /// page, used to verify webhook signatures.
    pub fn wechat_token(mut self, token: impl Into<String>) -> Self {
        self.wechat_token = token.into();
        self
    }

    /// Replaces the wall clock. Tests use a [`ManualClock`](scangate_session::ManualClock).
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Builds the service around `issuer`. The reaper is not running
    /// until [`ScanGate::start`] is called.
    pub fn build<Q: QrCodeIssuer>(self, issuer: Q) -> ScanGate<Q> {
        if self.wechat_token.is_empty() {
            warn!("no wechat token configured, webhook signatures will be rejected");
        }
        let store = SessionStore::with_clock(self.session_config, self.clock);
        ScanGate {
            store: Arc::new(store),
            issuer,
            wechat_token: self.wechat_token,
            reaper: None,
        }
    }
}

impl Default for ScanGateBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A configured scan-to-login service.
pub struct ScanGate<Q: QrCodeIssuer> {
    store: Arc<SessionStore>,
    issuer: Q,
    wechat_token: String,
    reaper: Option<ReaperHandle>,
}

impl<Q: QrCodeIssuer> ScanGate<Q> {
    // -----------------------------------------------------------------------
    // Lifecycle
    // -----------------------------------------------------------------------

    /// Starts the background sweep. Must be called inside a Tokio runtime.
    /// Calling it again while the reaper runs does nothing.
    pub fn start(&mut self) {
        if self.is_running() {
            return;
        }
        self.reaper = Some(Reaper::new(Arc::clone(&self.store)).spawn());
    }

    /// Stops the background sweep and waits for it to exit. Sessions stay
    /// in the store and still expire lazily on lookup.
    pub async fn shutdown(&mut self) {
        if let Some(reaper) = self.reaper.take() {
            reaper.stop().await;
        }
    }

    /// Returns `true` while the reaper is running.
    pub fn is_running(&self) -> bool {
        self.reaper.as_ref().is_some_and(|r| !r.is_finished())
    }

    /// The underlying session store.
    pub fn store(&self) -> &Arc<SessionStore> {
        &self.store
    }

    /// Number of live sessions.
    pub fn active_session_count(&self) -> usize {
        self.store.active_session_count()
    }

    // -----------------------------------------------------------------------
    // Browser-facing
    // -----------------------------------------------------------------------

    /// Opens a login session and gets a QR code for it.
    ///
    /// The QR code lives exactly as long as the session. If the issuer
    /// fails, the session is left to expire on its own.
    ///
    /// # Errors
    /// Whatever the issuer returns, or [`ScanGateError::WeChat`] when
    /// WeChat answers with an error code.
    pub async fn create_login_qrcode(&self) -> Result<QrLogin, ScanGateError> {
        let session = self.store.create_session();
        let requested = self.qr_expire_seconds();
        let request = QrCodeRequest::for_scene(&session.scene_id, requested)?;

        let ticket = match self.issuer.issue(&request).await {
            Ok(ticket) => ticket.into_result()?,
            Err(e) => {
                warn!(scene_id = %session.scene_id, error = %e, "qr code issue failed");
                return Err(e);
            }
        };

        info!(scene_id = %session.scene_id, "login qr code created");
        Ok(QrLogin {
            qrcode_url: ticket.image_url(),
            expire_seconds: match ticket.expire_seconds {
                0 => request.expire_seconds,
                n => n,
            },
            scene_id: session.scene_id,
            login_token: session.login_token,
        })
    }

    /// Reports where a login attempt stands.
    ///
    /// # Errors
    /// - [`ScanGateError::MissingParameter`] if `login_token` is empty
    /// - [`ScanGateError::InvalidLoginToken`] if no live session has it
    pub fn login_status(&self, login_token: &str) -> Result<LoginStatus, ScanGateError> {
        if login_token.is_empty() {
            return Err(ScanGateError::MissingParameter("login_token"));
        }
        let session = self
            .store
            .get_session(login_token)
            .ok_or(ScanGateError::InvalidLoginToken)?;

        debug!(status = %session.status, scene_id = %session.scene_id, "login status polled");
        if session.status != SessionStatus::Success {
            return Ok(LoginStatus {
                status: session.status,
                wechat_user: None,
                auth_code: None,
            });
        }
        Ok(LoginStatus {
            status: session.status,
            wechat_user: session.user_info,
            auth_code: Some(session.auth_code),
        })
    }

    /// Exchanges an auth code for the WeChat open id it was issued to.
    ///
    /// The code stays valid until its session expires.
    ///
    /// # Errors
    /// - [`ScanGateError::MissingParameter`] if `auth_code` is empty
    /// - [`ScanGateError::MalformedAuthCode`] if it isn't 32 characters
    /// - [`ScanGateError::InvalidAuthCode`] if no successful live session has it
    pub fn redeem_auth_code(&self, auth_code: &str) -> Result<String, ScanGateError> {
        if auth_code.is_empty() {
            return Err(ScanGateError::MissingParameter("auth_code"));
        }
        if auth_code.len() != AUTH_CODE_LEN {
            return Err(ScanGateError::MalformedAuthCode(auth_code.len()));
        }
        let wechat_id = self
            .store
            .find_by_auth_code(auth_code)
            .ok_or(ScanGateError::InvalidAuthCode)?;

        info!(%wechat_id, "auth code redeemed");
        Ok(wechat_id)
    }

    // -----------------------------------------------------------------------
    // WeChat-facing
    // -----------------------------------------------------------------------

    /// Checks the `signature` query parameter of a request to the server
    /// URL. Always `false` when no WeChat token is configured.
    pub fn verify_signature(&self, signature: &str, timestamp: &str, nonce: &str) -> bool {
        if self.wechat_token.is_empty() {
            warn!("rejecting signed request, no wechat token configured");
            return false;
        }
        let ok = scangate_wechat::verify_signature(&self.wechat_token, timestamp, nonce, signature);
        if !ok {
            warn!(%timestamp, "wechat signature mismatch");
        }
        ok
    }

    /// Handles a message pushed by WeChat and returns the passive reply.
    ///
    /// Signature checks are the caller's job; see [`Self::verify_signature`].
    pub fn handle_message(&self, msg: &InboundMessage) -> ReplyMessage {
        handle_message(&self.store, msg)
    }

    fn qr_expire_seconds(&self) -> u32 {
        u32::try_from(self.store.config().session_ttl.as_secs()).unwrap_or(u32::MAX)
    }
}
