//! # ScanGate
//!
//! WeChat Official Account scan-to-login for web applications.
//!
//! A page asks for a login QR code and polls its status. The user scans
//! the code with WeChat, WeChat pushes the scan to the server URL, and
//! the poll turns into `success` with an auth code the backend can redeem
//! for the user's open id.
//!
//! ```text
//!  browser                ScanGate                 WeChat
//!     │ create_login_qrcode  │                        │
//!     │─────────────────────→│── qrcode/create ──────→│
//!     │←── QrLogin ──────────│                        │
//!     │                      │←── SCAN / subscribe ───│ (user scans)
//!     │ login_status (poll)  │── ReplyMessage ───────→│
//!     │─────────────────────→│                        │
//!     │←── success + code ───│                        │
//!     │ redeem_auth_code     │                        │
//!     │─────────────────────→│                        │
//!     │←── openid ───────────│                        │
//! ```
//!
//! HTTP routing and XML decoding are left to the host web framework; this
//! crate works on the decoded types.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use scangate::prelude::*;
//!
//! let mut gate = ScanGateBuilder::new()
//!     .wechat_token("my-token")
//!     .build(my_issuer);
//! gate.start();
//!
//! let login = gate.create_login_qrcode().await?;
//! // render login.qrcode_url, poll gate.login_status(&login.login_token)
//! ```

#![allow(async_fn_in_trait)]

mod error;
mod handler;
mod issuer;
mod response;
mod service;

pub use error::ScanGateError;
pub use handler::replies;
pub use issuer::QrCodeIssuer;
pub use response::{ApiResponse, LoginStatus, QrLogin};
pub use service::{AUTH_CODE_LEN, ScanGate, ScanGateBuilder};

/// Common imports for embedding ScanGate.
pub mod prelude {
    pub use crate::{
        ApiResponse, LoginStatus, QrCodeIssuer, QrLogin, ScanGate, ScanGateBuilder, ScanGateError,
    };
    pub use scangate_session::{SessionConfig, SessionStatus, WeChatUserInfo};
    pub use scangate_wechat::{InboundMessage, QrCodeRequest, QrCodeTicket, ReplyMessage};
}
