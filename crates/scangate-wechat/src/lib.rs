//! WeChat Official Account wire types for ScanGate.
//!
//! This crate knows what WeChat sends and expects, and nothing about
//! login sessions:
//!
//! - **Messages** ([`InboundMessage`], [`ReplyMessage`]): pushes to the
//!   server URL and the passive text replies to them
//! - **QR codes** ([`QrCodeRequest`], [`QrCodeTicket`]): the body and
//!   response of the QR-code creation API
//! - **Signatures** ([`verify_signature`]): checking that a request to the
//!   server URL really came from WeChat
//!
//! ```text
//! WeChat push (XML) → InboundMessage → ScanGate webhook handler → ReplyMessage
//! ```

mod error;
mod message;
mod qrcode;
mod signature;

pub use error::WeChatError;
pub use message::{
    EVENT_SCAN, EVENT_SUBSCRIBE, InboundKind, InboundMessage, MSG_TYPE_EVENT,
    MSG_TYPE_TEXT, ReplyMessage, SUBSCRIBE_SCENE_PREFIX,
};
pub use qrcode::{
    ActionInfo, MAX_EXPIRE_SECONDS, MAX_SCENE_STR_LEN, QR_STR_SCENE, QrCodeRequest, QrCodeTicket,
    SHOW_QRCODE_URL, Scene, show_qrcode_url,
};
pub use signature::{signature, verify_signature};
