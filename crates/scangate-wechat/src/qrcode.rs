//! Request and response shapes of WeChat's QR-code creation API
//! (`POST /cgi-bin/qrcode/create`).
//!
//! Only the data types live here; making the call (and obtaining the
//! access token it needs) belongs to whatever implements the issuer.

use serde::{Deserialize, Serialize};

use crate::WeChatError;

/// Action name for a temporary QR code carrying a string scene.
pub const QR_STR_SCENE: &str = "QR_STR_SCENE";

/// Longest `scene_str` WeChat accepts.
pub const MAX_SCENE_STR_LEN: usize = 64;

/// Longest lifetime WeChat allows for a temporary QR code (30 days).
pub const MAX_EXPIRE_SECONDS: u32 = 2_592_000;

/// Endpoint that renders a ticket as a QR image.
pub const SHOW_QRCODE_URL: &str = "https://mp.weixin.qq.com/cgi-bin/showqrcode";

/// Body of a QR-code creation request.
///
/// Serializes to:
///
/// ```json
/// {
///   "expire_seconds": 600,
///   "action_name": "QR_STR_SCENE",
///   "action_info": { "scene": { "scene_str": "login_..." } }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QrCodeRequest {
    pub expire_seconds: u32,
    pub action_name: String,
    pub action_info: ActionInfo,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionInfo {
    pub scene: Scene,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scene {
    pub scene_str: String,
}

impl QrCodeRequest {
    /// Builds a temporary string-scene QR request.
    ///
    /// `expire_seconds` is capped at [`MAX_EXPIRE_SECONDS`].
    ///
    /// # Errors
    /// [`WeChatError::InvalidScene`] if `scene` is empty or longer than
    /// [`MAX_SCENE_STR_LEN`].
    pub fn for_scene(scene: &str, expire_seconds: u32) -> Result<Self, WeChatError> {
        if scene.is_empty() || scene.len() > MAX_SCENE_STR_LEN {
            return Err(WeChatError::InvalidScene {
                len: scene.len(),
                max: MAX_SCENE_STR_LEN,
            });
        }
        Ok(Self {
            expire_seconds: expire_seconds.min(MAX_EXPIRE_SECONDS),
            action_name: QR_STR_SCENE.to_string(),
            action_info: ActionInfo {
                scene: Scene {
                    scene_str: scene.to_string(),
                },
            },
        })
    }

    /// The scene string embedded in the code.
    pub fn scene(&self) -> &str {
        &self.action_info.scene.scene_str
    }
}

/// Response of a QR-code creation request.
///
/// On failure WeChat sends only `errcode` / `errmsg`, so every field
/// defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QrCodeTicket {
    #[serde(default)]
    pub ticket: String,
    #[serde(default)]
    pub expire_seconds: u32,
    /// The URL encoded in the QR image itself.
    #[serde(default)]
    pub url: String,
    #[serde(default, rename = "errcode", skip_serializing_if = "is_zero")]
    pub error_code: i64,
    #[serde(default, rename = "errmsg", skip_serializing_if = "String::is_empty")]
    pub error_message: String,
}

impl QrCodeTicket {
    /// Turns a non-zero `errcode` into an error.
    pub fn into_result(self) -> Result<Self, WeChatError> {
        if self.error_code != 0 {
            return Err(WeChatError::Api {
                code: self.error_code,
                message: self.error_message,
            });
        }
        Ok(self)
    }

    /// URL of the QR image for this ticket.
    pub fn image_url(&self) -> String {
        show_qrcode_url(&self.ticket)
    }
}

/// URL of the QR image for `ticket`.
pub fn show_qrcode_url(ticket: &str) -> String {
    format!("{SHOW_QRCODE_URL}?ticket={ticket}")
}

fn is_zero(n: &i64) -> bool {
    *n == 0
}
