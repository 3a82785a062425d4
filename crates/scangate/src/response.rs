//! Payloads handed back to the browser.

use scangate_session::{SessionStatus, WeChatUserInfo};
use serde::{Deserialize, Serialize};

use crate::ScanGateError;

/// Result of creating a login QR code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QrLogin {
    pub scene_id: String,
    /// Image URL the page renders as the QR code.
    pub qrcode_url: String,
    /// Token the page polls [`ScanGate::login_status`](crate::ScanGate::login_status) with.
    pub login_token: String,
    pub expire_seconds: u32,
}

/// Answer to a status poll.
///
/// `wechat_user` and `auth_code` are present only once the session has
/// reached [`SessionStatus::Success`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginStatus {
    pub status: SessionStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wechat_user: Option<WeChatUserInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth_code: Option<String>,
}

/// JSON envelope shared by every browser-facing endpoint.
///
/// ```json
/// { "success": false, "message": "登录令牌无效或已过期" }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            message: String::new(),
            data: Some(data),
        }
    }

    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            data: None,
        }
    }

    /// Replaces the message, keeping everything else.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }
}

impl<T> From<Result<T, ScanGateError>> for ApiResponse<T> {
    fn from(result: Result<T, ScanGateError>) -> Self {
        match result {
            Ok(data) => Self::ok(data),
            Err(e) => Self::fail(e.user_message()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pending_status_omits_user_fields() {
        let status = LoginStatus {
            status: SessionStatus::Pending,
            wechat_user: None,
            auth_code: None,
        };

        let json = serde_json::to_value(ApiResponse::ok(status)).unwrap();

        assert_eq!(
            json,
            serde_json::json!({
                "success": true,
                "message": "",
                "data": { "status": "pending" }
            })
        );
    }

    #[test]
    fn test_success_status_carries_user_and_code() {
        let status = LoginStatus {
            status: SessionStatus::Success,
            wechat_user: Some(WeChatUserInfo::new("oUser")),
            auth_code: Some("ab".repeat(16)),
        };

        let json = serde_json::to_value(&status).unwrap();

        assert_eq!(json["status"], "success");
        assert_eq!(json["wechat_user"]["openid"], "oUser");
        assert_eq!(json["auth_code"].as_str().unwrap().len(), 32);
    }

    #[test]
    fn test_from_err_uses_user_message() {
        let resp: ApiResponse<LoginStatus> = Err(ScanGateError::InvalidLoginToken).into();

        assert!(!resp.success);
        assert_eq!(resp.message, "登录令牌无效或已过期");
        let json = serde_json::to_value(&resp).unwrap();
        assert!(json.get("data").is_none());
    }

    #[test]
    fn test_with_message_keeps_data() {
        let resp = ApiResponse::ok(3).with_message("查询成功");

        assert!(resp.success);
        assert_eq!(resp.message, "查询成功");
        assert_eq!(resp.data, Some(3));
    }
}
