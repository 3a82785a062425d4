//! Unified error type for ScanGate.

use scangate_wechat::WeChatError;

/// Everything the controller-level operations of
/// [`ScanGate`](crate::ScanGate) can fail with.
///
/// Lookups that miss are ordinary outcomes inside the session store;
/// they only become errors here, where a caller asked for something
/// specific and has to be told why it isn't there.
#[derive(Debug, thiserror::Error)]
pub enum ScanGateError {
    /// A required request parameter was empty.
    #[error("missing parameter: {0}")]
    MissingParameter(&'static str),

    /// No live session has this login token (never existed or expired).
    #[error("login token is invalid or expired")]
    InvalidLoginToken,

    /// The auth code is not 32 characters long.
    #[error("malformed auth code: expected 32 characters, got {0}")]
    MalformedAuthCode(usize),

    /// No successful, live session has this auth code.
    #[error("auth code is invalid or expired")]
    InvalidAuthCode,

    /// The [`QrCodeIssuer`](crate::QrCodeIssuer) could not get a ticket
    /// (no access token, network failure, undecodable response, ...).
    #[error("qr code issue failed: {0}")]
    QrCodeIssue(String),

    /// A WeChat-level error: bad scene string or an API error code.
    #[error(transparent)]
    WeChat(#[from] WeChatError),
}

impl ScanGateError {
    /// The message shown to the end user for this error.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::MissingParameter(_) => "无效的参数",
            Self::InvalidLoginToken => "登录令牌无效或已过期",
            Self::MalformedAuthCode(_) => "无效的授权码格式",
            Self::InvalidAuthCode => "授权码无效或已过期",
            Self::QrCodeIssue(_) => "创建登录二维码失败",
            Self::WeChat(WeChatError::Api { .. }) => "微信API错误",
            Self::WeChat(_) => "创建登录二维码失败",
        }
    }

    /// Returns `true` if the caller sent a bad request, as opposed to the
    /// server or WeChat failing.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::MissingParameter(_)
                | Self::InvalidLoginToken
                | Self::MalformedAuthCode(_)
                | Self::InvalidAuthCode
        )
    }
}
