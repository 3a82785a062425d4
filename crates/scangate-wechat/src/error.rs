//! Error types for the WeChat wire layer.

/// Errors raised while interpreting WeChat messages and API responses.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WeChatError {
    /// A subscribe or SCAN event arrived without a usable scene id.
    /// The `EventKey` was empty, or only the `qrscene_` prefix.
    #[error("scan event carries no scene id")]
    MissingSceneId,

    /// A scene string WeChat would refuse: `QR_STR_SCENE` accepts
    /// 1 to 64 characters.
    #[error("invalid scene string ({len} chars, expected 1..={max})")]
    InvalidScene { len: usize, max: usize },

    /// The WeChat API answered with a non-zero `errcode`.
    #[error("wechat api error {code}: {message}")]
    Api { code: i64, message: String },
}
