//! Webhook dispatch: what to do with a message WeChat pushes to the
//! server URL, and what to say back.
//!
//! ```text
//! InboundMessage
//!     │ classify()
//!     ├── QrScan { scene_id, first_follow } → bind openid to the session
//!     ├── Follow                             → greeting
//!     ├── Text                               → how-to-login hint
//!     └── Other                              → generic hint
//! ```
//!
//! Every branch produces a text reply; nothing here fails outward. A scan
//! for an unknown or expired scene is reported to the user, not the caller.

use std::time::{SystemTime, UNIX_EPOCH};

use scangate_session::{SessionStore, WeChatUserInfo};
use scangate_wechat::{InboundKind, InboundMessage, ReplyMessage};
use tracing::{debug, info, warn};

/// Texts sent back to the WeChat user.
pub mod replies {
    pub const SCAN_SUCCESS: &str = "登录成功，请返回网页继续操作";
    pub const FOLLOW_SUCCESS: &str = "欢迎关注！登录成功，请返回网页继续操作";
    pub const SCAN_EXPIRED: &str = "二维码已过期，请返回网页重新生成";
    pub const FOLLOW_EXPIRED: &str = "欢迎关注！二维码可能已过期，请重新生成";
    pub const SCAN_FAILED: &str = "登录失败，请重新扫码";
    pub const SCAN_INVALID: &str = "二维码无效，请重新扫码";
    pub const FOLLOW: &str = "欢迎关注！请在网页上使用扫码登录功能";
    pub const TEXT_HINT: &str = "请在网页上生成登录二维码，然后使用微信扫码登录";
    pub const DEFAULT: &str = "欢迎使用！请在网页上使用扫码登录功能";
}

/// Handles one inbound message and builds the reply.
pub(crate) fn handle_message(store: &SessionStore, msg: &InboundMessage) -> ReplyMessage {
    debug!(
        msg_type = %msg.msg_type,
        event = %msg.event,
        openid = %msg.from_user_name,
        "wechat message received"
    );

    let content = match msg.classify() {
        Ok(InboundKind::QrScan { scene_id, first_follow }) => {
            handle_scan(store, scene_id, &msg.from_user_name, first_follow)
        }
        Ok(InboundKind::Follow) => replies::FOLLOW,
        Ok(InboundKind::Text(_)) => replies::TEXT_HINT,
        Ok(InboundKind::Other) => replies::DEFAULT,
        Err(e) => {
            warn!(error = %e, openid = %msg.from_user_name, "rejected scan event");
            replies::SCAN_INVALID
        }
    };

    ReplyMessage::text(msg, content, reply_time(store.now()))
}

/// `CreateTime` of a reply: Unix seconds, 0 before the epoch.
fn reply_time(now: SystemTime) -> i64 {
    now.duration_since(UNIX_EPOCH)
        .map(|d| i64::try_from(d.as_secs()).unwrap_or(i64::MAX))
        .unwrap_or_default()
}

fn handle_scan(
    store: &SessionStore,
    scene_id: &str,
    openid: &str,
    first_follow: bool,
) -> &'static str {
    if openid.is_empty() {
        warn!(%scene_id, "scan event without sender openid");
        return replies::SCAN_INVALID;
    }

    if store.get_session_by_scene(scene_id).is_none() {
        info!(%scene_id, %openid, "scan for unknown or expired scene");
        return if first_follow {
            replies::FOLLOW_EXPIRED
        } else {
            replies::SCAN_EXPIRED
        };
    }

    // The session can still expire between the lookup and the update.
    if !store.update_session_by_scene(scene_id, openid, WeChatUserInfo::new(openid)) {
        warn!(%scene_id, %openid, "login session vanished during scan");
        return replies::SCAN_FAILED;
    }

    info!(%scene_id, %openid, first_follow, "wechat login confirmed");
    if first_follow {
        replies::FOLLOW_SUCCESS
    } else {
        replies::SCAN_SUCCESS
    }
}
