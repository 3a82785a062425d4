//! Messages WeChat pushes to the Official Account server, and the passive
//! replies the server sends back.
//!
//! WeChat delivers these as XML with PascalCase element names
//! (`<ToUserName>`, `<EventKey>`, ...). The structs carry the same names
//! through `#[serde(rename_all = "PascalCase")]`, so whatever transport
//! decodes the XML can deserialize straight into them.

use serde::{Deserialize, Serialize};

use crate::WeChatError;

/// `MsgType` of event pushes.
pub const MSG_TYPE_EVENT: &str = "event";
/// `MsgType` of plain text messages (and of text replies).
pub const MSG_TYPE_TEXT: &str = "text";
/// `Event` sent when a user follows the account, possibly via a QR code.
pub const EVENT_SUBSCRIBE: &str = "subscribe";
/// `Event` sent when an existing follower scans a parameterised QR code.
pub const EVENT_SCAN: &str = "SCAN";
/// Prefix WeChat puts in front of the scene on `subscribe` events.
pub const SUBSCRIBE_SCENE_PREFIX: &str = "qrscene_";

// ---------------------------------------------------------------------------
// InboundMessage
// ---------------------------------------------------------------------------

/// A message or event pushed by WeChat to the server URL.
///
/// Only `ToUserName`, `FromUserName`, `CreateTime` and `MsgType` are
/// always present; everything else depends on the message type and
/// defaults to empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct InboundMessage {
    /// The Official Account's own id.
    pub to_user_name: String,
    /// The sender's open id.
    pub from_user_name: String,
    pub create_time: i64,
    pub msg_type: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub msg_id: i64,
    #[serde(default)]
    pub event: String,
    #[serde(default)]
    pub event_key: String,
    /// QR ticket, present on scan events.
    #[serde(default)]
    pub ticket: String,
}

/// What an [`InboundMessage`] means for the login flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InboundKind<'a> {
    /// A login QR code was scanned. `first_follow` is `true` when the scan
    /// also made the user a new follower (`subscribe` event).
    QrScan { scene_id: &'a str, first_follow: bool },
    /// A follow without any QR scene.
    Follow,
    /// A text message.
    Text(&'a str),
    /// Anything else (images, menu clicks, unsubscribes, ...).
    Other,
}

impl InboundMessage {
    /// Sorts the message into the cases the login flow cares about.
    ///
    /// # Errors
    /// [`WeChatError::MissingSceneId`] for a scan event whose `EventKey`
    /// yields an empty scene id.
    pub fn classify(&self) -> Result<InboundKind<'_>, WeChatError> {
        match self.msg_type.as_str() {
            MSG_TYPE_EVENT => match self.event.as_str() {
                EVENT_SUBSCRIBE => {
                    match self.event_key.strip_prefix(SUBSCRIBE_SCENE_PREFIX) {
                        Some("") => Err(WeChatError::MissingSceneId),
                        Some(scene_id) => Ok(InboundKind::QrScan {
                            scene_id,
                            first_follow: true,
                        }),
                        None => Ok(InboundKind::Follow),
                    }
                }
                EVENT_SCAN if self.event_key.is_empty() => {
                    Err(WeChatError::MissingSceneId)
                }
                EVENT_SCAN => Ok(InboundKind::QrScan {
                    scene_id: &self.event_key,
                    first_follow: false,
                }),
                _ => Ok(InboundKind::Other),
            },
            MSG_TYPE_TEXT => Ok(InboundKind::Text(&self.content)),
            _ => Ok(InboundKind::Other),
        }
    }
}

// ---------------------------------------------------------------------------
// ReplyMessage
// ---------------------------------------------------------------------------

/// A passive text reply, returned in the HTTP response to a push.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ReplyMessage {
    pub to_user_name: String,
    pub from_user_name: String,
    pub create_time: i64,
    pub msg_type: String,
    pub content: String,
}

impl ReplyMessage {
    /// Builds a text reply to `inbound`, swapping sender and receiver.
    pub fn text(
        inbound: &InboundMessage,
        content: impl Into<String>,
        create_time: i64,
    ) -> Self {
        Self {
            to_user_name: inbound.from_user_name.clone(),
            from_user_name: inbound.to_user_name.clone(),
            create_time,
            msg_type: MSG_TYPE_TEXT.to_string(),
            content: content.into(),
        }
    }

    /// WeChat expects an empty body, not an empty reply, when there is
    /// nothing to say.
    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }
}
