//! Session types: the records the store hands out to callers.
//!
//! A login session is the server's record of one "scan to log in"
//! attempt. It tracks:
//! - HOW the browser polls for it (`login_token`)
//! - WHICH QR code it belongs to (`scene_id`)
//! - WHERE it is in the flow (`status`)
//! - WHO scanned it, once someone has (`wechat_id`, `user_info`)
//! - WHEN it stops being valid (`expired_at`)

use std::fmt;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use tracing::warn;

// ---------------------------------------------------------------------------
// SessionConfig
// ---------------------------------------------------------------------------

/// Configuration for session lifetime and sweeping.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// How long a session lives after creation. Fixed at creation time
    /// and never extended.
    ///
    /// Default: 10 minutes, matching the lifetime of the WeChat QR code.
    pub session_ttl: Duration,

    /// How often the reaper sweeps expired sessions out of the store.
    ///
    /// Default: 1 minute.
    pub sweep_interval: Duration,
}

impl SessionConfig {
    /// Default session lifetime.
    pub const DEFAULT_TTL: Duration = Duration::from_secs(10 * 60);

    /// Default reaper interval.
    pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

    /// Longest session lifetime; a QR code can't outlive 30 days anyway.
    pub const MAX_TTL: Duration = Duration::from_secs(30 * 24 * 60 * 60);

    /// Longest gap between sweeps.
    pub const MAX_SWEEP_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);

    /// Replace zero durations with the defaults and cap oversized ones,
    /// so the config is safe to use.
    ///
    /// A zero TTL would make every session dead on arrival, and a zero
    /// interval makes `tokio::time::interval` panic. Durations near
    /// `Duration::MAX` overflow when added to the current time.
    pub fn validated(mut self) -> Self {
        if self.session_ttl.is_zero() {
            warn!(
                default_secs = Self::DEFAULT_TTL.as_secs(),
                "session_ttl is zero, using default"
            );
            self.session_ttl = Self::DEFAULT_TTL;
        }
        if self.sweep_interval.is_zero() {
            warn!(
                default_secs = Self::DEFAULT_SWEEP_INTERVAL.as_secs(),
                "sweep_interval is zero, using default"
            );
            self.sweep_interval = Self::DEFAULT_SWEEP_INTERVAL;
        }
        if self.session_ttl > Self::MAX_TTL {
            warn!(
                requested_secs = self.session_ttl.as_secs(),
                max_secs = Self::MAX_TTL.as_secs(),
                "session_ttl too large, clamping"
            );
            self.session_ttl = Self::MAX_TTL;
        }
        if self.sweep_interval > Self::MAX_SWEEP_INTERVAL {
            warn!(
                requested_secs = self.sweep_interval.as_secs(),
                max_secs = Self::MAX_SWEEP_INTERVAL.as_secs(),
                "sweep_interval too large, clamping"
            );
            self.sweep_interval = Self::MAX_SWEEP_INTERVAL;
        }
        self
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            session_ttl: Self::DEFAULT_TTL,
            sweep_interval: Self::DEFAULT_SWEEP_INTERVAL,
        }
    }
}

// ---------------------------------------------------------------------------
// SessionStatus
// ---------------------------------------------------------------------------

/// Where a login session is in the scan flow.
///
/// ```text
///   Pending ──(scan)──→ Success
///      │                   │
///      └──→ Scanned ───────┘        (Scanned is reserved, nothing sets it yet)
///
///   any live status ──(time)──→ Expired
/// ```
///
/// `Expired` is only ever observed inside the reaper's critical section;
/// expired sessions are removed before anyone else can read them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Pending,
    Scanned,
    Success,
    Expired,
}

impl SessionStatus {
    /// Returns `true` if moving from `self` to `target` is allowed.
    ///
    /// `Success → Success` is allowed: scanning the same code twice
    /// overwrites the identity with the latest scan.
    pub fn can_transition_to(self, target: Self) -> bool {
        match (self, target) {
            (Self::Expired, _) => false,
            (_, Self::Expired) => true,
            (Self::Pending, Self::Scanned | Self::Success) => true,
            (Self::Scanned, Self::Success) => true,
            (Self::Success, Self::Success) => true,
            _ => false,
        }
    }

    /// The lowercase name used on the wire.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Scanned => "scanned",
            Self::Success => "success",
            Self::Expired => "expired",
        }
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// WeChatUserInfo
// ---------------------------------------------------------------------------

/// Profile of the WeChat user who scanned the code.
///
/// Only the open id is known from a scan event. Richer profile data
/// would need a separate WeChat user-info API call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeChatUserInfo {
    pub openid: String,
}

impl WeChatUserInfo {
    pub fn new(openid: impl Into<String>) -> Self {
        Self {
            openid: openid.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// LoginSession
// ---------------------------------------------------------------------------

/// A single scan-to-login attempt.
///
/// The store returns clones of these, so a caller holding one sees a
/// snapshot and never blocks the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginSession {
    /// Handle the browser polls with. 32 lowercase hex chars.
    pub login_token: String,

    /// Value embedded in the QR code and echoed back by WeChat on scan.
    /// Format: `login_<unix_seconds>_<16 hex chars>`.
    pub scene_id: String,

    pub status: SessionStatus,

    /// WeChat open id of the scanner. Empty until the session succeeds.
    pub wechat_id: String,

    /// Credential the frontend redeems for the WeChat identity.
    /// Independent of `login_token`; only disclosed after success.
    pub auth_code: String,

    pub user_info: Option<WeChatUserInfo>,

    pub created_at: SystemTime,

    /// `created_at + session_ttl`.
    pub expired_at: SystemTime,
}

impl LoginSession {
    /// Returns `true` once `now` is strictly past `expired_at`.
    pub fn is_expired_at(&self, now: SystemTime) -> bool {
        now > self.expired_at
    }

    /// Time left before expiry, zero if already expired.
    pub fn remaining_at(&self, now: SystemTime) -> Duration {
        self.expired_at
            .duration_since(now)
            .unwrap_or(Duration::ZERO)
    }

    /// `created_at` as Unix seconds.
    pub fn created_at_unix(&self) -> u64 {
        unix_seconds(self.created_at)
    }

    /// `expired_at` as Unix seconds.
    pub fn expired_at_unix(&self) -> u64 {
        unix_seconds(self.expired_at)
    }
}

/// Seconds since the Unix epoch, saturating at zero for pre-epoch times.
pub(crate) fn unix_seconds(at: SystemTime) -> u64 {
    at.duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
