//! The session store: every live login session, indexed two ways.
//!
//! Responsibilities:
//! - Creating sessions with fresh token / scene id / auth code
//! - Looking sessions up by login token (browser polling) and by scene id
//!   (WeChat scan events)
//! - Recording the scan result on a session
//! - Evicting expired sessions, lazily on read and in bulk for the reaper
//!
//! # Concurrency
//!
//! Both indices sit behind ONE `RwLock` so they can never disagree.
//! Lookups take the read half; creation, updates and sweeps take the
//! write half. A lookup that finds an expired entry drops its read guard,
//! takes the write guard and re-checks before deleting, because another
//! task may have evicted (or the reaper swept) in between.
//!
//! Nothing under the lock touches the network: random generation and map
//! edits only.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::SystemTime;

use parking_lot::RwLock;
use rand::Rng;
use tracing::{debug, info, warn};

use crate::session::unix_seconds;
use crate::{
    Clock, LoginSession, SessionConfig, SessionStatus, SystemClock,
    WeChatUserInfo,
};

/// Prefix of every scene id the store generates.
pub const SCENE_PREFIX: &str = "login_";

/// The two indices, always locked together.
#[derive(Default)]
struct Indices {
    /// Live sessions keyed by login token.
    sessions: HashMap<String, LoginSession>,

    /// Scene id → login token. Every entry points at a key of `sessions`
    /// (dangling entries only exist transiently and are dropped on sight).
    scenes: HashMap<String, String>,
}

impl Indices {
    /// Removes the session under `token` if it has expired at `now`.
    ///
    /// This is the single eviction primitive shared by the read paths and
    /// the reaper. Returns `true` if something was removed.
    fn remove_if_expired(&mut self, token: &str, now: SystemTime) -> bool {
        let expired = self
            .sessions
            .get(token)
            .is_some_and(|s| s.is_expired_at(now));
        if !expired {
            return false;
        }

        if let Some(mut session) = self.sessions.remove(token) {
            session.status = SessionStatus::Expired;
            self.scenes.remove(&session.scene_id);
            debug!(scene_id = %session.scene_id, "login session evicted");
        }
        true
    }

    /// Drops a scene entry if its session is gone or expired.
    fn evict_scene(&mut self, scene_id: &str, now: SystemTime) {
        let Some(token) = self.scenes.get(scene_id).cloned() else {
            return;
        };
        if self.sessions.contains_key(&token) {
            self.remove_if_expired(&token, now);
        } else {
            self.scenes.remove(scene_id);
            debug!(%scene_id, "dangling scene entry dropped");
        }
    }
}

/// Thread-safe store of login sessions.
///
/// Share it as `Arc<SessionStore>` between request handlers and the
/// [`Reaper`](crate::Reaper).
///
/// ## Lifecycle of one entry
///
/// ```text
/// create_session() ──→ [Pending] ──update_session_by_scene()──→ [Success]
///                          │                                       │
///                          └────────── expired_at passes ──────────┘
///                                            │
///                                            ▼
///                     evicted by the next read or the next sweep
/// ```
pub struct SessionStore {
    inner: RwLock<Indices>,
    config: SessionConfig,
    clock: Arc<dyn Clock>,
}

impl SessionStore {
    /// Creates an empty store reading time from the system clock.
    pub fn new(config: SessionConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Creates an empty store reading time from `clock`.
    pub fn with_clock(config: SessionConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            inner: RwLock::new(Indices::default()),
            config: config.validated(),
            clock,
        }
    }

    /// The (validated) configuration this store runs with.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Current time according to the store's clock.
    pub fn now(&self) -> SystemTime {
        self.clock.now()
    }

    /// Creates a pending session and indexes it by token and scene id.
    ///
    /// Token, scene id and auth code are drawn independently from a
    /// cryptographically secure RNG. A token or scene id that collides
    /// with a live session is redrawn.
    pub fn create_session(&self) -> LoginSession {
        let now = self.clock.now();
        let mut inner = self.inner.write();

        let mut login_token = generate_token();
        while inner.sessions.contains_key(&login_token) {
            login_token = generate_token();
        }
        let mut scene_id = generate_scene_id(now);
        while inner.scenes.contains_key(&scene_id) {
            scene_id = generate_scene_id(now);
        }

        let expired_at = match now.checked_add(self.config.session_ttl) {
            Some(at) => at,
            None => {
                warn!(
                    ttl_secs = self.config.session_ttl.as_secs(),
                    "session expiry overflows the clock"
                );
                now
            }
        };

        let session = LoginSession {
            login_token: login_token.clone(),
            scene_id: scene_id.clone(),
            status: SessionStatus::Pending,
            wechat_id: String::new(),
            auth_code: generate_token(),
            user_info: None,
            created_at: now,
            expired_at,
        };

        inner.scenes.insert(scene_id.clone(), login_token.clone());
        inner.sessions.insert(login_token, session.clone());

        info!(%scene_id, "login session created");
        session
    }

    /// Looks up a live session by login token.
    ///
    /// An expired session is evicted from both indices and reported as
    /// absent, whether or not the reaper has run.
    pub fn get_session(&self, login_token: &str) -> Option<LoginSession> {
        let now = self.clock.now();
        {
            let inner = self.inner.read();
            match inner.sessions.get(login_token) {
                None => return None,
                Some(session) if !session.is_expired_at(now) => {
                    return Some(session.clone());
                }
                Some(_) => {}
            }
        }

        self.inner.write().remove_if_expired(login_token, now);
        None
    }

    /// Looks up a live session by the scene id embedded in its QR code.
    ///
    /// Evicts the session if it has expired, and drops the scene entry if
    /// the session it points to no longer exists.
    pub fn get_session_by_scene(&self, scene_id: &str) -> Option<LoginSession> {
        let now = self.clock.now();
        {
            let inner = self.inner.read();
            let token = inner.scenes.get(scene_id)?;
            if let Some(session) = inner.sessions.get(token) {
                if !session.is_expired_at(now) {
                    return Some(session.clone());
                }
            }
        }

        self.inner.write().evict_scene(scene_id, now);
        None
    }

    /// Records a successful scan on the session behind `scene_id`.
    ///
    /// Returns `false`, leaving every session untouched, if the scene is
    /// unknown or its session is gone or expired (the scan lost a race
    /// with expiry). Scanning an already successful session again
    /// overwrites its identity with the new scan.
    pub fn update_session_by_scene(
        &self,
        scene_id: &str,
        wechat_id: &str,
        user_info: WeChatUserInfo,
    ) -> bool {
        let now = self.clock.now();
        let mut guard = self.inner.write();
        let inner = &mut *guard;

        let Some(token) = inner.scenes.get(scene_id).cloned() else {
            debug!(%scene_id, "update for unknown scene");
            return false;
        };
        if inner.remove_if_expired(&token, now) {
            debug!(%scene_id, "update for expired scene");
            return false;
        }
        match inner.sessions.get_mut(&token) {
            Some(session) => {
                session.wechat_id = wechat_id.to_string();
                session.user_info = Some(user_info);
                session.status = SessionStatus::Success;
            }
            None => {
                inner.scenes.remove(scene_id);
                debug!(%scene_id, "update for scene with no session");
                return false;
            }
        }

        info!(%scene_id, %wechat_id, "login session succeeded");
        true
    }

    /// Resolves an auth code to the WeChat id of a successful session.
    ///
    /// Pending and expired sessions never match, even when the code is
    /// right. This is a linear scan; the number of concurrent login
    /// attempts is expected to stay small.
    pub fn find_by_auth_code(&self, auth_code: &str) -> Option<String> {
        let now = self.clock.now();
        let inner = self.inner.read();
        inner
            .sessions
            .values()
            .find(|s| {
                s.auth_code == auth_code
                    && s.status == SessionStatus::Success
                    && !s.is_expired_at(now)
            })
            .map(|s| s.wechat_id.clone())
    }

    /// Number of sessions currently held, expired-but-unswept included.
    pub fn active_session_count(&self) -> usize {
        self.inner.read().sessions.len()
    }

    /// Removes every expired session from both indices.
    ///
    /// Called by the reaper on each tick. Returns how many sessions were
    /// removed.
    pub fn sweep_expired(&self) -> usize {
        let now = self.clock.now();
        let mut inner = self.inner.write();

        let expired: Vec<String> = inner
            .sessions
            .iter()
            .filter(|(_, s)| s.is_expired_at(now))
            .map(|(token, _)| token.clone())
            .collect();

        let mut removed = 0;
        for token in &expired {
            if inner.remove_if_expired(token, now) {
                removed += 1;
            }
        }

        // Scene entries whose session vanished some other way.
        let Indices { sessions, scenes } = &mut *inner;
        scenes.retain(|_, token| sessions.contains_key(token));

        debug!(removed, remaining = inner.sessions.len(), "sweep completed");
        removed
    }
}

/// Generates a random 32-character hex string (128 bits of entropy).
///
/// Used for both login tokens and auth codes. `rand::rng()` is a
/// ChaCha-based CSPRNG seeded from the operating system.
fn generate_token() -> String {
    let bytes: [u8; 16] = rand::rng().random();
    hex::encode(bytes)
}

/// Generates `login_<unix_seconds>_<16 hex chars>`.
fn generate_scene_id(now: SystemTime) -> String {
    let bytes: [u8; 8] = rand::rng().random();
    format!("{SCENE_PREFIX}{}_{}", unix_seconds(now), hex::encode(bytes))
}

// =========================================================================
// Tests
// =========================================================================
