//! Login session management for ScanGate.
//!
//! This crate holds the state behind a WeChat "scan to log in" flow:
//!
//! 1. **Sessions**: one [`LoginSession`] per QR code shown to a browser
//! 2. **Store**: [`SessionStore`], indexed by login token and by scene id,
//!    safe to share across request handlers
//! 3. **Expiry**: lazy eviction on every read, plus a periodic
//!    [`Reaper`] that sweeps sessions nobody reads again
//!
//! # How it fits in the stack
//!
//! ```text
//! ScanGate facade (above)  ← HTTP controllers and the WeChat webhook call in
//!     ↕
//! Session layer (this crate)  ← owns every login session and its expiry
//! ```

mod clock;
mod reaper;
mod session;
mod store;

pub use clock::{Clock, ManualClock, SystemClock};
pub use reaper::{Reaper, ReaperHandle};
pub use session::{LoginSession, SessionConfig, SessionStatus, WeChatUserInfo};
pub use store::{SCENE_PREFIX, SessionStore};
