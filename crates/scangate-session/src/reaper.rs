//! Background sweeper that bounds how long expired sessions stay in memory.
//!
//! Lookups already hide expired sessions on their own; the reaper exists
//! for sessions nobody reads again (abandoned QR codes), which would
//! otherwise sit in the store forever.
//!
//! The reaper runs as its own Tokio task, the same way each room in a
//! game server runs as an actor: spawn it, keep the handle, and tell it to
//! stop through a channel.
//!
//! ```ignore
//! let store = Arc::new(SessionStore::new(SessionConfig::default()));
//! let reaper = Reaper::new(Arc::clone(&store)).spawn();
//! // ... serve requests ...
//! reaper.stop().await;
//! ```

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, info};

use crate::SessionStore;

/// A not-yet-running reaper for one store.
pub struct Reaper {
    store: Arc<SessionStore>,
    interval: Duration,
}

impl Reaper {
    /// Creates a reaper that sweeps `store` every
    /// [`sweep_interval`](crate::SessionConfig::sweep_interval).
    pub fn new(store: Arc<SessionStore>) -> Self {
        let interval = store.config().sweep_interval;
        Self { store, interval }
    }

    /// The time between sweeps.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Starts the sweep loop on the current Tokio runtime.
    ///
    /// The first sweep happens one full interval after spawning.
    /// Dropping the returned handle also stops the loop.
    pub fn spawn(self) -> ReaperHandle {
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let task = tokio::spawn(run_reaper(self.store, self.interval, shutdown_rx));
        ReaperHandle {
            shutdown: shutdown_tx,
            task,
        }
    }
}

/// Handle to a running reaper.
pub struct ReaperHandle {
    shutdown: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

impl ReaperHandle {
    /// Signals the reaper to stop and waits for its task to finish.
    ///
    /// A sweep already in progress completes first.
    pub async fn stop(self) {
        let Self { shutdown, task } = self;
        let _ = shutdown.send(());
        if let Err(e) = task.await {
            debug!(error = %e, "reaper task ended abnormally");
        }
    }

    /// Returns `true` once the sweep loop has exited.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

async fn run_reaper(
    store: Arc<SessionStore>,
    period: Duration,
    mut shutdown: oneshot::Receiver<()>,
) {
    let first = Instant::now()
        .checked_add(period)
        .unwrap_or_else(Instant::now);
    let mut ticker = time::interval_at(first, period);
    // A late sweep covers everything a missed one would have; no bursts.
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    info!(interval_secs = period.as_secs(), "session reaper started");

    loop {
        tokio::select! {
            // Either an explicit stop or the handle being dropped.
            _ = &mut shutdown => break,
            _ = ticker.tick() => {
                let removed = store.sweep_expired();
                debug!(
                    removed,
                    active = store.active_session_count(),
                    "reaper sweep"
                );
            }
        }
    }

    info!("session reaper stopped");
}
