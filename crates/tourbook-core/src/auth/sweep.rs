//! Background expiry sweep.
//!
//! A recurring tokio task that re-checks the persisted token while the
//! session is alive. The task is owned by a [`SweepHandle`]; dropping the
//! handle aborts it.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::debug;

use super::session::SessionStore;

/// Default polling interval for the expiry sweep.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Owner of a running expiry sweep.
#[must_use = "dropping the handle stops the sweep"]
pub struct SweepHandle {
    task: JoinHandle<()>,
}

impl SweepHandle {
    /// Stop the sweep now.
    pub fn cancel(self) {
        drop(self);
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for SweepHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

impl SessionStore {
    /// Start checking token validity every `period`. The task holds only a
    /// weak reference, so it also ends once the store is dropped.
    pub fn spawn_expiry_sweep(self: &Arc<Self>, period: Duration) -> SweepHandle {
        let store = Arc::downgrade(self);
        let task = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                let Some(store) = store.upgrade() else {
                    debug!("Session store dropped, stopping expiry sweep");
                    break;
                };
                if store.sweep() {
                    debug!("Expiry sweep logged the session out");
                }
            }
        });
        debug!(period_secs = period.as_secs(), "Expiry sweep started");
        SweepHandle { task }
    }
}

// ============================================================================
// Tests
// ============================================================================
