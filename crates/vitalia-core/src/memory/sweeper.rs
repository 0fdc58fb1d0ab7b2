//! Periodic sweep of idle sessions.
//!
//! Runs on its own schedule, independent of request handling, and stops
//! cleanly when the cancellation token fires.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::store::MemoryStore;

/// Spawn the background task that sweeps idle sessions every `interval`.
///
/// The returned handle completes once `token` is cancelled.
pub fn spawn_sweeper(
    store: Arc<MemoryStore>,
    interval: Duration,
    token: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately; skip it so the first real
        // sweep happens one full interval after startup.
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = token.cancelled() => {
                    debug!("session sweeper stopped");
                    break;
                }
                _ = ticker.tick() => {
                    let removed = store.sweep(Utc::now());
                    if removed > 0 {
                        info!(removed, "session sweep evicted idle sessions");
                    }
                }
            }
        }
    })
}
