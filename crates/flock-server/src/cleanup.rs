use std::time::Duration;
use tracing::debug;

use crate::state::Store;

/// Background task that wipes the friends cache on a fixed interval, so a
/// stale list never survives longer than one interval. Runs independently
/// of request traffic and tolerates the store never having come up.
pub async fn run_clear_loop(store: Store, interval_secs: u64) {
    let mut interval = tokio::time::interval(Duration::from_secs(interval_secs));

    loop {
        interval.tick().await;

        if store.is_available() {
            store.clear_friends("interval");
        } else {
            debug!("cache clear skipped, store unavailable");
        }
    }
}
