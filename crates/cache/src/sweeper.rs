// crates/cache/src/sweeper.rs
//! Periodic reclamation of expired entries

use crate::manager::CacheManager;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

const MIN_INTERVAL: Duration = Duration::from_millis(1);

/// Background task purging expired entries
///
/// The task stops when this handle is dropped or [`Sweeper::stop`] is called.
#[derive(Debug)]
pub struct Sweeper {
    handle: JoinHandle<()>,
}

impl Sweeper {
    pub fn stop(self) {
        self.handle.abort();
    }

    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }
}

impl Drop for Sweeper {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

impl<T: Send + 'static> CacheManager<T> {
    /// Spawns a tokio task calling [`CacheManager::purge_expired`] every `interval`
    ///
    /// Returns `None` when no tokio runtime is current. Expired entries are
    /// then still reclaimed lazily on read.
    pub fn spawn_sweeper(&self, interval: Duration) -> Option<Sweeper> {
        let runtime = match Handle::try_current() {
            Ok(runtime) => runtime,
            Err(e) => {
                log::warn!("Cache sweeper not started, no tokio runtime: {}", e);
                return None;
            }
        };

        let cache = self.clone();
        let period = interval.max(MIN_INTERVAL);

        let handle = runtime.spawn(async move {
            let mut ticker = tokio::time::interval(period);
            // The first tick completes immediately
            ticker.tick().await;

            loop {
                ticker.tick().await;
                let removed = cache.purge_expired();
                if removed > 0 {
                    log::debug!("Sweeper reclaimed {} expired cache entries", removed);
                }
            }
        });

        Some(Sweeper { handle })
    }
}
