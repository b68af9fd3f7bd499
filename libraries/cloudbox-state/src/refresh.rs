//! Periodic background refresh of the file collection.

use crate::error::Rejection;
use crate::store::Store;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(30);

/// What a refresh does with a failed fetch.
///
/// Either way the failure still lands in the file state, and an unauthorized
/// answer still expires the session.
#[derive(Debug, Clone, Default)]
pub enum ErrorPolicy {
    /// Log at debug level only
    #[default]
    Suppress,
    /// Forward every failure on the channel
    Surface(mpsc::UnboundedSender<Rejection>),
}

/// Handle to a running refresh loop.
///
/// Dropping the handle cancels the loop.
pub struct RefreshTask {
    cancel: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl RefreshTask {
    /// Start fetching the collection every `period`, beginning one period
    /// from now. Ticks with no stored session are skipped.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn spawn(store: Store, period: Duration, policy: ErrorPolicy) -> Self {
        let cancel = CancellationToken::new();
        let token = cancel.clone();

        let handle = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            info!(period_secs = period.as_secs(), "Background refresh started");

            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = ticker.tick() => {}
                }

                let Some(session) = store.session() else {
                    debug!("No session stored; skipping refresh");
                    continue;
                };

                // Runs to completion so the fetch status never stays in flight
                match store.fetch_all(&session).await {
                    Ok(files) => debug!(count = files.len(), "Background refresh complete"),
                    Err(rejection) => match &policy {
                        ErrorPolicy::Suppress => {
                            debug!(error = %rejection, "Background refresh failed");
                        }
                        ErrorPolicy::Surface(tx) => {
                            if tx.send(rejection).is_err() {
                                warn!("Refresh error receiver dropped");
                            }
                        }
                    },
                }
            }

            info!("Background refresh stopped");
        });

        Self {
            cancel,
            handle: Some(handle),
        }
    }

    /// Stop the loop. A fetch already in flight still settles.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Cancel and wait for the loop to exit.
    pub async fn shutdown(mut self) {
        self.cancel.cancel();
        if let Some(handle) = self.handle.take() {
            if let Err(e) = handle.await {
                warn!(error = %e, "Background refresh task panicked");
            }
        }
    }
}

impl Drop for RefreshTask {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
