use tokio::signal::unix::{SignalKind, signal};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

/// Cancels a shared token on SIGTERM or SIGINT.
///
/// Every listener holds a clone of the token and stops accepting work once it
/// is cancelled.
pub struct ShutdownSignal {
    tracker: TaskTracker,
    token: CancellationToken,
}

impl ShutdownSignal {
    /// Registers the signal handlers. Fails if registration is refused.
    pub fn try_new() -> Result<Self, std::io::Error> {
        let mut sigterm = signal(SignalKind::terminate())?;
        let mut sigint = signal(SignalKind::interrupt())?;
        let token = CancellationToken::new();
        let trigger = token.clone();
        let tracker = TaskTracker::new();
        tracker.spawn(async move {
            tokio::select! {
                _ = sigterm.recv() => tracing::info!("received SIGTERM"),
                _ = sigint.recv() => tracing::info!("received SIGINT"),
                _ = trigger.cancelled() => return,
            }
            trigger.cancel();
        });
        tracker.close();
        Ok(Self { tracker, token })
    }

    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Waits until shutdown was requested and the signal task has finished.
    pub async fn wait(&self) {
        self.token.cancelled().await;
        self.tracker.wait().await;
    }
}
