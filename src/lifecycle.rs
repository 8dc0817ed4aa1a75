//! Cooperative shutdown.
//!
//! SIGINT or SIGTERM cancels a shared token. Components stop taking new work
//! when it fires and get a bounded grace period to finish what they hold.

use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

pub struct Lifecycle {
    token: CancellationToken,
    grace: Duration,
}

impl Lifecycle {
    pub fn new(grace: Duration) -> Self {
        Self {
            token: CancellationToken::new(),
            grace,
        }
    }

    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    pub fn grace(&self) -> Duration {
        self.grace
    }

    /// Cancel the token on the first termination signal.
    pub fn listen_for_signals(&self) -> JoinHandle<()> {
        let token = self.token.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => return,
                signal = termination_signal() => {
                    tracing::info!("Received {signal}, shutting down");
                }
            }
            token.cancel();
        })
    }

    /// Wait for `tasks` to finish, giving up `grace` after shutdown started.
    ///
    /// Returns `false` when tasks were still running at the deadline.
    pub async fn drain<T>(&self, tasks: Vec<JoinHandle<T>>) -> bool {
        let all = futures::future::join_all(tasks);
        tokio::pin!(all);

        tokio::select! {
            results = &mut all => {
                for result in results {
                    if let Err(e) = result {
                        tracing::error!("Task failed: {e}");
                    }
                }
                true
            }
            _ = async {
                self.token.cancelled().await;
                tokio::time::sleep(self.grace).await;
            } => {
                tracing::warn!("Tasks still running after {:?} grace period", self.grace);
                false
            }
        }
    }
}

#[cfg(unix)]
async fn termination_signal() -> &'static str {
    use tokio::signal::unix::{signal, SignalKind};

    match signal(SignalKind::terminate()) {
        Ok(mut sigterm) => tokio::select! {
            _ = tokio::signal::ctrl_c() => "SIGINT",
            _ = sigterm.recv() => "SIGTERM",
        },
        Err(e) => {
            tracing::warn!("Cannot listen for SIGTERM: {e}");
            let _ = tokio::signal::ctrl_c().await;
            "SIGINT"
        }
    }
}

#[cfg(not(unix))]
async fn termination_signal() -> &'static str {
    let _ = tokio::signal::ctrl_c().await;
    "Ctrl-C"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_drain_waits_for_finished_tasks() {
        let lifecycle = Lifecycle::new(Duration::from_millis(50));
        let tasks = vec![tokio::spawn(async { 1 }), tokio::spawn(async { 2 })];
        assert!(lifecycle.drain(tasks).await);
    }

    #[tokio::test]
    async fn test_drain_gives_up_after_grace() {
        let lifecycle = Lifecycle::new(Duration::from_millis(20));
        let stuck = tokio::spawn(tokio::time::sleep(Duration::from_secs(60)));
        lifecycle.token().cancel();

        let started = tokio::time::Instant::now();
        assert!(!lifecycle.drain(vec![stuck]).await);
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_task_observing_token_drains_in_time() {
        let lifecycle = Lifecycle::new(Duration::from_secs(5));
        let token = lifecycle.token();
        let worker = tokio::spawn(async move { token.cancelled().await });

        lifecycle.token().cancel();
        assert!(lifecycle.drain(vec![worker]).await);
    }
}
