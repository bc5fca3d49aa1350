//! Cooperative shutdown primitive shared by every long-running task in the
//! workspace (the collector's per-source tasks, the dictionary
//! synchronizer, the outbox listener). Wraps a [`tokio_util::sync::CancellationToken`]
//! and a `SIGTERM`/`SIGINT` listener, generalising the ad-hoc
//! `shutdown_signal()` helper the teacher duplicates per binary
//! (`control-plane/agents/jsongrpc/src/service.rs`) into a single reusable
//! crate.

use tokio_util::sync::CancellationToken;

/// A handle that every component task clones and polls for cancellation.
#[derive(Clone, Debug)]
pub struct Shutdown {
    token: CancellationToken,
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

impl Shutdown {
    /// Create a fresh, uncancelled shutdown handle.
    pub fn new() -> Self {
        Self {
            token: CancellationToken::new(),
        }
    }

    /// Spawn a task that cancels `self` on the first `SIGTERM` or `SIGINT`.
    /// Mirrors the teacher's `JsonGrpcSvc::shutdown_signal`, generalised to
    /// drive a shared token instead of a one-shot channel.
    pub fn trap_signals(&self) {
        let token = self.token.clone();
        tokio::spawn(async move {
            let mut term = match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(sig) => sig,
                Err(error) => {
                    tracing::warn!(%error, "failed to install SIGTERM handler");
                    return;
                }
            };
            let mut int = match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::interrupt()) {
                Ok(sig) => sig,
                Err(error) => {
                    tracing::warn!(%error, "failed to install SIGINT handler");
                    return;
                }
            };
            tokio::select! {
                _ = term.recv() => tracing::info!("SIGTERM received"),
                _ = int.recv() => tracing::info!("SIGINT received"),
            }
            token.cancel();
        });
    }

    /// Returns true once a shutdown has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Resolves once a shutdown has been requested. Cheap to call in a
    /// `tokio::select!` branch on every suspension point, per spec.md §5.
    pub async fn cancelled(&self) {
        self.token.cancelled().await
    }

    /// Request a shutdown programmatically (used by tests and by `main` on
    /// fatal init errors).
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// A child token that is cancelled whenever `self` is, but can also be
    /// cancelled independently (e.g. to tear down a single data source
    /// without stopping the whole collector).
    pub fn child(&self) -> Shutdown {
        Shutdown {
            token: self.token.child_token(),
        }
    }

    /// The raw token, for bridging into APIs (e.g. `o2ims-transport::Client`)
    /// that predate this wrapper and take a `CancellationToken` directly.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.token.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn cancel_propagates_to_children() {
        let parent = Shutdown::new();
        let child = parent.child();
        assert!(!child.is_cancelled());
        parent.cancel();
        child.cancelled().await;
        assert!(child.is_cancelled());
    }
}
