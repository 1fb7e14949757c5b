//! Stop signal for the RPC and WebSocket servers.
//!
//! Both servers take a future from [`ShutdownController::signalled`] and hand
//! it to axum's graceful shutdown: they stop accepting connections once it
//! resolves and finish the requests in flight. The node resolves it on
//! SIGINT/SIGTERM or from [`RegistryNode::stop`](crate::RegistryNode::stop).
//!
//! The flag is a `tokio::sync::watch` value rather than a one-shot message,
//! so a server started after the stop was requested still sees it.

use std::future::Future;

use tokio::signal;
use tokio::sync::watch;

/// Latched stop flag shared by the node's servers.
pub struct ShutdownController {
    stopped: watch::Sender<bool>,
}

impl ShutdownController {
    pub fn new() -> Self {
        let (stopped, _) = watch::channel(false);
        Self { stopped }
    }

    /// Resolves once a stop has been requested, including before the call.
    pub fn signalled(&self) -> impl Future<Output = ()> + Send + 'static {
        let mut rx = self.stopped.subscribe();
        async move {
            // An error means the controller is gone, which also ends serving.
            let _ = rx.wait_for(|stopped| *stopped).await;
        }
    }

    /// Request a stop. Later calls are no-ops.
    pub fn shutdown(&self) {
        self.stopped.send_replace(true);
    }

    pub fn is_shutting_down(&self) -> bool {
        *self.stopped.borrow()
    }

    /// Block until SIGINT or SIGTERM, then request a stop.
    pub async fn wait_for_signal(&self) {
        let ctrl_c = signal::ctrl_c();

        #[cfg(unix)]
        let terminate = async {
            match signal::unix::signal(signal::unix::SignalKind::terminate()) {
                Ok(mut sigterm) => {
                    sigterm.recv().await;
                }
                Err(e) => {
                    tracing::warn!(error = %e, "SIGTERM handler unavailable; stopping on SIGINT only");
                    std::future::pending::<()>().await;
                }
            }
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            _ = ctrl_c => tracing::info!(signal = "SIGINT", "stopping registry servers"),
            _ = terminate => tracing::info!(signal = "SIGTERM", "stopping registry servers"),
        }

        self.shutdown();
    }
}

impl Default for ShutdownController {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn rpc_and_websocket_futures_both_resolve() {
        let controller = ShutdownController::new();
        let rpc = controller.signalled();
        let websocket = controller.signalled();
        controller.shutdown();
        rpc.await;
        websocket.await;
    }

    #[tokio::test]
    async fn server_started_after_stop_sees_it() {
        let controller = ShutdownController::new();
        controller.shutdown();
        assert!(controller.is_shutting_down());
        controller.signalled().await;
    }

    #[tokio::test]
    async fn repeated_stop_is_harmless() {
        let controller = ShutdownController::new();
        assert!(!controller.is_shutting_down());
        controller.shutdown();
        controller.shutdown();
        controller.signalled().await;
    }
}
