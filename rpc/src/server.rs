//! Axum-based RPC server.

use std::future::Future;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::de::DeserializeOwned;
use tokio::sync::RwLock;
use tower_http::cors::CorsLayer;
use tracing::info;

use verileaf_registry::{CallContext, EventLog, Registry};
use verileaf_store::RegistryStore;
use verileaf_types::{Clock, Timestamp};

use crate::auth::SignedCall;
use crate::error::RpcError;
use crate::handlers::{self, log_rejection, WriteResponse};
use crate::metrics::RegistryMetrics;
use crate::replay::ReplayGuard;

/// Listener and surface options.
#[derive(Debug, Clone)]
pub struct RpcConfig {
    pub bind_address: IpAddr,
    pub port: u16,
    pub enable_metrics: bool,
    /// Answer CORS preflights for any origin (browser frontends).
    pub cors_allow_any: bool,
    /// Largest accepted distance between a call's `issued_at` and server time.
    pub max_clock_skew_secs: u64,
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            bind_address: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 7077,
            enable_metrics: true,
            cors_allow_any: false,
            max_clock_skew_secs: 300,
        }
    }
}

/// State shared by every handler.
///
/// All writes go through the one lock around the registry.
pub struct AppState<S, L> {
    pub registry: Arc<RwLock<Registry<S, L>>>,
    pub replay: Arc<ReplayGuard>,
    pub metrics: Arc<RegistryMetrics>,
    pub clock: Arc<dyn Clock>,
    pub max_clock_skew_secs: u64,
}

impl<S, L> Clone for AppState<S, L> {
    fn clone(&self) -> Self {
        Self {
            registry: Arc::clone(&self.registry),
            replay: Arc::clone(&self.replay),
            metrics: Arc::clone(&self.metrics),
            clock: Arc::clone(&self.clock),
            max_clock_skew_secs: self.max_clock_skew_secs,
        }
    }
}

impl<S, L> AppState<S, L>
where
    S: RegistryStore + Send + Sync + 'static,
    L: EventLog + Send + Sync + 'static,
{
    /// Authenticate a signed call and apply it under the write lock.
    ///
    /// A replayed call is refused before the lock is taken. Rejections are
    /// counted by kind before being returned.
    pub(crate) async fn execute<P, F>(
        &self,
        call: &'static str,
        body: Result<Json<SignedCall>, JsonRejection>,
        apply: F,
    ) -> Result<Json<WriteResponse>, RpcError>
    where
        P: DeserializeOwned + Send,
        F: FnOnce(&mut Registry<S, L>, &CallContext, P) -> Result<(), RpcError> + Send,
    {
        let result = self.authenticate::<P>(call, body);
        let result = match result {
            Ok((ctx, payload)) => {
                let mut registry = self.registry.write().await;
                apply(&mut *registry, &ctx, payload).map(|()| ctx)
            }
            Err(e) => Err(e),
        };

        match result {
            Ok(ctx) => Ok(Json(WriteResponse {
                call: call.to_string(),
                caller: ctx.caller,
            })),
            Err(e) => {
                log_rejection(call, &e);
                self.metrics.record_rejection(&e);
                Err(e)
            }
        }
    }

    fn authenticate<P: DeserializeOwned>(
        &self,
        call: &str,
        body: Result<Json<SignedCall>, JsonRejection>,
    ) -> Result<(CallContext, P), RpcError> {
        let Json(signed) = body.map_err(|e| RpcError::InvalidRequest(e.body_text()))?;
        let now = self.clock.now();
        let verified = signed.verify(call, now, self.max_clock_skew_secs)?;
        // Recorded even if the registry goes on to reject it; the client
        // re-signs with a new `issued_at` to retry.
        self.replay.check_and_record(
            signed.signer,
            signed.digest(call)?,
            Timestamp::new(signed.issued_at),
            now,
            self.max_clock_skew_secs,
        )?;
        Ok(verified)
    }
}

pub struct RpcServer<S, L> {
    config: RpcConfig,
    state: AppState<S, L>,
}

impl<S, L> RpcServer<S, L>
where
    S: RegistryStore + Send + Sync + 'static,
    L: EventLog + Send + Sync + 'static,
{
    pub fn new(config: RpcConfig, state: AppState<S, L>) -> Self {
        Self { config, state }
    }

    /// Build the router with every endpoint.
    pub fn router(&self) -> Router {
        let mut router = Router::new()
            .route("/health", get(handlers::health))
            .route("/roles", get(handlers::get_roles::<S, L>))
            .route("/claims", post(handlers::register_claim::<S, L>))
            .route("/claims/:identity", get(handlers::get_claim::<S, L>))
            .route("/scores", post(handlers::submit_impact_score::<S, L>))
            .route("/scores/:identity", get(handlers::get_score::<S, L>))
            .route("/verifier", post(handlers::set_verifier::<S, L>))
            .route("/events", get(handlers::list_events::<S, L>));
        if self.config.enable_metrics {
            router = router.route("/metrics", get(handlers::metrics::<S, L>));
        }

        let router = router.with_state(self.state.clone());
        if self.config.cors_allow_any {
            router.layer(CorsLayer::permissive())
        } else {
            router
        }
    }

    /// Bind and serve until `shutdown` resolves.
    pub async fn start<F>(self, shutdown: F) -> Result<(), RpcError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = SocketAddr::new(self.config.bind_address, self.config.port);
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| RpcError::Server(format!("bind {addr}: {e}")))?;
        info!(%addr, metrics = self.config.enable_metrics, "RPC server listening");

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| RpcError::Server(e.to_string()))
    }
}
