//! The registry node: wires storage, registry, notifications and servers.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::task::JoinHandle;

use verileaf_registry::{CallContext, EventBus, Registry};
use verileaf_rpc::{AppState, RegistryMetrics, ReplayGuard, RpcConfig, RpcServer};
use verileaf_store::{EventStore, RoleStore};
use verileaf_store_lmdb::LmdbEnvironment;
use verileaf_types::{Clock, SystemClock};
use verileaf_websocket::{WebSocketServer, WsState};

use crate::config::NodeConfig;
use crate::error::NodeError;
use crate::shutdown::ShutdownController;

/// Timeout for waiting on the servers during shutdown.
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(10);

/// Capacity of each WebSocket topic channel.
const WS_CHANNEL_CAPACITY: usize = 256;

/// The registry as the node runs it: LMDB-backed, notifying the event bus.
pub type NodeRegistry = Registry<Arc<LmdbEnvironment>, EventBus>;

pub struct RegistryNode {
    pub config: NodeConfig,
    pub store: Arc<LmdbEnvironment>,
    pub registry: Arc<RwLock<NodeRegistry>>,
    /// Signed calls accepted recently, shared by every RPC server this node
    /// builds.
    pub replay: Arc<ReplayGuard>,
    pub metrics: Arc<RegistryMetrics>,
    pub ws_state: Arc<WsState>,
    pub shutdown: Arc<ShutdownController>,
    clock: Arc<dyn Clock>,
    task_handles: Vec<JoinHandle<()>>,
}

impl RegistryNode {
    /// Open the store and construct or reopen the registry.
    ///
    /// An empty store is constructed with `config.owner` as the owner; a
    /// store that already holds a registry is reopened and keeps its owner.
    pub fn new(config: NodeConfig) -> Result<Self, NodeError> {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: NodeConfig, clock: Arc<dyn Clock>) -> Result<Self, NodeError> {
        let store = Arc::new(LmdbEnvironment::open(
            &config.data_dir,
            config.lmdb_map_size,
        )?);

        let metrics = Arc::new(RegistryMetrics::new());
        metrics
            .audit_log_length
            .set(i64::try_from(store.event_count()?).unwrap_or(i64::MAX));
        let ws_state = Arc::new(WsState::new(WS_CHANNEL_CAPACITY));
        let bus = build_event_bus(&metrics, &ws_state);

        let registry = match store.get_roles()? {
            Some(roles) => {
                if let Some(owner) = config.owner.filter(|o| *o != roles.owner) {
                    tracing::warn!(
                        configured = %owner,
                        stored = %roles.owner,
                        "configured owner ignored; the stored registry keeps its owner"
                    );
                }
                Registry::open(Arc::clone(&store), bus)?
            }
            None => {
                let owner = config.owner.ok_or(NodeError::MissingOwner)?;
                if owner.is_null() {
                    return Err(NodeError::NullOwner);
                }
                let ctx = CallContext::new(owner, clock.now());
                Registry::construct(Arc::clone(&store), bus, &ctx, config.initial_verifier)?
            }
        };

        Ok(Self {
            config,
            store,
            registry: Arc::new(RwLock::new(registry)),
            replay: Arc::new(ReplayGuard::new()),
            metrics,
            ws_state,
            shutdown: Arc::new(ShutdownController::new()),
            clock,
            task_handles: Vec::new(),
        })
    }

    /// The RPC server over this node's registry.
    pub fn rpc_server(&self) -> RpcServer<Arc<LmdbEnvironment>, EventBus> {
        let config = RpcConfig {
            bind_address: self.config.bind_address,
            port: self.config.rpc_port,
            enable_metrics: self.config.enable_metrics,
            cors_allow_any: self.config.cors_allow_any,
            max_clock_skew_secs: self.config.max_clock_skew_secs,
        };
        let state = AppState {
            registry: Arc::clone(&self.registry),
            replay: Arc::clone(&self.replay),
            metrics: Arc::clone(&self.metrics),
            clock: Arc::clone(&self.clock),
            max_clock_skew_secs: self.config.max_clock_skew_secs,
        };
        RpcServer::new(config, state)
    }

    /// Spawn the RPC server and, if enabled, the WebSocket server.
    pub async fn start(&mut self) -> Result<(), NodeError> {
        let roles = self.registry.read().await.roles();
        tracing::info!(
            data_dir = %self.config.data_dir.display(),
            owner = %roles.owner,
            verifier = %roles.verifier,
            "VeriLeaf node starting"
        );

        let rpc_server = self.rpc_server();
        let shutdown = self.shutdown.signalled();
        self.task_handles.push(tokio::spawn(async move {
            match rpc_server.start(shutdown).await {
                Ok(()) => tracing::info!("RPC server exited"),
                Err(e) => tracing::error!(error = %e, "RPC server error"),
            }
        }));

        if self.config.enable_websocket {
            let addr = SocketAddr::new(self.config.bind_address, self.config.websocket_port);
            let ws_server = WebSocketServer::new(addr, Arc::clone(&self.ws_state));
            let shutdown = self.shutdown.signalled();
            self.task_handles.push(tokio::spawn(async move {
                match ws_server.start(shutdown).await {
                    Ok(()) => tracing::info!("WebSocket server exited"),
                    Err(e) => tracing::error!(error = %e, "WebSocket server error"),
                }
            }));
        }

        tracing::info!(
            rpc_port = self.config.rpc_port,
            websocket = self.config.enable_websocket,
            "VeriLeaf node started"
        );
        Ok(())
    }

    /// Start, then run until SIGINT/SIGTERM and stop.
    pub async fn run(&mut self) -> Result<(), NodeError> {
        self.start().await?;
        self.shutdown.wait_for_signal().await;
        self.stop().await
    }

    /// Stop the servers and flush the store.
    pub async fn stop(&mut self) -> Result<(), NodeError> {
        tracing::info!("VeriLeaf node stopping");
        self.shutdown.shutdown();

        let handles: Vec<_> = self.task_handles.drain(..).collect();
        let joined = tokio::time::timeout(SHUTDOWN_TIMEOUT, async {
            for handle in handles {
                let _ = handle.await;
            }
        })
        .await;

        self.store.sync()?;
        if joined.is_err() {
            return Err(NodeError::ShutdownTimeout);
        }
        tracing::info!("VeriLeaf node stopped");
        Ok(())
    }
}

/// Fan registry notifications out to every consumer. The audit trail itself
/// is written by the store.
fn build_event_bus(metrics: &Arc<RegistryMetrics>, ws_state: &Arc<WsState>) -> EventBus {
    let mut bus = EventBus::new();

    let metrics = Arc::clone(metrics);
    bus.subscribe(Box::new(move |event| metrics.observe(event)));

    let ws_state = Arc::clone(ws_state);
    bus.subscribe(Box::new(move |event| {
        let delivered = ws_state.publish(event);
        tracing::debug!(kind = event.kind(), delivered, "registry event published");
    }));
    bus
}
