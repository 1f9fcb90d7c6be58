//! Game server assembly and accept loop
//!
//! `GameServer::new` wires the per-mode backends into one [`GameContext`]
//! shared by every connection task, then `start` runs the long-lived tasks:
//! prune listener, duel workers, duel-result router, UDP ping responder, and
//! the TCP accept loop. Everything honors the broadcast shutdown channel.

use crate::cli::{Cli, DeploymentMode};
use crate::ping;
use crate::session;
use dashmap::DashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::{TcpListener, UdpSocket};
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use trionfi_coord::{
    keys, spawn_duel_workers, spawn_prune_listener, CandidateCache, ClaimCoordinator, DrawEngine,
    DuelQueue, DuelResult, EventBus, GameStore, HandStore, LedgerClaimCoordinator,
    LocalClaimCoordinator, MemoryBus, MemoryStore, RedisBackend,
};
use trionfi_core::Catalog;

/// Outbound channels of the connections this process currently owns,
/// keyed by player id.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    inner: DashMap<String, mpsc::UnboundedSender<String>>,
}

impl ConnectionRegistry {
    pub fn register(&self, player_id: &str, tx: mpsc::UnboundedSender<String>) {
        self.inner.insert(player_id.to_string(), tx);
    }

    pub fn unregister(&self, player_id: &str) {
        self.inner.remove(player_id);
    }

    /// Push a message to a locally-connected player. Returns false when the
    /// player is not (or no longer) connected here.
    pub fn deliver(&self, player_id: &str, text: &str) -> bool {
        match self.inner.get(player_id) {
            Some(tx) => tx.send(text.to_string()).is_ok(),
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

/// Everything a connection task needs, built once per process.
pub struct GameContext {
    pub server_id: String,
    pub catalog: Arc<Catalog>,
    pub cache: Arc<CandidateCache>,
    pub engine: DrawEngine,
    pub hands: HandStore,
    pub duels: DuelQueue,
    pub connections: ConnectionRegistry,
}

/// Handle for triggering a graceful stop from outside the server task.
#[derive(Clone)]
pub struct ShutdownHandle(broadcast::Sender<()>);

impl ShutdownHandle {
    pub fn shutdown(&self) {
        let _ = self.0.send(());
    }
}

/// The Trionfi game server.
pub struct GameServer {
    context: Arc<GameContext>,
    store: Arc<dyn GameStore>,
    bus: Arc<dyn EventBus>,
    duel_workers: usize,
    listener: Option<TcpListener>,
    ping_socket: Option<UdpSocket>,
    shutdown: broadcast::Sender<()>,
}

impl GameServer {
    /// Assemble a server from CLI configuration. Binds both sockets up
    /// front so the actual addresses are known before `start`.
    pub async fn new(cli: &Cli) -> anyhow::Result<Self> {
        let server_id = cli.effective_server_id();
        let catalog = Arc::new(Catalog::standard());
        let cache = Arc::new(CandidateCache::from_catalog(&catalog));

        let (store, bus, claims): (Arc<dyn GameStore>, Arc<dyn EventBus>, Arc<dyn ClaimCoordinator>) =
            match cli.mode {
                DeploymentMode::Standalone => {
                    info!("standalone mode: in-memory coordination");
                    (
                        Arc::new(MemoryStore::new()),
                        Arc::new(MemoryBus::new()),
                        Arc::new(LocalClaimCoordinator::new()),
                    )
                }
                DeploymentMode::Cluster => {
                    info!(redis_url = %cli.redis_url, "cluster mode: redis coordination");
                    let mut backend = RedisBackend::connect(&cli.redis_url).await?;
                    if let Some(lease) = cli.claim_lease() {
                        backend = backend.with_claim_lease(lease);
                    }
                    let backend = Arc::new(backend);
                    let store: Arc<dyn GameStore> = backend.clone();
                    let bus: Arc<dyn EventBus> = backend.clone();
                    let claims = LedgerClaimCoordinator::new(
                        backend.clone(),
                        store.clone(),
                        bus.clone(),
                        server_id.clone(),
                    )
                    .with_timeout(cli.claim_timeout());
                    (store, bus, Arc::new(claims))
                }
            };

        let engine = DrawEngine::new(
            catalog.clone(),
            cache.clone(),
            claims,
            cli.draw_config(),
        );
        let hands = HandStore::new(store.clone());
        let duels = DuelQueue::new(store.clone());

        let listener = TcpListener::bind(cli.bind).await?;
        let ping_socket = UdpSocket::bind(cli.ping_bind).await?;

        let (shutdown, _) = broadcast::channel(4);

        Ok(Self {
            context: Arc::new(GameContext {
                server_id,
                catalog,
                cache,
                engine,
                hands,
                duels,
                connections: ConnectionRegistry::default(),
            }),
            store,
            bus,
            duel_workers: cli.duel_workers,
            listener: Some(listener),
            ping_socket: Some(ping_socket),
            shutdown,
        })
    }

    /// Actual game endpoint address (useful with port 0 in tests).
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener
            .as_ref()
            .ok_or_else(|| {
                std::io::Error::new(std::io::ErrorKind::NotConnected, "server not bound")
            })
            .and_then(|l| l.local_addr())
    }

    /// Actual ping responder address.
    pub fn ping_addr(&self) -> std::io::Result<SocketAddr> {
        self.ping_socket
            .as_ref()
            .ok_or_else(|| {
                std::io::Error::new(std::io::ErrorKind::NotConnected, "responder not bound")
            })
            .and_then(|s| s.local_addr())
    }

    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle(self.shutdown.clone())
    }

    /// Run the server until shutdown is signalled.
    pub async fn start(mut self) -> anyhow::Result<()> {
        let listener = self
            .listener
            .take()
            .ok_or_else(|| anyhow::anyhow!("server already started"))?;
        let ping_socket = self
            .ping_socket
            .take()
            .ok_or_else(|| anyhow::anyhow!("server already started"))?;

        let addr = listener.local_addr()?;
        info!(
            server_id = %self.context.server_id,
            %addr,
            duel_workers = self.duel_workers,
            "starting trionfi server"
        );

        spawn_prune_listener(
            self.bus.clone(),
            self.context.cache.clone(),
            self.shutdown.subscribe(),
        );
        spawn_duel_workers(
            self.duel_workers,
            self.store.clone(),
            self.context.hands.clone(),
            self.bus.clone(),
            &self.shutdown,
        );
        spawn_result_router(self.bus.clone(), self.context.clone(), self.shutdown.subscribe());
        ping::spawn_ping_responder(ping_socket, self.shutdown.subscribe());

        let mut shutdown_rx = self.shutdown.subscribe();
        loop {
            tokio::select! {
                _ = shutdown_rx.recv() => {
                    info!("shutdown signalled, closing accept loop");
                    break;
                }
                accepted = listener.accept() => match accepted {
                    Ok((stream, peer)) => {
                        info!(%peer, "new connection");
                        let context = self.context.clone();
                        let shutdown = self.shutdown.subscribe();
                        tokio::spawn(async move {
                            if let Err(e) =
                                session::handle_connection(stream, peer, context, shutdown).await
                            {
                                error!(%peer, error = %e, "connection error");
                            }
                        });
                    }
                    Err(e) => {
                        error!(error = %e, "error accepting connection");
                    }
                }
            }
        }

        Ok(())
    }
}

/// Route duel results to the connections this process owns. Results for
/// other servers — or for players no longer connected here — are dropped.
fn spawn_result_router(
    bus: Arc<dyn EventBus>,
    context: Arc<GameContext>,
    mut shutdown: broadcast::Receiver<()>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut results = match bus.subscribe(keys::DUEL_RESULTS).await {
            Ok(rx) => rx,
            Err(e) => {
                error!(error = %e, "failed to subscribe to duel results");
                return;
            }
        };

        loop {
            tokio::select! {
                _ = shutdown.recv() => {
                    debug!("result router stopping");
                    break;
                }
                message = results.recv() => {
                    let Some(json) = message else {
                        debug!("duel result subscription closed");
                        break;
                    };
                    let result: DuelResult = match serde_json::from_str(&json) {
                        Ok(r) => r,
                        Err(e) => {
                            warn!(error = %e, "undecodable duel result");
                            continue;
                        }
                    };
                    if result.owner != context.server_id {
                        continue;
                    }
                    if !context.connections.deliver(&result.player_id, &result.result) {
                        debug!(
                            player_id = %result.player_id,
                            "duel result for disconnected player dropped"
                        );
                    }
                }
            }
        }
    })
}
