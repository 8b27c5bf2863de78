//! A small HTTP and WebSocket server for flash-backed content.
//!
//! One task owns everything: the listener, a fixed pool of connections
//! driven through a `BEGIN → PAS → END → CLOSE` state machine, and a pool of
//! upgraded WebSocket peers polled once per tick. Static files stream from
//! the [`Filesystem`], `.lua`/`.cgi` paths run through the [`ScriptEngine`],
//! and WebSocket peers on `/dev` talk straight to the [`Board`].

pub mod config;
pub mod control;
pub mod host;
pub mod http;
pub mod pool;
pub mod websocket;

mod conn;
mod files;
mod router;
mod script;

use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use httpd_hal::{Board, Connection, Filesystem, ScriptEngine, Transport};
use log::{debug, error, info, warn};

pub use config::{Config, ConfigError};
pub use conn::{ConnKind, ConnState};
pub use control::ServerHandle;
pub use script::WS_DATA_GLOBAL;

use conn::{Client, Services};
use control::Control;
use pool::Pool;
use websocket::pool::WsPool;

#[derive(Debug, thiserror::Error)]
pub enum HttpServerError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    IoError(#[from] std::io::Error),
}

pub struct HttpServer<T, F, S, B>
where
    T: Transport,
    F: Filesystem,
    S: ScriptEngine,
{
    config: Config,
    transport: T,
    fs: F,
    engine: S,
    board: B,
    control: Arc<Control>,
    clients: Pool<Client<T::Conn, F, S>>,
    peers: WsPool<T::Conn>,
    started: Instant,
}

impl<T, F, S, B> HttpServer<T, F, S, B>
where
    T: Transport,
    F: Filesystem,
    S: ScriptEngine,
    B: Board,
{
    pub fn new(
        config: Config,
        transport: T,
        fs: F,
        engine: S,
        board: B,
    ) -> Result<Self, HttpServerError> {
        config.validate()?;
        Ok(Self {
            control: Arc::new(Control::new(config.timeouts())),
            clients: Pool::with_capacity(config.max_connections),
            peers: WsPool::new(config.max_peers),
            started: Instant::now(),
            config,
            transport,
            fs,
            engine,
            board,
        })
    }

    /// A handle for stopping the server and adjusting timeouts from elsewhere.
    pub fn handle(&self) -> ServerHandle {
        ServerHandle(self.control.clone())
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn fs(&self) -> &F {
        &self.fs
    }

    pub fn engine(&self) -> &S {
        &self.engine
    }

    pub fn board(&self) -> &B {
        &self.board
    }

    pub fn peers(&self) -> &WsPool<T::Conn> {
        &self.peers
    }

    /// Occupied connection slots.
    pub fn connections(&self) -> usize {
        self.clients.len()
    }

    /// States of the occupied connection slots, in slot order.
    pub fn connection_states(&self) -> Vec<(ConnKind, ConnState)> {
        self.clients
            .iter()
            .map(|client| (client.kind(), client.state()))
            .collect()
    }

    /// Serves until [`ServerHandle::stop`] is called, then closes every
    /// connection and peer and shuts the listener down.
    pub async fn run(&mut self) {
        info!(
            "serving {} with {} connection slots and {} websocket slots",
            self.config.content_root,
            self.clients.capacity(),
            self.peers.capacity()
        );
        while self.control.is_running() {
            self.tick().await;
        }
        self.shutdown().await;
    }

    /// One pass of the loop: accept, step every connection once, then poll
    /// the WebSocket peers.
    pub async fn tick(&mut self) {
        self.accept().await;

        let mut svc = Services {
            fs: &mut self.fs,
            engine: &mut self.engine,
            board: &mut self.board,
            config: &self.config,
            control: &self.control,
            started: self.started,
        };
        for idx in self.clients.occupied() {
            let Some(client) = self.clients.get_mut(idx) else {
                continue;
            };
            client.step(&mut svc, &mut self.peers).await;
            if client.state() == ConnState::Close {
                if let Some(client) = self.clients.remove(idx) {
                    debug!("slot {} free ({:?})", idx, client.kind());
                    client.release().await;
                }
            }
        }
        websocket::poll(&mut self.peers, &mut svc).await;
    }

    async fn accept(&mut self) {
        // leave new connections queued in the listener until a slot frees up
        if self.clients.is_full() {
            return;
        }
        // don't sit in accept while there is work queued
        let wait = if self.clients.is_empty() && self.peers.is_empty() {
            self.control.timeouts().recv
        } else {
            Duration::ZERO
        };
        let mut clnt = match self.transport.accept(wait).await {
            Ok(clnt) => clnt,
            Err(err) if err.is_transient() => return,
            Err(err) if err.is_fatal() => {
                error!("listener failed: {}", err);
                self.control.set_running(false);
                return;
            }
            Err(err) => {
                warn!("accept failed: {}", err);
                return;
            }
        };

        let addr = clnt.peer_addr();
        clnt.set_timeouts(self.control.timeouts());
        if let Err(client) = self.clients.insert(Client::new(clnt)) {
            warn!("connection pool full, rejecting {}", addr);
            client.release().await;
            return;
        }
        debug!("accepted {}", addr);
    }

    /// Closes every connection and peer and the listener. Safe to call twice.
    pub async fn shutdown(&mut self) {
        self.control.set_running(false);
        let mut svc = Services {
            fs: &mut self.fs,
            engine: &mut self.engine,
            board: &mut self.board,
            config: &self.config,
            control: &self.control,
            started: self.started,
        };
        let clients: Vec<_> = self.clients.drain().collect();
        for client in clients {
            client.abort(&mut svc).await;
        }
        for peer in self.peers.drain() {
            peer.close().await;
        }
        self.transport.shutdown().await;
        info!("server stopped");
    }
}
