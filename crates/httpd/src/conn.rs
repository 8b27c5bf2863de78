//! The per-connection state machine.
//!
//! A connection starts in `BEGIN`, waiting for its request. The request is
//! routed, the chosen handler runs its setup and then streams one work unit
//! per step in `PAS`. `END` tears the handler down and `CLOSE` hands the slot
//! back to the pool. Every path through [`Client::step`] reaches `CLOSE`.

use std::{net::SocketAddr, time::Instant};

use bytes::Bytes;
use httpd_hal::{Board, Connection, Filesystem, NetError, ScriptEngine};
use log::{debug, error, warn};

use crate::{
    config::Config,
    control::Control,
    files::{self, FileJob},
    http::{parser::parse_request, request::Request, response},
    router::{self, Route},
    script::{self, ScriptJob},
    websocket::{self, Upgrade, pool::WsPool},
};

/// Everything a handler may touch besides its own connection.
pub(crate) struct Services<'a, F, S, B> {
    pub fs: &'a mut F,
    pub engine: &'a mut S,
    pub board: &'a mut B,
    pub config: &'a Config,
    pub control: &'a Control,
    pub started: Instant,
}

impl<F, S, B: Board> Services<'_, F, S, B> {
    fn not_found(&self, url: &str) -> Bytes {
        response::not_found(url, self.started.elapsed().as_secs(), self.board.free_heap())
    }
}

/// Role of a connection after dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnKind {
    Get,
    Ws,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnState {
    Begin,
    Pas,
    End,
    Close,
}

/// What a handler's setup produced.
pub(crate) enum Begun<J> {
    Streaming(J),
    /// Nothing to stream; tear down whatever was set up.
    Done(Option<J>),
    NotFound,
    /// Out of resources: drop the connection without a response.
    Abort,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Progress {
    More,
    Done,
}

enum Target {
    File(String),
    Script(String),
}

enum Job<F: Filesystem, S: ScriptEngine> {
    File(FileJob<F>),
    Script(ScriptJob<S>),
}

impl<F: Filesystem, S: ScriptEngine> Job<F, S> {
    fn end(self, fs: &mut F, engine: &mut S) {
        match self {
            Self::File(job) => job.end(fs),
            Self::Script(job) => job.end(engine),
        }
    }
}

enum Stage<F: Filesystem, S: ScriptEngine> {
    Request,
    Begin(Target),
    Pas(Job<F, S>),
    End(Option<Job<F, S>>),
    Close,
}

/// Logs a transport error; fatal ones are worth an error line.
pub(crate) fn log_net(addr: SocketAddr, err: NetError) {
    if err.is_fatal() {
        error!("{}: {}", addr, err);
    } else {
        debug!("{}: {}", addr, err);
    }
}

/// One slot of the connection pool.
pub(crate) struct Client<C, F: Filesystem, S: ScriptEngine> {
    kind: ConnKind,
    addr: SocketAddr,
    clnt: Option<C>,
    request: Option<Request>,
    stage: Stage<F, S>,
    idle: u32,
}

impl<C: Connection, F: Filesystem, S: ScriptEngine> Client<C, F, S> {
    pub(crate) fn new(clnt: C) -> Self {
        Self {
            kind: ConnKind::Get,
            addr: clnt.peer_addr(),
            clnt: Some(clnt),
            request: None,
            stage: Stage::Request,
            idle: 0,
        }
    }

    pub(crate) fn kind(&self) -> ConnKind {
        self.kind
    }

    pub(crate) fn state(&self) -> ConnState {
        match self.stage {
            Stage::Request | Stage::Begin(_) => ConnState::Begin,
            Stage::Pas(_) => ConnState::Pas,
            Stage::End(_) => ConnState::End,
            Stage::Close => ConnState::Close,
        }
    }

    /// Runs one unit of work.
    pub(crate) async fn step<B: Board>(
        &mut self,
        svc: &mut Services<'_, F, S, B>,
        peers: &mut WsPool<C>,
    ) {
        self.stage = match std::mem::replace(&mut self.stage, Stage::Close) {
            Stage::Request => self.receive(svc, peers).await,
            Stage::Begin(target) => self.begin(svc, target).await,
            Stage::Pas(job) if !svc.control.is_running() => {
                debug!("{}: stopping mid-response", self.addr);
                Stage::End(Some(job))
            }
            Stage::Pas(job) => self.pas(svc, job).await,
            Stage::End(job) => {
                if let Some(job) = job {
                    job.end(svc.fs, svc.engine);
                }
                self.request = None;
                Stage::Close
            }
            Stage::Close => Stage::Close,
        };
    }

    async fn receive<B: Board>(
        &mut self,
        svc: &mut Services<'_, F, S, B>,
        peers: &mut WsPool<C>,
    ) -> Stage<F, S> {
        let Some(clnt) = self.clnt.as_mut() else {
            return Stage::Close;
        };
        let mut buf = vec![0u8; svc.config.out_buf.max(svc.config.max_uri_len + 16)];
        let n = match clnt.recv(&mut buf).await {
            Ok(n) => n,
            Err(err) if err.is_fatal() => {
                log_net(self.addr, err);
                return Stage::Close;
            }
            Err(_) => {
                self.idle += 1;
                if self.idle > svc.config.request_idle_limit {
                    debug!("{}: no request after {} cycles", self.addr, self.idle);
                    return Stage::Close;
                }
                return Stage::Request;
            }
        };
        buf.truncate(n);
        let head = Bytes::from(buf);

        let request = match parse_request(head.clone(), svc.config.max_uri_len) {
            Ok(request) => request,
            Err(err) => {
                debug!("{}: bad request: {}", self.addr, err);
                let url = request_target(&head);
                return self.reply_not_found(svc, &url).await;
            }
        };
        debug!("{}: GET {}", self.addr, request.uri);

        if request.wants_websocket() {
            match websocket::upgrade(&mut self.clnt, &request, peers, svc.control.timeouts()).await {
                Upgrade::Upgraded => {
                    self.kind = ConnKind::Ws;
                    return Stage::Close;
                }
                Upgrade::AlreadyPeer => debug!("{}: already upgraded, serving as GET", self.addr),
                Upgrade::Failed(err) => debug!("{}: upgrade failed: {}", self.addr, err),
            }
        }

        let stage = match router::route(&request, svc.fs, svc.config) {
            Route::File(path) => Stage::Begin(Target::File(path)),
            Route::Script(path) => Stage::Begin(Target::Script(path)),
            Route::NotFound => {
                let uri = request.uri.clone();
                self.request = Some(request);
                return self.reply_not_found(svc, &uri).await;
            }
        };
        self.request = Some(request);
        stage
    }

    async fn begin<B: Board>(
        &mut self,
        svc: &mut Services<'_, F, S, B>,
        target: Target,
    ) -> Stage<F, S> {
        let Some(clnt) = self.clnt.as_mut() else {
            return Stage::Close;
        };
        match target {
            Target::File(path) => {
                match files::begin(svc.fs, clnt, &path, svc.config.chunk_size()).await {
                    Begun::Streaming(job) => Stage::Pas(Job::File(job)),
                    Begun::Done(job) => Stage::End(job.map(Job::File)),
                    Begun::NotFound => {
                        let url = self.request.as_ref().map_or(path, |req| req.uri.clone());
                        self.reply_not_found(svc, &url).await
                    }
                    Begun::Abort => Stage::Close,
                }
            }
            Target::Script(path) => {
                let query = self.request.as_ref().map_or(&[][..], |req| &*req.query);
                match script::begin(svc.engine, clnt, &path, query).await {
                    Begun::Streaming(job) => Stage::Pas(Job::Script(job)),
                    Begun::Done(job) => Stage::End(job.map(Job::Script)),
                    Begun::NotFound => Stage::End(None),
                    Begun::Abort => {
                        warn!("{}: closing without a response", self.addr);
                        Stage::Close
                    }
                }
            }
        }
    }

    async fn pas<B: Board>(&mut self, svc: &mut Services<'_, F, S, B>, mut job: Job<F, S>) -> Stage<F, S> {
        let Some(clnt) = self.clnt.as_mut() else {
            return Stage::End(Some(job));
        };
        let progress = match &mut job {
            Job::File(file) => file.pas(svc.fs, clnt).await,
            Job::Script(script) => {
                script
                    .pas(svc.engine, clnt, svc.config.out_buf, svc.config.script_step_limit)
                    .await
            }
        };
        match progress {
            Progress::More => Stage::Pas(job),
            Progress::Done => Stage::End(Some(job)),
        }
    }

    async fn reply_not_found<B: Board>(
        &mut self,
        svc: &mut Services<'_, F, S, B>,
        url: &str,
    ) -> Stage<F, S> {
        if let Some(clnt) = self.clnt.as_mut() {
            if let Err(err) = clnt.write(&svc.not_found(url)).await {
                log_net(self.addr, err);
            }
        }
        Stage::End(None)
    }

    /// Unwinds whatever is in flight and closes the handle. The slot must
    /// not be stepped again.
    pub(crate) async fn abort<B: Board>(mut self, svc: &mut Services<'_, F, S, B>) {
        match std::mem::replace(&mut self.stage, Stage::Close) {
            Stage::Pas(job) | Stage::End(Some(job)) => job.end(svc.fs, svc.engine),
            _ => {}
        }
        self.release().await;
    }

    /// Closes the transport handle, if this slot still owns it.
    pub(crate) async fn release(mut self) {
        if let Some(mut clnt) = self.clnt.take() {
            clnt.close().await;
        }
        self.request = None;
    }
}

/// The raw path token of a request line that failed to parse.
fn request_target(head: &[u8]) -> String {
    let line = head.split(|b| *b == b'\n').next().unwrap_or_default();
    let target = line
        .split(|b| *b == b' ')
        .filter(|word| !word.is_empty())
        .nth(1)
        .unwrap_or_default();
    let path = target.split(|b| *b == b'?').next().unwrap_or_default();
    String::from_utf8_lossy(path).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_of_bad_requests() {
        assert_eq!(request_target(b"POST /form HTTP/1.1\r\n\r\n"), "/form");
        assert_eq!(request_target(b"GET /a?b=c HTTP/1.1 extra\r\n"), "/a");
        assert_eq!(request_target(b"garbage"), "");
        assert_eq!(request_target(b""), "");
    }
}
