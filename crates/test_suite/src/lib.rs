//! In-memory collaborators for driving the server without sockets, flash
//! or an interpreter. Everything is single-threaded and shared through
//! `Rc<RefCell<_>>`, so the test keeps a handle on each side of a
//! connection while the server owns the other.

use std::{
    cell::RefCell,
    collections::{BTreeMap, BTreeSet, HashMap, VecDeque},
    net::SocketAddr,
    rc::Rc,
    time::Duration,
};

use httpd_hal::{
    Connection, Filesystem, FsError, NetError, QueryParam, ScriptEngine, ScriptError, Timeouts,
    Transport,
};

#[derive(Debug, Default)]
struct Wire {
    inbound: VecDeque<Vec<u8>>,
    output: Vec<u8>,
    hung_up: bool,
    closed: bool,
    recv_error: Option<NetError>,
    write_error: Option<NetError>,
    timeouts: Option<Timeouts>,
}

#[derive(Debug, Default)]
struct Listener {
    pending: VecDeque<MemConn>,
    shut_down: bool,
    waits: Vec<Duration>,
}

/// The fake network: hands out the transport for the server and client
/// ends for the test.
#[derive(Debug, Clone, Default)]
pub struct Network(Rc<RefCell<Listener>>);

impl Network {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn transport(&self) -> MemTransport {
        MemTransport(self.0.clone())
    }

    /// Queues a connection from `addr` for the next accept.
    pub fn connect(&self, addr: &str) -> Peer {
        let addr: SocketAddr = addr.parse().expect("peer address");
        let wire = Rc::new(RefCell::new(Wire::default()));
        self.0.borrow_mut().pending.push_back(MemConn {
            addr,
            wire: wire.clone(),
        });
        Peer { addr, wire }
    }

    pub fn pending(&self) -> usize {
        self.0.borrow().pending.len()
    }

    pub fn is_shut_down(&self) -> bool {
        self.0.borrow().shut_down
    }

    /// How long each accept call was allowed to wait.
    pub fn accept_waits(&self) -> Vec<Duration> {
        self.0.borrow().waits.clone()
    }
}

#[derive(Debug)]
pub struct MemTransport(Rc<RefCell<Listener>>);

impl Transport for MemTransport {
    type Conn = MemConn;

    async fn accept(&mut self, wait: Duration) -> Result<Self::Conn, NetError> {
        let mut listener = self.0.borrow_mut();
        if listener.shut_down {
            return Err(NetError::Closed);
        }
        listener.waits.push(wait);
        listener.pending.pop_front().ok_or(NetError::Timeout)
    }

    async fn shutdown(&mut self) {
        let mut listener = self.0.borrow_mut();
        listener.shut_down = true;
        listener.pending.clear();
    }
}

/// Server side of a fake connection.
#[derive(Debug)]
pub struct MemConn {
    addr: SocketAddr,
    wire: Rc<RefCell<Wire>>,
}

impl Connection for MemConn {
    fn peer_addr(&self) -> SocketAddr {
        self.addr
    }

    fn set_timeouts(&mut self, timeouts: Timeouts) {
        self.wire.borrow_mut().timeouts = Some(timeouts);
    }

    async fn recv(&mut self, buf: &mut [u8]) -> Result<usize, NetError> {
        let mut wire = self.wire.borrow_mut();
        if wire.closed {
            return Err(NetError::Closed);
        }
        if let Some(err) = wire.recv_error.take() {
            return Err(err);
        }
        let Some(mut chunk) = wire.inbound.pop_front() else {
            return Err(if wire.hung_up {
                NetError::Closed
            } else {
                NetError::Timeout
            });
        };
        let n = chunk.len().min(buf.len());
        buf[..n].copy_from_slice(&chunk[..n]);
        if n < chunk.len() {
            wire.inbound.push_front(chunk.split_off(n));
        }
        Ok(n)
    }

    async fn write(&mut self, data: &[u8]) -> Result<(), NetError> {
        let mut wire = self.wire.borrow_mut();
        if wire.closed {
            return Err(NetError::Closed);
        }
        if let Some(err) = wire.write_error {
            return Err(err);
        }
        wire.output.extend_from_slice(data);
        Ok(())
    }

    async fn close(&mut self) {
        self.wire.borrow_mut().closed = true;
    }
}

/// Client side of a fake connection.
#[derive(Debug, Clone)]
pub struct Peer {
    addr: SocketAddr,
    wire: Rc<RefCell<Wire>>,
}

impl Peer {
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Queues one receive worth of bytes.
    pub fn send(&self, data: impl AsRef<[u8]>) {
        self.wire
            .borrow_mut()
            .inbound
            .push_back(data.as_ref().to_vec());
    }

    /// Receives fail with `Closed` once the queued data is consumed.
    pub fn hang_up(&self) {
        self.wire.borrow_mut().hung_up = true;
    }

    /// The next receive fails with `err`.
    pub fn fail_recv(&self, err: NetError) {
        self.wire.borrow_mut().recv_error = Some(err);
    }

    /// Every write from now on fails with `err`.
    pub fn fail_writes(&self, err: NetError) {
        self.wire.borrow_mut().write_error = Some(err);
    }

    pub fn output(&self) -> Vec<u8> {
        self.wire.borrow().output.clone()
    }

    pub fn output_text(&self) -> String {
        String::from_utf8_lossy(&self.wire.borrow().output).into_owned()
    }

    pub fn take_output(&self) -> Vec<u8> {
        std::mem::take(&mut self.wire.borrow_mut().output)
    }

    /// The server closed its end.
    pub fn is_closed(&self) -> bool {
        self.wire.borrow().closed
    }

    pub fn timeouts(&self) -> Option<Timeouts> {
        self.wire.borrow().timeouts
    }
}

/// `GET <target> HTTP/1.1` with a host header.
pub fn get(target: &str) -> Vec<u8> {
    format!("GET {} HTTP/1.1\r\nHost: board\r\n\r\n", target).into_bytes()
}

/// A WebSocket opening request.
pub fn upgrade(target: &str, key: &str) -> Vec<u8> {
    format!(
        "GET {} HTTP/1.1\r\nHost: board\r\nUpgrade: websocket\r\nConnection: Upgrade\r\n\
         Sec-WebSocket-Key: {}\r\nSec-WebSocket-Version: 13\r\n\r\n",
        target, key
    )
    .into_bytes()
}

/// A final, masked client frame.
pub fn mask_frame(opcode: u8, payload: &[u8], key: [u8; 4]) -> Vec<u8> {
    let mut out = vec![0x80 | opcode];
    match payload.len() {
        len @ 0..=125 => out.push(0x80 | len as u8),
        len @ 126..=0xFFFF => {
            out.push(0x80 | 126);
            out.extend_from_slice(&(len as u16).to_be_bytes());
        }
        len => {
            out.push(0x80 | 127);
            out.extend_from_slice(&(len as u64).to_be_bytes());
        }
    }
    out.extend_from_slice(&key);
    out.extend(payload.iter().enumerate().map(|(i, b)| b ^ key[i & 3]));
    out
}

/// Splits a server response into its head and body.
pub fn split_response(raw: &[u8]) -> Option<(String, Vec<u8>)> {
    let end = raw.windows(4).position(|w| w == b"\r\n\r\n")?;
    let head = String::from_utf8_lossy(&raw[..end]).into_owned();
    Some((head, raw[end + 4..].to_vec()))
}

#[derive(Debug)]
pub struct MemFile {
    path: String,
    pos: usize,
}

/// A map-backed filesystem. Parent directories of every file exist implicitly.
#[derive(Debug, Clone, Default)]
pub struct MemFs {
    files: BTreeMap<String, Vec<u8>>,
    dirs: BTreeSet<String>,
    open: usize,
    max_open: Option<usize>,
    opened: Vec<String>,
}

fn normalize(path: &str) -> &str {
    match path.trim_end_matches('/') {
        "" => "/",
        trimmed => trimmed,
    }
}

impl MemFs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(mut self, path: &str, contents: impl AsRef<[u8]>) -> Self {
        self.add_parents(path);
        self.files
            .insert(path.to_string(), contents.as_ref().to_vec());
        self
    }

    pub fn with_dir(mut self, path: &str) -> Self {
        self.add_parents(path);
        self.dirs.insert(normalize(path).to_string());
        self
    }

    /// Opens beyond `max` fail with [`FsError::NoHandles`].
    pub fn limit_handles(mut self, max: usize) -> Self {
        self.max_open = Some(max);
        self
    }

    fn add_parents(&mut self, path: &str) {
        for (idx, _) in path.match_indices('/').filter(|(idx, _)| *idx > 0) {
            self.dirs.insert(path[..idx].to_string());
        }
    }

    /// Handles opened and not yet closed.
    pub fn open_handles(&self) -> usize {
        self.open
    }

    /// Every path that was opened successfully, in order.
    pub fn opened(&self) -> &[String] {
        &self.opened
    }
}

impl Filesystem for MemFs {
    type File = MemFile;

    fn open(&mut self, path: &str) -> Result<Self::File, FsError> {
        if self.dirs.contains(normalize(path)) {
            return Err(FsError::IsDirectory);
        }
        if !self.files.contains_key(path) {
            return Err(FsError::NotFound);
        }
        if self.max_open.is_some_and(|max| self.open >= max) {
            return Err(FsError::NoHandles);
        }
        self.open += 1;
        self.opened.push(path.to_string());
        Ok(MemFile {
            path: path.to_string(),
            pos: 0,
        })
    }

    fn read(&mut self, file: &mut Self::File, buf: &mut [u8]) -> Result<usize, FsError> {
        let data = self.files.get(&file.path).ok_or(FsError::Io)?;
        let rest = data.get(file.pos..).unwrap_or_default();
        let n = rest.len().min(buf.len());
        buf[..n].copy_from_slice(&rest[..n]);
        file.pos += n;
        Ok(n)
    }

    fn seek(&mut self, file: &mut Self::File, pos: u64) -> Result<u64, FsError> {
        let len = self.files.get(&file.path).ok_or(FsError::Io)?.len();
        file.pos = (pos as usize).min(len);
        Ok(file.pos as u64)
    }

    fn stat(&mut self, file: &Self::File) -> Result<u64, FsError> {
        let data = self.files.get(&file.path).ok_or(FsError::Io)?;
        Ok(data.len() as u64)
    }

    fn close(&mut self, _file: Self::File) {
        self.open = self.open.saturating_sub(1);
    }

    fn is_directory(&mut self, path: &str) -> bool {
        self.dirs.contains(normalize(path))
    }
}

/// How a fake script behaves when loaded and called.
#[derive(Debug, Clone, PartialEq)]
pub enum Behavior {
    /// Returns each page in turn, then nil.
    Pages(Vec<String>),
    LoadError(ScriptError),
    CallError(ScriptError),
    /// Returns the named global once.
    EchoGlobal(String),
    /// Returns the named query parameter once.
    EchoQuery(String),
    /// Never returns nil.
    Forever(String),
}

#[derive(Debug)]
pub struct FakeScript {
    behavior: Behavior,
    calls: usize,
}

#[derive(Debug, Default)]
pub struct FakeEngine {
    scripts: HashMap<String, Behavior>,
    globals: HashMap<String, String>,
    query: Vec<QueryParam>,
    loads: usize,
    live: usize,
    calls: usize,
    gc_runs: usize,
}

impl FakeEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_script(mut self, path: &str, behavior: Behavior) -> Self {
        self.scripts.insert(path.to_string(), behavior);
        self
    }

    pub fn global(&self, name: &str) -> Option<&str> {
        self.globals.get(name).map(String::as_str)
    }

    pub fn query(&self) -> &[QueryParam] {
        &self.query
    }

    /// Successful loads.
    pub fn loads(&self) -> usize {
        self.loads
    }

    /// Loaded scripts not yet released.
    pub fn live(&self) -> usize {
        self.live
    }

    pub fn calls(&self) -> usize {
        self.calls
    }

    pub fn gc_runs(&self) -> usize {
        self.gc_runs
    }
}

impl ScriptEngine for FakeEngine {
    type Script = FakeScript;

    fn set_query(&mut self, params: &[QueryParam]) {
        self.query = params.to_vec();
    }

    fn set_global(&mut self, name: &str, value: &str) {
        self.globals.insert(name.to_string(), value.to_string());
    }

    fn load(&mut self, path: &str) -> Result<Self::Script, ScriptError> {
        let behavior = match self.scripts.get(path) {
            None => return Err(ScriptError::NotFound),
            Some(Behavior::LoadError(err)) => return Err(err.clone()),
            Some(behavior) => behavior.clone(),
        };
        self.loads += 1;
        self.live += 1;
        Ok(FakeScript { behavior, calls: 0 })
    }

    fn call(&mut self, script: &mut Self::Script) -> Result<Option<String>, ScriptError> {
        self.calls += 1;
        let nth = script.calls;
        script.calls += 1;
        match &script.behavior {
            Behavior::Pages(pages) => Ok(pages.get(nth).cloned()),
            Behavior::CallError(err) | Behavior::LoadError(err) => Err(err.clone()),
            Behavior::EchoGlobal(name) if nth == 0 => Ok(self.globals.get(name).cloned()),
            Behavior::EchoQuery(name) if nth == 0 => Ok(self
                .query
                .iter()
                .find(|param| &param.name == name)
                .map(|param| param.value.clone())),
            Behavior::EchoGlobal(_) | Behavior::EchoQuery(_) => Ok(None),
            Behavior::Forever(page) => Ok(Some(page.clone())),
        }
    }

    fn release(&mut self, _script: Self::Script) {
        self.live = self.live.saturating_sub(1);
    }

    fn full_gc(&mut self) {
        self.gc_runs += 1;
    }
}
