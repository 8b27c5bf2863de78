//! The pool of upgraded peers, kept in most-recently-active order.

use std::net::SocketAddr;

use httpd_hal::Connection;

/// An upgraded connection bound to the path it was opened on.
#[derive(Debug)]
pub struct WsPeer<C> {
    pub(crate) clnt: C,
    addr: SocketAddr,
    uri: String,
    age: u32,
}

/// What a poll cycle did to a peer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activity {
    /// A frame was exchanged.
    Active,
    /// Nothing usable arrived.
    Idle,
    /// Closed, faulted or timed out.
    Evict,
}

impl<C> WsPeer<C> {
    pub fn new(clnt: C, addr: SocketAddr, uri: String) -> Self {
        Self {
            clnt,
            addr,
            uri,
            age: 0,
        }
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn age(&self) -> u32 {
        self.age
    }

    pub(crate) fn touch(&mut self) -> Activity {
        self.age = 0;
        Activity::Active
    }

    pub(crate) fn idle(&mut self, limit: u32) -> Activity {
        self.age = self.age.saturating_add(1);
        if self.age > limit {
            Activity::Evict
        } else {
            Activity::Idle
        }
    }
}

impl<C: Connection> WsPeer<C> {
    pub(crate) async fn close(mut self) {
        self.clnt.close().await;
    }
}

#[derive(Debug)]
pub struct WsPool<C> {
    peers: Vec<WsPeer<C>>,
    capacity: usize,
}

impl<C> WsPool<C> {
    pub fn new(capacity: usize) -> Self {
        Self {
            peers: Vec::with_capacity(capacity),
            capacity,
        }
    }

    pub fn len(&self) -> usize {
        self.peers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Peers, most recently active first.
    pub fn iter(&self) -> impl Iterator<Item = &WsPeer<C>> {
        self.peers.iter()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut WsPeer<C>> {
        self.peers.iter_mut()
    }

    /// The exact socket is already upgraded.
    pub fn contains(&self, addr: SocketAddr) -> bool {
        self.peers.iter().any(|peer| peer.addr == addr)
    }

    /// Admits `peer` at the front. Peers from the same remote host go first,
    /// then the least recently active one if the pool is still full.
    /// Returns the evicted peers so the caller can close them.
    pub fn admit(&mut self, peer: WsPeer<C>) -> Vec<WsPeer<C>> {
        let mut evicted = Vec::new();
        let mut i = 0;
        while i < self.peers.len() {
            if self.peers[i].addr.ip() == peer.addr.ip() {
                evicted.push(self.peers.remove(i));
            } else {
                i += 1;
            }
        }
        while self.peers.len() >= self.capacity {
            match self.peers.pop() {
                Some(oldest) => evicted.push(oldest),
                None => break,
            }
        }
        self.peers.insert(0, peer);
        evicted
    }

    /// Applies one poll cycle's results, index for index: evicted peers are
    /// removed and active ones move to the front.
    pub(crate) fn settle(&mut self, activity: &[Activity]) -> Vec<WsPeer<C>> {
        let mut active = Vec::new();
        let mut rest = Vec::with_capacity(self.peers.len());
        let mut evicted = Vec::new();
        let mut outcomes = activity.iter().copied();
        for peer in self.peers.drain(..) {
            match outcomes.next().unwrap_or(Activity::Idle) {
                Activity::Active => active.push(peer),
                Activity::Idle => rest.push(peer),
                Activity::Evict => evicted.push(peer),
            }
        }
        // each promotion lands on index 0, so the last one polled ends up first
        active.reverse();
        active.append(&mut rest);
        self.peers = active;
        evicted
    }

    pub(crate) fn drain(&mut self) -> Vec<WsPeer<C>> {
        std::mem::take(&mut self.peers)
    }
}
