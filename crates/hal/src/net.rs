//! Transport facade: a netconn-style listener handing out connected handles.

use std::{future::Future, io, net::SocketAddr, time::Duration};

/// Transport error codes, ordered by severity.
///
/// The discriminants follow the lwIP `err_t` numbering so a netconn port can
/// convert with a plain cast. Everything below [`NetError::AlreadyConnected`]
/// means the handle is unusable.
#[repr(i8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, thiserror::Error)]
pub enum NetError {
    #[error("Out of memory error.")]
    Mem = -1,
    #[error("Buffer error.")]
    Buf = -2,
    #[error("Timeout.")]
    Timeout = -3,
    #[error("Routing problem.")]
    Routing = -4,
    #[error("Operation in progress.")]
    InProgress = -5,
    #[error("Illegal value.")]
    Value = -6,
    #[error("Operation would block.")]
    WouldBlock = -7,
    #[error("Address in use.")]
    InUse = -8,
    #[error("Already connected.")]
    AlreadyConnected = -9,
    #[error("Connection aborted.")]
    Aborted = -10,
    #[error("Connection reset.")]
    Reset = -11,
    #[error("Connection closed.")]
    Closed = -12,
    #[error("Not connected.")]
    NotConnected = -13,
    #[error("Illegal argument.")]
    IllegalArgument = -14,
    #[error("Low-level netif error.")]
    Interface = -15,
}

impl NetError {
    pub const fn code(self) -> i8 {
        self as i8
    }

    /// Fatal errors tear the affected connection down.
    pub const fn is_fatal(self) -> bool {
        self.code() < NetError::AlreadyConnected.code()
    }

    /// Nothing happened this cycle; try again on the next poll.
    pub const fn is_transient(self) -> bool {
        matches!(self, Self::Timeout | Self::WouldBlock | Self::InProgress)
    }
}

impl From<io::Error> for NetError {
    fn from(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::TimedOut => Self::Timeout,
            io::ErrorKind::WouldBlock => Self::WouldBlock,
            io::ErrorKind::Interrupted => Self::InProgress,
            io::ErrorKind::ConnectionReset => Self::Reset,
            io::ErrorKind::ConnectionAborted => Self::Aborted,
            io::ErrorKind::BrokenPipe | io::ErrorKind::UnexpectedEof => Self::Closed,
            io::ErrorKind::NotConnected => Self::NotConnected,
            io::ErrorKind::AddrInUse => Self::InUse,
            io::ErrorKind::AlreadyExists => Self::AlreadyConnected,
            io::ErrorKind::InvalidInput => Self::IllegalArgument,
            io::ErrorKind::InvalidData => Self::Value,
            io::ErrorKind::OutOfMemory => Self::Mem,
            io::ErrorKind::HostUnreachable | io::ErrorKind::NetworkUnreachable => Self::Routing,
            _ => Self::Interface,
        }
    }
}

/// Receive and send timeouts applied to a connected handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub recv: Duration,
    pub send: Duration,
}

impl Timeouts {
    pub const fn from_millis(recv: u64, send: u64) -> Self {
        Self {
            recv: Duration::from_millis(recv),
            send: Duration::from_millis(send),
        }
    }
}

/// A listening endpoint.
pub trait Transport {
    type Conn: Connection;

    /// Waits at most `wait` for an inbound connection.
    /// Returns [`NetError::Timeout`] when nobody connected in time.
    fn accept(&mut self, wait: Duration) -> impl Future<Output = Result<Self::Conn, NetError>>;

    /// Closes the listening handle. Further accepts fail with [`NetError::Closed`].
    fn shutdown(&mut self) -> impl Future<Output = ()>;
}

/// A connected handle owned by exactly one pool slot at a time.
pub trait Connection {
    fn peer_addr(&self) -> SocketAddr;

    fn set_timeouts(&mut self, timeouts: Timeouts);

    /// Receives whatever is available, bounded by the receive timeout.
    /// Never returns `Ok(0)`; an orderly shutdown by the peer is [`NetError::Closed`].
    fn recv(&mut self, buf: &mut [u8]) -> impl Future<Output = Result<usize, NetError>>;

    /// Writes all of `data`, bounded by the send timeout.
    fn write(&mut self, data: &[u8]) -> impl Future<Output = Result<(), NetError>>;

    fn close(&mut self) -> impl Future<Output = ()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fatal_classification() {
        for err in [
            NetError::Mem,
            NetError::Buf,
            NetError::Timeout,
            NetError::WouldBlock,
            NetError::InUse,
            NetError::AlreadyConnected,
        ] {
            assert!(!err.is_fatal(), "{err:?}");
        }
        for err in [
            NetError::Aborted,
            NetError::Reset,
            NetError::Closed,
            NetError::NotConnected,
            NetError::IllegalArgument,
            NetError::Interface,
        ] {
            assert!(err.is_fatal(), "{err:?}");
        }
    }

    #[test]
    fn io_errors_map_onto_table() {
        let reset = io::Error::from(io::ErrorKind::ConnectionReset);
        assert_eq!(NetError::from(reset), NetError::Reset);
        let timeout = io::Error::from(io::ErrorKind::TimedOut);
        assert!(NetError::from(timeout).is_transient());
        assert_eq!(NetError::Closed.to_string(), "Connection closed.");
    }
}
