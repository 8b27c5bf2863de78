use std::{io, net::SocketAddr, time::Duration};

use httpd_hal::{Connection, NetError, Timeouts, Transport};
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::{TcpListener, TcpSocket, TcpStream},
    time::timeout,
};

/// A tokio listener behind the [`Transport`] facade.
#[derive(Debug)]
pub struct TcpTransport {
    listener: Option<TcpListener>,
}

impl TcpTransport {
    pub fn bind(addr: SocketAddr) -> io::Result<Self> {
        let sock = match addr {
            SocketAddr::V4(_) => TcpSocket::new_v4()?,
            SocketAddr::V6(_) => TcpSocket::new_v6()?,
        };

        sock.set_reuseaddr(true)?;
        sock.bind(addr)?;

        let listener = sock.listen(1024)?;
        Ok(Self {
            listener: Some(listener),
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        match &self.listener {
            Some(listener) => listener.local_addr(),
            None => Err(io::ErrorKind::NotConnected.into()),
        }
    }
}

impl Transport for TcpTransport {
    type Conn = TcpConnection;

    async fn accept(&mut self, wait: Duration) -> Result<Self::Conn, NetError> {
        let listener = self.listener.as_ref().ok_or(NetError::Closed)?;
        let accepted = timeout(bounded(wait), listener.accept())
            .await
            .map_err(|_| NetError::Timeout)?;
        let (stream, addr) = accepted?;
        stream.set_nodelay(true)?;
        Ok(TcpConnection::new(stream, addr))
    }

    async fn shutdown(&mut self) {
        self.listener = None;
    }
}

#[derive(Debug)]
pub struct TcpConnection {
    stream: Option<TcpStream>,
    addr: SocketAddr,
    timeouts: Timeouts,
}

impl TcpConnection {
    fn new(stream: TcpStream, addr: SocketAddr) -> Self {
        Self {
            stream: Some(stream),
            addr,
            timeouts: Timeouts::from_millis(0, 0),
        }
    }
}

/// Zero means "don't wait": give the reactor one turn to report readiness.
fn bounded(limit: Duration) -> Duration {
    limit.max(Duration::from_millis(1))
}

impl Connection for TcpConnection {
    fn peer_addr(&self) -> SocketAddr {
        self.addr
    }

    fn set_timeouts(&mut self, timeouts: Timeouts) {
        self.timeouts = timeouts;
    }

    async fn recv(&mut self, buf: &mut [u8]) -> Result<usize, NetError> {
        let stream = self.stream.as_mut().ok_or(NetError::Closed)?;
        match timeout(bounded(self.timeouts.recv), stream.read(buf)).await {
            Err(_) => Err(NetError::Timeout),
            Ok(Ok(0)) => Err(NetError::Closed),
            Ok(Ok(n)) => Ok(n),
            Ok(Err(err)) => Err(err.into()),
        }
    }

    async fn write(&mut self, data: &[u8]) -> Result<(), NetError> {
        let stream = self.stream.as_mut().ok_or(NetError::Closed)?;
        match timeout(bounded(self.timeouts.send), stream.write_all(data)).await {
            Err(_) => Err(NetError::Timeout),
            Ok(res) => Ok(res?),
        }
    }

    async fn close(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            if let Err(err) = stream.shutdown().await {
                log::debug!("shutdown of {} failed: {}", self.addr, err);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn accept_times_out_without_clients() {
        let mut transport = TcpTransport::bind("127.0.0.1:0".parse().unwrap()).unwrap();
        let res = transport.accept(Duration::from_millis(10)).await;
        assert_eq!(res.unwrap_err(), NetError::Timeout);
        transport.shutdown().await;
        assert_eq!(
            transport.accept(Duration::ZERO).await.unwrap_err(),
            NetError::Closed
        );
    }

    #[tokio::test]
    async fn echo_through_connection() {
        let mut transport = TcpTransport::bind("127.0.0.1:0".parse().unwrap()).unwrap();
        let addr = transport.local_addr().unwrap();
        let mut client = TcpStream::connect(addr).await.unwrap();
        let mut conn = transport.accept(Duration::from_secs(1)).await.unwrap();
        conn.set_timeouts(Timeouts::from_millis(500, 500));

        client.write_all(b"ping").await.unwrap();
        let mut buf = [0u8; 16];
        let n = conn.recv(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], b"ping");

        conn.write(b"pong").await.unwrap();
        let mut reply = [0u8; 4];
        client.read_exact(&mut reply).await.unwrap();
        assert_eq!(&reply, b"pong");

        drop(client);
        assert_eq!(conn.recv(&mut buf).await.unwrap_err(), NetError::Closed);
        conn.close().await;
    }
}
