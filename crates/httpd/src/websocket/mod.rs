//! WebSocket support: the opening handshake, the peer pool and the polling
//! pass that serves frames from every upgraded peer once per tick.

pub mod device;
pub mod frame;
pub mod pool;

use std::time::Duration;

use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64_STANDARD};
use httpd_hal::{Board, Connection, NetError, ScriptEngine, Timeouts};
use log::{debug, info, warn};
use sha1::{Digest, Sha1};

use crate::{
    conn::{Services, log_net},
    http::{header, request::Request, response, uri::content_path},
    script,
};
use frame::{Frame, MAX_HEADER, opcode};
use pool::{Activity, WsPeer, WsPool};

const GUID: &str = "258EAFA5-E914-47DA-95CA-C5AB0DC85B11";

/// `Sec-WebSocket-Accept` value for a client key.
pub fn accept_key(key: &[u8]) -> String {
    let mut hasher = Sha1::new();
    hasher.update(key);
    hasher.update(GUID.as_bytes());
    BASE64_STANDARD.encode(hasher.finalize())
}

#[derive(Debug, thiserror::Error)]
pub enum HandshakeError {
    #[error("no Sec-WebSocket-Key header")]
    MissingKey,
    #[error("Sec-WebSocket-Key is not a base64 encoded 16 byte nonce")]
    InvalidKey,
    #[error(transparent)]
    Transport(#[from] NetError),
}

/// Outcome of an upgrade attempt.
#[derive(Debug)]
pub enum Upgrade {
    /// The handle moved into the peer pool.
    Upgraded,
    /// This socket already is a peer; serve the request as a plain GET.
    AlreadyPeer,
    /// The handshake could not be completed; serve the request as a plain GET.
    Failed(HandshakeError),
}

fn client_key(request: &Request) -> Result<&[u8], HandshakeError> {
    let key = request
        .header(header::SEC_WEBSOCKET_KEY)
        .ok_or(HandshakeError::MissingKey)?;
    match BASE64_STANDARD.decode(key) {
        Ok(nonce) if nonce.len() == 16 => Ok(key),
        _ => Err(HandshakeError::InvalidKey),
    }
}

/// Completes the handshake and moves the handle out of `clnt` into `peers`.
/// On anything but [`Upgrade::Upgraded`] the handle stays where it was.
pub(crate) async fn upgrade<C: Connection>(
    clnt: &mut Option<C>,
    request: &Request,
    peers: &mut WsPool<C>,
    timeouts: Timeouts,
) -> Upgrade {
    let Some(conn) = clnt.as_mut() else {
        return Upgrade::Failed(NetError::NotConnected.into());
    };
    let addr = conn.peer_addr();
    if peers.contains(addr) {
        return Upgrade::AlreadyPeer;
    }
    let key = match client_key(request) {
        Ok(key) => key,
        Err(err) => return Upgrade::Failed(err),
    };
    if let Err(err) = conn
        .write(&response::switching_protocols(&accept_key(key)))
        .await
    {
        return Upgrade::Failed(err.into());
    }

    let Some(mut conn) = clnt.take() else {
        return Upgrade::Failed(NetError::NotConnected.into());
    };
    // peers are polled, never waited on
    conn.set_timeouts(Timeouts {
        recv: Duration::ZERO,
        send: timeouts.send,
    });
    info!("websocket peer {} on {}", addr, request.uri);
    for old in peers.admit(WsPeer::new(conn, addr, request.uri.clone())) {
        info!("evicting websocket peer {}", old.addr());
        old.close().await;
    }
    Upgrade::Upgraded
}

/// One receive attempt per peer, then reorders the pool by activity and
/// closes whoever was evicted.
pub(crate) async fn poll<C, F, S, B>(peers: &mut WsPool<C>, svc: &mut Services<'_, F, S, B>)
where
    C: Connection,
    S: ScriptEngine,
    B: Board,
{
    if peers.is_empty() {
        return;
    }
    let mut buf = vec![0u8; svc.config.out_buf + MAX_HEADER];
    let mut activity = Vec::with_capacity(peers.len());
    for peer in peers.iter_mut() {
        activity.push(poll_peer(peer, &mut buf, svc).await);
    }
    for peer in peers.settle(&activity) {
        info!("closing websocket peer {}", peer.addr());
        peer.close().await;
    }
}

async fn poll_peer<C, F, S, B>(
    peer: &mut WsPeer<C>,
    buf: &mut [u8],
    svc: &mut Services<'_, F, S, B>,
) -> Activity
where
    C: Connection,
    S: ScriptEngine,
    B: Board,
{
    let limit = svc.config.ws_idle_limit;
    let n = match peer.clnt.recv(buf).await {
        Ok(n) => n,
        Err(err) if err.is_fatal() => {
            log_net(peer.addr(), err);
            return Activity::Evict;
        }
        Err(_) => return peer.idle(limit),
    };

    // a segment may carry several frames; serve each in order
    let out_buf = svc.config.out_buf;
    let mut served = false;
    let mut offset = 0;
    while offset < n {
        let (parsed, used) = match frame::parse(&mut buf[offset..n]) {
            Ok(parsed) => parsed,
            Err(err) => {
                debug!("{}: {}, dropping {} bytes", peer.addr(), err, n - offset);
                break;
            }
        };
        offset += used;
        let reply = match parsed {
            Frame::Close => {
                debug!("{}: close frame", peer.addr());
                return Activity::Evict;
            }
            Frame::Ping(payload) => frame::encode(opcode::PONG, payload, out_buf),
            Frame::Text(payload) | Frame::Binary(payload) => {
                debug!("{}: {} byte frame for {}", peer.addr(), payload.len(), peer.uri());
                respond(peer.uri(), payload, svc).and_then(|text| {
                    let frame = frame::encode(opcode::TEXT, text.as_bytes(), out_buf);
                    if frame.is_none() {
                        warn!("{}: dropping {} byte reply", peer.addr(), text.len());
                    }
                    frame
                })
            }
        };
        served = true;

        if let Some(reply) = reply {
            if let Err(err) = peer.clnt.write(&reply).await {
                log_net(peer.addr(), err);
                if err.is_fatal() {
                    return Activity::Evict;
                }
            }
        }
    }

    if served {
        peer.touch()
    } else {
        peer.idle(limit)
    }
}

fn respond<F, S, B>(uri: &str, payload: &[u8], svc: &mut Services<'_, F, S, B>) -> Option<String>
where
    S: ScriptEngine,
    B: Board,
{
    if uri == device::DEV_PATH {
        return match device::handle(payload, svc.board) {
            Ok(reply) => Some(reply),
            Err(err) => {
                warn!("device command failed: {}", err);
                None
            }
        };
    }
    let path = content_path(&svc.config.content_root, uri)?;
    script::run_once(svc.engine, &path, &String::from_utf8_lossy(payload))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rfc6455_accept_value() {
        assert_eq!(
            accept_key(b"dGhlIHNhbXBsZSBub25jZQ=="),
            "s3pPLMBiTxaQ9kYGzzhZRbK+xOo="
        );
    }
}
