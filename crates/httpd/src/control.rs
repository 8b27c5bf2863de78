use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicU64, Ordering},
    },
    time::Duration,
};

use httpd_hal::Timeouts;

/// Run flag and connection timeouts, shared between the server loop and the
/// application that owns it.
#[derive(Debug)]
pub struct Control {
    running: AtomicBool,
    recv_ms: AtomicU64,
    send_ms: AtomicU64,
}

impl Control {
    pub fn new(timeouts: Timeouts) -> Self {
        Self {
            running: AtomicBool::new(true),
            recv_ms: AtomicU64::new(timeouts.recv.as_millis() as u64),
            send_ms: AtomicU64::new(timeouts.send.as_millis() as u64),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    pub fn set_running(&self, running: bool) {
        self.running.store(running, Ordering::Release);
    }

    pub fn timeouts(&self) -> Timeouts {
        Timeouts {
            recv: Duration::from_millis(self.recv_ms.load(Ordering::Relaxed)),
            send: Duration::from_millis(self.send_ms.load(Ordering::Relaxed)),
        }
    }

    pub fn set_timeouts(&self, timeouts: Timeouts) {
        self.recv_ms
            .store(timeouts.recv.as_millis() as u64, Ordering::Relaxed);
        self.send_ms
            .store(timeouts.send.as_millis() as u64, Ordering::Relaxed);
    }
}

/// Remote control for a running [`HttpServer`](crate::HttpServer).
#[derive(Debug, Clone)]
pub struct ServerHandle(pub(crate) Arc<Control>);

impl ServerHandle {
    /// Asks the loop to stop. In-flight responses are cut short.
    pub fn stop(&self) {
        self.0.set_running(false);
    }

    pub fn is_running(&self) -> bool {
        self.0.is_running()
    }

    pub fn timeouts(&self) -> Timeouts {
        self.0.timeouts()
    }

    /// Applies to connections accepted from now on.
    pub fn set_timeouts(&self, recv: Duration, send: Duration) {
        self.0.set_timeouts(Timeouts { recv, send });
    }
}
