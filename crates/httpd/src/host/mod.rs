//! Collaborators for running the server on a regular host: a tokio TCP
//! listener, a directory standing in for flash, and simulated peripherals.

mod board;
mod dir;
mod engine;
mod tcp;

pub use board::SimBoard;
pub use dir::{DirFile, DirFs};
pub use engine::DisabledEngine;
pub use tcp::{TcpConnection, TcpTransport};
