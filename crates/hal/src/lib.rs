//! Hardware abstraction layer for the flash httpd.
//!
//! The server core never talks to sockets, flash or the script interpreter
//! directly. Everything it needs from the board is expressed by the traits in
//! this crate, so the same core runs on top of a host TCP stack, an in-memory
//! test harness or a netconn/SPIFFS port.

pub mod ascii;
pub mod board;
pub mod fs;
pub mod net;
pub mod script;

pub use board::{Board, Device, DeviceError};
pub use fs::{FsError, Filesystem};
pub use net::{Connection, NetError, Timeouts, Transport};
pub use script::{QueryParam, ScriptEngine, ScriptError};
