//! Client for the ETH008 eight relay ethernet module.
//!
//! The module speaks a bare binary protocol over TCP: one opcode byte plus
//! payload per request, and a reply whose length depends on the opcode.
//! A [`Session`] owns the connected stream and runs one request at a time.

pub mod config;
pub mod error;
pub mod outputs;
pub mod protocol;
pub mod session;
pub mod transport;

#[cfg(test)]
mod testing;

pub use crate::error::{AuthError, ProtocolError, Result, SessionError, TransportError};
pub use crate::outputs::{ModuleInfo, OutputState, OutputStates, Relay};
pub use crate::protocol::{Command, Opcode};
pub use crate::session::Session;
pub use crate::transport::{ModuleStream, IO_TIMEOUT};
