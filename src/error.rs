use std::io;
use std::path::PathBuf;
use std::time::Duration;

use snafu::Snafu;
use strum_macros::Display;

use crate::protocol::Opcode;

pub type Result<T> = ::std::result::Result<T, SessionError>;

/// Which way the stream was expected to become ready.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
#[strum(serialize_all = "lowercase")]
pub enum Direction {
    Readable,
    Writable,
}

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum TransportError {
    #[snafu(display("module did not become {} within {:?}", direction, timeout))]
    Timeout {
        direction: Direction,
        timeout: Duration,
    },
    #[snafu(display("I/O error while {}: {}", action, source))]
    Io {
        action: &'static str,
        source: io::Error,
    },
    #[snafu(display("{} bytes written out of {} requested", written, requested))]
    PartialWrite { written: usize, requested: usize },
}

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum ProtocolError {
    #[snafu(display(
        "truncated {} reply: expected {} bytes, received {}",
        opcode,
        expected,
        received
    ))]
    TruncatedReply {
        opcode: Opcode,
        expected: usize,
        received: usize,
    },
    #[snafu(display("{} payload of {} bytes exceeds the {} byte limit", opcode, len, max))]
    PayloadTooLong { opcode: Opcode, len: usize, max: usize },
}

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum AuthError {
    #[snafu(display("A password is needed."))]
    PasswordRequired,
    #[snafu(display("Password error (module replied {}).", reply))]
    PasswordRejected { reply: u8 },
    #[snafu(display("Unable to unlock module."))]
    StillLocked,
}

/// Anything that ends a session. Every variant is terminal: the stream
/// must not be reused after one of these is returned.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum SessionError {
    #[snafu(context(false), display("transport failure: {}", source))]
    Transport { source: TransportError },
    #[snafu(context(false), display("protocol failure: {}", source))]
    Protocol { source: ProtocolError },
    #[snafu(context(false), display("{}", source))]
    Auth { source: AuthError },
}

impl SessionError {
    /// Conditions the user can fix (missing or ineffective password) rather
    /// than failures of the link or the module.
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            SessionError::Auth {
                source: AuthError::PasswordRequired
            } | SessionError::Auth {
                source: AuthError::StillLocked
            }
        )
    }
}

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum ConfigError {
    #[snafu(display("could not read config file {}: {}", path.display(), source))]
    Read { path: PathBuf, source: io::Error },
    #[snafu(display("could not parse config file {}: {}", path.display(), source))]
    Parse {
        path: PathBuf,
        source: serde_yaml::Error,
    },
    #[snafu(display("No IP address was supplied."))]
    NoAddress,
    #[snafu(display("timeout_ms must be at least 1, got {}", timeout_ms))]
    InvalidTimeout { timeout_ms: u64 },
}
