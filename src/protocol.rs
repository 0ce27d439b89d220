//! ETH008 command set.
//!
//! Frames carry no length prefix, delimiter or checksum: a request is the
//! opcode followed by its payload, and the reply length is implied by the
//! opcode. [`Opcode::reply_len`] is the only place that knowledge lives.

use std::fmt;

use snafu::ensure;
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter, IntoStaticStr};

use crate::error::{PayloadTooLongSnafu, ProtocolError};
use crate::outputs::{OutputState, Relay};

/// Largest payload a single frame may carry.
pub const MAX_PAYLOAD: usize = 98;

/// Pulse time that makes an output change permanent.
pub const PERMANENT: u8 = 0x00;

#[repr(u8)]
#[derive(Debug, Display, IntoStaticStr, EnumIter, Clone, Copy, PartialEq, Eq, Hash)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum Opcode {
    GetInfo = 0x10,
    GetUnlock = 0x7a,
    SendPassword = 0x79,
    Logout = 0x7b,
    GetDigitalOutputs = 0x24,
    SetOutputActive = 0x20,
    SetOutputInactive = 0x21,
}

impl Opcode {
    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn from_code(code: u8) -> Option<Opcode> {
        Opcode::iter().find(|op| op.code() == code)
    }

    /// Number of bytes the module answers with.
    pub fn reply_len(self) -> usize {
        match self {
            Opcode::GetInfo => 3,
            Opcode::GetUnlock
            | Opcode::SendPassword
            | Opcode::Logout
            | Opcode::GetDigitalOutputs
            | Opcode::SetOutputActive
            | Opcode::SetOutputInactive => 1,
        }
    }

    /// Opcode that drives an output into `state`.
    pub fn set_output(state: OutputState) -> Opcode {
        match state {
            OutputState::Active => Opcode::SetOutputActive,
            OutputState::Inactive => Opcode::SetOutputInactive,
        }
    }
}

/// One request frame. Immutable once built.
#[derive(Clone, PartialEq, Eq)]
pub struct Command {
    opcode: Opcode,
    payload: Vec<u8>,
}

impl Command {
    pub fn new(opcode: Opcode) -> Self {
        Command {
            opcode,
            payload: Vec::new(),
        }
    }

    pub fn with_payload(opcode: Opcode, payload: &[u8]) -> Result<Self, ProtocolError> {
        ensure!(
            payload.len() <= MAX_PAYLOAD,
            PayloadTooLongSnafu {
                opcode,
                len: payload.len(),
                max: MAX_PAYLOAD,
            }
        );
        Ok(Command {
            opcode,
            payload: payload.to_vec(),
        })
    }

    /// Password bytes as typed, without terminator or length prefix.
    pub fn send_password(password: &str) -> Result<Self, ProtocolError> {
        Command::with_payload(Opcode::SendPassword, password.as_bytes())
    }

    pub fn set_output(state: OutputState, relay: Relay, pulse: u8) -> Self {
        Command {
            opcode: Opcode::set_output(state),
            payload: vec![relay.number(), pulse],
        }
    }

    pub fn opcode(&self) -> Opcode {
        self.opcode
    }

    pub fn reply_len(&self) -> usize {
        self.opcode.reply_len()
    }

    pub fn frame(&self) -> Vec<u8> {
        let mut v = Vec::with_capacity(self.payload.len() + 1);
        v.push(self.opcode.code());
        v.extend_from_slice(&self.payload);
        v
    }

    /// Whether the frame may be written to logs verbatim.
    pub fn is_secret(&self) -> bool {
        self.opcode == Opcode::SendPassword
    }
}

// keep passwords out of debug output
impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut d = f.debug_struct("Command");
        d.field("opcode", &self.opcode);
        if self.is_secret() {
            d.field("payload", &format_args!("<{} bytes>", self.payload.len()));
        } else {
            d.field("payload", &self.payload);
        }
        d.finish()
    }
}
