//! A single control session with one ETH008 module.
//!
//! Each operation is exactly one write-then-read round trip. Nothing about
//! the module is cached between operations; in particular the unlock status
//! is queried afresh by [`Session::authenticate`].

use std::time::Duration;

use tracing::{debug, info, trace, warn};

use crate::error::{AuthError, ProtocolError, Result};
use crate::outputs::{ModuleInfo, OutputState, OutputStates, Relay};
use crate::protocol::{Command, Opcode, PERMANENT};
use crate::transport::{self, ModuleStream, IO_TIMEOUT};

#[derive(Debug)]
pub struct Session<S> {
    stream: S,
    timeout: Duration,
}

impl<S: ModuleStream> Session<S> {
    /// Bind a session to an already connected stream.
    pub fn new(stream: S) -> Self {
        Session {
            stream,
            timeout: IO_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn exchange(&mut self, command: &Command) -> Result<Vec<u8>> {
        let opcode = command.opcode();
        let frame = command.frame();
        if command.is_secret() {
            trace!(%opcode, len = frame.len(), "send");
        } else {
            trace!(%opcode, frame = %hex::encode(&frame), "send");
        }
        transport::write_exact(&mut self.stream, &frame, self.timeout)?;

        let expected = command.reply_len();
        let reply = transport::read_exact(&mut self.stream, expected, self.timeout)?;
        if reply.len() != expected {
            return Err(ProtocolError::TruncatedReply {
                opcode,
                expected,
                received: reply.len(),
            }
            .into());
        }
        debug!(%opcode, reply = %hex::encode(&reply), "exchange complete");
        Ok(reply)
    }

    /// Module id, hardware and firmware versions.
    pub fn module_info(&mut self) -> Result<ModuleInfo> {
        let reply = self.exchange(&Command::new(Opcode::GetInfo))?;
        Ok(ModuleInfo::from_reply([reply[0], reply[1], reply[2]]))
    }

    /// Seconds left before the module locks itself again; 0 means locked.
    pub fn unlock_seconds(&mut self) -> Result<u8> {
        let reply = self.exchange(&Command::new(Opcode::GetUnlock))?;
        Ok(reply[0])
    }

    /// Send a password. Acceptance only means the password was well formed,
    /// the unlock timer must be checked separately.
    pub fn send_password(&mut self, password: &str) -> Result<()> {
        let command = Command::send_password(password)?;
        let reply = self.exchange(&command)?;
        match reply[0] {
            1 => Ok(()),
            reply => Err(AuthError::PasswordRejected { reply }.into()),
        }
    }

    /// Unlock the module if it is locked.
    ///
    /// Returns the remaining unlock time. A locked module needs a non-empty
    /// `password`, and is only considered unlocked once a second unlock query
    /// reports a non-zero time.
    pub fn authenticate(&mut self, password: Option<&str>) -> Result<u8> {
        let seconds = self.unlock_seconds()?;
        if seconds > 0 {
            debug!(seconds, "module already unlocked");
            return Ok(seconds);
        }

        let password = match password {
            Some(p) if !p.is_empty() => p,
            _ => return Err(AuthError::PasswordRequired.into()),
        };
        self.send_password(password)?;

        let seconds = self.unlock_seconds()?;
        if seconds == 0 {
            return Err(AuthError::StillLocked.into());
        }
        info!(seconds, "module unlocked");
        Ok(seconds)
    }

    pub fn output_states(&mut self) -> Result<OutputStates> {
        let reply = self.exchange(&Command::new(Opcode::GetDigitalOutputs))?;
        Ok(OutputStates::from_bits(reply[0]))
    }

    /// Drive `relay` into `state`. A non-zero `pulse` asks the module to
    /// revert after that time; [`PERMANENT`] keeps the change.
    /// Returns the module's status byte unchecked.
    pub fn set_output(&mut self, relay: Relay, state: OutputState, pulse: u8) -> Result<u8> {
        let reply = self.exchange(&Command::set_output(state, relay, pulse))?;
        debug!(%relay, %state, pulse, "output set");
        Ok(reply[0])
    }

    /// Flip output `output` (1 to 8) based on its freshly read state.
    ///
    /// Any other number is ignored: nothing is sent and `Ok(None)` is
    /// returned. Otherwise returns the state that was requested.
    pub fn toggle_output(&mut self, output: u8) -> Result<Option<OutputState>> {
        let relay = match Relay::new(output) {
            Some(relay) => relay,
            None => {
                warn!(output, "ignoring toggle of nonexistent output");
                return Ok(None);
            }
        };
        let target = self.output_states()?.state(relay).toggled();
        self.set_output(relay, target, PERMANENT)?;
        Ok(Some(target))
    }

    /// Lock the module again and hand back the stream for closing.
    pub fn logout(mut self) -> Result<S> {
        self.exchange(&Command::new(Opcode::Logout))?;
        info!("logged out");
        Ok(self.stream)
    }

    /// Give up the stream without logging out.
    pub fn into_inner(self) -> S {
        self.stream
    }
}
