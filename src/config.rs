//! Where to find the module and how to talk to it.
//!
//! Values come from an optional YAML profile, overridden by the command line.

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use snafu::{ensure, OptionExt, ResultExt};

use crate::error::{ConfigError, InvalidTimeoutSnafu, NoAddressSnafu, ParseSnafu, ReadSnafu};
use crate::transport::IO_TIMEOUT;

pub const DEFAULT_PORT: u16 = 17494;

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Profile {
    pub address: Option<String>,
    pub port: Option<u16>,
    pub password: Option<String>,
    pub timeout_ms: Option<u64>,
}

impl Profile {
    pub fn load(path: &Path) -> Result<Profile, ConfigError> {
        let body = fs::read_to_string(path).context(ReadSnafu { path })?;
        Profile::parse(&body).context(ParseSnafu { path })
    }

    pub fn parse(body: &str) -> Result<Profile, serde_yaml::Error> {
        if body.trim().is_empty() {
            return Ok(Profile::default());
        }
        serde_yaml::from_str(body)
    }

    /// Values set in `overrides` win.
    pub fn merge(self, overrides: Profile) -> Profile {
        Profile {
            address: overrides.address.or(self.address),
            port: overrides.port.or(self.port),
            password: overrides.password.or(self.password),
            timeout_ms: overrides.timeout_ms.or(self.timeout_ms),
        }
    }

    /// Sockets refuse a zero timeout, so `timeout_ms: 0` is rejected here.
    pub fn resolve(self) -> Result<Target, ConfigError> {
        let address = self.address.context(NoAddressSnafu)?;
        let timeout = match self.timeout_ms {
            Some(timeout_ms) => {
                ensure!(timeout_ms > 0, InvalidTimeoutSnafu { timeout_ms });
                Duration::from_millis(timeout_ms)
            }
            None => IO_TIMEOUT,
        };
        Ok(Target {
            address,
            port: self.port.unwrap_or(DEFAULT_PORT),
            password: self.password,
            timeout,
        })
    }
}

/// A fully resolved connection target.
#[derive(Clone, PartialEq)]
pub struct Target {
    pub address: String,
    pub port: u16,
    pub password: Option<String>,
    pub timeout: Duration,
}

impl std::fmt::Debug for Target {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Target")
            .field("address", &self.address)
            .field("port", &self.port)
            .field("password", &self.password.as_ref().map(|_| "<set>"))
            .field("timeout", &self.timeout)
            .finish()
    }
}
