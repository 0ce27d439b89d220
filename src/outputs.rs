use std::fmt;

use strum_macros::Display;

pub const RELAY_COUNT: u8 = 8;

/// A relay output, numbered 1 to 8 as printed on the module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Relay(u8);

impl Relay {
    pub fn new(number: u8) -> Option<Relay> {
        if (1..=RELAY_COUNT).contains(&number) {
            Some(Relay(number))
        } else {
            None
        }
    }

    pub fn number(self) -> u8 {
        self.0
    }

    /// Position of this relay in the output bitmask.
    pub fn bit(self) -> u8 {
        self.0 - 1
    }

    fn mask(self) -> u8 {
        0x01 << self.bit()
    }

    pub fn all() -> impl Iterator<Item = Relay> {
        (1..=RELAY_COUNT).map(Relay)
    }
}

impl fmt::Display for Relay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum OutputState {
    Active,
    Inactive,
}

impl OutputState {
    pub fn toggled(self) -> OutputState {
        match self {
            OutputState::Active => OutputState::Inactive,
            OutputState::Inactive => OutputState::Active,
        }
    }
}

impl From<bool> for OutputState {
    fn from(active: bool) -> Self {
        if active {
            OutputState::Active
        } else {
            OutputState::Inactive
        }
    }
}

/// The GET_DIGITAL_OUTPUTS bitmask: bit `r` set means relay `r + 1` is energized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OutputStates(u8);

impl OutputStates {
    pub fn from_bits(bits: u8) -> Self {
        OutputStates(bits)
    }

    pub fn bits(self) -> u8 {
        self.0
    }

    pub fn is_active(self, relay: Relay) -> bool {
        self.0 & relay.mask() != 0
    }

    pub fn state(self, relay: Relay) -> OutputState {
        self.is_active(relay).into()
    }

    pub fn iter(self) -> impl Iterator<Item = (Relay, OutputState)> {
        Relay::all().map(move |relay| (relay, self.state(relay)))
    }
}

impl fmt::Display for OutputStates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (relay, state) in self.iter() {
            writeln!(f, "Relay {}: {}", relay, state)?;
        }
        Ok(())
    }
}

/// GET_INFO reply, byte for byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModuleInfo {
    pub module_id: u8,
    pub hardware_version: u8,
    pub firmware_version: u8,
}

impl ModuleInfo {
    pub fn from_reply(reply: [u8; 3]) -> Self {
        ModuleInfo {
            module_id: reply[0],
            hardware_version: reply[1],
            firmware_version: reply[2],
        }
    }
}

impl fmt::Display for ModuleInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Module ID: {}", self.module_id)?;
        writeln!(f, "Hardware version: {}", self.hardware_version)?;
        writeln!(f, "Firmware version: {}", self.firmware_version)
    }
}
