//! Amplifier command set
//!
//! Commands are a closed, static set. Group `01` covers amplifier
//! power/mute, `03` source selection and `13` version queries.

use std::fmt;

use crate::Source;

/// A command frame to send to the amplifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Command {
    pub group: &'static str,
    pub number: &'static str,
    /// Empty when the command carries no data field
    pub data: &'static str,
}

impl Command {
    const fn new(group: &'static str, number: &'static str, data: &'static str) -> Self {
        Self {
            group,
            number,
            data,
        }
    }

    pub const GET_POWER_STATE: Command = Command::new("01", "01", "");
    pub const SET_POWER_STANDBY: Command = Command::new("01", "02", "0");
    pub const SET_POWER_ON: Command = Command::new("01", "02", "1");
    pub const GET_MUTE_STATE: Command = Command::new("01", "03", "");
    pub const SET_MUTE_OFF: Command = Command::new("01", "04", "0");
    pub const SET_MUTE_ON: Command = Command::new("01", "04", "1");

    pub const GET_SOURCE: Command = Command::new("03", "01", "");
    pub const SELECT_NEXT_SOURCE: Command = Command::new("03", "02", "");
    pub const SELECT_PREVIOUS_SOURCE: Command = Command::new("03", "03", "");

    pub const GET_PROTOCOL_VERSION: Command = Command::new("13", "01", "");
    pub const GET_FIRMWARE_VERSION: Command = Command::new("13", "02", "");

    /// Queries sent on startup to populate the state store
    pub const INITIAL_QUERIES: [Command; 5] = [
        Command::GET_POWER_STATE,
        Command::GET_MUTE_STATE,
        Command::GET_SOURCE,
        Command::GET_PROTOCOL_VERSION,
        Command::GET_FIRMWARE_VERSION,
    ];

    /// Select an input
    pub const fn set_source(source: Source) -> Command {
        Command::new("03", "04", source.code())
    }

    pub const fn set_power(on: bool) -> Command {
        if on {
            Command::SET_POWER_ON
        } else {
            Command::SET_POWER_STANDBY
        }
    }

    pub const fn set_mute(on: bool) -> Command {
        if on {
            Command::SET_MUTE_ON
        } else {
            Command::SET_MUTE_OFF
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.data.is_empty() {
            write!(f, "{},{}", self.group, self.number)
        } else {
            write!(f, "{},{},{}", self.group, self.number, self.data)
        }
    }
}
