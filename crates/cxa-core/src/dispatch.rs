//! User intent to command mapping
//!
//! Each function validates a user-facing string and yields the single
//! command to send along with the state change to commit once it has been
//! sent. An empty string is a no-op, not an error.

use crate::{Command, DeviceState, Error, Result, Source};

/// A state change to commit after a command is transmitted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Change {
    Power(bool),
    Mute(bool),
    Source(Source),
}

/// A validated command with its intended state change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dispatch {
    pub command: Command,
    pub change: Change,
}

impl Dispatch {
    fn new(command: Command, change: Change) -> Self {
        Self { command, change }
    }
}

/// Map `on`, `off` or `toggle`. `toggle` complements `current.powered`.
pub fn power(arg: &str, current: &DeviceState) -> Result<Option<Dispatch>> {
    let on = match arg {
        "on" => true,
        "off" => false,
        "toggle" => !current.powered,
        "" => return Ok(None),
        other => {
            return Err(Error::InvalidArgument(format!(
                "Unexpected power state {}, expected: on/off/toggle",
                other
            )))
        }
    };

    Ok(Some(Dispatch::new(Command::set_power(on), Change::Power(on))))
}

/// Map `on`/`muted` or `off`/`unmuted`
pub fn mute(arg: &str) -> Result<Option<Dispatch>> {
    let on = match arg {
        "on" | "muted" => true,
        "off" | "unmuted" => false,
        "" => return Ok(None),
        other => {
            return Err(Error::InvalidArgument(format!(
                "Unexpected mute state {}, expected: on/off/muted/unmuted",
                other
            )))
        }
    };

    Ok(Some(Dispatch::new(Command::set_mute(on), Change::Mute(on))))
}

/// Map a source name such as `A1` or `Bluetooth`
pub fn source(arg: &str) -> Result<Option<Dispatch>> {
    if arg.is_empty() {
        return Ok(None);
    }

    let source: Source = arg.parse()?;
    Ok(Some(Dispatch::new(
        Command::set_source(source),
        Change::Source(source),
    )))
}
