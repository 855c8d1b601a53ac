//! Amplifier input sources
//!
//! The amplifier reports and selects inputs by a two-digit code. Codes are
//! shared between the CXA61 and CXA81; `MP3` only exists on the CXA81.

use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::{Error, Result};

/// An amplifier input
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Source {
    A1,
    A2,
    A3,
    A4,
    D1,
    D2,
    D3,
    Mp3,
    Bluetooth,
    Usb,
    A1Balanced,
}

impl Source {
    /// Every source, in code order
    pub const ALL: [Source; 11] = [
        Source::A1,
        Source::A2,
        Source::A3,
        Source::A4,
        Source::D1,
        Source::D2,
        Source::D3,
        Source::Mp3,
        Source::Bluetooth,
        Source::Usb,
        Source::A1Balanced,
    ];

    /// Two-digit wire code
    pub const fn code(self) -> &'static str {
        match self {
            Source::A1 => "00",
            Source::A2 => "01",
            Source::A3 => "02",
            Source::A4 => "03",
            Source::D1 => "04",
            Source::D2 => "05",
            Source::D3 => "06",
            Source::Mp3 => "10",
            Source::Bluetooth => "14",
            Source::Usb => "16",
            Source::A1Balanced => "20",
        }
    }

    /// Human-facing name, as used by the HTTP API
    pub const fn name(self) -> &'static str {
        match self {
            Source::A1 => "A1",
            Source::A2 => "A2",
            Source::A3 => "A3",
            Source::A4 => "A4",
            Source::D1 => "D1",
            Source::D2 => "D2",
            Source::D3 => "D3",
            Source::Mp3 => "MP3",
            Source::Bluetooth => "Bluetooth",
            Source::Usb => "USB",
            Source::A1Balanced => "A1 Balanced",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.code() == code)
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.name() == name)
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Source {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_name(s).ok_or_else(|| Error::InvalidArgument(format!("Unknown source: {}", s)))
    }
}

impl Serialize for Source {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

/// Serialize an optional source as its name, or `""` when unknown
pub(crate) fn serialize_opt<S: Serializer>(
    source: &Option<Source>,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_str(source.map(Source::name).unwrap_or(""))
}
