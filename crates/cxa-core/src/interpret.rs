//! Human-readable reply descriptions
//!
//! Replies are described through a static `(group, number)` table. New reply
//! kinds are added as table rows.

use std::fmt;

use crate::{Reply, Source};

/// How a reply's data field is presented
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataKind {
    /// Shown as received
    Raw,
    /// A source code, shown as the source name
    Source,
}

/// A row of the reply table
#[derive(Debug, Clone, Copy)]
pub struct ReplyDescriptor {
    pub group: &'static str,
    pub number: &'static str,
    pub description: &'static str,
    pub data: DataKind,
}

const fn row(
    group: &'static str,
    number: &'static str,
    description: &'static str,
) -> ReplyDescriptor {
    ReplyDescriptor {
        group,
        number,
        description,
        data: DataKind::Raw,
    }
}

/// Known replies. Version replies are answered under group 13 by some
/// firmware and group 14 by others.
pub static REPLY_TABLE: &[ReplyDescriptor] = &[
    row("00", "01", "Command group unknown"),
    row("00", "02", "Command number unknown"),
    row("00", "03", "Command data error"),
    row("00", "04", "Command not available"),
    row("02", "01", "Current power state"),
    row("02", "03", "Current mute state"),
    ReplyDescriptor {
        group: "04",
        number: "01",
        description: "Current source",
        data: DataKind::Source,
    },
    row("13", "01", "Protocol version"),
    row("13", "02", "Firmware version"),
    row("14", "01", "Protocol version"),
    row("14", "02", "Firmware version"),
];

/// Look up the table row for a reply
pub fn descriptor(reply: &Reply) -> Option<&'static ReplyDescriptor> {
    REPLY_TABLE.iter().find(|d| reply.is(d.group, d.number))
}

/// A described reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interpretation {
    pub description: String,
    /// Data after resolution (source codes become names)
    pub data: String,
    /// Whether the reply matched the table
    pub known: bool,
}

/// Describe a reply
pub fn interpret(reply: &Reply) -> Interpretation {
    match descriptor(reply) {
        Some(desc) => {
            let data = match desc.data {
                DataKind::Raw => reply.data.clone(),
                DataKind::Source => Source::from_code(&reply.data)
                    .map(|s| s.name().to_string())
                    .unwrap_or_else(|| reply.data.clone()),
            };
            Interpretation {
                description: desc.description.to_string(),
                data,
                known: true,
            }
        }
        None => Interpretation {
            description: format!(
                "Unknown reply: {},{},{}",
                reply.group, reply.number, reply.data
            ),
            data: reply.data.clone(),
            known: false,
        },
    }
}

impl fmt::Display for Interpretation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.data.is_empty() {
            f.write_str(&self.description)
        } else {
            write!(f, "{}: {}", self.description, self.data)
        }
    }
}
