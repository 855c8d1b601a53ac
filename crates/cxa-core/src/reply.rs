//! Decoded replies from the amplifier

use std::fmt;

use crate::interpret;

/// A reply frame received from the amplifier, solicited or not.
///
/// `group` and `number` are always two ASCII digits. `data` is empty when
/// the frame has no data field.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Reply {
    pub group: String,
    pub number: String,
    pub data: String,
}

impl Reply {
    pub fn new(
        group: impl Into<String>,
        number: impl Into<String>,
        data: impl Into<String>,
    ) -> Self {
        Self {
            group: group.into(),
            number: number.into(),
            data: data.into(),
        }
    }

    /// True when this reply has the given group/number key
    pub fn is(&self, group: &str, number: &str) -> bool {
        self.group == group && self.number == number
    }
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        interpret(self).fmt(f)
    }
}
