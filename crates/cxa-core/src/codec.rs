//! CXA frame codec
//!
//! Frame format:
//! ```text
//! #GG,NN[,DATA]\r
//!
//! GG    two ASCII digits, command/reply group
//! NN    two ASCII digits, number within the group
//! DATA  optional, any characters except '\r'
//! ```
//!
//! There is no escaping and no length prefix. A single serial read may carry
//! several frames, and bytes outside frames are ignored. Each read is decoded
//! on its own; a frame split across two reads is lost.

use bytes::{BufMut, Bytes, BytesMut};
use regex_lite::Regex;
use std::sync::OnceLock;

use crate::{Command, Error, Reply, Result, FRAME_END, FRAME_START};

fn frame_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"#([0-9]{2}),([0-9]{2})(?:,([^\r]*))?\r")
            .expect("frame pattern is valid")
    })
}

/// Encode a command into a wire frame
pub fn encode(cmd: &Command) -> Bytes {
    encode_parts(cmd.group, cmd.number, cmd.data)
}

/// Encode a reply into a wire frame, as the amplifier would send it
pub fn encode_reply(reply: &Reply) -> Bytes {
    encode_parts(&reply.group, &reply.number, &reply.data)
}

/// Encode raw frame fields. `data` is omitted when empty.
pub fn encode_parts(group: &str, number: &str, data: &str) -> Bytes {
    let mut buf = BytesMut::with_capacity(8 + data.len());

    buf.put_u8(FRAME_START);
    buf.extend_from_slice(group.as_bytes());
    buf.put_u8(b',');
    buf.extend_from_slice(number.as_bytes());

    if !data.is_empty() {
        buf.put_u8(b',');
        buf.extend_from_slice(data.as_bytes());
    }

    buf.put_u8(FRAME_END);
    buf.freeze()
}

/// Decode every complete frame in `buf`, in order.
///
/// An empty buffer decodes to no replies. A non-empty buffer without a
/// single frame is [`Error::MalformedFrame`].
pub fn decode(buf: &[u8]) -> Result<Vec<Reply>> {
    if buf.is_empty() {
        return Ok(Vec::new());
    }

    let text = String::from_utf8_lossy(buf);
    let replies: Vec<Reply> = frame_pattern()
        .captures_iter(&text)
        .map(|caps| Reply {
            group: caps[1].to_string(),
            number: caps[2].to_string(),
            data: caps.get(3).map(|m| m.as_str().to_string()).unwrap_or_default(),
        })
        .collect();

    if replies.is_empty() {
        return Err(Error::MalformedFrame(text.into_owned()));
    }

    Ok(replies)
}
