//! Simulated amplifier
//!
//! Sits on the device end of a memory transport and answers commands the way
//! a CXA81 does: every set command is confirmed with the matching state
//! reply, and commands that need the amplifier on are refused in standby.

use cxa_core::{codec, Reply, Source};
use cxa_transport::MemoryDevice;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// In-process stand-in for an amplifier
pub struct Simulator {
    device: MemoryDevice,
    powered: bool,
    muted: bool,
    source: Source,
    protocol_version: String,
    firmware_version: String,
}

impl Simulator {
    pub fn new(device: MemoryDevice) -> Self {
        Self {
            device,
            powered: false,
            muted: false,
            source: Source::A1,
            protocol_version: "1.1".to_string(),
            firmware_version: "v104-a-105".to_string(),
        }
    }

    /// Start powered on
    pub fn powered_on(mut self) -> Self {
        self.powered = true;
        self
    }

    pub fn with_source(mut self, source: Source) -> Self {
        self.source = source;
        self
    }

    pub fn spawn(self, cancel: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(self.run(cancel))
    }

    pub async fn run(mut self, cancel: CancellationToken) {
        info!("Simulated amplifier running");

        loop {
            let written = tokio::select! {
                _ = cancel.cancelled() => break,
                written = self.device.next_write() => written,
            };

            let Some(written) = written else { break };

            let Ok(commands) = codec::decode(&written) else {
                debug!("Simulator ignoring {:?}", String::from_utf8_lossy(&written));
                continue;
            };

            let mut out = Vec::new();
            for cmd in &commands {
                for reply in self.handle(cmd) {
                    out.extend_from_slice(&codec::encode_reply(&reply));
                }
            }

            if !out.is_empty() && self.device.reply(out).await.is_err() {
                break;
            }
        }

        info!("Simulated amplifier stopped");
    }

    fn handle(&mut self, cmd: &Reply) -> Vec<Reply> {
        let flag = |on: bool| if on { "1" } else { "0" };

        match (cmd.group.as_str(), cmd.number.as_str()) {
            ("01", "01") => vec![Reply::new("02", "01", flag(self.powered))],
            ("01", "02") => match cmd.data.as_str() {
                "0" | "1" => {
                    self.powered = cmd.data == "1";
                    if !self.powered {
                        self.muted = false;
                    }
                    vec![Reply::new("02", "01", flag(self.powered))]
                }
                _ => vec![Reply::new("00", "03", "")],
            },
            ("01", "03") => vec![Reply::new("02", "03", flag(self.muted))],
            ("01", "04") if !self.powered => vec![Reply::new("00", "04", "")],
            ("01", "04") => match cmd.data.as_str() {
                "0" | "1" => {
                    self.muted = cmd.data == "1";
                    vec![Reply::new("02", "03", flag(self.muted))]
                }
                _ => vec![Reply::new("00", "03", "")],
            },
            ("03", "01") => vec![Reply::new("04", "01", self.source.code())],
            ("03", "02" | "03") if !self.powered => vec![Reply::new("00", "04", "")],
            ("03", "02") => {
                self.source = self.step_source(1);
                vec![Reply::new("04", "01", self.source.code())]
            }
            ("03", "03") => {
                self.source = self.step_source(Source::ALL.len() - 1);
                vec![Reply::new("04", "01", self.source.code())]
            }
            ("03", "04") if !self.powered => vec![Reply::new("00", "04", "")],
            ("03", "04") => match Source::from_code(&cmd.data) {
                Some(source) => {
                    self.source = source;
                    vec![Reply::new("04", "01", source.code())]
                }
                None => vec![Reply::new("00", "03", "")],
            },
            ("13", "01") => vec![Reply::new("14", "01", self.protocol_version.clone())],
            ("13", "02") => vec![Reply::new("14", "02", self.firmware_version.clone())],
            ("01" | "03" | "13", _) => vec![Reply::new("00", "02", "")],
            _ => vec![Reply::new("00", "01", "")],
        }
    }

    /// Input `offset` places further along the front-panel order, wrapping
    fn step_source(&self, offset: usize) -> Source {
        let all = Source::ALL;
        let pos = all.iter().position(|s| *s == self.source).unwrap_or(0);
        all[(pos + offset) % all.len()]
    }
}
