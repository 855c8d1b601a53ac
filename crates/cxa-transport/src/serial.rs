//! Serial transport implementation
//!
//! Opens the amplifier's RS-232 port and splits it into a sender and a
//! receiver. Reads run on a background task that forwards each read as a
//! [`TransportEvent::Data`]. Read errors are reported and retried with
//! exponential backoff; end of stream ends the task.

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt, WriteHalf};
use tokio::sync::mpsc;
use tokio_serial::{SerialPortBuilderExt, SerialStream};
use tracing::{debug, error, info, warn};

use crate::error::{Result, TransportError};
use crate::traits::{TransportEvent, TransportReceiver, TransportSender};

/// Serial transport configuration
#[derive(Debug, Clone)]
pub struct SerialConfig {
    /// Baud rate (default: 9600)
    pub baud_rate: u32,
    /// Data bits (default: 8)
    pub data_bits: u8,
    /// Stop bits (default: 1)
    pub stop_bits: u8,
    /// Parity (default: none)
    pub parity: SerialParity,
    /// Flow control (default: none)
    pub flow_control: SerialFlowControl,
    /// Read buffer size
    pub read_buffer: usize,
    /// First delay after a failed read
    pub retry_initial: Duration,
    /// Upper bound for the retry delay
    pub retry_max: Duration,
}

/// Serial parity options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SerialParity {
    #[default]
    None,
    Odd,
    Even,
}

/// Serial flow control options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SerialFlowControl {
    #[default]
    None,
    Hardware,
    Software,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            baud_rate: 9600,
            data_bits: 8,
            stop_bits: 1,
            parity: SerialParity::None,
            flow_control: SerialFlowControl::None,
            read_buffer: 1024,
            retry_initial: Duration::from_millis(100),
            retry_max: Duration::from_secs(5),
        }
    }
}

impl SerialConfig {
    fn data_bits(&self) -> Result<tokio_serial::DataBits> {
        use tokio_serial::DataBits;
        match self.data_bits {
            5 => Ok(DataBits::Five),
            6 => Ok(DataBits::Six),
            7 => Ok(DataBits::Seven),
            8 => Ok(DataBits::Eight),
            n => Err(TransportError::InvalidConfig(format!("data bits: {}", n))),
        }
    }

    fn stop_bits(&self) -> Result<tokio_serial::StopBits> {
        use tokio_serial::StopBits;
        match self.stop_bits {
            1 => Ok(StopBits::One),
            2 => Ok(StopBits::Two),
            n => Err(TransportError::InvalidConfig(format!("stop bits: {}", n))),
        }
    }

    fn parity(&self) -> tokio_serial::Parity {
        match self.parity {
            SerialParity::None => tokio_serial::Parity::None,
            SerialParity::Odd => tokio_serial::Parity::Odd,
            SerialParity::Even => tokio_serial::Parity::Even,
        }
    }

    fn flow_control(&self) -> tokio_serial::FlowControl {
        match self.flow_control {
            SerialFlowControl::None => tokio_serial::FlowControl::None,
            SerialFlowControl::Hardware => tokio_serial::FlowControl::Hardware,
            SerialFlowControl::Software => tokio_serial::FlowControl::Software,
        }
    }
}

/// Serial transport for the amplifier
pub struct SerialTransport;

impl SerialTransport {
    /// List available serial ports
    pub fn list_ports() -> Result<Vec<String>> {
        let ports = tokio_serial::available_ports().map_err(|e| {
            TransportError::ConnectionFailed(format!("Failed to list ports: {}", e))
        })?;
        Ok(ports.into_iter().map(|p| p.port_name).collect())
    }

    /// Connect to a serial port with the amplifier's default settings
    pub async fn connect(port_name: &str) -> Result<(SerialSender, SerialReceiver)> {
        Self::connect_with_config(port_name, SerialConfig::default()).await
    }

    /// Connect with custom config
    pub async fn connect_with_config(
        port_name: &str,
        config: SerialConfig,
    ) -> Result<(SerialSender, SerialReceiver)> {
        let port = tokio_serial::new(port_name, config.baud_rate)
            .data_bits(config.data_bits()?)
            .stop_bits(config.stop_bits()?)
            .parity(config.parity())
            .flow_control(config.flow_control())
            .open_native_async()
            .map_err(|e| TransportError::ConnectionFailed(format!("Failed to open port: {}", e)))?;

        info!(
            "Serial port opened: {} @ {} baud",
            port_name, config.baud_rate
        );

        let (reader, writer) = tokio::io::split(port);
        let (tx, rx) = mpsc::channel(100);
        let connected = Arc::new(Mutex::new(true));

        tokio::spawn(read_loop(reader, tx, connected.clone(), config));

        let sender = SerialSender {
            writer: Arc::new(tokio::sync::Mutex::new(writer)),
            connected,
        };

        Ok((sender, SerialReceiver { rx }))
    }
}

async fn read_loop(
    mut reader: tokio::io::ReadHalf<SerialStream>,
    tx: mpsc::Sender<TransportEvent>,
    connected: Arc<Mutex<bool>>,
    config: SerialConfig,
) {
    let mut buf = vec![0u8; config.read_buffer];
    let mut delay = config.retry_initial;

    loop {
        match reader.read(&mut buf).await {
            Ok(0) => {
                *connected.lock() = false;
                let _ = tx.send(TransportEvent::Disconnected { reason: None }).await;
                break;
            }
            Ok(n) => {
                delay = config.retry_initial;
                let data = Bytes::copy_from_slice(&buf[..n]);
                if tx.send(TransportEvent::Data(data)).await.is_err() {
                    debug!("Serial receiver dropped, stopping reads");
                    break;
                }
            }
            Err(e) => {
                error!("Serial read error: {}", e);
                if tx.send(TransportEvent::Error(e.to_string())).await.is_err() {
                    break;
                }
                warn!("Retrying serial read in {:?}", delay);
                tokio::time::sleep(delay).await;
                delay = (delay * 2).min(config.retry_max);
            }
        }
    }
}

/// Serial sender. Writers are serialized by their own lock.
pub struct SerialSender {
    writer: Arc<tokio::sync::Mutex<WriteHalf<SerialStream>>>,
    connected: Arc<Mutex<bool>>,
}

#[async_trait]
impl TransportSender for SerialSender {
    async fn send(&self, data: Bytes) -> Result<()> {
        if !self.is_connected() {
            return Err(TransportError::NotConnected);
        }

        let mut writer = self.writer.lock().await;
        writer
            .write_all(&data)
            .await
            .map_err(|e| TransportError::SendFailed(format!("Serial write failed: {}", e)))?;
        writer
            .flush()
            .await
            .map_err(|e| TransportError::SendFailed(format!("Serial flush failed: {}", e)))?;

        debug!("Serial sent {} bytes", data.len());
        Ok(())
    }

    fn is_connected(&self) -> bool {
        *self.connected.lock()
    }

    async fn close(&self) -> Result<()> {
        *self.connected.lock() = false;
        Ok(())
    }
}

/// Serial receiver
pub struct SerialReceiver {
    rx: mpsc::Receiver<TransportEvent>,
}

#[async_trait]
impl TransportReceiver for SerialReceiver {
    async fn recv(&mut self) -> Option<TransportEvent> {
        self.rx.recv().await
    }
}
