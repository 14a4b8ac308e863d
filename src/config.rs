use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::CitoError;

/// Modbus/TCP port used by the generator's Ethernet interface.
pub const DEFAULT_PORT: u16 = 502;
pub const DEFAULT_BAUD_RATE: u32 = 115_200;

/// Connect, send and receive timeout for packet mode.
pub const PACKET_TIMEOUT: Duration = Duration::from_secs(1);
/// Budget for receiving one checksummed reply in stream mode.
pub const STREAM_TIMEOUT: Duration = Duration::from_millis(1000);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Parity {
    None,
    Odd,
    #[default]
    Even,
}

impl From<Parity> for serialport::Parity {
    fn from(parity: Parity) -> Self {
        match parity {
            Parity::None => serialport::Parity::None,
            Parity::Odd => serialport::Parity::Odd,
            Parity::Even => serialport::Parity::Even,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StopBits {
    #[default]
    One,
    Two,
}

impl From<StopBits> for serialport::StopBits {
    fn from(bits: StopBits) -> Self {
        match bits {
            StopBits::One => serialport::StopBits::One,
            StopBits::Two => serialport::StopBits::Two,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataBits {
    Five,
    Six,
    Seven,
    #[default]
    Eight,
}

impl From<DataBits> for serialport::DataBits {
    fn from(bits: DataBits) -> Self {
        match bits {
            DataBits::Five => serialport::DataBits::Five,
            DataBits::Six => serialport::DataBits::Six,
            DataBits::Seven => serialport::DataBits::Seven,
            DataBits::Eight => serialport::DataBits::Eight,
        }
    }
}

/// How to reach the generator.
///
/// The mode is chosen explicitly; nothing is inferred from the address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum ConnectionConfig {
    /// Ethernet, Modbus/TCP style framing.
    Packet {
        host: String,
        #[serde(default = "default_port")]
        port: u16,
    },
    /// RS-232, CRC16 framing.
    Stream {
        device: String,
        #[serde(default = "default_baud_rate")]
        baud_rate: u32,
        #[serde(default)]
        parity: Parity,
        #[serde(default)]
        stop_bits: StopBits,
        #[serde(default)]
        data_bits: DataBits,
    },
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_baud_rate() -> u32 {
    DEFAULT_BAUD_RATE
}

impl ConnectionConfig {
    pub fn packet(host: impl Into<String>) -> Self {
        ConnectionConfig::Packet {
            host: host.into(),
            port: DEFAULT_PORT,
        }
    }

    pub fn stream(device: impl Into<String>) -> Self {
        ConnectionConfig::Stream {
            device: device.into(),
            baud_rate: DEFAULT_BAUD_RATE,
            parity: Parity::default(),
            stop_bits: StopBits::default(),
            data_bits: DataBits::default(),
        }
    }

    pub fn validate(&self) -> Result<(), CitoError> {
        match self {
            ConnectionConfig::Packet { host, port } => {
                if host.trim().is_empty() {
                    return Err(CitoError::HostMissing);
                }
                if *port == 0 {
                    return Err(CitoError::InvalidPort(*port));
                }
            }
            ConnectionConfig::Stream { device, .. } => {
                if device.trim().is_empty() {
                    return Err(CitoError::HostMissing);
                }
            }
        }
        Ok(())
    }
}
