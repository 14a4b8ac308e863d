// lib.rs

mod cito_rtu;
mod cito_tcp;
mod client;
mod config;
mod core;
mod crc16;
mod exception;
pub mod params;
mod transport;

pub use cito_rtu::{CitoRTU, POLL_INTERVAL};
pub use cito_tcp::{CitoTCP, TransactionSequencer};
pub use client::{CitoClient, CitoClientBuilder, Framing, TransportMode};
pub use config::{
    ConnectionConfig, DataBits, Parity, StopBits, DEFAULT_BAUD_RATE, DEFAULT_PORT,
    PACKET_TIMEOUT, STREAM_TIMEOUT,
};
pub use crc16::{crc16, crc16_bytes};
pub use exception::{
    classify_reply, decode_exception_code, shft_exception_description, ExceptionCode,
    MODBUS_EXCEPTION_CODES, SHFT_EXCEPTION_CODES, UNKNOWN_EXCEPTION_CODE,
};
pub use params::RfStatus;
pub use transport::{Link, SerialTransport, TcpTransport, Transport};

pub use crate::core::{
    decode_float, decode_integer, decode_ip_addr, decode_string, parse_ip_addr,
    ParameterError, ParameterRequest, DEVICE_ADDRESS, FC_EXCEPTION_FLAG, FC_READ, FC_WRITE,
};

pub type CitoResult<T> = Result<T, CitoError>;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CitoError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Connection is not open")]
    NotOpen,

    #[error("Write timeout")]
    WriteTimeout,

    #[error("Write error: {0}")]
    WriteError(String),

    #[error("Read timeout")]
    ReadTimeout,

    #[error("Read error: {0}")]
    ReadError(String),

    #[error("Invalid reply: {0}")]
    InvalidReply(String),

    #[error("Unexpected function code {0:#04x} in reply")]
    ProtocolViolation(u8),

    #[error("Device exception {0}")]
    Device(ExceptionCode),

    #[error("Payload length {0} outside 5..=252 bytes")]
    PayloadLength(usize),

    #[error("Host address not set")]
    HostMissing,

    #[error("Invalid port: {0}")]
    InvalidPort(u16),

    #[error("Parameter error: {0}")]
    Parameter(#[from] ParameterError),
}

impl CitoError {
    /// Exception code this error is reported as.
    pub fn exception_code(&self) -> ExceptionCode {
        match self {
            CitoError::ConnectionFailed(_) => ExceptionCode::CONNECTION_FAILED,
            CitoError::NotOpen => ExceptionCode::INVALID_HANDLE,
            CitoError::WriteTimeout => ExceptionCode::WRITE_TIMEOUT,
            CitoError::WriteError(_) => ExceptionCode::WRITE_ERROR,
            CitoError::ReadTimeout => ExceptionCode::READ_TIMEOUT,
            CitoError::ReadError(_) => ExceptionCode::READ_ERROR,
            CitoError::InvalidReply(_) => ExceptionCode::INVALID_REPLY,
            CitoError::ProtocolViolation(_) => ExceptionCode::PROTOCOL_VIOLATION,
            CitoError::Device(code) => *code,
            CitoError::PayloadLength(_) | CitoError::HostMissing | CitoError::InvalidPort(_) => {
                ExceptionCode::INVALID_ARGUMENT
            }
            CitoError::Parameter(err) => ExceptionCode(err.code()),
        }
    }

    /// Raw byte form of [`exception_code`](Self::exception_code).
    pub fn code(&self) -> u8 {
        self.exception_code().0
    }
}

/// Render bytes as `0x0A 0x41 ...` for frame traces.
pub fn hex_string(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("0x{:02X}", b))
        .collect::<Vec<_>>()
        .join(" ")
}
