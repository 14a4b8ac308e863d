use std::net::Ipv4Addr;

use thiserror::Error;

/// Leading byte of every SHFT payload.
pub const DEVICE_ADDRESS: u8 = 0x0A;
pub const FC_READ: u8 = 0x41;
pub const FC_WRITE: u8 = 0x42;
/// Added to the request function code when the device answers with an exception.
pub const FC_EXCEPTION_FLAG: u8 = 0x80;

const VALUE_OFFSET: usize = 3;
const WORD_REPLY_LEN: usize = VALUE_OFFSET + 4;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParameterError {
    #[error("Invalid IPv4 address: {0:?}")]
    InvalidIpAddress(String),

    #[error("Invalid value: {0}")]
    InvalidValue(String),

    #[error("String value contains non-ASCII characters")]
    NonAsciiString,

    #[error("Invalid response length: expected {expected}, got {actual}")]
    InvalidResponseLength { expected: usize, actual: usize },

    #[error("String length {declared} exceeds {available} available bytes")]
    StringOverrun { declared: usize, available: usize },
}

impl ParameterError {
    /// Exception byte reported to callers for this error.
    pub fn code(&self) -> u8 {
        match self {
            ParameterError::InvalidIpAddress(_)
            | ParameterError::InvalidValue(_)
            | ParameterError::NonAsciiString => 0x04,
            ParameterError::InvalidResponseLength { .. }
            | ParameterError::StringOverrun { .. } => 0xC6,
        }
    }
}

/// One SHFT parameter transaction: a read, or a write carrying an encoded value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterRequest {
    function_code: u8,
    parameter: u16,
    value: Vec<u8>,
}

impl ParameterRequest {
    pub fn read(parameter: u16) -> Self {
        ParameterRequest {
            function_code: FC_READ,
            parameter,
            // Reads always ask for a single value.
            value: vec![0x00, 0x01],
        }
    }

    pub fn write_integer(parameter: u16, value: i32) -> Self {
        Self::write(parameter, value.to_be_bytes().to_vec())
    }

    /// The value is rounded to six decimals before being packed as an IEEE-754 single.
    pub fn write_float(parameter: u16, value: f64) -> Self {
        let rounded = round6(value) as f32;
        Self::write(parameter, rounded.to_be_bytes().to_vec())
    }

    pub fn write_string(parameter: u16, value: &str) -> Result<Self, ParameterError> {
        if !value.is_ascii() {
            return Err(ParameterError::NonAsciiString);
        }
        let mut bytes = Vec::with_capacity(value.len() + 1);
        bytes.extend_from_slice(value.as_bytes());
        bytes.push(0x00);
        Ok(Self::write(parameter, bytes))
    }

    pub fn write_ip_addr(parameter: u16, value: &str) -> Result<Self, ParameterError> {
        let addr = parse_ip_addr(value)?;
        Ok(Self::write(parameter, u32::from(addr).to_be_bytes().to_vec()))
    }

    fn write(parameter: u16, value: Vec<u8>) -> Self {
        ParameterRequest {
            function_code: FC_WRITE,
            parameter,
            value,
        }
    }

    pub fn function_code(&self) -> u8 {
        self.function_code
    }

    pub fn parameter(&self) -> u16 {
        self.parameter
    }

    pub fn is_write(&self) -> bool {
        self.function_code == FC_WRITE
    }

    /// Serialize to the SHFT payload that the frame codecs wrap.
    pub fn to_pdu(&self) -> Vec<u8> {
        let mut pdu = Vec::with_capacity(4 + self.value.len());
        pdu.push(DEVICE_ADDRESS);
        pdu.push(self.function_code);
        pdu.push((self.parameter >> 8) as u8);
        pdu.push(self.parameter as u8);
        pdu.extend_from_slice(&self.value);
        pdu
    }
}

/// Parse dotted-quad notation; every octet must be a decimal in 0..=255.
pub fn parse_ip_addr(value: &str) -> Result<Ipv4Addr, ParameterError> {
    let invalid = || ParameterError::InvalidIpAddress(value.to_string());

    let parts: Vec<&str> = value.split('.').collect();
    if parts.len() != 4 {
        return Err(invalid());
    }

    let mut octets = [0u8; 4];
    for (octet, part) in octets.iter_mut().zip(parts) {
        *octet = part.trim().parse::<u8>().map_err(|_| invalid())?;
    }
    Ok(Ipv4Addr::from(octets))
}

fn word(pdu: &[u8]) -> Result<[u8; 4], ParameterError> {
    if pdu.len() != WORD_REPLY_LEN {
        return Err(ParameterError::InvalidResponseLength {
            expected: WORD_REPLY_LEN,
            actual: pdu.len(),
        });
    }
    let mut bytes = [0u8; 4];
    bytes.copy_from_slice(&pdu[VALUE_OFFSET..WORD_REPLY_LEN]);
    Ok(bytes)
}

pub fn decode_integer(pdu: &[u8]) -> Result<i32, ParameterError> {
    word(pdu).map(i32::from_be_bytes)
}

/// Decoded single precision value, rounded to six decimals.
pub fn decode_float(pdu: &[u8]) -> Result<f64, ParameterError> {
    word(pdu).map(|bytes| round6(f64::from(f32::from_be_bytes(bytes))))
}

pub fn decode_ip_addr(pdu: &[u8]) -> Result<Ipv4Addr, ParameterError> {
    word(pdu).map(|bytes| Ipv4Addr::from(u32::from_be_bytes(bytes)))
}

/// Byte 2 carries the character count; the characters follow at offset 3.
pub fn decode_string(pdu: &[u8]) -> Result<String, ParameterError> {
    if pdu.len() < VALUE_OFFSET {
        return Err(ParameterError::InvalidResponseLength {
            expected: VALUE_OFFSET,
            actual: pdu.len(),
        });
    }

    let declared = pdu[2] as usize;
    let available = pdu.len() - VALUE_OFFSET;
    if declared > available {
        return Err(ParameterError::StringOverrun { declared, available });
    }

    Ok(pdu[VALUE_OFFSET..VALUE_OFFSET + declared]
        .iter()
        .map(|&b| b as char)
        .collect())
}

fn round6(value: f64) -> f64 {
    (value * 1_000_000.0).round() / 1_000_000.0
}
