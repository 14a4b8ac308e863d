//! Exception codes and reply classification.
//!
//! Two tables are kept. [`MODBUS_EXCEPTION_CODES`] is what the generator
//! actually reports and is the one [`decode_exception_code`] consults.
//! [`SHFT_EXCEPTION_CODES`] is the parameter fault table from the SHFT
//! protocol description; current firmware sends those faults with the high
//! bit set (0x84 rather than 0x04), so the two tables disagree for
//! 0x01..=0x0C. They are intentionally not merged.

use std::fmt;

use crate::core::{FC_EXCEPTION_FLAG, FC_READ, FC_WRITE};
use crate::CitoError;

pub const UNKNOWN_EXCEPTION_CODE: &str = "UNKNOWN_EXCEPTION_CODE";

pub static MODBUS_EXCEPTION_CODES: [(u8, &str); 40] = [
    (0x00, "NO_ERRORS"),
    (0x01, "EXCEPT_ILLEGAL_FUNCTION"),
    (0x02, "EXCEPT_ILLEGAL_DATA_ADDRESS"),
    (0x03, "EXCEPT_ILLEGAL_DATA_VALUE"),
    (0x04, "EXCEPT_SLAVE_DEVICE_FAILURE"),
    (0x05, "EXCEPT_ACKNOWLEDGE"),
    (0x06, "EXCEPT_SLAVE_DEVICE_BUSY"),
    (0x07, "EXCEPT_NEGATIVE_ACKNOWLEDGE"),
    (0x08, "EXCEPT_MEMORY_PARITY_ERROR"),
    (0x0A, "EXCEPT_GATEWAY_PATH_UNAVAILABLE"),
    (0x0B, "EXCEPT_GATEWAY_TARGET_DEVICE_FAILED_TO_RESPOND"),
    (0x81, "SHFT_PARAFAULT_UNKNOWN_PARAMETER"),
    (0x82, "SHFT_PARAFAULT_INDEX"),
    (0x83, "SHFT_PARAFAULT_INDEX_MAX"),
    (0x84, "SHFT_PARAFAULT_VALUE_INVALID"),
    (0x85, "SHFT_PARAFAULT_NOT_WRITEABLE"),
    (0x86, "SHFT_PARAFAULT_NOT_READABLE"),
    (0x87, "SHFT_PARAFAULT_STOP"),
    (0x88, "SHFT_PARAFAULT_NOT_ALLOWED"),
    (0x89, "SHFT_PARAFAULT_TYPE"),
    (0x8A, "SHFT_PARAFAULT_INTERNAL"),
    (0x8B, "SHFT_PARAFAULT_VALUE_OVL"),
    (0x8C, "SHFT_PARAFAULT_VALUE_NOVL"),
    (0xC1, "ISOCKET_INVALID_ARGUMENT"),
    (0xC2, "ISOCKET_READ_ERROR"),
    (0xC3, "ISOCKET_WRITE_ERROR"),
    (0xC4, "ISOCKET_WRITE_TIMEOUT"),
    (0xC5, "ISOCKET_READ_TIMEOUT"),
    (0xC6, "ISOCKET_INVALID_REPLY"),
    (0xD1, "RFGENTHR_PARAMETER_INVALID"),
    (0xD2, "RFGENTHR_PARAMETER_INVALID_CASE_READ"),
    (0xD3, "RFGENTHR_PARAMETER_INVALID_CASE_WRITE"),
    (0xD4, "RFGENTHR_PARAMETER_TOO_MANY_PARAINFOS"),
    (0xD5, "RFGENTHR_PARAMETER_STOP_REQUESTED"),
    (0xD6, "RFGENTHR_PARAMETER_CANCELED"),
    (0xD7, "RFGENTHR_TIMEOUT"),
    (0xE1, "DLL_NO_FREE_HANDLE"),
    (0xE2, "DLL_CREATE_CONNECTION_FAILED"),
    (0xE3, "DLL_INVALID_HANDLE"),
    (0xE4, "DLL_INVALID_PARAMETER"),
];

// TODO: drop once the generator firmware reports plain SHFT fault codes (ECR0100).
pub static SHFT_EXCEPTION_CODES: [(u8, &str); 11] = [
    (0x00, "No errors"),
    (0x01, "Unknown parameter or illegal function code"),
    (0x04, "Value invalid"),
    (0x05, "Parameter not writeable"),
    (0x06, "Parameter not readable"),
    (0x07, "Stop"),
    (0x08, "Not allowed"),
    (0x09, "Wrong data type"),
    (0x0A, "Internal error"),
    (0x0B, "Value too high"),
    (0x0C, "Value too low"),
];

fn lookup(table: &'static [(u8, &'static str)], code: u8) -> Option<&'static str> {
    table
        .iter()
        .find(|(entry, _)| *entry == code)
        .map(|(_, name)| *name)
}

/// Clear text name of an exception code, `UNKNOWN_EXCEPTION_CODE` when unmapped.
pub fn decode_exception_code(code: u8) -> &'static str {
    lookup(&MODBUS_EXCEPTION_CODES, code).unwrap_or(UNKNOWN_EXCEPTION_CODE)
}

pub fn shft_exception_description(code: u8) -> Option<&'static str> {
    lookup(&SHFT_EXCEPTION_CODES, code)
}

/// Single byte status of a transaction. Zero means success.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ExceptionCode(pub u8);

impl ExceptionCode {
    pub const SUCCESS: ExceptionCode = ExceptionCode(0x00);
    pub const VALUE_INVALID: ExceptionCode = ExceptionCode(0x04);
    pub const INVALID_ARGUMENT: ExceptionCode = ExceptionCode(0xC1);
    pub const READ_ERROR: ExceptionCode = ExceptionCode(0xC2);
    pub const WRITE_ERROR: ExceptionCode = ExceptionCode(0xC3);
    pub const WRITE_TIMEOUT: ExceptionCode = ExceptionCode(0xC4);
    pub const READ_TIMEOUT: ExceptionCode = ExceptionCode(0xC5);
    pub const INVALID_REPLY: ExceptionCode = ExceptionCode(0xC6);
    pub const CONNECTION_FAILED: ExceptionCode = ExceptionCode(0xE2);
    pub const INVALID_HANDLE: ExceptionCode = ExceptionCode(0xE3);
    pub const PROTOCOL_VIOLATION: ExceptionCode = ExceptionCode(0xFF);

    pub fn is_success(self) -> bool {
        self.0 == 0
    }

    pub fn name(self) -> &'static str {
        decode_exception_code(self.0)
    }

    /// Timeouts may succeed when re-issued; everything else is terminal.
    pub fn is_timeout(self) -> bool {
        self == Self::READ_TIMEOUT || self == Self::WRITE_TIMEOUT
    }
}

impl fmt::Display for ExceptionCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#04x} ({})", self.0, self.name())
    }
}

/// Classify a reply against the request that produced it.
///
/// `sent` and `received` are the complete frames including transport
/// framing; `payload` is the SHFT part of `received`.
pub fn classify_reply(
    request_function_code: u8,
    sent: &[u8],
    received: &[u8],
    payload: &[u8],
) -> Result<(), CitoError> {
    let function_code = match payload.get(1) {
        Some(&fc) => fc,
        None => {
            return Err(CitoError::InvalidReply(format!(
                "reply of {} bytes carries no function code",
                payload.len()
            )));
        }
    };

    match function_code {
        FC_READ => Ok(()),
        FC_WRITE if received == sent => Ok(()),
        FC_WRITE => Err(CitoError::InvalidReply(
            "write echo differs from request".to_string(),
        )),
        fc if fc == request_function_code.wrapping_add(FC_EXCEPTION_FLAG) => {
            match payload.get(2) {
                Some(&0) | None => Err(CitoError::InvalidReply(
                    "exception reply without exception code".to_string(),
                )),
                Some(&code) => Err(CitoError::Device(ExceptionCode(code))),
            }
        }
        fc => Err(CitoError::ProtocolViolation(fc)),
    }
}
