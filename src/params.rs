//! Parameter numbers and command values of the Cito Plus generator.

pub const LABEL: u16 = 10;
pub const COMMAND: u16 = 1001;
pub const POWER_SETPOINT: u16 = 1206;
pub const IP_ADDRESS: u16 = 5100;

pub const STATE: u16 = 8000;
pub const RF_FREQUENCY: u16 = 8011;
pub const FORWARD_POWER: u16 = 8021;
pub const REFLECTED_POWER: u16 = 8022;
pub const LOAD_POWER: u16 = 8023;
pub const CEX_FREQUENCY: u16 = 8041;

/// Error texts live on odd numbers 8101..=8131, each followed by its state.
pub const ERROR_TEXT_FIRST: u16 = 8101;
pub const ERROR_TEXT_SLOTS: u16 = 16;
pub const ERROR_NUMBER_FIRST: u16 = 8133;
pub const ERROR_NUMBER_SLOTS: u16 = 17;
/// State of the n-th error number slot is at `ERROR_STATE_FIRST + 2 * n`.
pub const ERROR_STATE_FIRST: u16 = 8102;
pub const WARNING_TEXT_FIRST: u16 = 8151;
pub const WARNING_NUMBER_FIRST: u16 = 8167;
pub const WARNING_SLOTS: u16 = 16;

pub const CMD_RF_OFF: i32 = 0;
pub const CMD_RF_ON: i32 = 1;
/// Clears errors in state "revoked"; "enduring" and "persistent" ones stay.
pub const CMD_RESET: i32 = 9;

/// Monitor and setpoint values are transferred scaled by 1000.
pub const VALUE_SCALE: i32 = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RfStatus {
    Init,
    RfOff,
    RfOn,
    Error,
    Calibration,
    Update,
    Blocked,
    Undefined(i32),
}

impl RfStatus {
    pub fn from_raw(value: i32) -> Self {
        match value {
            0 => RfStatus::Init,
            1 => RfStatus::RfOff,
            2 => RfStatus::RfOn,
            3 => RfStatus::Error,
            4 => RfStatus::Calibration,
            5 => RfStatus::Update,
            6 => RfStatus::Blocked,
            other => RfStatus::Undefined(other),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RfStatus::Init => "Init",
            RfStatus::RfOff => "RF off",
            RfStatus::RfOn => "RF on",
            RfStatus::Error => "Error",
            RfStatus::Calibration => "Calibration",
            RfStatus::Update => "Update",
            RfStatus::Blocked => "Blocked",
            RfStatus::Undefined(_) => "Undefined",
        }
    }
}
