use std::net::Ipv4Addr;

use tracing::{debug, warn};

use super::*;
use crate::params::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportMode {
    Packet,
    Stream,
}

impl From<&ConnectionConfig> for TransportMode {
    fn from(config: &ConnectionConfig) -> Self {
        match config {
            ConnectionConfig::Packet { .. } => TransportMode::Packet,
            ConnectionConfig::Stream { .. } => TransportMode::Stream,
        }
    }
}

/// Frame codec matching the transport mode.
#[derive(Debug, Clone)]
pub enum Framing {
    Packet(CitoTCP),
    Stream(CitoRTU),
}

impl Framing {
    pub fn for_mode(mode: TransportMode) -> Self {
        match mode {
            TransportMode::Packet => Framing::Packet(CitoTCP::new()),
            TransportMode::Stream => Framing::Stream(CitoRTU::new()),
        }
    }

    pub fn wrap(&mut self, payload: &[u8]) -> Result<Vec<u8>, CitoError> {
        match self {
            Framing::Packet(tcp) => tcp.wrap(payload),
            Framing::Stream(rtu) => Ok(rtu.wrap(payload)),
        }
    }

    pub fn unwrap(&self, frame: &[u8]) -> Result<Vec<u8>, CitoError> {
        match self {
            Framing::Packet(tcp) => tcp.unwrap(frame),
            Framing::Stream(rtu) => rtu.unwrap(frame),
        }
    }

    pub fn receive_frame<T: Transport + ?Sized>(
        &self,
        transport: &mut T,
    ) -> Result<Vec<u8>, CitoError> {
        match self {
            Framing::Packet(tcp) => tcp.receive_frame(transport),
            Framing::Stream(rtu) => rtu.receive_frame(transport),
        }
    }
}

pub struct CitoClientBuilder {
    host: Option<String>,
    mode: Option<TransportMode>,
    port: Option<u16>,
    baud_rate: Option<u32>,
    parity: Option<Parity>,
    stop_bits: Option<StopBits>,
    data_bits: Option<DataBits>,
}

impl CitoClientBuilder {
    /// Connect over Ethernet to `host` (IP address or host name).
    pub fn ethernet(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self.mode = Some(TransportMode::Packet);
        self
    }

    /// Connect over RS-232 through `device` (e.g. "/dev/ttyUSB0" or "COM5").
    pub fn serial(mut self, device: impl Into<String>) -> Self {
        self.host = Some(device.into());
        self.mode = Some(TransportMode::Stream);
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    pub fn baud_rate(mut self, baud_rate: u32) -> Self {
        self.baud_rate = Some(baud_rate);
        self
    }

    pub fn parity(mut self, parity: Parity) -> Self {
        self.parity = Some(parity);
        self
    }

    pub fn stop_bits(mut self, stop_bits: StopBits) -> Self {
        self.stop_bits = Some(stop_bits);
        self
    }

    pub fn data_bits(mut self, data_bits: DataBits) -> Self {
        self.data_bits = Some(data_bits);
        self
    }

    pub fn build_config(self) -> Result<ConnectionConfig, CitoError> {
        let host = self.host.ok_or(CitoError::HostMissing)?;
        let config = match self.mode.unwrap_or(TransportMode::Packet) {
            TransportMode::Packet => ConnectionConfig::Packet {
                host,
                port: self.port.unwrap_or(DEFAULT_PORT),
            },
            TransportMode::Stream => ConnectionConfig::Stream {
                device: host,
                baud_rate: self.baud_rate.unwrap_or(DEFAULT_BAUD_RATE),
                parity: self.parity.unwrap_or_default(),
                stop_bits: self.stop_bits.unwrap_or_default(),
                data_bits: self.data_bits.unwrap_or_default(),
            },
        };
        config.validate()?;
        Ok(config)
    }

    pub fn build(self) -> Result<CitoClient<Link>, CitoError> {
        CitoClient::from_config(&self.build_config()?)
    }
}

/// Client for a Cito Plus RF generator.
///
/// Created closed; call [`open`](Self::open) before any parameter access.
/// One transaction runs to completion before the next starts.
pub struct CitoClient<T: Transport> {
    transport: T,
    framing: Framing,
}

impl CitoClient<Link> {
    pub fn builder() -> CitoClientBuilder {
        CitoClientBuilder {
            host: None,
            mode: None,
            port: None,
            baud_rate: None,
            parity: None,
            stop_bits: None,
            data_bits: None,
        }
    }

    pub fn from_config(config: &ConnectionConfig) -> Result<Self, CitoError> {
        config.validate()?;
        Ok(CitoClient::with_transport(Link::from(config), TransportMode::from(config)))
    }
}

impl<T: Transport> CitoClient<T> {
    pub fn with_transport(transport: T, mode: TransportMode) -> Self {
        CitoClient {
            transport,
            framing: Framing::for_mode(mode),
        }
    }

    pub fn with_framing(transport: T, framing: Framing) -> Self {
        CitoClient { transport, framing }
    }

    pub fn mode(&self) -> TransportMode {
        match self.framing {
            Framing::Packet(_) => TransportMode::Packet,
            Framing::Stream(_) => TransportMode::Stream,
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn try_open(&mut self) -> Result<(), CitoError> {
        self.transport.open()
    }

    /// Open the connection. Returns false when it could not be established.
    pub fn open(&mut self) -> bool {
        self.try_open().is_ok()
    }

    pub fn is_open(&self) -> bool {
        self.transport.is_open()
    }

    pub fn close(&mut self) {
        self.transport.close();
    }

    /// Send one request and return the SHFT payload of the checked reply.
    fn exchange(&mut self, request: &ParameterRequest) -> Result<Vec<u8>, CitoError> {
        if !self.transport.is_open() {
            return Err(CitoError::NotOpen);
        }

        let frame = self.framing.wrap(&request.to_pdu())?;
        debug!(parameter = request.parameter(), tx = %hex_string(&frame), "sending");

        if let Err(err) = self
            .transport
            .discard_input()
            .and_then(|_| self.transport.send(&frame))
        {
            warn!(parameter = request.parameter(), %err, "send failed");
            return Err(err);
        }

        let received = match self.framing.receive_frame(&mut self.transport) {
            Ok(received) => received,
            Err(err) => {
                warn!(parameter = request.parameter(), %err, "receive failed");
                return Err(err);
            }
        };
        debug!(parameter = request.parameter(), rx = %hex_string(&received), "received");

        let payload = self.framing.unwrap(&received)?;
        classify_reply(request.function_code(), &frame, &received, &payload)?;
        Ok(payload)
    }

    fn write(&mut self, request: ParameterRequest) -> Result<(), CitoError> {
        self.exchange(&request).map(|_| ())
    }

    pub fn read_integer(&mut self, parameter: u16) -> Result<i32, CitoError> {
        let payload = self.exchange(&ParameterRequest::read(parameter))?;
        Ok(decode_integer(&payload)?)
    }

    pub fn read_float(&mut self, parameter: u16) -> Result<f64, CitoError> {
        let payload = self.exchange(&ParameterRequest::read(parameter))?;
        Ok(decode_float(&payload)?)
    }

    pub fn read_string(&mut self, parameter: u16) -> Result<String, CitoError> {
        let payload = self.exchange(&ParameterRequest::read(parameter))?;
        Ok(decode_string(&payload)?)
    }

    /// IP address in dotted notation, e.g. "169.254.1.1".
    pub fn read_ip_addr(&mut self, parameter: u16) -> Result<String, CitoError> {
        let payload = self.exchange(&ParameterRequest::read(parameter))?;
        let addr: Ipv4Addr = decode_ip_addr(&payload)?;
        Ok(addr.to_string())
    }

    pub fn write_integer(&mut self, parameter: u16, value: i32) -> Result<(), CitoError> {
        self.write(ParameterRequest::write_integer(parameter, value))
    }

    pub fn write_float(&mut self, parameter: u16, value: f64) -> Result<(), CitoError> {
        self.write(ParameterRequest::write_float(parameter, value))
    }

    pub fn write_string(&mut self, parameter: u16, value: &str) -> Result<(), CitoError> {
        self.write(ParameterRequest::write_string(parameter, value)?)
    }

    /// Malformed addresses fail with 0x04 before anything is sent.
    pub fn write_ip_addr(&mut self, parameter: u16, value: &str) -> Result<(), CitoError> {
        self.write(ParameterRequest::write_ip_addr(parameter, value)?)
    }

    /// Turn RF on, or off when `enable` is false.
    pub fn set_rf_on(&mut self, enable: bool) -> Result<(), CitoError> {
        let command = if enable { CMD_RF_ON } else { CMD_RF_OFF };
        self.write_integer(COMMAND, command)
    }

    /// Turn RF off, or on when `disable` is false.
    pub fn set_rf_off(&mut self, disable: bool) -> Result<(), CitoError> {
        self.set_rf_on(!disable)
    }

    pub fn reset_errors(&mut self) -> Result<(), CitoError> {
        self.write_integer(COMMAND, CMD_RESET)
    }

    pub fn set_power_setpoint_watts(&mut self, watts: i32) -> Result<(), CitoError> {
        let scaled = watts.checked_mul(VALUE_SCALE).ok_or_else(|| {
            ParameterError::InvalidValue(format!("{} W exceeds the setpoint range", watts))
        })?;
        self.write_integer(POWER_SETPOINT, scaled)
    }

    pub fn get_power_setpoint_watts(&mut self) -> Result<i32, CitoError> {
        self.read_scaled(POWER_SETPOINT)
    }

    /// RF frequency in kHz.
    pub fn get_rf_frequency(&mut self) -> Result<i32, CitoError> {
        self.read_scaled(RF_FREQUENCY)
    }

    /// CEX frequency in kHz.
    pub fn get_cex_frequency(&mut self) -> Result<i32, CitoError> {
        self.read_scaled(CEX_FREQUENCY)
    }

    pub fn get_forward_power_watts(&mut self) -> Result<i32, CitoError> {
        self.read_scaled(FORWARD_POWER)
    }

    pub fn get_reflected_power_watts(&mut self) -> Result<i32, CitoError> {
        self.read_scaled(REFLECTED_POWER)
    }

    pub fn get_load_power_watts(&mut self) -> Result<i32, CitoError> {
        self.read_scaled(LOAD_POWER)
    }

    // Integer division truncates toward zero.
    fn read_scaled(&mut self, parameter: u16) -> Result<i32, CitoError> {
        self.read_integer(parameter).map(|value| value / VALUE_SCALE)
    }

    pub fn get_rf_status_int(&mut self) -> Result<i32, CitoError> {
        self.read_integer(STATE)
    }

    pub fn get_rf_status(&mut self) -> Result<RfStatus, CitoError> {
        self.get_rf_status_int().map(RfStatus::from_raw)
    }

    pub fn get_rf_status_string(&mut self) -> Result<&'static str, CitoError> {
        self.get_rf_status().map(|status| status.as_str())
    }

    /// Status of an active error slot. A failed read counts as state 0.
    fn read_error_state(&mut self, parameter: u16) -> i32 {
        self.read_integer(parameter).unwrap_or_else(|err| {
            warn!(parameter, %err, "error state unreadable");
            0
        })
    }

    /// Active errors as (text, state) pairs in slot order.
    pub fn read_errors_as_text(&mut self) -> Result<Vec<(String, i32)>, CitoError> {
        self.ensure_open()?;
        let mut errors = Vec::new();
        for slot in 0..ERROR_TEXT_SLOTS {
            let parameter = ERROR_TEXT_FIRST + 2 * slot;
            match self.read_string(parameter) {
                Ok(text) if !text.is_empty() => {
                    let state = self.read_error_state(parameter + 1);
                    errors.push((text, state));
                }
                Ok(_) => {}
                Err(err) => debug!(parameter, %err, "error slot skipped"),
            }
        }
        Ok(errors)
    }

    /// Active errors as (number, state) pairs in slot order.
    pub fn read_errors_as_numbers(&mut self) -> Result<Vec<(i32, i32)>, CitoError> {
        self.ensure_open()?;
        let mut errors = Vec::new();
        for slot in 0..ERROR_NUMBER_SLOTS {
            let parameter = ERROR_NUMBER_FIRST + slot;
            match self.read_integer(parameter) {
                Ok(number) if number > 0 => {
                    let state = self.read_error_state(ERROR_STATE_FIRST + 2 * slot);
                    errors.push((number, state));
                }
                Ok(_) => {}
                Err(err) => debug!(parameter, %err, "error slot skipped"),
            }
        }
        Ok(errors)
    }

    pub fn read_warnings_as_text(&mut self) -> Result<Vec<String>, CitoError> {
        self.ensure_open()?;
        let mut warnings = Vec::new();
        for parameter in WARNING_TEXT_FIRST..WARNING_TEXT_FIRST + WARNING_SLOTS {
            match self.read_string(parameter) {
                Ok(text) if !text.is_empty() => warnings.push(text),
                Ok(_) => {}
                Err(err) => debug!(parameter, %err, "warning slot skipped"),
            }
        }
        Ok(warnings)
    }

    pub fn read_warnings_as_numbers(&mut self) -> Result<Vec<i32>, CitoError> {
        self.ensure_open()?;
        let mut warnings = Vec::new();
        for parameter in WARNING_NUMBER_FIRST..WARNING_NUMBER_FIRST + WARNING_SLOTS {
            match self.read_integer(parameter) {
                Ok(number) if number > 0 => warnings.push(number),
                Ok(_) => {}
                Err(err) => debug!(parameter, %err, "warning slot skipped"),
            }
        }
        Ok(warnings)
    }

    fn ensure_open(&self) -> Result<(), CitoError> {
        if self.transport.is_open() {
            Ok(())
        } else {
            Err(CitoError::NotOpen)
        }
    }
}
