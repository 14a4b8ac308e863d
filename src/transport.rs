//! Byte level transports: a TCP socket for packet mode and a serial port for
//! stream mode.

use std::io::{self, Read, Write};
use std::net::{Shutdown, TcpStream, ToSocketAddrs};
use std::time::Duration;

use serialport::{ClearBuffer, SerialPort};
use tracing::{info, warn};

use crate::config::{
    ConnectionConfig, DataBits, Parity, StopBits, PACKET_TIMEOUT, STREAM_TIMEOUT,
};
use crate::CitoError;

/// Blocking, timeout bounded byte transport owned by one client.
pub trait Transport {
    fn open(&mut self) -> Result<(), CitoError>;

    fn is_open(&self) -> bool;

    /// Release the handle. Calling it on a closed transport does nothing.
    fn close(&mut self);

    /// Drop bytes still waiting from an earlier exchange, such as a reply
    /// that arrived after its request timed out. Called before every send.
    fn discard_input(&mut self) -> Result<(), CitoError> {
        Ok(())
    }

    fn send(&mut self, data: &[u8]) -> Result<(), CitoError>;

    /// Read whatever is available into `buf`.
    ///
    /// `Ok(0)` means nothing has arrived yet; stream mode polls on it.
    fn receive(&mut self, buf: &mut [u8]) -> Result<usize, CitoError>;
}

fn is_timeout(err: &io::Error) -> bool {
    matches!(err.kind(), io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock)
}

fn write_error(err: io::Error) -> CitoError {
    if is_timeout(&err) {
        CitoError::WriteTimeout
    } else {
        CitoError::WriteError(err.to_string())
    }
}

fn read_error(err: io::Error) -> CitoError {
    if is_timeout(&err) {
        CitoError::ReadTimeout
    } else {
        CitoError::ReadError(err.to_string())
    }
}

/// Packet mode socket.
///
/// Connect, read and write are bounded by [`PACKET_TIMEOUT`]. A host name is
/// resolved through the system resolver first, which the timeout does not
/// cover; configure an IP address where `open` must return within it.
pub struct TcpTransport {
    host: String,
    port: u16,
    timeout: Duration,
    stream: Option<TcpStream>,
}

impl TcpTransport {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        TcpTransport {
            host: host.into(),
            port,
            timeout: PACKET_TIMEOUT,
            stream: None,
        }
    }

    fn connect(&self) -> io::Result<TcpStream> {
        let mut last_err = io::Error::new(io::ErrorKind::NotFound, "host resolved to no address");
        for addr in (self.host.as_str(), self.port).to_socket_addrs()? {
            match TcpStream::connect_timeout(&addr, self.timeout) {
                Ok(stream) => {
                    stream.set_read_timeout(Some(self.timeout))?;
                    stream.set_write_timeout(Some(self.timeout))?;
                    stream.set_nodelay(true)?;
                    return Ok(stream);
                }
                Err(err) => last_err = err,
            }
        }
        Err(last_err)
    }
}

impl Transport for TcpTransport {
    fn open(&mut self) -> Result<(), CitoError> {
        self.close();
        let stream = self.connect().map_err(|err| {
            warn!(host = %self.host, port = self.port, %err, "connection failed");
            CitoError::ConnectionFailed(err.to_string())
        })?;
        info!(host = %self.host, port = self.port, "connected");
        self.stream = Some(stream);
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.stream.is_some()
    }

    fn close(&mut self) {
        if let Some(stream) = self.stream.take() {
            if let Err(err) = stream.shutdown(Shutdown::Both) {
                warn!(host = %self.host, %err, "shutdown failed");
            }
            info!(host = %self.host, "connection closed");
        }
    }

    fn send(&mut self, data: &[u8]) -> Result<(), CitoError> {
        let stream = self.stream.as_mut().ok_or(CitoError::NotOpen)?;
        stream.write_all(data).map_err(write_error)
    }

    fn receive(&mut self, buf: &mut [u8]) -> Result<usize, CitoError> {
        let stream = self.stream.as_mut().ok_or(CitoError::NotOpen)?;
        match stream.read(buf) {
            Ok(0) => Err(CitoError::ReadError("connection closed by peer".to_string())),
            Ok(n) => Ok(n),
            Err(err) => Err(read_error(err)),
        }
    }
}

pub struct SerialTransport {
    device: String,
    baud_rate: u32,
    parity: Parity,
    stop_bits: StopBits,
    data_bits: DataBits,
    timeout: Duration,
    port: Option<Box<dyn SerialPort>>,
}

impl SerialTransport {
    pub fn new(
        device: impl Into<String>,
        baud_rate: u32,
        parity: Parity,
        stop_bits: StopBits,
        data_bits: DataBits,
    ) -> Self {
        SerialTransport {
            device: device.into(),
            baud_rate,
            parity,
            stop_bits,
            data_bits,
            timeout: STREAM_TIMEOUT,
            port: None,
        }
    }
}

impl Transport for SerialTransport {
    fn open(&mut self) -> Result<(), CitoError> {
        self.close();
        let port = serialport::new(self.device.as_str(), self.baud_rate)
            .parity(self.parity.into())
            .stop_bits(self.stop_bits.into())
            .data_bits(self.data_bits.into())
            .timeout(self.timeout)
            .open()
            .map_err(|err| {
                warn!(device = %self.device, %err, "serial port open failed");
                CitoError::ConnectionFailed(err.to_string())
            })?;
        info!(device = %self.device, baud_rate = self.baud_rate, "serial port opened");
        self.port = Some(port);
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.port.is_some()
    }

    fn close(&mut self) {
        if self.port.take().is_some() {
            info!(device = %self.device, "serial port closed");
        }
    }

    fn discard_input(&mut self) -> Result<(), CitoError> {
        let port = self.port.as_mut().ok_or(CitoError::NotOpen)?;
        port.clear(ClearBuffer::Input).map_err(|err| CitoError::ReadError(err.to_string()))
    }

    fn send(&mut self, data: &[u8]) -> Result<(), CitoError> {
        let port = self.port.as_mut().ok_or(CitoError::NotOpen)?;
        port.write_all(data).map_err(write_error)?;
        port.flush().map_err(write_error)
    }

    fn receive(&mut self, buf: &mut [u8]) -> Result<usize, CitoError> {
        let port = self.port.as_mut().ok_or(CitoError::NotOpen)?;
        let waiting = port
            .bytes_to_read()
            .map_err(|err| CitoError::ReadError(err.to_string()))? as usize;
        if waiting == 0 {
            return Ok(0);
        }
        let len = waiting.min(buf.len());
        port.read(&mut buf[..len]).map_err(read_error)
    }
}

/// The transport selected by a [`ConnectionConfig`].
pub enum Link {
    Tcp(TcpTransport),
    Serial(SerialTransport),
}

impl From<&ConnectionConfig> for Link {
    fn from(config: &ConnectionConfig) -> Self {
        match config {
            ConnectionConfig::Packet { host, port } => {
                Link::Tcp(TcpTransport::new(host.clone(), *port))
            }
            ConnectionConfig::Stream {
                device,
                baud_rate,
                parity,
                stop_bits,
                data_bits,
            } => Link::Serial(SerialTransport::new(
                device.clone(),
                *baud_rate,
                *parity,
                *stop_bits,
                *data_bits,
            )),
        }
    }
}

impl Transport for Link {
    fn open(&mut self) -> Result<(), CitoError> {
        match self {
            Link::Tcp(t) => t.open(),
            Link::Serial(t) => t.open(),
        }
    }

    fn is_open(&self) -> bool {
        match self {
            Link::Tcp(t) => t.is_open(),
            Link::Serial(t) => t.is_open(),
        }
    }

    fn close(&mut self) {
        match self {
            Link::Tcp(t) => t.close(),
            Link::Serial(t) => t.close(),
        }
    }

    fn discard_input(&mut self) -> Result<(), CitoError> {
        match self {
            Link::Tcp(t) => t.discard_input(),
            Link::Serial(t) => t.discard_input(),
        }
    }

    fn send(&mut self, data: &[u8]) -> Result<(), CitoError> {
        match self {
            Link::Tcp(t) => t.send(data),
            Link::Serial(t) => t.send(data),
        }
    }

    fn receive(&mut self, buf: &mut [u8]) -> Result<usize, CitoError> {
        match self {
            Link::Tcp(t) => t.receive(buf),
            Link::Serial(t) => t.receive(buf),
        }
    }
}
