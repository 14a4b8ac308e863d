use std::thread;
use std::time::{Duration, Instant};

use super::*;

const CRC_LEN: usize = 2;
/// A reply is not checked until it could hold address, function, one byte and the CRC.
const MIN_REPLY_LEN: usize = 5;
/// Pause between polls of the serial input buffer.
pub const POLL_INTERVAL: Duration = Duration::from_millis(2);
const READ_CHUNK_LEN: usize = 64;

/// Stream mode (RS-232) framing
#[derive(Debug, Clone)]
pub struct CitoRTU {
    timeout: Duration,
}

impl Default for CitoRTU {
    fn default() -> Self {
        Self::new()
    }
}

impl CitoRTU {
    pub fn new() -> Self {
        Self::with_timeout(STREAM_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        CitoRTU { timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Append the CRC16 of `payload`, low byte first.
    pub fn wrap(&self, payload: &[u8]) -> Vec<u8> {
        let mut frame = Vec::with_capacity(payload.len() + CRC_LEN);
        frame.extend_from_slice(payload);
        frame.extend_from_slice(&crc16_bytes(payload));
        frame
    }

    pub fn unwrap(&self, frame: &[u8]) -> Result<Vec<u8>, CitoError> {
        if !Self::is_complete(frame) {
            return Err(CitoError::InvalidReply(format!(
                "checksum mismatch in {} byte frame",
                frame.len()
            )));
        }
        Ok(frame[..frame.len() - CRC_LEN].to_vec())
    }

    /// True once the trailing two bytes are the CRC16 of everything before them.
    pub fn is_complete(frame: &[u8]) -> bool {
        if frame.len() < MIN_REPLY_LEN {
            return false;
        }
        let (body, crc) = frame.split_at(frame.len() - CRC_LEN);
        crc == crc16_bytes(body)
    }

    /// Accumulate bytes until a checksummed frame is buffered or the timeout expires.
    pub fn receive_frame<T: Transport + ?Sized>(
        &self,
        transport: &mut T,
    ) -> Result<Vec<u8>, CitoError> {
        let start = Instant::now();
        let mut frame = Vec::new();
        let mut chunk = [0u8; READ_CHUNK_LEN];

        loop {
            match transport.receive(&mut chunk) {
                Ok(n) => frame.extend_from_slice(&chunk[..n]),
                // A serial read timeout only means the line is quiet.
                Err(CitoError::ReadTimeout) => {}
                Err(err) => return Err(err),
            }

            if Self::is_complete(&frame) {
                return Ok(frame);
            }

            if start.elapsed() > self.timeout {
                tracing::debug!(received = %hex_string(&frame), "no valid checksum before timeout");
                return Err(CitoError::ReadTimeout);
            }
            thread::sleep(POLL_INTERVAL);
        }
    }
}
