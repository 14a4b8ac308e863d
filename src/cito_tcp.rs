use super::*;

/// Bytes preceding the SHFT payload: transaction id, protocol id, length.
pub const HEADER_LEN: usize = 6;
pub const MIN_PAYLOAD_LEN: usize = 5;
pub const MAX_PAYLOAD_LEN: usize = 252;
/// Shortest reply worth inspecting: header plus address, function and one data byte.
const MIN_REPLY_LEN: usize = 9;
const RECEIVE_BUFFER_LEN: usize = 300;

/// Hands out 16-bit transaction ids, wrapping from 0xFFFF back to 0x0000.
#[derive(Debug, Clone, Default)]
pub struct TransactionSequencer {
    next: u16,
}

impl TransactionSequencer {
    pub fn new() -> Self {
        Self::starting_at(0)
    }

    pub fn starting_at(id: u16) -> Self {
        TransactionSequencer { next: id }
    }

    /// The id the next call to [`next_id`](Self::next_id) returns.
    pub fn peek(&self) -> u16 {
        self.next
    }

    pub fn next_id(&mut self) -> u16 {
        let id = self.next;
        self.next = self.next.wrapping_add(1);
        id
    }
}

/// Packet mode (Ethernet) framing
#[derive(Debug, Clone, Default)]
pub struct CitoTCP {
    sequencer: TransactionSequencer,
}

impl CitoTCP {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sequencer(sequencer: TransactionSequencer) -> Self {
        CitoTCP { sequencer }
    }

    pub fn sequencer(&self) -> &TransactionSequencer {
        &self.sequencer
    }

    /// Prefix `payload` with the six byte header.
    ///
    /// The length is checked before an id is taken, so a rejected payload
    /// leaves no gap in the sequence.
    pub fn wrap(&mut self, payload: &[u8]) -> Result<Vec<u8>, CitoError> {
        if payload.len() < MIN_PAYLOAD_LEN || payload.len() > MAX_PAYLOAD_LEN {
            return Err(CitoError::PayloadLength(payload.len()));
        }

        let transaction_id = self.sequencer.next_id();
        let length = payload.len() as u16;
        let mut frame = Vec::with_capacity(HEADER_LEN + payload.len());

        frame.push((transaction_id >> 8) as u8);
        frame.push(transaction_id as u8);
        frame.push(0x00);
        frame.push(0x00);
        frame.push((length >> 8) as u8);
        frame.push(length as u8);
        frame.extend_from_slice(payload);

        Ok(frame)
    }

    /// Strip the header, accepting the frame only when its size matches the length field.
    pub fn unwrap(&self, frame: &[u8]) -> Result<Vec<u8>, CitoError> {
        if frame.len() < MIN_REPLY_LEN {
            return Err(CitoError::InvalidReply(format!(
                "frame of {} bytes is too short",
                frame.len()
            )));
        }

        let length = ((frame[4] as usize) << 8) | frame[5] as usize;
        if frame.len() != length + HEADER_LEN {
            return Err(CitoError::InvalidReply(format!(
                "length field {} does not match {} received bytes",
                length,
                frame.len()
            )));
        }

        Ok(frame[HEADER_LEN..].to_vec())
    }

    /// One blocking read of up to 300 bytes.
    pub fn receive_frame<T: Transport + ?Sized>(
        &self,
        transport: &mut T,
    ) -> Result<Vec<u8>, CitoError> {
        let mut buf = [0u8; RECEIVE_BUFFER_LEN];
        let n = transport.receive(&mut buf)?;
        if n == 0 {
            return Err(CitoError::ReadTimeout);
        }
        Ok(buf[..n].to_vec())
    }
}
