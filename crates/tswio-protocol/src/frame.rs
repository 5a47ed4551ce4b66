//! Cursor helpers for reading and writing message bodies

use crate::{ProtocolError, ProtocolResult};

/// Reads little-endian fields from a complete message buffer.
///
/// Running off the end of the buffer is an [`ProtocolError::InvalidMessage`];
/// so is leaving bytes behind, which [`finish`](Self::finish) checks.
pub struct FrameReader<'a> {
    buffer: &'a [u8],
    position: usize,
}

impl<'a> FrameReader<'a> {
    pub fn new(buffer: &'a [u8]) -> Self {
        Self {
            buffer,
            position: 0,
        }
    }

    pub fn remaining(&self) -> usize {
        self.buffer.len().saturating_sub(self.position)
    }

    pub fn read_u8(&mut self) -> ProtocolResult<u8> {
        let value = *self
            .buffer
            .get(self.position)
            .ok_or(ProtocolError::InvalidMessage)?;
        self.position += 1;
        Ok(value)
    }

    pub fn read_u16_le(&mut self) -> ProtocolResult<u16> {
        let bytes = self.read_array::<2>()?;
        Ok(u16::from_le_bytes(bytes))
    }

    pub fn read_i16_le(&mut self) -> ProtocolResult<i16> {
        let bytes = self.read_array::<2>()?;
        Ok(i16::from_le_bytes(bytes))
    }

    pub fn read_u32_le(&mut self) -> ProtocolResult<u32> {
        let bytes = self.read_array::<4>()?;
        Ok(u32::from_le_bytes(bytes))
    }

    pub fn read_bytes(&mut self, count: usize) -> ProtocolResult<&'a [u8]> {
        let end = self
            .position
            .checked_add(count)
            .ok_or(ProtocolError::InvalidMessage)?;
        let slice = self
            .buffer
            .get(self.position..end)
            .ok_or(ProtocolError::InvalidMessage)?;
        self.position = end;
        Ok(slice)
    }

    fn read_array<const N: usize>(&mut self) -> ProtocolResult<[u8; N]> {
        let slice = self.read_bytes(N)?;
        let mut out = [0u8; N];
        out.copy_from_slice(slice);
        Ok(out)
    }

    /// Fails when unread bytes remain.
    pub fn finish(self) -> ProtocolResult<()> {
        if self.remaining() == 0 {
            Ok(())
        } else {
            Err(ProtocolError::InvalidMessage)
        }
    }
}

/// Builds a message buffer field by field.
#[derive(Debug, Default)]
pub struct FrameWriter {
    buffer: Vec<u8>,
}

impl FrameWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(capacity),
        }
    }

    pub fn write_u8(&mut self, value: u8) -> &mut Self {
        self.buffer.push(value);
        self
    }

    pub fn write_u16_le(&mut self, value: u16) -> &mut Self {
        self.buffer.extend_from_slice(&value.to_le_bytes());
        self
    }

    pub fn write_i16_le(&mut self, value: i16) -> &mut Self {
        self.buffer.extend_from_slice(&value.to_le_bytes());
        self
    }

    pub fn write_u32_le(&mut self, value: u32) -> &mut Self {
        self.buffer.extend_from_slice(&value.to_le_bytes());
        self
    }

    pub fn write_bytes(&mut self, data: &[u8]) -> &mut Self {
        self.buffer.extend_from_slice(data);
        self
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.buffer
    }
}
