//! Byte-level message codec.
//!
//! All multi-byte fields are big-endian (network order). Reads are length
//! checked and fail with [`ParseError::Truncated`] instead of panicking;
//! sessions drop malformed messages silently.

use bytes::{Buf, BufMut, Bytes, BytesMut};
use glam::Vec2;
use thiserror::Error;

/// Version carried in the connect handshake. A mismatch aborts the
/// connection before a slot is assigned.
pub const PROTOCOL_VERSION: i32 = 4;

/// Default server port.
pub const PORT_SERVER: u16 = 27910;

/// Server-to-client message types, one per record in a transmission.
pub mod msg {
    pub const NONE: u8 = 0;
    pub const FRAME: u8 = 1;
    pub const SOUND: u8 = 2;
    pub const EFFECT: u8 = 3;
}

/// Client-to-server command bytes.
pub mod clc {
    pub const COMMAND: u8 = 1;
    pub const DISCONNECT: u8 = 2;
    pub const UPGRADE: u8 = 3;
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("message truncated")]
    Truncated,
    #[error("unknown message type {0}")]
    UnknownType(u8),
}

/// Growable big-endian message writer.
#[derive(Debug, Default)]
pub struct MessageWriter {
    buf: BytesMut,
}

impl MessageWriter {
    pub fn new() -> MessageWriter {
        MessageWriter::default()
    }

    pub fn write_u8(&mut self, value: u8) {
        self.buf.put_u8(value);
    }

    pub fn write_i32(&mut self, value: i32) {
        self.buf.put_i32(value);
    }

    pub fn write_f32(&mut self, value: f32) {
        self.buf.put_f32(value);
    }

    pub fn write_vec2(&mut self, value: Vec2) {
        self.write_f32(value.x);
        self.write_f32(value.y);
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.buf
    }

    /// Drain the accumulated bytes, leaving the writer empty.
    pub fn take(&mut self) -> Bytes {
        self.buf.split().freeze()
    }

    pub fn clear(&mut self) {
        self.buf.clear();
    }
}

/// Length-checked big-endian reader over a received message.
#[derive(Debug, Clone)]
pub struct MessageReader<'a> {
    data: &'a [u8],
}

impl<'a> MessageReader<'a> {
    pub fn new(data: &'a [u8]) -> MessageReader<'a> {
        MessageReader { data }
    }

    pub fn remaining(&self) -> usize {
        self.data.len()
    }

    pub fn read_u8(&mut self) -> Result<u8, ParseError> {
        if self.data.remaining() < 1 {
            return Err(ParseError::Truncated);
        }
        Ok(self.data.get_u8())
    }

    pub fn read_i32(&mut self) -> Result<i32, ParseError> {
        if self.data.remaining() < 4 {
            return Err(ParseError::Truncated);
        }
        Ok(self.data.get_i32())
    }

    pub fn read_f32(&mut self) -> Result<f32, ParseError> {
        if self.data.remaining() < 4 {
            return Err(ParseError::Truncated);
        }
        Ok(self.data.get_f32())
    }

    pub fn read_vec2(&mut self) -> Result<Vec2, ParseError> {
        let x = self.read_f32()?;
        let y = self.read_f32()?;
        Ok(Vec2::new(x, y))
    }
}
