//! Byte streams handed to `write` and `read` hooks.
//!
//! All integers and floats are big-endian. Strings are a `u32` byte length
//! followed by UTF-8 bytes. Entity references are written as their raw `u64`.

use bytes::{Buf, BufMut, BytesMut};
use glam::Vec2;

use crate::entity::EntityId;
use crate::field::{FieldType, FieldValue};

/// Errors raised while reading a field stream.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReadError {
    /// The stream ended before a value was complete.
    #[error("unexpected end of stream: needed {needed} bytes, {remaining} remaining")]
    UnexpectedEof {
        /// Bytes required by the value being read.
        needed: usize,
        /// Bytes left in the stream.
        remaining: usize,
    },

    /// A string payload was not valid UTF-8.
    #[error("invalid UTF-8 in string field")]
    InvalidUtf8,

    /// A boolean byte was neither 0 nor 1.
    #[error("invalid boolean byte {0:#04x}")]
    InvalidBool(u8),
}

/// Append-only output stream.
#[derive(Debug, Default)]
pub struct Writes {
    buf: BytesMut,
}

impl Writes {
    /// Create an empty stream.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of bytes written so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Returns `true` if nothing has been written.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Consume the stream and return its bytes.
    #[must_use]
    pub fn into_inner(self) -> BytesMut {
        self.buf
    }

    /// Write a boolean as a single byte.
    pub fn bool(&mut self, v: bool) {
        self.buf.put_u8(u8::from(v));
    }

    /// Write an unsigned byte.
    pub fn u8(&mut self, v: u8) {
        self.buf.put_u8(v);
    }

    /// Write a 32-bit signed integer.
    pub fn i32(&mut self, v: i32) {
        self.buf.put_i32(v);
    }

    /// Write a 64-bit signed integer.
    pub fn i64(&mut self, v: i64) {
        self.buf.put_i64(v);
    }

    /// Write a 32-bit float.
    pub fn f32(&mut self, v: f32) {
        self.buf.put_f32(v);
    }

    /// Write a two-component vector.
    pub fn vec2(&mut self, v: Vec2) {
        self.buf.put_f32(v.x);
        self.buf.put_f32(v.y);
    }

    /// Write a string. The text is never shortened; a string too long for
    /// its `u32` prefix also overflows the record length, which the record
    /// encoder rejects.
    pub fn str(&mut self, v: &str) {
        self.buf.put_u32(u32::try_from(v.len()).unwrap_or(u32::MAX));
        self.buf.put_slice(v.as_bytes());
    }

    /// Write an entity reference.
    pub fn entity(&mut self, v: EntityId) {
        self.buf.put_u64(v.id());
    }

    /// Write any field value using the encoding of its type.
    pub fn value(&mut self, value: &FieldValue) {
        match value {
            FieldValue::Bool(v) => self.bool(*v),
            FieldValue::Int(v) => self.i32(*v),
            FieldValue::Long(v) => self.i64(*v),
            FieldValue::Float(v) => self.f32(*v),
            FieldValue::Vec2(v) => self.vec2(*v),
            FieldValue::Text(v) => self.str(v),
            FieldValue::Entity(v) => self.entity(*v),
        }
    }
}

/// Cursor over an input stream.
#[derive(Debug)]
pub struct Reads<'a> {
    buf: &'a [u8],
}

impl<'a> Reads<'a> {
    /// Wrap a byte slice.
    #[must_use]
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf }
    }

    /// Bytes not yet consumed.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.buf.remaining()
    }

    fn need(&self, needed: usize) -> Result<(), ReadError> {
        let remaining = self.buf.remaining();
        if remaining < needed {
            return Err(ReadError::UnexpectedEof { needed, remaining });
        }
        Ok(())
    }

    /// Read a boolean byte.
    ///
    /// # Errors
    ///
    /// Fails on end of stream or a byte other than 0 or 1.
    pub fn bool(&mut self) -> Result<bool, ReadError> {
        match self.u8()? {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(ReadError::InvalidBool(other)),
        }
    }

    /// Read an unsigned byte.
    ///
    /// # Errors
    ///
    /// Fails on end of stream.
    pub fn u8(&mut self) -> Result<u8, ReadError> {
        self.need(1)?;
        Ok(self.buf.get_u8())
    }

    /// Read a 32-bit signed integer.
    ///
    /// # Errors
    ///
    /// Fails on end of stream.
    pub fn i32(&mut self) -> Result<i32, ReadError> {
        self.need(4)?;
        Ok(self.buf.get_i32())
    }

    /// Read a 64-bit signed integer.
    ///
    /// # Errors
    ///
    /// Fails on end of stream.
    pub fn i64(&mut self) -> Result<i64, ReadError> {
        self.need(8)?;
        Ok(self.buf.get_i64())
    }

    /// Read a 32-bit float.
    ///
    /// # Errors
    ///
    /// Fails on end of stream.
    pub fn f32(&mut self) -> Result<f32, ReadError> {
        self.need(4)?;
        Ok(self.buf.get_f32())
    }

    /// Read a two-component vector.
    ///
    /// # Errors
    ///
    /// Fails on end of stream.
    pub fn vec2(&mut self) -> Result<Vec2, ReadError> {
        self.need(8)?;
        let x = self.buf.get_f32();
        let y = self.buf.get_f32();
        Ok(Vec2::new(x, y))
    }

    /// Read a length-prefixed string.
    ///
    /// # Errors
    ///
    /// Fails on end of stream or invalid UTF-8.
    pub fn str(&mut self) -> Result<String, ReadError> {
        self.need(4)?;
        let len = self.buf.get_u32() as usize;
        self.need(len)?;
        let (head, tail) = self.buf.split_at(len);
        let s = std::str::from_utf8(head).map_err(|_| ReadError::InvalidUtf8)?;
        self.buf = tail;
        Ok(s.to_string())
    }

    /// Read an entity reference.
    ///
    /// # Errors
    ///
    /// Fails on end of stream.
    pub fn entity(&mut self) -> Result<EntityId, ReadError> {
        self.need(8)?;
        Ok(EntityId(self.buf.get_u64()))
    }

    /// Read a value of the given type.
    ///
    /// # Errors
    ///
    /// Propagates the error of the typed reader.
    pub fn value(&mut self, ty: FieldType) -> Result<FieldValue, ReadError> {
        Ok(match ty {
            FieldType::Bool => FieldValue::Bool(self.bool()?),
            FieldType::Int => FieldValue::Int(self.i32()?),
            FieldType::Long => FieldValue::Long(self.i64()?),
            FieldType::Float => FieldValue::Float(self.f32()?),
            FieldType::Vec2 => FieldValue::Vec2(self.vec2()?),
            FieldType::Text => FieldValue::Text(self.str()?),
            FieldType::Entity => FieldValue::Entity(self.entity()?),
        })
    }
}
