//! Protocol buffer wire format: tags, varints and length-delimited payloads.
//!
//! The [`Reader`] walks an in-memory slice field by field. Every error carries
//! an absolute byte offset into the original input, including errors raised
//! while reading a nested message.

use thiserror::Error;

/// Longest legal varint encoding (ten 7-bit groups cover 64 bits).
const MAX_VARINT_LEN: usize = 10;

/// Largest field number a tag may carry (29 bits).
const MAX_FIELD_NUMBER: u64 = (1 << 29) - 1;

/// Nesting limit when skipping unknown groups.
const MAX_GROUP_DEPTH: usize = 64;

/// Errors raised while decoding the binary ledger.
///
/// Decoding is all-or-nothing: any of these aborts the whole decode and no
/// partial message is returned.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// The input ends before a tag, varint or declared payload is complete.
    #[error("truncated input at byte {offset}: needed {needed} byte(s), {available} available")]
    Truncated {
        /// Absolute offset where the incomplete read started.
        offset: usize,
        /// Bytes the read required.
        needed: usize,
        /// Bytes left in the enclosing buffer.
        available: usize,
    },

    /// A varint ran past ten bytes without a terminating byte.
    #[error("malformed varint at byte {offset}: longer than 10 bytes")]
    VarintOverflow {
        /// Absolute offset of the first varint byte.
        offset: usize,
    },

    /// A tag carried wire type 6 or 7.
    #[error("invalid wire type {wire_type} at byte {offset}")]
    InvalidWireType {
        /// Absolute offset of the tag.
        offset: usize,
        /// The raw 3-bit wire type.
        wire_type: u8,
    },

    /// A tag carried field number 0 or one above the 29-bit limit.
    #[error("invalid field number {number} at byte {offset}")]
    InvalidFieldNumber {
        /// Absolute offset of the tag.
        offset: usize,
        /// The decoded field number.
        number: u64,
    },

    /// An end-group tag appeared without a matching start-group tag.
    #[error("unexpected end-group tag at byte {offset}")]
    UnexpectedEndGroup {
        /// Absolute offset of the tag.
        offset: usize,
    },

    /// Unknown groups were nested too deeply to skip.
    #[error("group nesting too deep at byte {offset}")]
    RecursionLimit {
        /// Absolute offset of the innermost start-group payload.
        offset: usize,
    },
}

/// The 3-bit wire type stored in the low bits of every tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WireType {
    /// Variable-length integer.
    Varint,
    /// Eight little-endian bytes.
    Fixed64,
    /// Varint length followed by that many bytes.
    LengthDelimited,
    /// Start of a (deprecated) group.
    StartGroup,
    /// End of a (deprecated) group.
    EndGroup,
    /// Four little-endian bytes.
    Fixed32,
}

impl WireType {
    /// Map the raw 3-bit value to a wire type, if it is defined.
    pub fn from_raw(raw: u8) -> Option<Self> {
        match raw {
            0 => Some(Self::Varint),
            1 => Some(Self::Fixed64),
            2 => Some(Self::LengthDelimited),
            3 => Some(Self::StartGroup),
            4 => Some(Self::EndGroup),
            5 => Some(Self::Fixed32),
            _ => None,
        }
    }

    /// The raw 3-bit value written into a tag.
    pub fn as_raw(self) -> u8 {
        match self {
            Self::Varint => 0,
            Self::Fixed64 => 1,
            Self::LengthDelimited => 2,
            Self::StartGroup => 3,
            Self::EndGroup => 4,
            Self::Fixed32 => 5,
        }
    }
}

/// Payload of one field, already consumed from the stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireValue<'a> {
    /// A varint payload.
    Varint(u64),
    /// A fixed 64-bit payload.
    Fixed64(u64),
    /// A fixed 32-bit payload.
    Fixed32(u32),
    /// A length-delimited payload (string, bytes or embedded message).
    Bytes {
        /// The payload bytes.
        data: &'a [u8],
        /// Absolute offset of the first payload byte.
        offset: usize,
    },
    /// A group, skipped in full.
    Group,
}

impl<'a> WireValue<'a> {
    /// A reader over a length-delimited payload that keeps absolute offsets.
    pub fn as_reader(&self) -> Option<Reader<'a>> {
        match *self {
            Self::Bytes { data, offset } => Some(Reader::with_base(data, offset)),
            _ => None,
        }
    }
}

/// One decoded field: its number, where its tag started, and its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Field<'a> {
    /// Field number from the tag.
    pub number: u32,
    /// Absolute offset of the tag.
    pub offset: usize,
    /// The consumed payload.
    pub value: WireValue<'a>,
}

/// Cursor over a protobuf-encoded byte slice.
#[derive(Debug, Clone)]
pub struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
    /// Absolute offset of `buf[0]` in the original input.
    base: usize,
}

impl<'a> Reader<'a> {
    /// Create a reader over a complete top-level buffer.
    pub fn new(buf: &'a [u8]) -> Self {
        Self::with_base(buf, 0)
    }

    /// Create a reader over a sub-slice that starts at `base` in the original input.
    pub fn with_base(buf: &'a [u8], base: usize) -> Self {
        Self { buf, pos: 0, base }
    }

    /// Absolute offset of the cursor.
    pub fn offset(&self) -> usize {
        self.base + self.pos
    }

    /// Number of unread bytes.
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    /// True once every byte has been consumed.
    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// Read the next field, or `None` at a clean end of buffer.
    ///
    /// # Errors
    ///
    /// Returns a [`DecodeError`] if the tag or its payload is malformed or
    /// runs past the end of the buffer.
    pub fn next_field(&mut self) -> Result<Option<Field<'a>>, DecodeError> {
        if self.is_empty() {
            return Ok(None);
        }
        let offset = self.offset();
        let (number, wire_type) = self.tag()?;
        let value = self.value(number, wire_type, offset, 0)?;
        Ok(Some(Field {
            number,
            offset,
            value,
        }))
    }

    /// Read a base-128 varint.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::Truncated`] if the input ends mid-varint and
    /// [`DecodeError::VarintOverflow`] if it exceeds ten bytes.
    pub fn varint(&mut self) -> Result<u64, DecodeError> {
        let start = self.offset();
        let mut value = 0u64;
        for group in 0..MAX_VARINT_LEN {
            let Some(&byte) = self.buf.get(self.pos) else {
                return Err(DecodeError::Truncated {
                    offset: start,
                    needed: group + 1,
                    available: group,
                });
            };
            self.pos += 1;
            value |= u64::from(byte & 0x7f) << (7 * group);
            if byte & 0x80 == 0 {
                return Ok(value);
            }
        }
        Err(DecodeError::VarintOverflow { offset: start })
    }

    fn tag(&mut self) -> Result<(u32, WireType), DecodeError> {
        let offset = self.offset();
        let raw = self.varint()?;
        let wire_type = (raw & 0x7) as u8;
        let wire_type = WireType::from_raw(wire_type)
            .ok_or(DecodeError::InvalidWireType { offset, wire_type })?;
        let number = raw >> 3;
        if number == 0 || number > MAX_FIELD_NUMBER {
            return Err(DecodeError::InvalidFieldNumber { offset, number });
        }
        Ok((number as u32, wire_type))
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8], DecodeError> {
        let available = self.remaining();
        if len > available {
            return Err(DecodeError::Truncated {
                offset: self.offset(),
                needed: len,
                available,
            });
        }
        let data = &self.buf[self.pos..self.pos + len];
        self.pos += len;
        Ok(data)
    }

    fn value(
        &mut self,
        number: u32,
        wire_type: WireType,
        tag_offset: usize,
        depth: usize,
    ) -> Result<WireValue<'a>, DecodeError> {
        match wire_type {
            WireType::Varint => Ok(WireValue::Varint(self.varint()?)),
            WireType::Fixed64 => {
                let mut raw = [0u8; 8];
                raw.copy_from_slice(self.take(8)?);
                Ok(WireValue::Fixed64(u64::from_le_bytes(raw)))
            }
            WireType::Fixed32 => {
                let mut raw = [0u8; 4];
                raw.copy_from_slice(self.take(4)?);
                Ok(WireValue::Fixed32(u32::from_le_bytes(raw)))
            }
            WireType::LengthDelimited => {
                let len = usize::try_from(self.varint()?).unwrap_or(usize::MAX);
                let offset = self.offset();
                let data = self.take(len)?;
                Ok(WireValue::Bytes { data, offset })
            }
            WireType::StartGroup => {
                self.skip_group(number, depth)?;
                Ok(WireValue::Group)
            }
            WireType::EndGroup => Err(DecodeError::UnexpectedEndGroup { offset: tag_offset }),
        }
    }

    /// Consume a group body up to and including its matching end-group tag.
    fn skip_group(&mut self, number: u32, depth: usize) -> Result<(), DecodeError> {
        if depth >= MAX_GROUP_DEPTH {
            return Err(DecodeError::RecursionLimit {
                offset: self.offset(),
            });
        }
        loop {
            let offset = self.offset();
            let (inner, wire_type) = self.tag()?;
            if wire_type == WireType::EndGroup {
                if inner == number {
                    return Ok(());
                }
                return Err(DecodeError::UnexpectedEndGroup { offset });
            }
            self.value(inner, wire_type, offset, depth + 1)?;
        }
    }
}

/// Append-only protobuf encoder.
#[derive(Debug, Clone, Default)]
pub struct Writer {
    buf: Vec<u8>,
}

impl Writer {
    /// Create an empty writer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Write a base-128 varint.
    pub fn varint(&mut self, mut value: u64) {
        while value >= 0x80 {
            self.buf.push((value as u8 & 0x7f) | 0x80);
            value >>= 7;
        }
        self.buf.push(value as u8);
    }

    /// Write a field tag.
    pub fn tag(&mut self, number: u32, wire_type: WireType) {
        self.varint((u64::from(number) << 3) | u64::from(wire_type.as_raw()));
    }

    /// Write a varint field.
    pub fn varint_field(&mut self, number: u32, value: u64) {
        self.tag(number, WireType::Varint);
        self.varint(value);
    }

    /// Write a fixed 32-bit field.
    pub fn fixed32_field(&mut self, number: u32, value: u32) {
        self.tag(number, WireType::Fixed32);
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    /// Write a fixed 64-bit field.
    pub fn fixed64_field(&mut self, number: u32, value: u64) {
        self.tag(number, WireType::Fixed64);
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    /// Write a length-delimited field.
    pub fn bytes_field(&mut self, number: u32, data: &[u8]) {
        self.tag(number, WireType::LengthDelimited);
        self.varint(data.len() as u64);
        self.buf.extend_from_slice(data);
    }

    /// Append pre-encoded bytes verbatim.
    pub fn raw(&mut self, data: &[u8]) {
        self.buf.extend_from_slice(data);
    }

    /// Bytes written so far.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Number of bytes written so far.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// True if nothing has been written.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Consume the writer and return the encoded bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}
