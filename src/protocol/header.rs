//! Message header encoding and decoding.

use crate::error::{Error, Result};

/// Header size in bytes (fixed, exactly 16).
pub const HEADER_SIZE: usize = 16;

/// Maximum accepted message length (48 MB, matching the server bound).
/// A reply declaring more than this is treated as a framing error.
pub const MAX_MESSAGE_SIZE: i32 = 48_000_000;

/// Wire message opcodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum OpCode {
    /// Server reply to a query or get-more.
    Reply = 1,
    /// OP_UPDATE.
    Update = 2001,
    /// OP_INSERT.
    Insert = 2002,
    /// OP_QUERY.
    Query = 2004,
    /// OP_GET_MORE.
    GetMore = 2005,
    /// OP_DELETE.
    Delete = 2006,
    /// OP_KILL_CURSORS.
    KillCursors = 2007,
}

impl OpCode {
    /// Decode an opcode from its wire value.
    pub fn from_i32(value: i32) -> Option<Self> {
        match value {
            1 => Some(OpCode::Reply),
            2001 => Some(OpCode::Update),
            2002 => Some(OpCode::Insert),
            2004 => Some(OpCode::Query),
            2005 => Some(OpCode::GetMore),
            2006 => Some(OpCode::Delete),
            2007 => Some(OpCode::KillCursors),
            _ => None,
        }
    }

    /// The wire value.
    #[inline]
    pub fn as_i32(self) -> i32 {
        self as i32
    }
}

/// Decoded 16-byte message header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageHeader {
    /// Total message length, header included.
    pub message_length: i32,
    /// Client-assigned identifier of this message.
    pub request_id: i32,
    /// For replies, the request id being answered; 0 in requests.
    pub response_to: i32,
    /// Raw opcode value.
    pub op_code: i32,
}

impl MessageHeader {
    /// Create a new header.
    pub fn new(message_length: i32, request_id: i32, response_to: i32, op_code: i32) -> Self {
        Self {
            message_length,
            request_id,
            response_to,
            op_code,
        }
    }

    /// Encode the header to bytes (little-endian).
    pub fn encode(&self) -> [u8; HEADER_SIZE] {
        let mut buf = [0u8; HEADER_SIZE];
        buf[0..4].copy_from_slice(&self.message_length.to_le_bytes());
        buf[4..8].copy_from_slice(&self.request_id.to_le_bytes());
        buf[8..12].copy_from_slice(&self.response_to.to_le_bytes());
        buf[12..16].copy_from_slice(&self.op_code.to_le_bytes());
        buf
    }

    /// Decode a header from exactly 16 bytes.
    pub fn from_bytes(buf: &[u8; HEADER_SIZE]) -> Self {
        let int = |i: usize| i32::from_le_bytes([buf[i], buf[i + 1], buf[i + 2], buf[i + 3]]);
        Self {
            message_length: int(0),
            request_id: int(4),
            response_to: int(8),
            op_code: int(12),
        }
    }

    /// Decode a header from a byte slice. Returns `None` if the slice is
    /// too short.
    pub fn decode(buf: &[u8]) -> Option<Self> {
        let head: &[u8; HEADER_SIZE] = buf.get(..HEADER_SIZE)?.try_into().ok()?;
        Some(Self::from_bytes(head))
    }

    /// The decoded opcode, or `None` for an unknown value.
    pub fn op(&self) -> Option<OpCode> {
        OpCode::from_i32(self.op_code)
    }

    /// Validate the declared length against the protocol bounds.
    pub fn validate(&self) -> Result<()> {
        if self.message_length < HEADER_SIZE as i32 {
            return Err(Error::Framing(format!(
                "message length {} below header size {}",
                self.message_length, HEADER_SIZE
            )));
        }
        if self.message_length > MAX_MESSAGE_SIZE {
            return Err(Error::Framing(format!(
                "message length {} exceeds maximum {}",
                self.message_length, MAX_MESSAGE_SIZE
            )));
        }
        Ok(())
    }
}
