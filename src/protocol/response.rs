//! Reply message parsing.

use bytes::{Buf, Bytes};

use crate::bson::{decode, Document};
use crate::error::{Error, Result};

use super::header::{MessageHeader, OpCode, HEADER_SIZE};

/// Response flag bits carried in OP_REPLY.
pub mod response_flags {
    /// The get-more referred to a cursor the server no longer knows.
    pub const CURSOR_NOT_FOUND: i32 = 1 << 0;
    /// The query failed; the single returned document carries `$err`.
    pub const QUERY_FAILURE: i32 = 1 << 1;
    /// The server supports AwaitData on tailable cursors.
    pub const AWAIT_CAPABLE: i32 = 1 << 2;
}

/// A parsed OP_REPLY.
///
/// Cursor id 0 means the result set is complete; issuing a get-more for
/// it is a caller error.
#[derive(Debug, Clone)]
pub struct ResponseMessage {
    /// The reply's message header.
    pub header: MessageHeader,
    /// Response flag bits (see [`response_flags`]).
    pub flags: i32,
    /// Server-assigned cursor id; 0 when the cursor is exhausted.
    pub cursor_id: i64,
    /// Offset of the first returned document in the logical result set.
    pub starting_from: i32,
    /// The returned documents, in server order.
    pub documents: Vec<Document>,
}

impl ResponseMessage {
    /// Parse a reply from its header and body bytes.
    ///
    /// The opcode must be OP_REPLY and the declared document count must
    /// match the documents actually present; anything else is a framing
    /// error, never a silently truncated result.
    pub fn read(header: MessageHeader, mut body: Bytes) -> Result<Self> {
        if header.op() != Some(OpCode::Reply) {
            return Err(Error::Framing(format!(
                "expected reply opcode {}, got {}",
                OpCode::Reply.as_i32(),
                header.op_code
            )));
        }
        let expected_body = header.message_length as usize - HEADER_SIZE;
        if body.len() != expected_body {
            return Err(Error::Framing(format!(
                "reply declares {} body bytes, {} present",
                expected_body,
                body.len()
            )));
        }
        if body.remaining() < 20 {
            return Err(Error::Framing(format!(
                "reply prologue needs 20 bytes, {} available",
                body.remaining()
            )));
        }

        let flags = body.get_i32_le();
        let cursor_id = body.get_i64_le();
        let starting_from = body.get_i32_le();
        let number_returned = body.get_i32_le();
        if number_returned < 0 {
            return Err(Error::Framing(format!(
                "negative document count {}",
                number_returned
            )));
        }

        let mut documents = Vec::with_capacity(number_returned as usize);
        for index in 0..number_returned {
            let doc = decode::read_document(&mut body).map_err(|e| match e {
                Error::Framing(msg) => Error::Framing(format!(
                    "document {} of {}: {}",
                    index, number_returned, msg
                )),
                other => other,
            })?;
            documents.push(doc);
        }
        if body.has_remaining() {
            return Err(Error::Framing(format!(
                "{} bytes left after {} declared documents",
                body.remaining(),
                number_returned
            )));
        }

        Ok(Self {
            header,
            flags,
            cursor_id,
            starting_from,
            documents,
        })
    }

    /// Check the cursor-not-found flag.
    #[inline]
    pub fn is_cursor_not_found(&self) -> bool {
        self.flags & response_flags::CURSOR_NOT_FOUND != 0
    }

    /// Check the query-failure flag.
    #[inline]
    pub fn is_query_failure(&self) -> bool {
        self.flags & response_flags::QUERY_FAILURE != 0
    }

    /// Check the await-capable flag.
    #[inline]
    pub fn is_await_capable(&self) -> bool {
        self.flags & response_flags::AWAIT_CAPABLE != 0
    }

    /// The server error message (`$err`) when the query-failure flag is
    /// set and the reply carries one.
    pub fn error(&self) -> Option<&str> {
        if !self.is_query_failure() {
            return None;
        }
        self.documents.first().and_then(|doc| doc.get_str("$err").ok())
    }
}
