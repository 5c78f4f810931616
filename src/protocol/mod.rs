//! Wire protocol message layer.
//!
//! Implements the 16-byte message header shared by every request and
//! reply, the opcode-specific request builders, and the reply parser.
//!
//! ```text
//! ┌───────────────┬────────────┬─────────────┬─────────┬──────┐
//! │ messageLength │ requestID  │ responseTo  │ opCode  │ body │
//! │ int32 LE      │ int32 LE   │ int32 LE    │ int32 LE│ ...  │
//! └───────────────┴────────────┴─────────────┴─────────┴──────┘
//! ```
//!
//! Building a request never performs I/O; the builders only produce bytes
//! ready for a transport.

mod header;
mod request;
mod response;

pub use header::{MessageHeader, OpCode, HEADER_SIZE, MAX_MESSAGE_SIZE};
pub use request::{
    delete_flags, encode_request, insert_flags, query_flags, update_flags, DeleteRequest,
    GetMoreRequest, InsertRequest, KillCursorsRequest, QueryRequest, Request, UpdateRequest,
};
pub use response::{response_flags, ResponseMessage};
