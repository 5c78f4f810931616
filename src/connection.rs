//! Connection: strict request/reply alternation over a byte stream.
//!
//! One request is written, then at most one reply is read. The header
//! carries request/response-to ids that would support out-of-order
//! matching, but this layer deliberately does not pipeline: a connection
//! is not safe for concurrent use by multiple logical operations. Callers
//! needing concurrency use multiple connections or external locking.
//!
//! After a framing error the stream's byte alignment is unknown; discard
//! the connection instead of reusing it.

use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::Arc;

use bytes::Bytes;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::{TcpStream, ToSocketAddrs};

use crate::error::{Error, Result};
use crate::protocol::{encode_request, MessageHeader, Request, ResponseMessage, HEADER_SIZE};

/// Process-wide monotonic request id source.
///
/// Starts at 0 and wraps at 32-bit overflow; ids only need to be unique
/// within the lifetime of outstanding requests. Cheaply cloneable so
/// several connections can share one sequence, and injectable at
/// connection construction for deterministic golden-byte tests.
#[derive(Debug, Clone, Default)]
pub struct RequestIdGenerator {
    next: Arc<AtomicI32>,
}

impl RequestIdGenerator {
    /// Create a generator starting at 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a generator starting at a fixed value.
    pub fn starting_at(first: i32) -> Self {
        Self {
            next: Arc::new(AtomicI32::new(first)),
        }
    }

    /// Take the next id. Atomic; wraps on overflow.
    pub fn next_id(&self) -> i32 {
        self.next.fetch_add(1, Ordering::Relaxed)
    }
}

/// A client connection over any async byte stream.
///
/// The stream is typically a [`TcpStream`]; tests substitute an in-memory
/// duplex pipe. Timeouts and reconnection are the caller's concern.
pub struct Connection<S> {
    stream: S,
    request_ids: RequestIdGenerator,
}

impl Connection<TcpStream> {
    /// Connect to a server address ("host:port").
    pub async fn connect(addr: impl ToSocketAddrs) -> Result<Self> {
        let stream = TcpStream::connect(addr).await?;
        Ok(Self::new(stream))
    }
}

impl<S: AsyncRead + AsyncWrite + Unpin> Connection<S> {
    /// Wrap an established stream with a fresh request id sequence.
    pub fn new(stream: S) -> Self {
        Self::with_request_ids(stream, RequestIdGenerator::new())
    }

    /// Wrap an established stream with an injected request id sequence.
    pub fn with_request_ids(stream: S, request_ids: RequestIdGenerator) -> Self {
        Self {
            stream,
            request_ids,
        }
    }

    /// The request id sequence this connection draws from.
    pub fn request_ids(&self) -> &RequestIdGenerator {
        &self.request_ids
    }

    /// Send a request without expecting a reply (insert, update, delete,
    /// kill-cursors). Returns the assigned request id.
    pub async fn send_request(&mut self, request: &dyn Request) -> Result<i32> {
        let request_id = self.request_ids.next_id();
        let frame = encode_request(request, request_id);
        tracing::debug!(
            request_id,
            op_code = request.op_code().as_i32(),
            len = frame.len(),
            "sending request"
        );
        self.stream.write_all(&frame).await?;
        Ok(request_id)
    }

    /// Send a request and read the single reply (query, get-more).
    pub async fn send_request_expecting_reply(
        &mut self,
        request: &dyn Request,
    ) -> Result<ResponseMessage> {
        let request_id = self.send_request(request).await?;
        let reply = self.read_reply().await?;
        if reply.header.response_to != request_id {
            return Err(Error::Framing(format!(
                "reply answers request {}, expected {}",
                reply.header.response_to, request_id
            )));
        }
        Ok(reply)
    }

    async fn read_reply(&mut self) -> Result<ResponseMessage> {
        let mut head = [0u8; HEADER_SIZE];
        self.stream.read_exact(&mut head).await.map_err(eof_as_closed)?;
        let header = MessageHeader::from_bytes(&head);
        header.validate()?;

        let body_len = header.message_length as usize - HEADER_SIZE;
        let mut body = vec![0u8; body_len];
        self.stream
            .read_exact(&mut body)
            .await
            .map_err(eof_as_closed)?;
        tracing::debug!(
            response_to = header.response_to,
            len = header.message_length,
            "received reply"
        );
        ResponseMessage::read(header, Bytes::from(body))
    }
}

fn eof_as_closed(e: std::io::Error) -> Error {
    if e.kind() == std::io::ErrorKind::UnexpectedEof {
        Error::ConnectionClosed
    } else {
        Error::Io(e)
    }
}
