//! Cursor: one logical result stream over query + get-more round-trips.
//!
//! The first [`Cursor::next`] issues the query; later calls issue
//! get-mores with the stored cursor id. The cursor is exhausted once a
//! reply carries cursor id 0, after which `next` deterministically
//! returns an empty batch.
//!
//! An active cursor holds a server-side resource. Call [`Cursor::close`]
//! on every exit path that abandons the cursor before exhaustion; it
//! sends OP_KILL_CURSORS and is a no-op otherwise. Dropping an active
//! cursor only logs a warning, since no I/O can happen in `Drop`.

use tokio::io::{AsyncRead, AsyncWrite};

use crate::bson::Document;
use crate::connection::Connection;
use crate::error::{Error, Result};
use crate::protocol::{GetMoreRequest, KillCursorsRequest, QueryRequest, ResponseMessage};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// No query sent yet.
    Unstarted,
    /// Server holds an open cursor.
    Active { cursor_id: i64 },
    /// Cursor id 0 seen, or explicitly closed.
    Exhausted,
}

/// A stateful wrapper turning a bounded initial reply plus repeated
/// get-mores into a single logical stream of documents.
#[derive(Debug)]
pub struct Cursor {
    full_collection_name: String,
    selector: Document,
    batch_size: i32,
    state: State,
    retrieved: u64,
}

impl Cursor {
    /// Create a cursor over `db.collection` matching every document.
    pub fn new(db: &str, collection: &str) -> Self {
        Self::with_selector(db, collection, Document::new())
    }

    /// Create a cursor with a query selector.
    pub fn with_selector(db: &str, collection: &str, selector: Document) -> Self {
        Self {
            full_collection_name: format!("{}.{}", db, collection),
            selector,
            batch_size: 0,
            state: State::Unstarted,
            retrieved: 0,
        }
    }

    /// Batch size per round-trip. 0 leaves it to the server.
    pub fn set_batch_size(&mut self, batch_size: i32) -> &mut Self {
        self.batch_size = batch_size;
        self
    }

    /// Whether the server has reported the end of the result set.
    pub fn is_exhausted(&self) -> bool {
        self.state == State::Exhausted
    }

    /// Total documents yielded so far.
    pub fn retrieved(&self) -> u64 {
        self.retrieved
    }

    /// Fetch the next batch. The first call issues the query; subsequent
    /// calls issue get-mores. After exhaustion, returns an empty batch
    /// without a round-trip.
    pub async fn next<S>(&mut self, conn: &mut Connection<S>) -> Result<Vec<Document>>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let reply = match self.state {
            State::Unstarted => {
                let mut request = QueryRequest::new(&self.full_collection_name);
                request.set_number_to_return(self.batch_size);
                request.set_selector(self.selector.clone());
                conn.send_request_expecting_reply(&request).await?
            }
            State::Active { cursor_id } => {
                let mut request = GetMoreRequest::new(&self.full_collection_name, cursor_id);
                request.set_number_to_return(self.batch_size);
                conn.send_request_expecting_reply(&request).await?
            }
            State::Exhausted => return Ok(Vec::new()),
        };
        self.absorb(reply)
    }

    fn absorb(&mut self, reply: ResponseMessage) -> Result<Vec<Document>> {
        if reply.is_cursor_not_found() {
            let stale = match self.state {
                State::Active { cursor_id } => cursor_id,
                _ => 0,
            };
            self.state = State::Exhausted;
            return Err(Error::CursorNotFound(stale));
        }
        if reply.is_query_failure() {
            self.state = State::Exhausted;
            let message = reply.error().unwrap_or("server reported failure").to_string();
            return Err(Error::QueryFailure(message));
        }

        self.state = if reply.cursor_id == 0 {
            State::Exhausted
        } else {
            State::Active {
                cursor_id: reply.cursor_id,
            }
        };
        self.retrieved += reply.documents.len() as u64;
        Ok(reply.documents)
    }

    /// Release the server-side cursor. Sends OP_KILL_CURSORS when the
    /// cursor is still active; otherwise does nothing. Always leaves the
    /// cursor exhausted.
    pub async fn close<S>(&mut self, conn: &mut Connection<S>) -> Result<()>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        if let State::Active { cursor_id } = self.state {
            conn.send_request(&KillCursorsRequest::new(vec![cursor_id]))
                .await?;
            tracing::debug!(cursor_id, "cursor closed");
        }
        self.state = State::Exhausted;
        Ok(())
    }
}

impl Drop for Cursor {
    fn drop(&mut self) {
        if let State::Active { cursor_id } = self.state {
            tracing::warn!(
                cursor_id,
                collection = %self.full_collection_name,
                "cursor dropped while active; server-side cursor leaked (call close() first)"
            );
        }
    }
}
