//! Request message builders.
//!
//! One builder per opcode. Builders assemble the opcode-specific body;
//! [`encode_request`] frames a body with the shared header and backpatches
//! the total length. Nothing here touches a socket.
//!
//! The full collection name is the database name and the collection name
//! joined with a single "." (for database "foo" and collection "bar",
//! "foo.bar"). Builders do not enforce the format; the caller is expected
//! to supply it, usually via [`crate::Database`].

use bytes::{BufMut, Bytes, BytesMut};

use crate::bson::{encode, Document};

use super::header::OpCode;

/// Flags for OP_INSERT.
pub mod insert_flags {
    /// Keep inserting the remaining documents when one fails.
    pub const CONTINUE_ON_ERROR: i32 = 1 << 0;
}

/// Flags for OP_QUERY.
pub mod query_flags {
    /// Leave the cursor open after the last batch.
    pub const TAILABLE_CURSOR: i32 = 1 << 1;
    /// Allow reads from secondary members.
    pub const SLAVE_OK: i32 = 1 << 2;
    /// Disable the server-side idle cursor timeout.
    pub const NO_CURSOR_TIMEOUT: i32 = 1 << 4;
    /// Block for a while instead of returning an empty tailable batch.
    pub const AWAIT_DATA: i32 = 1 << 5;
    /// Stream multiple replies without waiting for get-more.
    pub const EXHAUST: i32 = 1 << 6;
    /// Accept partial results when a shard is down.
    pub const PARTIAL: i32 = 1 << 7;
}

/// Flags for OP_UPDATE.
pub mod update_flags {
    /// Insert the document when the selector matches nothing.
    pub const UPSERT: i32 = 1 << 0;
    /// Update every matching document instead of the first.
    pub const MULTI_UPDATE: i32 = 1 << 1;
}

/// Flags for OP_DELETE.
pub mod delete_flags {
    /// Remove only the first matching document.
    pub const SINGLE_REMOVE: i32 = 1 << 0;
}

/// A request message body builder.
///
/// Implementations produce the opcode-specific body bytes; the shared
/// header is written by [`encode_request`].
pub trait Request {
    /// The opcode this request is sent under.
    fn op_code(&self) -> OpCode;

    /// Append the opcode-specific body to `buf`.
    fn build_body(&self, buf: &mut BytesMut);
}

/// Frame a request: 16-byte header, body, backpatched total length.
///
/// `response_to` is always 0 in requests. The leading int32 of the result
/// equals 16 plus the body length.
pub fn encode_request(request: &dyn Request, request_id: i32) -> Bytes {
    let mut buf = BytesMut::with_capacity(128);
    buf.put_i32_le(0); // total length, backpatched below
    buf.put_i32_le(request_id);
    buf.put_i32_le(0);
    buf.put_i32_le(request.op_code().as_i32());
    request.build_body(&mut buf);

    let total = buf.len() as i32;
    buf[0..4].copy_from_slice(&total.to_le_bytes());
    buf.freeze()
}

/// OP_INSERT: insert one or more documents.
///
/// Body: `[int32 flags][cstring fullCollectionName][document...]`.
#[derive(Debug, Clone)]
pub struct InsertRequest {
    full_collection_name: String,
    flags: i32,
    documents: Vec<Document>,
}

impl InsertRequest {
    /// Create an insert against a full collection name.
    pub fn new(full_collection_name: impl Into<String>) -> Self {
        Self {
            full_collection_name: full_collection_name.into(),
            flags: 0,
            documents: Vec::new(),
        }
    }

    /// Set the insert flags (see [`insert_flags`]).
    pub fn set_flags(&mut self, flags: i32) -> &mut Self {
        self.flags = flags;
        self
    }

    /// Queue a document for insertion. A missing `_id` key gets a
    /// client-generated ObjectId.
    pub fn document(&mut self, mut doc: Document) -> &mut Self {
        doc.ensure_id();
        self.documents.push(doc);
        self
    }

    /// The queued documents.
    pub fn documents(&self) -> &[Document] {
        &self.documents
    }
}

impl Request for InsertRequest {
    fn op_code(&self) -> OpCode {
        OpCode::Insert
    }

    fn build_body(&self, buf: &mut BytesMut) {
        buf.put_i32_le(self.flags);
        encode::write_cstring(buf, &self.full_collection_name);
        for doc in &self.documents {
            encode::write_document(buf, doc);
        }
    }
}

/// OP_QUERY: query a collection, opening a server-side cursor.
///
/// Body: `[int32 flags][cstring fullCollectionName][int32 numberToSkip]
/// [int32 numberToReturn][document selector][document fieldSelector?]`.
#[derive(Debug, Clone)]
pub struct QueryRequest {
    full_collection_name: String,
    flags: i32,
    number_to_skip: i32,
    number_to_return: i32,
    selector: Document,
    field_selector: Option<Document>,
}

impl QueryRequest {
    /// Create a query against a full collection name. The default empty
    /// selector matches every document; number-to-return 0 leaves the
    /// batch size to the server.
    pub fn new(full_collection_name: impl Into<String>) -> Self {
        Self {
            full_collection_name: full_collection_name.into(),
            flags: 0,
            number_to_skip: 0,
            number_to_return: 0,
            selector: Document::new(),
            field_selector: None,
        }
    }

    /// Set the query flags (see [`query_flags`]).
    pub fn set_flags(&mut self, flags: i32) -> &mut Self {
        self.flags = flags;
        self
    }

    /// Number of documents to skip before the first result.
    pub fn set_number_to_skip(&mut self, n: i32) -> &mut Self {
        self.number_to_skip = n;
        self
    }

    /// Batch size for the initial reply. 0 means server default; a
    /// negative value closes the cursor after one batch.
    pub fn set_number_to_return(&mut self, n: i32) -> &mut Self {
        self.number_to_return = n;
        self
    }

    /// Mutable access to the query selector document.
    pub fn selector_mut(&mut self) -> &mut Document {
        &mut self.selector
    }

    /// Replace the query selector document.
    pub fn set_selector(&mut self, selector: Document) -> &mut Self {
        self.selector = selector;
        self
    }

    /// Restrict returned fields to the keys of `fields`.
    pub fn set_field_selector(&mut self, fields: Document) -> &mut Self {
        self.field_selector = Some(fields);
        self
    }
}

impl Request for QueryRequest {
    fn op_code(&self) -> OpCode {
        OpCode::Query
    }

    fn build_body(&self, buf: &mut BytesMut) {
        buf.put_i32_le(self.flags);
        encode::write_cstring(buf, &self.full_collection_name);
        buf.put_i32_le(self.number_to_skip);
        buf.put_i32_le(self.number_to_return);
        encode::write_document(buf, &self.selector);
        if let Some(fields) = &self.field_selector {
            encode::write_document(buf, fields);
        }
    }
}

/// OP_UPDATE: update documents matching a selector.
///
/// Body: `[int32 reserved][cstring fullCollectionName][int32 flags]
/// [document selector][document update]`.
#[derive(Debug, Clone)]
pub struct UpdateRequest {
    full_collection_name: String,
    flags: i32,
    selector: Document,
    update: Document,
}

impl UpdateRequest {
    /// Create an update against a full collection name.
    pub fn new(full_collection_name: impl Into<String>) -> Self {
        Self {
            full_collection_name: full_collection_name.into(),
            flags: 0,
            selector: Document::new(),
            update: Document::new(),
        }
    }

    /// Set the update flags (see [`update_flags`]).
    pub fn set_flags(&mut self, flags: i32) -> &mut Self {
        self.flags = flags;
        self
    }

    /// Mutable access to the match selector.
    pub fn selector_mut(&mut self) -> &mut Document {
        &mut self.selector
    }

    /// Mutable access to the update specification.
    pub fn update_mut(&mut self) -> &mut Document {
        &mut self.update
    }
}

impl Request for UpdateRequest {
    fn op_code(&self) -> OpCode {
        OpCode::Update
    }

    fn build_body(&self, buf: &mut BytesMut) {
        buf.put_i32_le(0); // reserved
        encode::write_cstring(buf, &self.full_collection_name);
        buf.put_i32_le(self.flags);
        encode::write_document(buf, &self.selector);
        encode::write_document(buf, &self.update);
    }
}

/// OP_DELETE: remove documents matching a selector.
///
/// Body: `[int32 reserved][cstring fullCollectionName][int32 flags]
/// [document selector]`.
#[derive(Debug, Clone)]
pub struct DeleteRequest {
    full_collection_name: String,
    flags: i32,
    selector: Document,
}

impl DeleteRequest {
    /// Create a delete against a full collection name. The default empty
    /// selector removes every document.
    pub fn new(full_collection_name: impl Into<String>) -> Self {
        Self {
            full_collection_name: full_collection_name.into(),
            flags: 0,
            selector: Document::new(),
        }
    }

    /// Set the delete flags (see [`delete_flags`]).
    pub fn set_flags(&mut self, flags: i32) -> &mut Self {
        self.flags = flags;
        self
    }

    /// Mutable access to the match selector.
    pub fn selector_mut(&mut self) -> &mut Document {
        &mut self.selector
    }
}

impl Request for DeleteRequest {
    fn op_code(&self) -> OpCode {
        OpCode::Delete
    }

    fn build_body(&self, buf: &mut BytesMut) {
        buf.put_i32_le(0); // reserved
        encode::write_cstring(buf, &self.full_collection_name);
        buf.put_i32_le(self.flags);
        encode::write_document(buf, &self.selector);
    }
}

/// OP_GET_MORE: fetch the next batch of an open cursor.
///
/// Body: `[int32 reserved][cstring fullCollectionName]
/// [int32 numberToReturn][int64 cursorID]`.
#[derive(Debug, Clone)]
pub struct GetMoreRequest {
    full_collection_name: String,
    number_to_return: i32,
    cursor_id: i64,
}

impl GetMoreRequest {
    /// Create a get-more for a cursor id previously returned in a reply.
    pub fn new(full_collection_name: impl Into<String>, cursor_id: i64) -> Self {
        Self {
            full_collection_name: full_collection_name.into(),
            number_to_return: 0,
            cursor_id,
        }
    }

    /// Batch size for this round-trip. 0 means server default.
    pub fn set_number_to_return(&mut self, n: i32) -> &mut Self {
        self.number_to_return = n;
        self
    }

    /// The cursor id this request continues.
    pub fn cursor_id(&self) -> i64 {
        self.cursor_id
    }
}

impl Request for GetMoreRequest {
    fn op_code(&self) -> OpCode {
        OpCode::GetMore
    }

    fn build_body(&self, buf: &mut BytesMut) {
        buf.put_i32_le(0); // reserved
        encode::write_cstring(buf, &self.full_collection_name);
        buf.put_i32_le(self.number_to_return);
        buf.put_i64_le(self.cursor_id);
    }
}

/// OP_KILL_CURSORS: release server-side cursors.
///
/// Body: `[int32 reserved][int32 numberOfCursorIDs][int64 cursorID...]`.
#[derive(Debug, Clone)]
pub struct KillCursorsRequest {
    cursor_ids: Vec<i64>,
}

impl KillCursorsRequest {
    /// Create a kill-cursors for the given ids.
    pub fn new(cursor_ids: Vec<i64>) -> Self {
        Self { cursor_ids }
    }

    /// Add another cursor id.
    pub fn cursor(&mut self, cursor_id: i64) -> &mut Self {
        self.cursor_ids.push(cursor_id);
        self
    }
}

impl Request for KillCursorsRequest {
    fn op_code(&self) -> OpCode {
        OpCode::KillCursors
    }

    fn build_body(&self, buf: &mut BytesMut) {
        buf.put_i32_le(0); // reserved
        buf.put_i32_le(self.cursor_ids.len() as i32);
        for id in &self.cursor_ids {
            buf.put_i64_le(*id);
        }
    }
}
