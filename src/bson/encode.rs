//! BSON serializer.
//!
//! Pure functions from documents to bytes; no I/O. Every document and
//! array writes a placeholder length, its elements in insertion order,
//! the 0x00 terminator, then backpatches the length (little-endian int32
//! counting itself and the terminator).

use bytes::{BufMut, Bytes, BytesMut};

use super::{Document, Value};

/// Serialize a document into a fresh buffer.
///
/// The first 4 bytes of the output, read as a little-endian int32, always
/// equal the total output length.
pub fn to_bytes(doc: &Document) -> Bytes {
    let mut buf = BytesMut::with_capacity(128);
    write_document(&mut buf, doc);
    buf.freeze()
}

/// Serialize a document by appending to an existing buffer. Used by the
/// request builders, which interleave documents with other body fields.
pub fn write_document(buf: &mut BytesMut, doc: &Document) {
    let start = buf.len();
    buf.put_i32_le(0); // length, backpatched below
    for (key, value) in doc.iter() {
        write_element(buf, key, value);
    }
    buf.put_u8(0);
    patch_length(buf, start);
}

/// Append a null-terminated UTF-8 string without a length prefix.
/// Also used for collection names in message bodies.
pub fn write_cstring(buf: &mut BytesMut, s: &str) {
    buf.put_slice(s.as_bytes());
    buf.put_u8(0);
}

fn write_string(buf: &mut BytesMut, s: &str) {
    buf.put_i32_le(s.len() as i32 + 1); // length includes the terminator
    buf.put_slice(s.as_bytes());
    buf.put_u8(0);
}

fn write_array(buf: &mut BytesMut, items: &[Value]) {
    let start = buf.len();
    buf.put_i32_le(0);
    for (index, value) in items.iter().enumerate() {
        write_element(buf, &index.to_string(), value);
    }
    buf.put_u8(0);
    patch_length(buf, start);
}

fn write_element(buf: &mut BytesMut, key: &str, value: &Value) {
    buf.put_u8(value.tag());
    write_cstring(buf, key);
    match value {
        Value::Double(d) => buf.put_f64_le(*d),
        Value::String(s) => write_string(buf, s),
        Value::Document(doc) => write_document(buf, doc),
        Value::Array(items) => write_array(buf, items),
        Value::Binary(bin) => {
            buf.put_i32_le(bin.bytes.len() as i32);
            buf.put_u8(bin.subtype);
            buf.put_slice(&bin.bytes);
        }
        Value::ObjectId(id) => buf.put_slice(id.bytes()),
        Value::Boolean(b) => buf.put_u8(*b as u8),
        Value::DateTime(ms) => buf.put_i64_le(*ms),
        Value::Null => {}
        Value::Int32(n) => buf.put_i32_le(*n),
        Value::Int64(n) => buf.put_i64_le(*n),
    }
}

fn patch_length(buf: &mut BytesMut, start: usize) {
    let len = (buf.len() - start) as i32;
    buf[start..start + 4].copy_from_slice(&len.to_le_bytes());
}
