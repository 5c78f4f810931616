//! BSON document model and binary codec.
//!
//! A [`Document`] is an ordered mapping from string keys to [`Value`]s.
//! Insertion order is significant and survives encode/decode round-trips:
//! it affects the wire size, and for command documents the server treats
//! the first key as the command name.
//!
//! The binary layout is the standard BSON framing, little-endian:
//!
//! ```text
//! ┌───────────┬──────────────────────────────────────────┬──────┐
//! │ int32 len │ element*                                 │ 0x00 │
//! │ (incl.    │ [type byte][key cstring][value bytes]    │      │
//! │  itself)  │                                          │      │
//! └───────────┴──────────────────────────────────────────┴──────┘
//! ```
//!
//! # Example
//!
//! ```
//! use mongowire::bson::{decode, encode, Document};
//!
//! let mut doc = Document::new();
//! doc.add("lastname", "Braem").add("start", 1993i32);
//!
//! let bytes = encode::to_bytes(&doc);
//! let back = decode::from_bytes(&bytes).unwrap();
//! assert_eq!(back.get_str("lastname").unwrap(), "Braem");
//! assert_eq!(back.get_i32("start").unwrap(), 1993);
//! ```

pub mod decode;
mod document;
pub mod encode;
mod oid;
mod value;

pub use document::Document;
pub use oid::ObjectId;
pub use value::{Binary, Value};

/// Value type tags as they appear on the wire.
pub mod tag {
    /// Document terminator (not a value type).
    pub const END: u8 = 0x00;
    /// 64-bit IEEE-754 float.
    pub const DOUBLE: u8 = 0x01;
    /// Length-prefixed UTF-8 string.
    pub const STRING: u8 = 0x02;
    /// Embedded document.
    pub const DOCUMENT: u8 = 0x03;
    /// Array (document with decimal string keys "0", "1", ...).
    pub const ARRAY: u8 = 0x04;
    /// Binary blob: length, subtype byte, raw bytes.
    pub const BINARY: u8 = 0x05;
    /// 12-byte ObjectId, no length prefix.
    pub const OBJECT_ID: u8 = 0x07;
    /// Single byte, 0x00 or 0x01.
    pub const BOOLEAN: u8 = 0x08;
    /// Signed 64-bit milliseconds since the Unix epoch.
    pub const DATETIME: u8 = 0x09;
    /// No value bytes; the tag alone carries the meaning.
    pub const NULL: u8 = 0x0A;
    /// Signed 32-bit integer.
    pub const INT32: u8 = 0x10;
    /// Signed 64-bit integer.
    pub const INT64: u8 = 0x12;
}
