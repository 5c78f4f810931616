//! The dynamically-typed value union.

use super::tag;
use super::{Document, ObjectId};

/// A binary blob with its subtype byte.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binary {
    /// Subtype byte (0x00 = generic).
    pub subtype: u8,
    /// Raw payload bytes.
    pub bytes: Vec<u8>,
}

impl Binary {
    /// Create a generic (subtype 0x00) binary value.
    pub fn generic(bytes: Vec<u8>) -> Self {
        Self { subtype: 0, bytes }
    }
}

/// A single BSON value. Closed union: every variant maps to exactly one
/// wire type tag.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// 64-bit float (tag 0x01).
    Double(f64),
    /// UTF-8 string (tag 0x02).
    String(String),
    /// Embedded document (tag 0x03).
    Document(Document),
    /// Array (tag 0x04). Encoded as a document whose keys are the decimal
    /// indices "0", "1", ... in order.
    Array(Vec<Value>),
    /// Binary blob (tag 0x05).
    Binary(Binary),
    /// 12-byte unique identifier (tag 0x07).
    ObjectId(ObjectId),
    /// Boolean (tag 0x08).
    Boolean(bool),
    /// UTC datetime, milliseconds since the Unix epoch (tag 0x09).
    DateTime(i64),
    /// Explicit null, distinct from a missing key (tag 0x0A).
    Null,
    /// 32-bit signed integer (tag 0x10).
    Int32(i32),
    /// 64-bit signed integer (tag 0x12).
    Int64(i64),
}

impl Value {
    /// The wire type tag for this value.
    #[inline]
    pub fn tag(&self) -> u8 {
        match self {
            Value::Double(_) => tag::DOUBLE,
            Value::String(_) => tag::STRING,
            Value::Document(_) => tag::DOCUMENT,
            Value::Array(_) => tag::ARRAY,
            Value::Binary(_) => tag::BINARY,
            Value::ObjectId(_) => tag::OBJECT_ID,
            Value::Boolean(_) => tag::BOOLEAN,
            Value::DateTime(_) => tag::DATETIME,
            Value::Null => tag::NULL,
            Value::Int32(_) => tag::INT32,
            Value::Int64(_) => tag::INT64,
        }
    }

    /// Human-readable type name, used in type-mismatch errors.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Double(_) => "double",
            Value::String(_) => "string",
            Value::Document(_) => "document",
            Value::Array(_) => "array",
            Value::Binary(_) => "binary",
            Value::ObjectId(_) => "objectid",
            Value::Boolean(_) => "boolean",
            Value::DateTime(_) => "datetime",
            Value::Null => "null",
            Value::Int32(_) => "int32",
            Value::Int64(_) => "int64",
        }
    }

    /// Check whether this value is null.
    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Double(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<Document> for Value {
    fn from(v: Document) -> Self {
        Value::Document(v)
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Value::Array(v)
    }
}

impl From<Binary> for Value {
    fn from(v: Binary) -> Self {
        Value::Binary(v)
    }
}

impl From<ObjectId> for Value {
    fn from(v: ObjectId) -> Self {
        Value::ObjectId(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Boolean(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int32(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int64(v)
    }
}
