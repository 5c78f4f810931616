//! Ordered document container.

use std::fmt;

use crate::error::{Error, Result};

use super::{ObjectId, Value};

/// An ordered mapping from string keys to [`Value`]s.
///
/// Pairs are kept in insertion order. [`Document::add`] never checks key
/// uniqueness: callers are responsible, matching the "array index as key"
/// convention the wire format uses for arrays. Decoding likewise preserves
/// duplicate pairs in order rather than overwriting.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    entries: Vec<(String, Value)>,
}

impl Document {
    /// Create an empty document.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Append a key/value pair. Returns `&mut self` for chaining.
    pub fn add(&mut self, key: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.entries.push((key.into(), value.into()));
        self
    }

    /// Number of key/value pairs.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check whether the document has no pairs.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Check whether a key is present.
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    /// Look up the first value stored under `key`.
    pub fn get(&self, key: &str) -> Result<&Value> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
            .ok_or_else(|| Error::KeyNotFound(key.to_string()))
    }

    /// Iterate over pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Consume the document and yield its values in order. Used when an
    /// array document's synthetic index keys are no longer needed.
    pub(crate) fn into_values(self) -> Vec<Value> {
        self.entries.into_iter().map(|(_, v)| v).collect()
    }

    /// Check whether `key` holds a null value. `false` when absent.
    pub fn is_null(&self, key: &str) -> bool {
        matches!(self.get(key), Ok(Value::Null))
    }

    /// Check whether `key` holds a value with the given wire tag.
    /// Never errors; `false` when the key is absent.
    pub fn is_type(&self, key: &str, tag: u8) -> bool {
        matches!(self.get(key), Ok(v) if v.tag() == tag)
    }

    fn typed<'a, T>(
        &'a self,
        key: &str,
        expected: &'static str,
        extract: impl FnOnce(&'a Value) -> Option<T>,
    ) -> Result<T> {
        let value = self.get(key)?;
        extract(value).ok_or_else(|| Error::TypeMismatch {
            key: key.to_string(),
            expected,
            actual: value.type_name(),
        })
    }

    /// Get a string value.
    pub fn get_str(&self, key: &str) -> Result<&str> {
        self.typed(key, "string", |v| match v {
            Value::String(s) => Some(s.as_str()),
            _ => None,
        })
    }

    /// Get a double value.
    pub fn get_f64(&self, key: &str) -> Result<f64> {
        self.typed(key, "double", |v| match v {
            Value::Double(d) => Some(*d),
            _ => None,
        })
    }

    /// Get a 32-bit integer value.
    pub fn get_i32(&self, key: &str) -> Result<i32> {
        self.typed(key, "int32", |v| match v {
            Value::Int32(n) => Some(*n),
            _ => None,
        })
    }

    /// Get a 64-bit integer value.
    pub fn get_i64(&self, key: &str) -> Result<i64> {
        self.typed(key, "int64", |v| match v {
            Value::Int64(n) => Some(*n),
            _ => None,
        })
    }

    /// Get a boolean value.
    pub fn get_bool(&self, key: &str) -> Result<bool> {
        self.typed(key, "boolean", |v| match v {
            Value::Boolean(b) => Some(*b),
            _ => None,
        })
    }

    /// Get a datetime value as milliseconds since the Unix epoch.
    pub fn get_datetime(&self, key: &str) -> Result<i64> {
        self.typed(key, "datetime", |v| match v {
            Value::DateTime(ms) => Some(*ms),
            _ => None,
        })
    }

    /// Get an embedded document.
    pub fn get_document(&self, key: &str) -> Result<&Document> {
        self.typed(key, "document", |v| match v {
            Value::Document(d) => Some(d),
            _ => None,
        })
    }

    /// Get an array value.
    pub fn get_array(&self, key: &str) -> Result<&[Value]> {
        self.typed(key, "array", |v| match v {
            Value::Array(items) => Some(items.as_slice()),
            _ => None,
        })
    }

    /// Get an ObjectId value.
    pub fn get_object_id(&self, key: &str) -> Result<&ObjectId> {
        self.typed(key, "objectid", |v| match v {
            Value::ObjectId(id) => Some(id),
            _ => None,
        })
    }

    /// Ensure the document carries an `_id` key, generating a fresh
    /// [`ObjectId`] and prepending it when absent. Called on documents
    /// queued for insertion.
    pub fn ensure_id(&mut self) {
        if !self.contains_key("_id") {
            self.entries
                .insert(0, ("_id".to_string(), Value::ObjectId(ObjectId::new())));
        }
    }

    /// JSON-like rendering for diagnostics. Not a wire format.
    pub fn to_string_pretty(&self, indent: usize) -> String {
        let mut out = String::new();
        render_document(&mut out, self, indent, 1);
        out
    }
}

fn render_value(out: &mut String, value: &Value, indent: usize, depth: usize) {
    match value {
        Value::Double(d) => out.push_str(&d.to_string()),
        Value::String(s) => render_string(out, s),
        Value::Document(d) => render_document(out, d, indent, depth + 1),
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                render_value(out, item, indent, depth);
            }
            out.push(']');
        }
        Value::Binary(bin) => {
            out.push_str(&format!("binary(subtype {}, {} bytes)", bin.subtype, bin.bytes.len()))
        }
        Value::ObjectId(id) => render_string(out, &id.to_string()),
        Value::Boolean(b) => out.push_str(if *b { "true" } else { "false" }),
        Value::DateTime(ms) => out.push_str(&ms.to_string()),
        Value::Null => out.push_str("null"),
        Value::Int32(n) => out.push_str(&n.to_string()),
        Value::Int64(n) => out.push_str(&n.to_string()),
    }
}

fn render_string(out: &mut String, s: &str) {
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            _ => out.push(c),
        }
    }
    out.push('"');
}

fn render_document(out: &mut String, doc: &Document, indent: usize, depth: usize) {
    let (open_pad, pad, close_pad) = if indent > 0 {
        (
            "\n".to_string(),
            " ".repeat(indent * depth),
            " ".repeat(indent * (depth - 1)),
        )
    } else {
        (String::new(), String::new(), String::new())
    };

    out.push('{');
    for (i, (key, value)) in doc.iter().enumerate() {
        if i > 0 {
            out.push(',');
            if indent == 0 {
                out.push(' ');
            }
        }
        out.push_str(&open_pad);
        out.push_str(&pad);
        render_string(out, key);
        out.push_str(": ");
        render_value(out, value, indent, depth);
    }
    if !doc.is_empty() {
        out.push_str(&open_pad);
        out.push_str(&close_pad);
    }
    out.push('}');
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_string_pretty(0))
    }
}
