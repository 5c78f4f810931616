//! BSON deserializer.
//!
//! Strict parsing: declared lengths must match the bytes actually
//! consumed, and an unrecognized type tag aborts the decode. A document
//! is never partially populated on error.

use bytes::{Buf, Bytes};

use crate::error::{Error, Result};

use super::{tag, Binary, Document, ObjectId, Value};

/// Parse a complete document from a byte slice. Trailing bytes after the
/// document are a framing error.
pub fn from_bytes(bytes: &[u8]) -> Result<Document> {
    let mut buf = Bytes::copy_from_slice(bytes);
    let doc = read_document(&mut buf)?;
    if buf.has_remaining() {
        return Err(Error::Framing(format!(
            "{} trailing bytes after document",
            buf.remaining()
        )));
    }
    Ok(doc)
}

/// Parse one document from the front of `buf`, consuming exactly the
/// declared length. Used by the reply parser, which reads several
/// documents back to back from one body.
pub fn read_document(buf: &mut Bytes) -> Result<Document> {
    if buf.remaining() < 4 {
        return Err(Error::Framing(format!(
            "document length prefix needs 4 bytes, {} available",
            buf.remaining()
        )));
    }
    let declared = buf.get_i32_le();
    if declared < 5 {
        return Err(Error::Framing(format!(
            "document length {} below minimum of 5",
            declared
        )));
    }
    let body_len = declared as usize - 4;
    if buf.remaining() < body_len {
        return Err(Error::Framing(format!(
            "document declares {} bytes, {} available",
            declared,
            buf.remaining() + 4
        )));
    }

    let mut body = buf.split_to(body_len);
    let mut doc = Document::new();
    loop {
        if !body.has_remaining() {
            return Err(Error::Framing(
                "document body ended without terminator".to_string(),
            ));
        }
        let type_tag = body.get_u8();
        if type_tag == tag::END {
            if body.has_remaining() {
                return Err(Error::Framing(format!(
                    "{} bytes left after document terminator",
                    body.remaining()
                )));
            }
            return Ok(doc);
        }
        let key = read_cstring(&mut body)?;
        let value = read_value(&mut body, type_tag, &key)?;
        doc.add(key, value);
    }
}

fn read_value(buf: &mut Bytes, type_tag: u8, key: &str) -> Result<Value> {
    match type_tag {
        tag::DOUBLE => {
            need(buf, 8, key, "double")?;
            Ok(Value::Double(buf.get_f64_le()))
        }
        tag::STRING => Ok(Value::String(read_string(buf, key)?)),
        tag::DOCUMENT => Ok(Value::Document(read_document(buf)?)),
        tag::ARRAY => Ok(Value::Array(read_document(buf)?.into_values())),
        tag::BINARY => {
            need(buf, 5, key, "binary header")?;
            let len = buf.get_i32_le();
            if len < 0 {
                return Err(Error::Framing(format!(
                    "negative binary length {} for key {:?}",
                    len, key
                )));
            }
            let subtype = buf.get_u8();
            need(buf, len as usize, key, "binary payload")?;
            let bytes = buf.split_to(len as usize).to_vec();
            Ok(Value::Binary(Binary { subtype, bytes }))
        }
        tag::OBJECT_ID => {
            need(buf, 12, key, "objectid")?;
            let mut raw = [0u8; 12];
            buf.copy_to_slice(&mut raw);
            Ok(Value::ObjectId(ObjectId::from_bytes(raw)))
        }
        tag::BOOLEAN => {
            need(buf, 1, key, "boolean")?;
            match buf.get_u8() {
                0 => Ok(Value::Boolean(false)),
                1 => Ok(Value::Boolean(true)),
                other => Err(Error::Framing(format!(
                    "invalid boolean byte 0x{:02X} for key {:?}",
                    other, key
                ))),
            }
        }
        tag::DATETIME => {
            need(buf, 8, key, "datetime")?;
            Ok(Value::DateTime(buf.get_i64_le()))
        }
        tag::NULL => Ok(Value::Null),
        tag::INT32 => {
            need(buf, 4, key, "int32")?;
            Ok(Value::Int32(buf.get_i32_le()))
        }
        tag::INT64 => {
            need(buf, 8, key, "int64")?;
            Ok(Value::Int64(buf.get_i64_le()))
        }
        other => Err(Error::UnknownType {
            tag: other,
            key: key.to_string(),
        }),
    }
}

fn read_cstring(buf: &mut Bytes) -> Result<String> {
    let end = buf
        .iter()
        .position(|&b| b == 0)
        .ok_or_else(|| Error::Framing("unterminated cstring".to_string()))?;
    let raw = buf.split_to(end);
    buf.advance(1); // terminator
    String::from_utf8(raw.to_vec())
        .map_err(|_| Error::Framing("invalid UTF-8 in cstring".to_string()))
}

fn read_string(buf: &mut Bytes, key: &str) -> Result<String> {
    need(buf, 4, key, "string length")?;
    let len = buf.get_i32_le();
    if len < 1 {
        return Err(Error::Framing(format!(
            "string length {} below minimum of 1 for key {:?}",
            len, key
        )));
    }
    need(buf, len as usize, key, "string payload")?;
    let mut raw = buf.split_to(len as usize).to_vec();
    match raw.pop() {
        Some(0) => {}
        _ => {
            return Err(Error::Framing(format!(
                "string for key {:?} is not null-terminated",
                key
            )))
        }
    }
    String::from_utf8(raw).map_err(|_| {
        Error::Framing(format!("invalid UTF-8 in string for key {:?}", key))
    })
}

fn need(buf: &Bytes, n: usize, key: &str, what: &str) -> Result<()> {
    if buf.remaining() < n {
        return Err(Error::Framing(format!(
            "{} for key {:?} needs {} bytes, {} available",
            what,
            key,
            n,
            buf.remaining()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bson::encode;

    fn round_trip(doc: &Document) -> Document {
        from_bytes(&encode::to_bytes(doc)).expect("round trip decode")
    }

    #[test]
    fn test_round_trip_all_scalar_types() {
        let mut doc = Document::new();
        doc.add("d", 3.25f64)
            .add("s", "text")
            .add("bin", Binary { subtype: 0x80, bytes: vec![1, 2, 3] })
            .add("id", ObjectId::new())
            .add("yes", true)
            .add("no", false)
            .add("when", Value::DateTime(-62135596800000))
            .add("nil", Value::Null)
            .add("small", i32::MIN)
            .add("large", i64::MAX);

        assert_eq!(round_trip(&doc), doc);
    }

    #[test]
    fn test_round_trip_preserves_key_order() {
        let mut doc = Document::new();
        doc.add("lastname", "Braem")
            .add("firstname", "Franky")
            .add("start", 1993i32)
            .add("active", false);

        let back = round_trip(&doc);
        let keys: Vec<&str> = back.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["lastname", "firstname", "start", "active"]);
        assert_eq!(back.get_str("lastname").unwrap(), "Braem");
        assert_eq!(back.get_str("firstname").unwrap(), "Franky");
        assert_eq!(back.get_i32("start").unwrap(), 1993);
        assert!(!back.get_bool("active").unwrap());
    }

    #[test]
    fn test_round_trip_nested_three_deep() {
        let mut level3 = Document::new();
        level3.add("leaf", "bottom");
        let mut level2 = Document::new();
        level2.add("three", level3).add("xs", vec![
            Value::Int32(1),
            Value::Array(vec![Value::from("nested"), Value::Null]),
        ]);
        let mut doc = Document::new();
        doc.add("two", level2).add("top", 1i32);

        assert_eq!(round_trip(&doc), doc);
    }

    #[test]
    fn test_round_trip_duplicate_keys() {
        let mut doc = Document::new();
        doc.add("k", 1i32).add("k", 2i32);

        let back = round_trip(&doc);
        assert_eq!(back.len(), 2);
        let values: Vec<&Value> = back.iter().map(|(_, v)| v).collect();
        assert_eq!(values, vec![&Value::Int32(1), &Value::Int32(2)]);
    }

    #[test]
    fn test_unknown_tag_is_rejected() {
        // {len}[0xFF]["bad\0"] ... terminator
        let mut raw = vec![0u8; 4];
        raw.push(0xFF);
        raw.extend_from_slice(b"bad\0");
        raw.push(0);
        let len = raw.len() as i32;
        raw[0..4].copy_from_slice(&len.to_le_bytes());

        match from_bytes(&raw) {
            Err(Error::UnknownType { tag, key }) => {
                assert_eq!(tag, 0xFF);
                assert_eq!(key, "bad");
            }
            other => panic!("expected unknown type error, got {:?}", other),
        }
    }

    #[test]
    fn test_truncated_document_is_framing_error() {
        let bytes = encode::to_bytes(&{
            let mut doc = Document::new();
            doc.add("k", 12345i32);
            doc
        });
        let result = from_bytes(&bytes[..bytes.len() - 3]);
        assert!(matches!(result, Err(Error::Framing(_))));
    }

    #[test]
    fn test_declared_length_longer_than_input() {
        let mut raw = encode::to_bytes(&Document::new()).to_vec();
        raw[0] = 100; // lie about the length
        assert!(matches!(from_bytes(&raw), Err(Error::Framing(_))));
    }

    #[test]
    fn test_missing_terminator_is_framing_error() {
        // declared length covers a null element whose key runs off the end
        let raw = vec![6, 0, 0, 0, 0x0A, b'k'];
        assert!(matches!(from_bytes(&raw), Err(Error::Framing(_))));
    }

    #[test]
    fn test_trailing_bytes_after_document() {
        let mut raw = encode::to_bytes(&Document::new()).to_vec();
        raw.push(0x42);
        assert!(matches!(from_bytes(&raw), Err(Error::Framing(_))));
    }

    #[test]
    fn test_invalid_boolean_byte() {
        let mut raw = vec![0u8; 4];
        raw.push(tag::BOOLEAN);
        raw.extend_from_slice(b"b\0");
        raw.push(0x02);
        raw.push(0);
        let len = raw.len() as i32;
        raw[0..4].copy_from_slice(&len.to_le_bytes());
        assert!(matches!(from_bytes(&raw), Err(Error::Framing(_))));
    }

    #[test]
    fn test_read_document_leaves_following_bytes() {
        let mut doc = Document::new();
        doc.add("n", 1i32);
        let mut stream = encode::to_bytes(&doc).to_vec();
        stream.extend_from_slice(&encode::to_bytes(&doc));

        let mut buf = Bytes::from(stream);
        let first = read_document(&mut buf).unwrap();
        let second = read_document(&mut buf).unwrap();
        assert_eq!(first, doc);
        assert_eq!(second, doc);
        assert!(!buf.has_remaining());
    }
}
