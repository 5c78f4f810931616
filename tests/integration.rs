//! Integration tests for mongowire.
//!
//! These drive the full stack — document model, codec, request builders,
//! connection, cursor — against a scripted in-memory peer speaking the
//! server side of the protocol over `tokio::io::duplex`.

use bytes::{Buf, BufMut, Bytes, BytesMut};
use tokio::io::{duplex, AsyncReadExt, AsyncWriteExt, DuplexStream};

use mongowire::bson::{decode, encode};
use mongowire::protocol::{MessageHeader, OpCode, HEADER_SIZE};
use mongowire::{Connection, Cursor, Database, Document, RequestIdGenerator, Value};

/// One request frame as the scripted server saw it.
struct SeenRequest {
    header: MessageHeader,
    body: Bytes,
}

async fn read_request(server: &mut DuplexStream) -> SeenRequest {
    let mut head = [0u8; HEADER_SIZE];
    server.read_exact(&mut head).await.unwrap();
    let header = MessageHeader::from_bytes(&head);
    let mut body = vec![0u8; header.message_length as usize - HEADER_SIZE];
    server.read_exact(&mut body).await.unwrap();
    SeenRequest {
        header,
        body: Bytes::from(body),
    }
}

async fn write_reply(
    server: &mut DuplexStream,
    response_to: i32,
    cursor_id: i64,
    docs: &[Document],
) {
    let mut body = BytesMut::new();
    body.put_i32_le(0);
    body.put_i64_le(cursor_id);
    body.put_i32_le(0);
    body.put_i32_le(docs.len() as i32);
    for doc in docs {
        encode::write_document(&mut body, doc);
    }
    let header = MessageHeader::new(
        (HEADER_SIZE + body.len()) as i32,
        1,
        response_to,
        OpCode::Reply.as_i32(),
    );
    server.write_all(&header.encode()).await.unwrap();
    server.write_all(&body).await.unwrap();
}

fn player() -> Document {
    let mut doc = Document::new();
    doc.add("lastname", "Braem")
        .add("firstname", "Franky")
        .add("start", 1993i32)
        .add("active", false);
    doc
}

/// Insert, then query back: the server sees an OP_INSERT whose document
/// round-trips with key order and types intact, and the reply decodes
/// into the same document the client queued.
#[tokio::test]
async fn test_insert_then_query_round_trip() {
    let (client, mut server) = duplex(64 * 1024);
    let mut conn = Connection::with_request_ids(client, RequestIdGenerator::starting_at(0));
    let db = Database::new("team");

    let script = tokio::spawn(async move {
        // OP_INSERT
        let insert = read_request(&mut server).await;
        assert_eq!(insert.header.op_code, OpCode::Insert.as_i32());
        assert_eq!(insert.header.request_id, 0);
        assert_eq!(insert.header.response_to, 0);

        let mut body = insert.body.clone();
        let flags = body.get_i32_le();
        assert_eq!(flags, 0);
        let name_end = body.iter().position(|&b| b == 0).unwrap();
        assert_eq!(&body[..name_end], b"team.players");
        body.advance(name_end + 1);
        let stored = decode::read_document(&mut body).unwrap();
        assert!(!body.has_remaining());

        // _id was generated client-side and leads the document
        let keys: Vec<&str> = stored.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["_id", "lastname", "firstname", "start", "active"]);
        assert!(stored.get_object_id("_id").is_ok());
        assert_eq!(stored.get_str("lastname").unwrap(), "Braem");
        assert_eq!(stored.get_str("firstname").unwrap(), "Franky");
        assert_eq!(stored.get_i32("start").unwrap(), 1993);
        assert!(!stored.get_bool("active").unwrap());

        // OP_QUERY, answered with the stored document
        let query = read_request(&mut server).await;
        assert_eq!(query.header.op_code, OpCode::Query.as_i32());
        write_reply(&mut server, query.header.request_id, 0, &[stored]).await;
    });

    let mut insert = db.insert("players");
    insert.document(player());
    conn.send_request(&insert).await.unwrap();

    let mut query = db.query("players");
    query.selector_mut().add("lastname", "Braem");
    let reply = conn.send_request_expecting_reply(&query).await.unwrap();

    assert_eq!(reply.documents.len(), 1);
    let doc = &reply.documents[0];
    assert_eq!(doc.get_str("lastname").unwrap(), "Braem");
    assert_eq!(doc.get_i32("start").unwrap(), 1993);
    script.await.unwrap();
}

/// A cursor driven to exhaustion performs exactly one query plus one
/// get-more per live reply, concatenates the batches in order, and goes
/// quiet after cursor id 0.
#[tokio::test]
async fn test_cursor_paginates_until_cursor_id_zero() {
    let (client, mut server) = duplex(64 * 1024);
    let mut conn = Connection::new(client);

    let script = tokio::spawn(async move {
        let docs = |range: std::ops::Range<i32>| -> Vec<Document> {
            range
                .map(|n| {
                    let mut doc = Document::new();
                    doc.add("number", n);
                    doc
                })
                .collect()
        };

        let query = read_request(&mut server).await;
        assert_eq!(query.header.op_code, OpCode::Query.as_i32());
        write_reply(&mut server, query.header.request_id, 7001, &docs(0..3)).await;

        for round in 0..2 {
            let get_more = read_request(&mut server).await;
            assert_eq!(get_more.header.op_code, OpCode::GetMore.as_i32());
            // body: reserved, cstring, numberToReturn, cursorID
            let body = &get_more.body[..];
            let name_end = 4 + body[4..].iter().position(|&b| b == 0).unwrap();
            assert_eq!(&body[4..name_end], b"team.numbers");
            let cursor_id = i64::from_le_bytes(
                body[name_end + 5..name_end + 13].try_into().unwrap(),
            );
            assert_eq!(cursor_id, 7001);

            let next_id = if round == 1 { 0 } else { 7001 };
            let lo = 3 + round * 3;
            write_reply(&mut server, get_more.header.request_id, next_id, &docs(lo..lo + 3))
                .await;
        }
    });

    let mut cursor = Cursor::new("team", "numbers");
    cursor.set_batch_size(3);
    let mut numbers = Vec::new();
    while !cursor.is_exhausted() {
        for doc in cursor.next(&mut conn).await.unwrap() {
            numbers.push(doc.get_i32("number").unwrap());
        }
    }

    assert_eq!(numbers, (0..9).collect::<Vec<i32>>());
    assert_eq!(cursor.retrieved(), 9);
    assert!(cursor.next(&mut conn).await.unwrap().is_empty());
    script.await.unwrap();
}

/// Abandoning an active cursor emits OP_KILL_CURSORS with the live id.
#[tokio::test]
async fn test_abandoned_cursor_kills_server_cursor() {
    let (client, mut server) = duplex(64 * 1024);
    let mut conn = Connection::new(client);

    let script = tokio::spawn(async move {
        let query = read_request(&mut server).await;
        write_reply(&mut server, query.header.request_id, 555, &[]).await;

        let kill = read_request(&mut server).await;
        assert_eq!(kill.header.op_code, OpCode::KillCursors.as_i32());
        let body = &kill.body[..];
        assert_eq!(&body[0..4], &[0, 0, 0, 0]);
        assert_eq!(&body[4..8], &1i32.to_le_bytes());
        assert_eq!(&body[8..16], &555i64.to_le_bytes());
    });

    let mut cursor = Cursor::new("team", "numbers");
    cursor.next(&mut conn).await.unwrap();
    cursor.close(&mut conn).await.unwrap();
    script.await.unwrap();
}

/// The count command goes to "$cmd" with the command name as first key;
/// the helper accepts the numeric `n` the server returns.
#[tokio::test]
async fn test_database_count_command() {
    let (client, mut server) = duplex(64 * 1024);
    let mut conn = Connection::new(client);

    let script = tokio::spawn(async move {
        let request = read_request(&mut server).await;
        assert_eq!(request.header.op_code, OpCode::Query.as_i32());

        let mut body = request.body.clone();
        body.advance(4); // flags
        let name_end = body.iter().position(|&b| b == 0).unwrap();
        assert_eq!(&body[..name_end], b"team.$cmd");
        body.advance(name_end + 1);
        let number_to_skip = body.get_i32_le();
        let number_to_return = body.get_i32_le();
        assert_eq!(number_to_skip, 0);
        assert_eq!(number_to_return, 1);

        let command = decode::read_document(&mut body).unwrap();
        assert_eq!(command.iter().next().unwrap().0, "count");
        assert_eq!(command.get_str("count").unwrap(), "numbers");

        let mut result = Document::new();
        result.add("n", Value::Double(10000.0)).add("ok", 1.0f64);
        write_reply(&mut server, request.header.request_id, 0, &[result]).await;
    });

    let db = Database::new("team");
    let count = db.count(&mut conn, "numbers").await.unwrap();
    assert_eq!(count, 10000.0);
    script.await.unwrap();
}

/// A reply whose body carries an undefined type tag fails decode with a
/// typed error and poisons nothing else: the client sees the failure
/// rather than a partial document.
#[tokio::test]
async fn test_corrupt_reply_surfaces_decode_error() {
    let (client, mut server) = duplex(64 * 1024);
    let mut conn = Connection::new(client);

    let script = tokio::spawn(async move {
        let query = read_request(&mut server).await;

        // hand-craft a reply holding a document with tag 0xFF
        let mut bad_doc = vec![0u8; 4];
        bad_doc.push(0xFF);
        bad_doc.extend_from_slice(b"field\0");
        bad_doc.push(0);
        let len = bad_doc.len() as i32;
        bad_doc[0..4].copy_from_slice(&len.to_le_bytes());

        let mut body = BytesMut::new();
        body.put_i32_le(0);
        body.put_i64_le(0);
        body.put_i32_le(0);
        body.put_i32_le(1);
        body.put_slice(&bad_doc);
        let header = MessageHeader::new(
            (HEADER_SIZE + body.len()) as i32,
            1,
            query.header.request_id,
            OpCode::Reply.as_i32(),
        );
        server.write_all(&header.encode()).await.unwrap();
        server.write_all(&body).await.unwrap();
    });

    let query = Database::new("team").query("numbers");
    let result = conn.send_request_expecting_reply(&query).await;
    match result {
        Err(mongowire::Error::UnknownType { tag, key }) => {
            assert_eq!(tag, 0xFF);
            assert_eq!(key, "field");
        }
        other => panic!("expected unknown type error, got {:?}", other),
    }
    script.await.unwrap();
}
