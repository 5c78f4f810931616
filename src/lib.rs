//! # mongowire
//!
//! Client-side implementation of the legacy MongoDB wire protocol.
//!
//! The crate builds typed request messages, serializes them into the
//! binary framing the server expects, sends them over a persistent
//! connection, and decodes binary replies back into a dynamically-typed
//! document model. Application code builds [`Document`]s, issues
//! insert/query/delete/get-more requests, and iterates results through a
//! [`Cursor`]; it never touches raw bytes.
//!
//! ## Layers
//!
//! - [`bson`]: the ordered document model and its binary codec
//! - [`protocol`]: the 16-byte message header, request builders, and the
//!   reply parser
//! - [`connection`]: one request then one reply, in strict alternation
//! - [`cursor`]: query + get-more round-trips as one result stream
//! - [`database`]: namespacing and `$cmd` helpers
//!
//! ## Example
//!
//! ```ignore
//! use mongowire::{Connection, Cursor, Database, Document};
//!
//! #[tokio::main]
//! async fn main() -> mongowire::Result<()> {
//!     let mut conn = Connection::connect("localhost:27017").await?;
//!     let db = Database::new("team");
//!
//!     let mut player = Document::new();
//!     player.add("lastname", "Braem").add("start", 1993i32);
//!     let mut insert = db.insert("players");
//!     insert.document(player);
//!     conn.send_request(&insert).await?;
//!
//!     let mut cursor = Cursor::new("team", "players");
//!     while !cursor.is_exhausted() {
//!         for doc in cursor.next(&mut conn).await? {
//!             println!("{}", doc.to_string_pretty(2));
//!         }
//!     }
//!     cursor.close(&mut conn).await?;
//!     Ok(())
//! }
//! ```

pub mod bson;
pub mod connection;
pub mod cursor;
pub mod database;
pub mod error;
pub mod protocol;

pub use bson::{Binary, Document, ObjectId, Value};
pub use connection::{Connection, RequestIdGenerator};
pub use cursor::Cursor;
pub use database::Database;
pub use error::{Error, Result};
