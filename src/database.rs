//! Database naming helper and common commands.
//!
//! Wraps a database name and produces requests with the full collection
//! name ("<database>.<collection>") filled in. Commands are queries
//! against the pseudo-collection `$cmd` whose selector's first key is the
//! command name.

use tokio::io::{AsyncRead, AsyncWrite};

use crate::bson::{Document, Value};
use crate::connection::Connection;
use crate::error::{Error, Result};
use crate::protocol::{DeleteRequest, InsertRequest, QueryRequest, UpdateRequest};

/// Helper for building requests against one database.
#[derive(Debug, Clone)]
pub struct Database {
    name: String,
}

impl Database {
    /// Create a helper for the given database name.
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// The database name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The full collection name for a collection in this database.
    pub fn namespace(&self, collection: &str) -> String {
        format!("{}.{}", self.name, collection)
    }

    /// Create a query against a collection.
    pub fn query(&self, collection: &str) -> QueryRequest {
        QueryRequest::new(self.namespace(collection))
    }

    /// Create an insert against a collection.
    pub fn insert(&self, collection: &str) -> InsertRequest {
        InsertRequest::new(self.namespace(collection))
    }

    /// Create an update against a collection.
    pub fn update(&self, collection: &str) -> UpdateRequest {
        UpdateRequest::new(self.namespace(collection))
    }

    /// Create a delete against a collection.
    pub fn delete(&self, collection: &str) -> DeleteRequest {
        DeleteRequest::new(self.namespace(collection))
    }

    /// Create a command query against `$cmd`. The command document's
    /// first key names the command; one reply document is requested.
    pub fn command(&self, command: Document) -> QueryRequest {
        let mut request = QueryRequest::new(self.namespace("$cmd"));
        request.set_number_to_return(1);
        request.set_selector(command);
        request
    }

    /// Build a `count` command for a collection.
    pub fn count_request(&self, collection: &str) -> QueryRequest {
        let mut command = Document::new();
        command.add("count", collection);
        self.command(command)
    }

    /// Build a `buildInfo` command.
    pub fn build_info_request(&self) -> QueryRequest {
        let mut command = Document::new();
        command.add("buildInfo", 1i32);
        self.command(command)
    }

    /// Run `count` on a collection and return the server's `n`.
    pub async fn count<S>(&self, conn: &mut Connection<S>, collection: &str) -> Result<f64>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let reply = conn
            .send_request_expecting_reply(&self.count_request(collection))
            .await?;
        if let Some(message) = reply.error() {
            return Err(Error::QueryFailure(message.to_string()));
        }
        let doc = reply
            .documents
            .first()
            .ok_or_else(|| Error::Framing("count reply carried no document".to_string()))?;
        // older servers return n as a double, newer ones as an int
        match doc.get("n")? {
            Value::Double(n) => Ok(*n),
            Value::Int32(n) => Ok(*n as f64),
            Value::Int64(n) => Ok(*n as f64),
            other => Err(Error::TypeMismatch {
                key: "n".to_string(),
                expected: "double",
                actual: other.type_name(),
            }),
        }
    }
}
