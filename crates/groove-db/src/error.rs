use std::fmt;

use groove_store::TransportError;

#[derive(Debug)]
pub enum DbError {
    /// The request never completed.
    Transport(TransportError),
    /// A view query came back with a non-success status.
    Query { status: u16, reason: String },
    /// A document operation came back with a non-success status.
    Operation {
        operation: &'static str,
        status: u16,
        reason: String,
    },
    /// A write or delete lost against a newer revision of the document.
    Conflict(String),
    /// The response envelope is missing or mistypes a field.
    Envelope {
        field: &'static str,
        message: String,
    },
    /// A row in an otherwise valid envelope cannot be decoded. Fatal for
    /// the whole page.
    Decode {
        row: usize,
        property: &'static str,
        message: String,
    },
    Serialization(String),
}

impl fmt::Display for DbError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DbError::Transport(e) => write!(f, "transport error: {e}"),
            DbError::Query { status, reason } => {
                write!(f, "view query failed with status {status}: {reason}")
            }
            DbError::Operation {
                operation,
                status,
                reason,
            } => write!(f, "{operation} failed with status {status}: {reason}"),
            DbError::Conflict(id) => write!(f, "revision conflict on document {id}"),
            DbError::Envelope { field, message } => {
                write!(f, "invalid view response: {field}: {message}")
            }
            DbError::Decode {
                row,
                property,
                message,
            } => write!(f, "cannot decode {property} of row {row}: {message}"),
            DbError::Serialization(msg) => write!(f, "serialization error: {msg}"),
        }
    }
}

impl std::error::Error for DbError {}

impl From<TransportError> for DbError {
    fn from(e: TransportError) -> Self {
        DbError::Transport(e)
    }
}

impl From<serde_json::Error> for DbError {
    fn from(e: serde_json::Error) -> Self {
        DbError::Serialization(e.to_string())
    }
}
