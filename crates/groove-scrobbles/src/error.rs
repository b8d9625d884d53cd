use std::fmt;

use groove_db::DbError;

#[derive(Debug)]
pub enum ScrobbleError {
    Db(DbError),
    /// The caller handed back a cursor this service never produced. A
    /// client input problem, not a store failure.
    BadCursor(String),
}

impl fmt::Display for ScrobbleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScrobbleError::Db(e) => write!(f, "db error: {e}"),
            ScrobbleError::BadCursor(msg) => write!(f, "bad cursor: {msg}"),
        }
    }
}

impl std::error::Error for ScrobbleError {}

impl ScrobbleError {
    pub fn status_code(&self) -> http::StatusCode {
        match self {
            ScrobbleError::BadCursor(_) => http::StatusCode::BAD_REQUEST,
            ScrobbleError::Db(DbError::Conflict(_)) => http::StatusCode::CONFLICT,
            ScrobbleError::Db(_) => http::StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<DbError> for ScrobbleError {
    fn from(e: DbError) -> Self {
        ScrobbleError::Db(e)
    }
}
