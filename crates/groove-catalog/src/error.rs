use std::fmt;

use groove_db::DbError;

#[derive(Debug)]
pub enum CatalogError {
    /// A store operation failed; `entity` names the catalog database
    /// the operation ran against.
    Db {
        entity: &'static str,
        source: DbError,
    },
}

impl fmt::Display for CatalogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CatalogError::Db { entity, source } => write!(f, "db error on {entity}: {source}"),
        }
    }
}

impl std::error::Error for CatalogError {}

impl CatalogError {
    pub fn status_code(&self) -> http::StatusCode {
        match self {
            CatalogError::Db {
                source: DbError::Conflict(_),
                ..
            } => http::StatusCode::CONFLICT,
            CatalogError::Db { .. } => http::StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
