use serde::{Deserialize, Serialize, de::DeserializeOwned};

use groove_store::{StoreRequest, Transport};

use crate::client::{StoreClient, consume, error_reason};
use crate::error::DbError;

/// Identity of a stored document: its id plus the revision the store
/// assigned on the last write. The revision is opaque; it only travels
/// back on the next update or delete.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DocumentRef {
    pub id: String,
    pub rev: String,
}

impl<T: Transport> StoreClient<T> {
    /// Create a document and let the store assign its id.
    pub fn create<D: Serialize>(&self, database: &str, doc: &D) -> Result<DocumentRef, DbError> {
        let body = serde_json::to_vec(doc)?;
        tracing::debug!(database, "creating document");
        let response = self.transport.execute(StoreRequest::post(database, body))?;
        let (status, bytes) = consume(response)?;
        if !(200..300).contains(&status) {
            return Err(DbError::Operation {
                operation: "create",
                status,
                reason: error_reason(&bytes),
            });
        }
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Create a document under a caller-chosen id. Fails with `Conflict`
    /// when the id is already taken.
    pub fn create_with_id<D: Serialize>(
        &self,
        database: &str,
        id: &str,
        doc: &D,
    ) -> Result<DocumentRef, DbError> {
        self.write("create", database, id, doc)
    }

    /// Replace a document. The serialized body must carry the current
    /// revision; a stale one fails with `Conflict` and is not retried.
    pub fn update<D: Serialize>(
        &self,
        database: &str,
        id: &str,
        doc: &D,
    ) -> Result<DocumentRef, DbError> {
        self.write("update", database, id, doc)
    }

    fn write<D: Serialize>(
        &self,
        operation: &'static str,
        database: &str,
        id: &str,
        doc: &D,
    ) -> Result<DocumentRef, DbError> {
        let body = serde_json::to_vec(doc)?;
        tracing::debug!(database, id, "writing document");
        let response = self
            .transport
            .execute(StoreRequest::put(document_path(database, id), body))?;
        let (status, bytes) = consume(response)?;
        match status {
            s if (200..300).contains(&s) => Ok(serde_json::from_slice(&bytes)?),
            409 => Err(DbError::Conflict(id.to_string())),
            s => Err(DbError::Operation {
                operation,
                status: s,
                reason: error_reason(&bytes),
            }),
        }
    }

    /// Fetch a document by id. Absence is an expected outcome, not an
    /// error.
    pub fn retrieve<D: DeserializeOwned>(
        &self,
        database: &str,
        id: &str,
    ) -> Result<Option<D>, DbError> {
        tracing::debug!(database, id, "retrieving document");
        let response = self
            .transport
            .execute(StoreRequest::get(document_path(database, id)))?;
        let (status, bytes) = consume(response)?;
        match status {
            s if (200..300).contains(&s) => Ok(Some(serde_json::from_slice(&bytes)?)),
            404 => Ok(None),
            s => Err(DbError::Operation {
                operation: "retrieve",
                status: s,
                reason: error_reason(&bytes),
            }),
        }
    }

    /// Delete a document at a known revision. A stale revision fails with
    /// `Conflict`; deleting a document that is already gone is an
    /// `Operation` failure.
    pub fn delete(&self, database: &str, id: &str, rev: &str) -> Result<(), DbError> {
        tracing::debug!(database, id, "deleting document");
        let request = StoreRequest::delete(document_path(database, id)).with_param("rev", rev);
        let response = self.transport.execute(request)?;
        let (status, bytes) = consume(response)?;
        match status {
            s if (200..300).contains(&s) => Ok(()),
            409 => Err(DbError::Conflict(id.to_string())),
            s => Err(DbError::Operation {
                operation: "delete",
                status: s,
                reason: error_reason(&bytes),
            }),
        }
    }
}

fn document_path(database: &str, id: &str) -> String {
    format!("{database}/{id}")
}
