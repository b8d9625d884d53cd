use serde::de::DeserializeOwned;
use serde_json::Value;

use groove_store::{StoreRequest, StoreResponse, Transport, TransportError};
use groove_view::{ViewQuery, ViewTarget};

use crate::error::DbError;
use crate::rows::{self, RowProperty, ViewRow};

/// Client for view queries and document operations, generic over the
/// transport that carries them. Holds no state between calls; the store's
/// revision tokens are the only concurrency control.
pub struct StoreClient<T: Transport> {
    pub(crate) transport: T,
}

impl<T: Transport> StoreClient<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    /// Execute a view query and parse the response envelope. A non-success
    /// status becomes a `Query` error and is never retried here.
    fn execute_view(&self, target: &ViewTarget, query: &ViewQuery) -> Result<Value, DbError> {
        let path = target.path();
        tracing::debug!(path = %path, "executing view query");
        let request = StoreRequest::get(path).with_params(query.build());
        let response = self.transport.execute(request)?;
        let (status, body) = consume(response)?;
        if !(200..300).contains(&status) {
            return Err(DbError::Query {
                status,
                reason: error_reason(&body),
            });
        }
        Ok(serde_json::from_slice(&body)?)
    }

    /// Number of rows in the whole view. Issues `limit=0`, so no row data
    /// crosses the wire.
    pub fn query_size(&self, target: &ViewTarget) -> Result<u64, DbError> {
        let query = ViewQuery::new().with_limit(0);
        let envelope = self.execute_view(target, &query)?;
        rows::decode_total_rows(&envelope)
    }

    /// Raw rows of a view query. An empty result is an empty vec, not an
    /// error.
    pub fn query_rows(
        &self,
        target: &ViewTarget,
        query: &ViewQuery,
    ) -> Result<Vec<ViewRow>, DbError> {
        let envelope = self.execute_view(target, query)?;
        rows::decode_rows(&envelope)
    }

    /// The `value` of every row, decoded as `V`.
    pub fn query_values<V>(&self, target: &ViewTarget, query: &ViewQuery) -> Result<Vec<V>, DbError>
    where
        V: DeserializeOwned,
    {
        let rows = self.query_rows(target, query)?;
        rows::project(&rows, RowProperty::Value)
    }

    /// The `doc` of every row, decoded as `D`. The query must have set
    /// `include_docs`, otherwise every row fails to decode.
    pub fn query_documents<D>(
        &self,
        target: &ViewTarget,
        query: &ViewQuery,
    ) -> Result<Vec<D>, DbError>
    where
        D: DeserializeOwned,
    {
        let rows = self.query_rows(target, query)?;
        rows::project(&rows, RowProperty::Doc)
    }
}

/// Drain the response body. Runs on every path, success or failure, so
/// the stream always goes back to the transport.
pub(crate) fn consume(response: StoreResponse) -> Result<(u16, Vec<u8>), DbError> {
    let status = response.status;
    let body = response
        .read_body()
        .map_err(|e| DbError::Transport(TransportError::Io(e)))?;
    Ok((status, body))
}

/// Pull the store's error/reason pair out of a failure body, falling back
/// to the raw text when the body is not the usual JSON shape.
pub(crate) fn error_reason(body: &[u8]) -> String {
    if let Ok(value) = serde_json::from_slice::<Value>(body) {
        let error = value.get("error").and_then(Value::as_str);
        let reason = value.get("reason").and_then(Value::as_str);
        match (error, reason) {
            (Some(error), Some(reason)) => return format!("{error}: {reason}"),
            (Some(error), None) => return error.to_string(),
            (None, Some(reason)) => return reason.to_string(),
            (None, None) => {}
        }
    }
    String::from_utf8_lossy(body).into_owned()
}
