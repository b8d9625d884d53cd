use chrono::{DateTime, Utc};
use serde_json::{Value, json};

use groove_db::{
    DbError, DocumentRef, PageRequest, RowProperty, StoreClient, ViewRow, plan, project,
};
use groove_store::Transport;
use groove_view::{ViewQuery, ViewTarget};

use crate::error::ScrobbleError;
use crate::stamp::EventStamp;
use crate::types::{Scrobble, ScrobblePage, ScrobbleRequest};

const DATABASE: &str = "scrobbles";
const DESIGN: &str = "scrobbles";
const BY_USER: &str = "by_user";

/// Page size when the request does not name one.
const DEFAULT_PAGE_SIZE: u64 = 50;

/// Scrobble retrieval and recording on top of the view store.
pub struct ScrobbleStore<T: Transport> {
    client: StoreClient<T>,
    by_user: ViewTarget,
}

impl<T: Transport> ScrobbleStore<T> {
    pub fn new(transport: T) -> Self {
        Self {
            client: StoreClient::new(transport),
            by_user: ViewTarget::new(DATABASE, DESIGN, BY_USER),
        }
    }

    /// One page of a user's listening history.
    ///
    /// Fetches one row beyond the page size; that row's stamp becomes the
    /// `next` token, and the page ends the range when it does not exist.
    /// A resumed request treats the cursor as an inclusive bound, so
    /// chained pages neither repeat nor skip events.
    pub fn by_user(
        &self,
        user_id: &str,
        request: &ScrobbleRequest,
    ) -> Result<ScrobblePage, ScrobbleError> {
        let cursor = match request.cursor.as_deref() {
            Some(token) => Some(
                EventStamp::parse_token(token)
                    .map_err(|e| ScrobbleError::BadCursor(format!("{token}: {e}")))?,
            ),
            None => None,
        };
        let limit = request.limit.unwrap_or(DEFAULT_PAGE_SIZE);

        let page = PageRequest {
            scope: Value::String(user_id.to_string()),
            cursor: cursor.map(|stamp| stamp.to_key()),
            range_start: request
                .start
                .map(|instant| EventStamp::from(instant).to_key()),
            range_end: request
                .end
                .map(|instant| EventStamp::from(instant).to_key()),
            direction: request.direction,
            limit: Some(limit.saturating_add(1)),
        };
        let query = plan(&page).with_include_docs(true);
        let rows = self.client.query_rows(&self.by_user, &query)?;

        let limit = limit as usize;
        let page_rows = &rows[..rows.len().min(limit)];
        let items: Vec<Scrobble> = project(page_rows, RowProperty::Doc)?;
        let next = match rows.get(limit) {
            Some(row) => Some(resume_token(limit, row)?),
            None => None,
        };

        Ok(ScrobblePage { items, next })
    }

    /// Every scrobble at one exact instant. A point lookup with `key=`,
    /// no range arguments involved.
    pub fn by_key(
        &self,
        user_id: &str,
        instant: DateTime<Utc>,
    ) -> Result<Vec<Scrobble>, ScrobbleError> {
        let stamp = EventStamp::from(instant);
        let query = ViewQuery::new()
            .with_key(json!([user_id, stamp.to_key()]))
            .with_include_docs(true);
        Ok(self.client.query_documents(&self.by_user, &query)?)
    }

    /// Persist a listening event. A scrobble carrying an id keeps it,
    /// otherwise the store assigns one.
    pub fn record(&self, scrobble: &Scrobble) -> Result<DocumentRef, ScrobbleError> {
        let created = match scrobble.id.as_deref() {
            Some(id) => self.client.create_with_id(DATABASE, id, scrobble)?,
            None => self.client.create(DATABASE, scrobble)?,
        };
        Ok(created)
    }
}

/// Sub-key of the first row beyond the page, rendered as a cursor token.
fn resume_token(index: usize, row: &ViewRow) -> Result<String, ScrobbleError> {
    let stamp = row
        .key
        .get(1)
        .and_then(EventStamp::from_key)
        .ok_or_else(|| {
            ScrobbleError::Db(DbError::Decode {
                row: index,
                property: "key",
                message: "expected a [user, [y, m, d, h, min, s, ms]] composite key".to_string(),
            })
        })?;
    Ok(stamp.token())
}
