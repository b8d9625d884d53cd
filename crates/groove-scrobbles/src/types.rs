use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use groove_view::SortDirection;

/// One listening event. A scrobble without an id has never been
/// persisted; the revision only appears on documents read back from the
/// store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scrobble {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "_rev", skip_serializing_if = "Option::is_none")]
    pub rev: Option<String>,
    pub user_id: String,
    pub artist: String,
    pub track: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub album: Option<String>,
    pub played_at: DateTime<Utc>,
}

/// Query half of the public pagination contract. All fields are optional;
/// an empty request reads the user's history from the beginning.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScrobbleRequest {
    /// Resume token from a previous page's `next`.
    pub cursor: Option<String>,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    #[serde(default)]
    pub direction: SortDirection,
    pub limit: Option<u64>,
}

/// Result half of the pagination contract. `next` is absent when the page
/// ended the range.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScrobblePage {
    pub items: Vec<Scrobble>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next: Option<String>,
}
