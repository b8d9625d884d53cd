use chrono::{DateTime, Utc};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::json;

use groove_db::{DbError, DocumentRef, RowProperty, StoreClient, project};
use groove_store::Transport;
use groove_view::{ViewQuery, ViewTarget};

use crate::entities::{Album, Artist, Label, Session, Track, User};
use crate::error::CatalogError;

const ARTISTS: &str = "artists";
const ALBUMS: &str = "albums";
const TRACKS: &str = "tracks";
const LABELS: &str = "labels";
const USERS: &str = "users";
const SESSIONS: &str = "sessions";

/// Every entity database keeps an `all` view for counting.
const ALL: &str = "all";
const BY_EXPIRY: &str = "by_expiry";

/// Typed access to the catalog databases: one per entity kind, each with
/// document CRUD and a row count off its `all` view.
pub struct Catalog<T: Transport> {
    client: StoreClient<T>,
}

impl<T: Transport> Catalog<T> {
    pub fn new(transport: T) -> Self {
        Self {
            client: StoreClient::new(transport),
        }
    }

    // ── Counts ──────────────────────────────────────────────────

    pub fn artist_count(&self) -> Result<u64, CatalogError> {
        self.count(ARTISTS)
    }

    pub fn album_count(&self) -> Result<u64, CatalogError> {
        self.count(ALBUMS)
    }

    pub fn track_count(&self) -> Result<u64, CatalogError> {
        self.count(TRACKS)
    }

    pub fn label_count(&self) -> Result<u64, CatalogError> {
        self.count(LABELS)
    }

    pub fn user_count(&self) -> Result<u64, CatalogError> {
        self.count(USERS)
    }

    fn count(&self, database: &'static str) -> Result<u64, CatalogError> {
        let target = ViewTarget::new(database, database, ALL);
        self.client
            .query_size(&target)
            .map_err(|source| CatalogError::Db { entity: database, source })
    }

    // ── Entities ────────────────────────────────────────────────

    pub fn artist(&self, id: &str) -> Result<Option<Artist>, CatalogError> {
        self.load(ARTISTS, id)
    }

    pub fn save_artist(&self, artist: &Artist) -> Result<DocumentRef, CatalogError> {
        self.save(ARTISTS, &artist.id, &artist.rev, artist)
    }

    pub fn album(&self, id: &str) -> Result<Option<Album>, CatalogError> {
        self.load(ALBUMS, id)
    }

    pub fn save_album(&self, album: &Album) -> Result<DocumentRef, CatalogError> {
        self.save(ALBUMS, &album.id, &album.rev, album)
    }

    pub fn track(&self, id: &str) -> Result<Option<Track>, CatalogError> {
        self.load(TRACKS, id)
    }

    pub fn save_track(&self, track: &Track) -> Result<DocumentRef, CatalogError> {
        self.save(TRACKS, &track.id, &track.rev, track)
    }

    pub fn label(&self, id: &str) -> Result<Option<Label>, CatalogError> {
        self.load(LABELS, id)
    }

    pub fn save_label(&self, label: &Label) -> Result<DocumentRef, CatalogError> {
        self.save(LABELS, &label.id, &label.rev, label)
    }

    pub fn user(&self, id: &str) -> Result<Option<User>, CatalogError> {
        self.load(USERS, id)
    }

    pub fn save_user(&self, user: &User) -> Result<DocumentRef, CatalogError> {
        self.save(USERS, &user.id, &user.rev, user)
    }

    fn load<D: DeserializeOwned>(
        &self,
        database: &'static str,
        id: &str,
    ) -> Result<Option<D>, CatalogError> {
        self.client
            .retrieve(database, id)
            .map_err(|source| CatalogError::Db { entity: database, source })
    }

    /// Route a document to the right write: a fresh document is created
    /// (with its chosen id when it has one), a document carrying a
    /// revision replaces its stored version.
    fn save<D: Serialize>(
        &self,
        database: &'static str,
        id: &Option<String>,
        rev: &Option<String>,
        doc: &D,
    ) -> Result<DocumentRef, CatalogError> {
        let written = match (id.as_deref(), rev.as_deref()) {
            (Some(id), Some(_)) => self.client.update(database, id, doc),
            (Some(id), None) => self.client.create_with_id(database, id, doc),
            (None, _) => self.client.create(database, doc),
        };
        written.map_err(|source| CatalogError::Db { entity: database, source })
    }

    // ── Sessions ────────────────────────────────────────────────

    pub fn session(&self, id: &str) -> Result<Option<Session>, CatalogError> {
        self.load(SESSIONS, id)
    }

    pub fn save_session(&self, session: &Session) -> Result<DocumentRef, CatalogError> {
        self.save(SESSIONS, &session.id, &session.rev, session)
    }

    pub fn delete_session(&self, id: &str, rev: &str) -> Result<(), CatalogError> {
        self.client
            .delete(SESSIONS, id, rev)
            .map_err(|source| CatalogError::Db { entity: SESSIONS, source })
    }

    /// Delete every session that expired strictly before `now`. The
    /// expiry view keys on epoch milliseconds, so the cutoff is a plain
    /// `endkey` with `inclusive_end=false`. A session refreshed or
    /// removed concurrently is skipped, not an error.
    pub fn purge_expired_sessions(&self, now: DateTime<Utc>) -> Result<u64, CatalogError> {
        let target = ViewTarget::new(SESSIONS, SESSIONS, BY_EXPIRY);
        let query = ViewQuery::new()
            .with_end_key(json!(now.timestamp_millis()))
            .with_inclusive_end(false)
            .with_include_docs(true);
        let rows = self
            .client
            .query_rows(&target, &query)
            .map_err(|source| CatalogError::Db { entity: SESSIONS, source })?;
        let expired: Vec<Session> = project(&rows, RowProperty::Doc)
            .map_err(|source| CatalogError::Db { entity: SESSIONS, source })?;

        let mut purged = 0;
        for session in expired {
            let (Some(id), Some(rev)) = (session.id, session.rev) else {
                continue;
            };
            match self.client.delete(SESSIONS, &id, &rev) {
                Ok(()) => purged += 1,
                Err(DbError::Conflict(_)) => continue,
                Err(DbError::Operation { status: 404, .. }) => continue,
                Err(source) => return Err(CatalogError::Db { entity: SESSIONS, source }),
            }
        }
        Ok(purged)
    }
}
