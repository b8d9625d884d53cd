use std::cmp::Ordering;
use std::collections::HashMap;
use std::io::Cursor;
use std::sync::{Arc, RwLock};

use serde_json::{Map, Value, json};
use uuid::Uuid;

use super::collate;
use crate::error::TransportError;
use crate::transport::{Method, StoreRequest, StoreResponse, Transport};

type MapFn = dyn Fn(&str, &Map<String, Value>) -> Vec<(Value, Value)> + Send + Sync;

struct StoredDoc {
    rev: String,
    fields: Map<String, Value>,
}

#[derive(Default)]
struct Database {
    docs: HashMap<String, StoredDoc>,
    views: HashMap<(String, String), Box<MapFn>>,
}

/// In-process stand-in for the document store. Implements document CRUD
/// with revision checks plus registered map views evaluated with store
/// collation, so the whole request path can be exercised without a server.
///
/// Cloning yields a handle onto the same data.
#[derive(Clone, Default)]
pub struct MemoryStore {
    databases: Arc<RwLock<HashMap<String, Database>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create_database(&self, name: &str) {
        let mut databases = self.databases.write().unwrap();
        databases.entry(name.to_string()).or_default();
    }

    /// Register a map function for `<database>/_design/<design>/_view/<view>`.
    /// The function is called per document with its id and fields (system
    /// fields stripped) and returns the emitted key/value pairs. Creates the
    /// database when it does not exist yet.
    pub fn register_view<F>(&self, database: &str, design: &str, view: &str, map: F)
    where
        F: Fn(&str, &Map<String, Value>) -> Vec<(Value, Value)> + Send + Sync + 'static,
    {
        let mut databases = self.databases.write().unwrap();
        let db = databases.entry(database.to_string()).or_default();
        db.views
            .insert((design.to_string(), view.to_string()), Box::new(map));
    }

    fn query_view(
        &self,
        database: &str,
        design: &str,
        view: &str,
        query: &[(String, String)],
    ) -> StoreResponse {
        let params = match ViewParams::parse(query) {
            Ok(params) => params,
            Err(reason) => return error_response(400, "query_parse_error", &reason),
        };

        let databases = self.databases.read().unwrap();
        let Some(db) = databases.get(database) else {
            return error_response(404, "not_found", "no_db_file");
        };
        let Some(map) = db.views.get(&(design.to_string(), view.to_string())) else {
            return error_response(404, "not_found", "missing_named_view");
        };

        // Materialize the whole view in key order, doc id as tiebreak.
        let mut emitted: Vec<(Value, Value, String)> = Vec::new();
        for (id, doc) in &db.docs {
            for (key, value) in map(id, &doc.fields) {
                emitted.push((key, value, id.clone()));
            }
        }
        emitted.sort_by(|a, b| collate::compare(&a.0, &b.0).then_with(|| a.2.cmp(&b.2)));

        let total_rows = emitted.len();
        if params.descending {
            emitted.reverse();
        }

        let mut offset = 0;
        if let Some(key) = &params.key {
            emitted.retain(|(k, _, _)| collate::compare(k, key) == Ordering::Equal);
        } else {
            if let Some(start) = &params.start_key {
                offset = emitted
                    .iter()
                    .take_while(|(key, _, _)| before_start(key, start, params.descending))
                    .count();
                emitted.drain(..offset);
            }
            if let Some(end) = &params.end_key {
                let cut = emitted.iter().position(|(key, _, _)| {
                    past_end(key, end, params.descending, params.inclusive_end)
                });
                if let Some(position) = cut {
                    emitted.truncate(position);
                }
            }
        }
        if let Some(limit) = params.limit {
            emitted.truncate(limit);
        }

        let rows: Vec<Value> = emitted
            .iter()
            .map(|(key, value, id)| {
                let mut row = Map::new();
                row.insert("id".to_string(), Value::String(id.clone()));
                row.insert("key".to_string(), key.clone());
                row.insert("value".to_string(), value.clone());
                if params.include_docs {
                    let doc = db
                        .docs
                        .get(id)
                        .map(|d| materialize(id, d))
                        .unwrap_or(Value::Null);
                    row.insert("doc".to_string(), doc);
                }
                Value::Object(row)
            })
            .collect();

        json_response(
            200,
            json!({ "total_rows": total_rows, "offset": offset, "rows": rows }),
        )
    }

    fn read_doc(&self, database: &str, id: &str) -> StoreResponse {
        let databases = self.databases.read().unwrap();
        let Some(db) = databases.get(database) else {
            return error_response(404, "not_found", "no_db_file");
        };
        match db.docs.get(id) {
            Some(doc) => json_response(200, materialize(id, doc)),
            None => error_response(404, "not_found", "missing"),
        }
    }

    fn create_doc(&self, database: &str, body: Option<&[u8]>) -> StoreResponse {
        let Some(mut fields) = parse_doc(body) else {
            return error_response(400, "bad_request", "invalid JSON document");
        };
        let id = match fields.remove("_id") {
            Some(Value::String(id)) => id,
            Some(_) => return error_response(400, "bad_request", "_id must be a string"),
            None => Uuid::new_v4().to_string(),
        };
        fields.remove("_rev");

        let mut databases = self.databases.write().unwrap();
        let Some(db) = databases.get_mut(database) else {
            return error_response(404, "not_found", "no_db_file");
        };
        if db.docs.contains_key(&id) {
            return error_response(409, "conflict", "Document update conflict.");
        }
        let rev = first_rev();
        db.docs.insert(id.clone(), StoredDoc { rev: rev.clone(), fields });
        json_response(201, json!({ "ok": true, "id": id, "rev": rev }))
    }

    fn write_doc(&self, database: &str, id: &str, body: Option<&[u8]>) -> StoreResponse {
        let Some(mut fields) = parse_doc(body) else {
            return error_response(400, "bad_request", "invalid JSON document");
        };
        let supplied_rev = match fields.remove("_rev") {
            Some(Value::String(rev)) => Some(rev),
            Some(_) => return error_response(400, "bad_request", "_rev must be a string"),
            None => None,
        };
        fields.remove("_id");

        let mut databases = self.databases.write().unwrap();
        let Some(db) = databases.get_mut(database) else {
            return error_response(404, "not_found", "no_db_file");
        };
        let rev = match (db.docs.get(id), supplied_rev) {
            (Some(existing), Some(rev)) if existing.rev == rev => next_rev(&rev),
            (Some(_), _) | (None, Some(_)) => {
                return error_response(409, "conflict", "Document update conflict.");
            }
            (None, None) => first_rev(),
        };
        db.docs
            .insert(id.to_string(), StoredDoc { rev: rev.clone(), fields });
        json_response(201, json!({ "ok": true, "id": id, "rev": rev }))
    }

    fn delete_doc(&self, database: &str, id: &str, query: &[(String, String)]) -> StoreResponse {
        let rev = query
            .iter()
            .find(|(name, _)| name == "rev")
            .map(|(_, value)| value.as_str());
        let Some(rev) = rev else {
            return error_response(400, "bad_request", "rev query parameter required");
        };

        let mut databases = self.databases.write().unwrap();
        let Some(db) = databases.get_mut(database) else {
            return error_response(404, "not_found", "no_db_file");
        };
        let current = match db.docs.get(id) {
            Some(doc) => doc.rev.clone(),
            None => return error_response(404, "not_found", "deleted"),
        };
        if current != rev {
            return error_response(409, "conflict", "Document update conflict.");
        }
        db.docs.remove(id);
        json_response(200, json!({ "ok": true, "id": id, "rev": next_rev(&current) }))
    }
}

impl Transport for MemoryStore {
    fn execute(&self, request: StoreRequest) -> Result<StoreResponse, TransportError> {
        let segments: Vec<&str> = request.path.split('/').collect();
        let response = match (request.method, segments.as_slice()) {
            (Method::Get, [db, "_design", design, "_view", view]) => {
                self.query_view(db, design, view, &request.query)
            }
            (Method::Post, [db]) => self.create_doc(db, request.body.as_deref()),
            (Method::Get, [db, id]) => self.read_doc(db, id),
            (Method::Put, [db, id]) => self.write_doc(db, id, request.body.as_deref()),
            (Method::Delete, [db, id]) => self.delete_doc(db, id, &request.query),
            _ => error_response(404, "not_found", "missing"),
        };
        Ok(response)
    }
}

// ── View parameter parsing ──────────────────────────────────────

struct ViewParams {
    key: Option<Value>,
    start_key: Option<Value>,
    end_key: Option<Value>,
    include_docs: bool,
    limit: Option<usize>,
    descending: bool,
    inclusive_end: bool,
}

impl ViewParams {
    fn parse(query: &[(String, String)]) -> Result<Self, String> {
        let mut params = ViewParams {
            key: None,
            start_key: None,
            end_key: None,
            include_docs: false,
            limit: None,
            descending: false,
            inclusive_end: true,
        };
        for (name, value) in query {
            match name.as_str() {
                "key" => params.key = Some(parse_json(name, value)?),
                "startkey" => params.start_key = Some(parse_json(name, value)?),
                "endkey" => params.end_key = Some(parse_json(name, value)?),
                "include_docs" => params.include_docs = parse_bool(name, value)?,
                "limit" => {
                    params.limit =
                        Some(value.parse().map_err(|_| format!("invalid limit: {value}"))?)
                }
                "descending" => params.descending = parse_bool(name, value)?,
                "inclusive_end" => params.inclusive_end = parse_bool(name, value)?,
                other => return Err(format!("unknown query parameter: {other}")),
            }
        }
        Ok(params)
    }
}

fn parse_json(name: &str, value: &str) -> Result<Value, String> {
    serde_json::from_str(value).map_err(|e| format!("invalid {name}: {e}"))
}

fn parse_bool(name: &str, value: &str) -> Result<bool, String> {
    match value {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(format!("invalid {name}: {value}")),
    }
}

/// In traversal order, is this key still in front of the start bound?
fn before_start(key: &Value, start: &Value, descending: bool) -> bool {
    let ord = collate::compare(key, start);
    if descending {
        ord == Ordering::Greater
    } else {
        ord == Ordering::Less
    }
}

/// In traversal order, is this key beyond the end bound?
fn past_end(key: &Value, end: &Value, descending: bool, inclusive: bool) -> bool {
    match collate::compare(key, end) {
        Ordering::Equal => !inclusive,
        Ordering::Greater => !descending,
        Ordering::Less => descending,
    }
}

fn materialize(id: &str, doc: &StoredDoc) -> Value {
    let mut body = Map::new();
    body.insert("_id".to_string(), Value::String(id.to_string()));
    body.insert("_rev".to_string(), Value::String(doc.rev.clone()));
    for (name, value) in &doc.fields {
        body.insert(name.clone(), value.clone());
    }
    Value::Object(body)
}

fn parse_doc(body: Option<&[u8]>) -> Option<Map<String, Value>> {
    let bytes = body?;
    match serde_json::from_slice(bytes) {
        Ok(Value::Object(map)) => Some(map),
        _ => None,
    }
}

fn first_rev() -> String {
    format!("1-{}", Uuid::new_v4().simple())
}

fn next_rev(rev: &str) -> String {
    let generation = rev
        .split_once('-')
        .and_then(|(n, _)| n.parse::<u64>().ok())
        .unwrap_or(0);
    format!("{}-{}", generation + 1, Uuid::new_v4().simple())
}

fn json_response(status: u16, body: Value) -> StoreResponse {
    StoreResponse {
        status,
        body: Box::new(Cursor::new(body.to_string().into_bytes())),
    }
}

fn error_response(status: u16, error: &str, reason: &str) -> StoreResponse {
    json_response(status, json!({ "error": error, "reason": reason }))
}
