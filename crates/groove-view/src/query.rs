use serde_json::Value;

/// Arguments for a single view query. Every setting is optional; only the
/// ones that were set appear in the built argument list. Built fresh per
/// request and never reused.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ViewQuery {
    key: Option<Value>,
    start_key: Option<Value>,
    end_key: Option<Value>,
    include_docs: Option<bool>,
    limit: Option<u64>,
    descending: Option<bool>,
    inclusive_end: Option<bool>,
}

impl ViewQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Exact-match key. Not combined with range bounds.
    pub fn with_key(mut self, key: Value) -> Self {
        self.key = Some(key);
        self
    }

    /// First key in traversal order. With `descending` set this is the
    /// upper end of the range.
    pub fn with_start_key(mut self, key: Value) -> Self {
        self.start_key = Some(key);
        self
    }

    /// Last key in traversal order.
    pub fn with_end_key(mut self, key: Value) -> Self {
        self.end_key = Some(key);
        self
    }

    pub fn with_include_docs(mut self, include_docs: bool) -> Self {
        self.include_docs = Some(include_docs);
        self
    }

    /// Maximum number of rows. Zero is meaningful: it asks for the
    /// envelope only, which still carries the total row count.
    pub fn with_limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_descending(mut self, descending: bool) -> Self {
        self.descending = Some(descending);
        self
    }

    /// Whether a row whose key equals the end key is part of the result.
    /// The store defaults to true when the argument is absent.
    pub fn with_inclusive_end(mut self, inclusive_end: bool) -> Self {
        self.inclusive_end = Some(inclusive_end);
        self
    }

    /// Encode the set arguments as name/value pairs. Keys are JSON-encoded,
    /// booleans and integers use their literal form, unset arguments are
    /// omitted entirely.
    pub fn build(&self) -> Vec<(&'static str, String)> {
        let mut args = Vec::new();
        if let Some(key) = &self.key {
            args.push(("key", key.to_string()));
        }
        if let Some(key) = &self.start_key {
            args.push(("startkey", key.to_string()));
        }
        if let Some(key) = &self.end_key {
            args.push(("endkey", key.to_string()));
        }
        if let Some(include_docs) = self.include_docs {
            args.push(("include_docs", include_docs.to_string()));
        }
        if let Some(limit) = self.limit {
            args.push(("limit", limit.to_string()));
        }
        if let Some(descending) = self.descending {
            args.push(("descending", descending.to_string()));
        }
        if let Some(inclusive_end) = self.inclusive_end {
            args.push(("inclusive_end", inclusive_end.to_string()));
        }
        args
    }
}
