use serde_json::{Value, json};

use groove_view::{SortDirection, ViewQuery};

/// One page's worth of query intent, consumed by [`plan`].
#[derive(Debug, Clone)]
pub struct PageRequest {
    /// Outer key component; every row of the page shares it.
    pub scope: Value,
    /// Sub-key to resume from, inclusive. Wins over the explicit bound on
    /// the side the traversal resumes from.
    pub cursor: Option<Value>,
    pub range_start: Option<Value>,
    pub range_end: Option<Value>,
    pub direction: SortDirection,
    /// Page size. `None` asks for the entire remaining range.
    pub limit: Option<u64>,
}

/// Translate a page request into view arguments.
///
/// Composite keys are `[scope, sub_key]`. An unconstrained lower side
/// falls back to `[scope]` and an unconstrained upper side to
/// `[scope, {}]`; both collate outside every sub-key array of the scope
/// without reaching into neighbouring scopes. When the direction is
/// descending the start/end swap happens here, so callers never hand the
/// store a reversed range.
pub fn plan(request: &PageRequest) -> ViewQuery {
    let sub_start = match request.direction {
        SortDirection::Asc => request.cursor.as_ref().or(request.range_start.as_ref()),
        SortDirection::Desc => request.range_start.as_ref(),
    };
    let sub_end = match request.direction {
        SortDirection::Asc => request.range_end.as_ref(),
        SortDirection::Desc => request.cursor.as_ref().or(request.range_end.as_ref()),
    };

    let lower = match sub_start {
        Some(sub) => json!([request.scope, sub]),
        None => json!([request.scope]),
    };
    let upper = match sub_end {
        Some(sub) => json!([request.scope, sub]),
        None => json!([request.scope, {}]),
    };

    let mut query = match request.direction {
        SortDirection::Asc => ViewQuery::new().with_start_key(lower).with_end_key(upper),
        SortDirection::Desc => ViewQuery::new()
            .with_start_key(upper)
            .with_end_key(lower)
            .with_descending(true),
    };
    if let Some(limit) = request.limit {
        query = query.with_limit(limit);
    }
    query
}
