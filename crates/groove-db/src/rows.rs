use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::DbError;

/// One row of a view response. `doc` is only present when the query asked
/// for `include_docs`. Rows live for the duration of one response.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewRow {
    pub id: String,
    pub key: Value,
    pub value: Value,
    pub doc: Option<Value>,
}

/// Which property of a row a projection reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowProperty {
    Key,
    Value,
    Doc,
}

impl RowProperty {
    pub fn as_str(&self) -> &'static str {
        match self {
            RowProperty::Key => "key",
            RowProperty::Value => "value",
            RowProperty::Doc => "doc",
        }
    }
}

/// Decode the row array of a response envelope. One malformed row fails
/// the whole page; there is no skip-and-continue mode.
pub fn decode_rows(envelope: &Value) -> Result<Vec<ViewRow>, DbError> {
    let rows = envelope
        .get("rows")
        .ok_or_else(|| DbError::Envelope {
            field: "rows",
            message: "missing".to_string(),
        })?
        .as_array()
        .ok_or_else(|| DbError::Envelope {
            field: "rows",
            message: "not an array".to_string(),
        })?;

    rows.iter()
        .enumerate()
        .map(|(index, row)| decode_row(index, row))
        .collect()
}

fn decode_row(index: usize, row: &Value) -> Result<ViewRow, DbError> {
    let id = row
        .get("id")
        .and_then(Value::as_str)
        .ok_or_else(|| DbError::Decode {
            row: index,
            property: "id",
            message: "missing or not a string".to_string(),
        })?;
    let key = row.get("key").cloned().ok_or_else(|| DbError::Decode {
        row: index,
        property: "key",
        message: "missing".to_string(),
    })?;
    let value = row.get("value").cloned().ok_or_else(|| DbError::Decode {
        row: index,
        property: "value",
        message: "missing".to_string(),
    })?;

    Ok(ViewRow {
        id: id.to_string(),
        key,
        value,
        doc: row.get("doc").cloned(),
    })
}

/// Read the view-wide row count from the envelope. Independent of the row
/// array: succeeds on a response whose `rows` is empty or absent-of-docs,
/// which is what a `limit=0` count query returns.
pub fn decode_total_rows(envelope: &Value) -> Result<u64, DbError> {
    envelope
        .get("total_rows")
        .and_then(Value::as_u64)
        .ok_or_else(|| DbError::Envelope {
            field: "total_rows",
            message: "missing or not an unsigned integer".to_string(),
        })
}

/// Decode one property of every row as `T`. A structurally incompatible
/// row fails with the row index and property; projecting `Doc` on a row
/// without a doc means the query never asked for documents.
pub fn project<T>(rows: &[ViewRow], property: RowProperty) -> Result<Vec<T>, DbError>
where
    T: DeserializeOwned,
{
    rows.iter()
        .enumerate()
        .map(|(index, row)| {
            let value = match property {
                RowProperty::Key => &row.key,
                RowProperty::Value => &row.value,
                RowProperty::Doc => row.doc.as_ref().ok_or_else(|| DbError::Decode {
                    row: index,
                    property: "doc",
                    message: "missing (query did not set include_docs)".to_string(),
                })?,
            };
            serde_json::from_value(value.clone()).map_err(|e| DbError::Decode {
                row: index,
                property: property.as_str(),
                message: e.to_string(),
            })
        })
        .collect()
}
