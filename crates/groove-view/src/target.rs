use serde::{Deserialize, Serialize};

/// Address of a materialized view: the database, the design document
/// holding the view definitions, and the view name within it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewTarget {
    pub database: String,
    pub design: String,
    pub view: String,
}

impl ViewTarget {
    pub fn new(
        database: impl Into<String>,
        design: impl Into<String>,
        view: impl Into<String>,
    ) -> Self {
        Self {
            database: database.into(),
            design: design.into(),
            view: view.into(),
        }
    }

    /// Store-relative request path for this view.
    pub fn path(&self) -> String {
        format!("{}/_design/{}/_view/{}", self.database, self.design, self.view)
    }
}
