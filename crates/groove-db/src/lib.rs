mod client;
mod documents;
mod error;
mod planner;
mod rows;

pub use client::StoreClient;
pub use documents::DocumentRef;
pub use error::DbError;
pub use planner::{PageRequest, plan};
pub use rows::{RowProperty, ViewRow, decode_rows, decode_total_rows, project};
