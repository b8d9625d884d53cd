mod direction;
mod query;
mod target;

pub use direction::SortDirection;
pub use query::ViewQuery;
pub use target::ViewTarget;
