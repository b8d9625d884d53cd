mod catalog;
mod entities;
mod error;
mod sweep;

pub use catalog::Catalog;
pub use entities::{Album, Artist, Label, Session, Track, User};
pub use error::CatalogError;
pub use sweep::SessionSweeper;
