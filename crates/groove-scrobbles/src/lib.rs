mod error;
mod service;
mod stamp;
mod types;

pub use error::ScrobbleError;
pub use service::ScrobbleStore;
pub use stamp::EventStamp;
pub use types::{Scrobble, ScrobblePage, ScrobbleRequest};
