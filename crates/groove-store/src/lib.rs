mod error;
mod transport;

pub use error::TransportError;
pub use transport::{Method, StoreRequest, StoreResponse, Transport};

#[cfg(feature = "memory")]
mod memory;

#[cfg(feature = "memory")]
pub use memory::MemoryStore;
