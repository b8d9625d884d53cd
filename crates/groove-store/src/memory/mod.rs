mod collate;
mod store;

pub use store::MemoryStore;
