pub mod store;

pub use store::{store_from_config, EntityStore, EntityStoreExt, JsonFileStore, MemoryStore};
