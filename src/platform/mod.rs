pub mod paths;
pub mod store;

pub use paths::AppPaths;
pub use store::{JsonFileStore, KeyValueStore, MemoryStore};
