pub mod state;
pub mod store;

pub use state::{ReadinessStatus, SessionState};
pub use store::{ConfigStore, SessionRecord, STORE_KEY};
