pub mod orchestrator;
pub mod types;

pub use orchestrator::ChatOrchestrator;
pub use types::{ChatError, ChatExchange, ChatRequest, LatencySource};
