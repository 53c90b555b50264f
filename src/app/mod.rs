pub mod config;
pub mod logging;
pub mod notify;
pub mod state;
pub mod workbench;

pub use config::{AppConfig, IngestConfig, LoggingConfig, ServiceConfig, UIConfig};
pub use notify::{NotificationSink, RecordingSink, Tone};
pub use state::AppState;
pub use workbench::{IngestReport, Workbench};
