pub mod app;
pub mod chat;
pub mod console;
pub mod error;
pub mod ingest;
pub mod platform;
pub mod service;
pub mod session;

pub use error::{Error, Result};
