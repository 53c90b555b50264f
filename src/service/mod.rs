pub mod client;
pub mod types;

pub use client::{RawResponse, ServiceClient, TenantCreated, TenantError, API_KEY_HEADER};
pub use types::{ChatRequestBody, ChatResponseBody, ErrorBody, IngestResponseBody};
