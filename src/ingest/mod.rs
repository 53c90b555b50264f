pub mod batch;
pub mod progress;
pub mod upload;

pub use batch::{BatchIngestCoordinator, BatchSummary, OutcomeStatus, UploadOutcome};
pub use progress::{
    BatchProgress, ProgressMode, ProgressPhase, ProgressSignal, ProgressSnapshot, ProgressTracker,
    ProgressView,
};
pub use upload::{HttpUploader, UploadError, UploadFile, UploadReceipt, Uploader};
