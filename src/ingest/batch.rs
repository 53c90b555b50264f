use tracing::{debug, info, warn};

use crate::app::notify::Tone;
use crate::ingest::progress::{BatchProgress, ProgressSignal};
use crate::ingest::upload::{UploadError, UploadFile, UploadReceipt, Uploader};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutcomeStatus {
    Indexed { chunks: Option<u64> },
    Failed { error: String },
}

/// Result of one file within a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadOutcome {
    pub filename: String,
    pub status: OutcomeStatus,
}

impl UploadOutcome {
    pub fn indexed(filename: impl Into<String>, receipt: &UploadReceipt) -> Self {
        Self {
            filename: filename.into(),
            status: OutcomeStatus::Indexed {
                chunks: receipt.chunks_indexed,
            },
        }
    }

    pub fn failed(filename: impl Into<String>, error: &UploadError) -> Self {
        Self {
            filename: filename.into(),
            status: OutcomeStatus::Failed {
                error: error.to_string(),
            },
        }
    }

    pub fn error(&self) -> Option<&str> {
        match &self.status {
            OutcomeStatus::Failed { error } => Some(error),
            OutcomeStatus::Indexed { .. } => None,
        }
    }

    pub fn chunks_indexed(&self) -> Option<u64> {
        match self.status {
            OutcomeStatus::Indexed { chunks } => chunks,
            OutcomeStatus::Failed { .. } => None,
        }
    }
}

/// Aggregate result of a batch. `ingested_count + failure_count() == total`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchSummary {
    pub total: usize,
    pub ingested_count: usize,
    pub total_chunks: u64,
    /// One entry per file, in upload order.
    pub outcomes: Vec<UploadOutcome>,
}

impl BatchSummary {
    fn new(total: usize) -> Self {
        Self {
            total,
            ingested_count: 0,
            total_chunks: 0,
            outcomes: Vec::with_capacity(total),
        }
    }

    fn record(&mut self, filename: &str, result: &Result<UploadReceipt, UploadError>) {
        let outcome = match result {
            Ok(receipt) => {
                self.ingested_count += 1;
                self.total_chunks += receipt.chunks_indexed.unwrap_or(0);
                UploadOutcome::indexed(filename, receipt)
            }
            Err(error) => UploadOutcome::failed(filename, error),
        };
        self.outcomes.push(outcome);
    }

    pub fn failures(&self) -> Vec<&UploadOutcome> {
        self.outcomes.iter().filter(|o| o.error().is_some()).collect()
    }

    pub fn failure_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.error().is_some()).count()
    }

    /// Any ingested file makes the batch a qualified success.
    pub fn tone(&self) -> Tone {
        if self.ingested_count > 0 {
            Tone::Ok
        } else {
            Tone::Error
        }
    }

    pub fn message(&self) -> String {
        let mut message = format!(
            "Indexed {} chunks from {} of {} files.",
            self.total_chunks, self.ingested_count, self.total
        );
        let failed = self.failure_count();
        if failed > 0 {
            message.push_str(&format!(" {} file(s) failed.", failed));
        }
        message
    }
}

/// Uploads files one at a time and reports one overall progress value.
///
/// Files are never uploaded concurrently: the overall percentage assumes
/// strict ordering, and one connection at a time keeps load on the service
/// bounded.
pub struct BatchIngestCoordinator<'a, U: Uploader + ?Sized> {
    uploader: &'a U,
}

impl<'a, U: Uploader + ?Sized> BatchIngestCoordinator<'a, U> {
    pub fn new(uploader: &'a U) -> Self {
        Self { uploader }
    }

    /// Returns `None` for an empty selection.
    pub async fn upload_all<F>(
        &self,
        files: &[UploadFile],
        tenant_id: &str,
        api_key: &str,
        mut on_overall: F,
    ) -> Option<BatchSummary>
    where
        F: FnMut(ProgressSignal) + Send,
    {
        let total = files.len();
        if total == 0 {
            debug!("Empty batch, nothing to upload");
            return None;
        }

        info!("Starting batch ingest of {} files", total);
        let mut progress = BatchProgress::new(total);
        let mut summary = BatchSummary::new(total);
        on_overall(ProgressSignal::Percent(0));

        for (index, file) in files.iter().enumerate() {
            let result = {
                let mut forward = |signal: ProgressSignal| on_overall(progress.item_signal(index, signal));
                self.uploader
                    .upload(file, tenant_id, api_key, &mut forward)
                    .await
            };

            if let Err(e) = &result {
                warn!("Batch item {}/{} ({}) failed: {}", index + 1, total, file.filename, e);
            }
            summary.record(&file.filename, &result);
            on_overall(ProgressSignal::Percent(progress.complete_item(index)));
        }

        info!(
            "Batch ingest finished: {}/{} files, {} chunks",
            summary.ingested_count, summary.total, summary.total_chunks
        );
        Some(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use parking_lot::Mutex;

    /// Replays a scripted result per filename and logs the call order.
    struct ScriptedUploader {
        results: HashMap<String, Result<UploadReceipt, UploadError>>,
        calls: Mutex<Vec<String>>,
    }

    impl ScriptedUploader {
        fn new(script: Vec<(&str, Result<Option<u64>, &str>)>) -> Self {
            let results = script
                .into_iter()
                .map(|(name, result)| {
                    let result = result
                        .map(|chunks| UploadReceipt {
                            chunks_indexed: chunks,
                            document_id: None,
                            status: None,
                        })
                        .map_err(|detail| UploadError::Server(detail.to_string()));
                    (name.to_string(), result)
                })
                .collect();
            Self {
                results,
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl Uploader for ScriptedUploader {
        async fn upload(
            &self,
            file: &UploadFile,
            _tenant_id: &str,
            _api_key: &str,
            on_progress: &mut (dyn FnMut(ProgressSignal) + Send),
        ) -> Result<UploadReceipt, UploadError> {
            self.calls.lock().push(file.filename.clone());
            on_progress(ProgressSignal::Percent(50));
            on_progress(ProgressSignal::Indeterminate);
            let result = self.results[&file.filename].clone();
            if result.is_ok() {
                on_progress(ProgressSignal::Percent(100));
            }
            result
        }
    }

    fn files(names: &[&str]) -> Vec<UploadFile> {
        names
            .iter()
            .map(|name| UploadFile::from_bytes(*name, b"data".to_vec()))
            .collect()
    }

    #[tokio::test]
    async fn test_partial_failure_keeps_going() {
        let uploader = ScriptedUploader::new(vec![
            ("f1", Ok(Some(4))),
            ("f2", Err("too large")),
            ("f3", Ok(Some(6))),
        ]);
        let coordinator = BatchIngestCoordinator::new(&uploader);

        let summary = coordinator
            .upload_all(&files(&["f1", "f2", "f3"]), "acme", "k", |_| {})
            .await
            .unwrap();

        assert_eq!(summary.total, 3);
        assert_eq!(summary.ingested_count, 2);
        assert_eq!(summary.total_chunks, 10);
        assert_eq!(summary.failure_count(), 1);
        assert_eq!(summary.failures()[0].filename, "f2");
        assert_eq!(summary.failures()[0].error(), Some("too large"));
        assert_eq!(summary.outcomes[2].chunks_indexed(), Some(6));
        assert_eq!(summary.tone(), Tone::Ok);
        assert_eq!(
            summary.message(),
            "Indexed 10 chunks from 2 of 3 files. 1 file(s) failed."
        );
        assert_eq!(*uploader.calls.lock(), vec!["f1", "f2", "f3"]);
    }

    #[tokio::test]
    async fn test_all_failed_is_error_tone() {
        let uploader = ScriptedUploader::new(vec![("a", Err("nope")), ("b", Err("nope"))]);
        let summary = BatchIngestCoordinator::new(&uploader)
            .upload_all(&files(&["a", "b"]), "acme", "k", |_| {})
            .await
            .unwrap();

        assert_eq!(summary.ingested_count + summary.failure_count(), summary.total);
        assert_eq!(summary.tone(), Tone::Error);
    }

    #[tokio::test]
    async fn test_unknown_chunks_count_as_zero() {
        let uploader = ScriptedUploader::new(vec![("a", Ok(None)), ("b", Ok(Some(3)))]);
        let summary = BatchIngestCoordinator::new(&uploader)
            .upload_all(&files(&["a", "b"]), "acme", "k", |_| {})
            .await
            .unwrap();

        assert_eq!(summary.total_chunks, 3);
        assert_eq!(summary.message(), "Indexed 3 chunks from 2 of 2 files.");
    }

    #[tokio::test]
    async fn test_overall_progress_sequence() {
        let uploader = ScriptedUploader::new(vec![("a", Ok(Some(1))), ("b", Err("bad"))]);
        let mut seen = Vec::new();
        BatchIngestCoordinator::new(&uploader)
            .upload_all(&files(&["a", "b"]), "acme", "k", |signal| seen.push(signal))
            .await
            .unwrap();

        use ProgressSignal::*;
        assert_eq!(
            seen,
            vec![
                Percent(0),
                Percent(25),
                Indeterminate,
                Percent(50),
                Percent(50),
                Percent(75),
                Indeterminate,
                Percent(100),
            ]
        );
    }

    #[tokio::test]
    async fn test_empty_batch_is_noop() {
        let uploader = ScriptedUploader::new(vec![]);
        let mut seen = Vec::new();
        let summary = BatchIngestCoordinator::new(&uploader)
            .upload_all(&[], "acme", "k", |signal| seen.push(signal))
            .await;

        assert!(summary.is_none());
        assert!(seen.is_empty());
        assert!(uploader.calls.lock().is_empty());
    }

    #[tokio::test]
    async fn test_conservation_over_mixed_batches() {
        for n in 1..=8usize {
            let names: Vec<String> = (0..n).map(|i| format!("file-{}", i)).collect();
            let script = names
                .iter()
                .enumerate()
                .map(|(i, name)| {
                    let result = if i % 3 == 1 { Err("bad") } else { Ok(Some(i as u64)) };
                    (name.as_str(), result)
                })
                .collect();
            let uploader = ScriptedUploader::new(script);
            let selection: Vec<&str> = names.iter().map(String::as_str).collect();

            let summary = BatchIngestCoordinator::new(&uploader)
                .upload_all(&files(&selection), "acme", "k", |_| {})
                .await
                .unwrap();

            let expected_chunks: u64 = (0..n).filter(|i| i % 3 != 1).map(|i| i as u64).sum();
            assert_eq!(summary.ingested_count + summary.failure_count(), n);
            assert_eq!(summary.total_chunks, expected_chunks);
        }
    }
}
