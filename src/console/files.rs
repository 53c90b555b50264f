use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tokio::io::AsyncReadExt;
use tracing::{debug, warn};

use crate::error::Result;
use crate::ingest::UploadFile;

pub const STDIN_ARG: &str = "-";
pub const STDIN_FILENAME: &str = "stdin.txt";

/// A selected path that could not be read and was left out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedPath {
    pub path: PathBuf,
    pub reason: String,
}

impl SkippedPath {
    fn new(path: &Path, reason: impl ToString) -> Self {
        let skipped = Self {
            path: path.to_path_buf(),
            reason: reason.to_string(),
        };
        warn!("Skipping {}: {}", skipped.path.display(), skipped.reason);
        skipped
    }

    pub fn notice(&self) -> String {
        format!("Skipped {}: {}", self.path.display(), self.reason)
    }
}

/// Files ready to upload plus whatever had to be left out. One bad entry
/// never drops the rest of the selection.
#[derive(Debug, Default)]
pub struct Selection {
    pub files: Vec<UploadFile>,
    pub skipped: Vec<SkippedPath>,
}

/// Expands the selection in argument order. Directories (and symlinks to
/// them) contribute every file beneath them, sorted by path.
pub async fn expand_paths(inputs: &[PathBuf], skipped: &mut Vec<SkippedPath>) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for input in inputs {
        match tokio::fs::metadata(input).await {
            Ok(metadata) if metadata.is_dir() => files.extend(walk_dir(input, skipped).await),
            Ok(_) => files.push(input.clone()),
            Err(e) => skipped.push(SkippedPath::new(input, e)),
        }
    }
    files
}

async fn walk_dir(root: &Path, skipped: &mut Vec<SkippedPath>) -> Vec<PathBuf> {
    let mut found = Vec::new();
    let mut visited = HashSet::new();
    let mut pending = vec![root.to_path_buf()];

    while let Some(dir) = pending.pop() {
        // Symlinked directories are followed once.
        match tokio::fs::canonicalize(&dir).await {
            Ok(real) if !visited.insert(real.clone()) => continue,
            Ok(_) => {}
            Err(e) => {
                skipped.push(SkippedPath::new(&dir, e));
                continue;
            }
        }

        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) => {
                skipped.push(SkippedPath::new(&dir, e));
                continue;
            }
        };
        loop {
            let entry = match entries.next_entry().await {
                Ok(Some(entry)) => entry,
                Ok(None) => break,
                Err(e) => {
                    skipped.push(SkippedPath::new(&dir, e));
                    break;
                }
            };
            let path = entry.path();
            match tokio::fs::metadata(&path).await {
                Ok(metadata) if metadata.is_dir() => pending.push(path),
                Ok(_) => found.push(path),
                Err(e) => skipped.push(SkippedPath::new(&path, e)),
            }
        }
    }

    found.sort();
    debug!("{} files under {}", found.len(), root.display());
    found
}

/// Loads the operator's selection. `-` reads stdin once, with no known size.
/// Unreadable paths are reported in `skipped`; only a failed stdin read is
/// an error.
pub async fn load_selection(args: &[String]) -> Result<Selection> {
    let mut selection = Selection::default();
    let mut paths = Vec::new();

    for arg in args {
        if arg == STDIN_ARG {
            load_paths(&paths, &mut selection).await;
            paths.clear();
            selection.files.push(read_stdin().await?);
        } else {
            paths.push(PathBuf::from(arg));
        }
    }
    load_paths(&paths, &mut selection).await;
    Ok(selection)
}

async fn load_paths(paths: &[PathBuf], selection: &mut Selection) {
    for path in expand_paths(paths, &mut selection.skipped).await {
        match UploadFile::from_path(&path).await {
            Ok(file) => selection.files.push(file),
            Err(e) => selection.skipped.push(SkippedPath::new(&path, e)),
        }
    }
}

async fn read_stdin() -> Result<UploadFile> {
    let mut content = Vec::new();
    tokio::io::stdin().read_to_end(&mut content).await?;
    Ok(UploadFile::without_length(STDIN_FILENAME, content))
}
