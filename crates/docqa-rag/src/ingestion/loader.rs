//! Document loading from a directory tree

use std::path::Path;

use tracing::{info, warn};
use walkdir::WalkDir;

use crate::error::{Error, Result};
use crate::types::{Document, DocumentFormat};

/// A file that could not be ingested, with the reason it was skipped
#[derive(Debug, Clone)]
pub struct SkippedFile {
    pub path: String,
    pub reason: String,
}

/// Result of walking an ingestion root
#[derive(Debug, Default)]
pub struct LoadOutcome {
    /// Successfully loaded documents, sorted by source path
    pub documents: Vec<Document>,
    /// Files that failed to load or were empty
    pub skipped: Vec<SkippedFile>,
}

/// Load every supported document under `root`.
///
/// Unreadable and empty files are logged and skipped; only a missing or
/// non-directory root is an error. Source paths are recorded relative to
/// `root` with `/` separators so an index stays portable across machines.
pub fn load_documents(root: &Path) -> Result<LoadOutcome> {
    if !root.is_dir() {
        return Err(Error::ingestion(
            root.display().to_string(),
            "docs folder not found or not a directory",
        ));
    }

    let mut outcome = LoadOutcome::default();
    let mut paths = Vec::new();

    for entry in WalkDir::new(root) {
        match entry {
            Ok(entry) if entry.file_type().is_file() => paths.push(entry.into_path()),
            Ok(_) => {}
            Err(err) => {
                let path = err
                    .path()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| root.display().to_string());
                warn!(path = %path, error = %err, "skipping unreadable entry");
                outcome.skipped.push(SkippedFile {
                    path,
                    reason: err.to_string(),
                });
            }
        }
    }
    paths.sort();

    for path in paths {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        let Some(format) = DocumentFormat::from_extension(ext) else {
            continue;
        };

        let source_path = relative_source_path(root, &path);
        match load_one(&path, &source_path, format) {
            Ok(document) => {
                info!(path = %source_path, "loaded document");
                outcome.documents.push(document);
            }
            Err(err) => {
                warn!(path = %source_path, error = %err, "skipping document");
                outcome.skipped.push(SkippedFile {
                    path: source_path,
                    reason: err.to_string(),
                });
            }
        }
    }

    if outcome.documents.is_empty() {
        warn!(root = %root.display(), "no supported documents found");
    }

    Ok(outcome)
}

fn load_one(path: &Path, source_path: &str, format: DocumentFormat) -> Result<Document> {
    let text = std::fs::read_to_string(path)
        .map_err(|err| Error::ingestion(source_path, err.to_string()))?;

    if text.trim().is_empty() {
        return Err(Error::EmptyDocument(source_path.to_string()));
    }

    Ok(Document::new(source_path, format, text))
}

fn relative_source_path(root: &Path, path: &Path) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path);
    let parts: Vec<String> = rel
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    parts.join("/")
}
