//! Index snapshot persistence
//!
//! A single JSON snapshot per index directory, written via a temp file
//! and an atomic rename so a crash mid-write never leaves a torn file.

use std::fs;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use tracing::info;

use crate::error::{Error, Result};
use super::index::{IndexDescriptor, VectorIndex};

/// Snapshot file name inside the index directory
pub const INDEX_FILE: &str = "index.json";

/// True when `dir` holds a snapshot
pub fn exists(dir: &Path) -> bool {
    dir.join(INDEX_FILE).is_file()
}

/// Write the snapshot under `dir`, creating the directory if needed
pub fn save(index: &VectorIndex, dir: &Path) -> Result<()> {
    fs::create_dir_all(dir)?;

    let tmp = dir.join(format!("{INDEX_FILE}.tmp"));
    let file = fs::File::create(&tmp)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer(&mut writer, index)?;
    writer.flush()?;
    fs::rename(&tmp, dir.join(INDEX_FILE))?;

    info!(
        path = %dir.join(INDEX_FILE).display(),
        chunks = index.len(),
        "saved index snapshot"
    );
    Ok(())
}

/// Load the snapshot under `dir` and verify it was built under the
/// `expected` configuration. A disagreement is a configuration error,
/// not a cue to silently rebuild.
pub fn load(dir: &Path, expected: &IndexDescriptor) -> Result<VectorIndex> {
    let path = dir.join(INDEX_FILE);
    let file = fs::File::open(&path)
        .map_err(|err| Error::index(format!("cannot open snapshot {}: {err}", path.display())))?;

    let index: VectorIndex = serde_json::from_reader(BufReader::new(file))?;
    index.check_consistency()?;
    expected.ensure_matches(index.descriptor())?;

    info!(
        path = %path.display(),
        chunks = index.len(),
        "loaded index snapshot"
    );
    Ok(index)
}
