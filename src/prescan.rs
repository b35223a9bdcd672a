//! Pre-scan manifest of the source files a scan should consider.

use crate::error::{IoOperation, Result, ScanError};
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Component, Path, PathBuf};
use tracing::debug;
use walkdir::{DirEntry, WalkDir};

pub const MANIFEST_VERSION: &str = "1.0.0";
pub const MANIFEST_SCHEMA: &str = "https://tbd/scan-input-metadata-schema-1.0.0.json";

const SOURCE_EXTENSIONS: &[&str] = &["java", "js", "ts", "html", "htm"];
const DESCRIPTOR_NAME: &str = "web.xml";
const SKIPPED_DIR: &str = "node_modules";

/// Manifest uploaded next to the code artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PrescanManifest {
    pub version: &'static str,
    #[serde(rename = "$schema")]
    pub schema: &'static str,
    pub paths: Vec<PathBuf>,
}

impl PrescanManifest {
    /// List the source files under `source_dir`.
    pub fn collect(source_dir: &Path) -> Result<Self> {
        let root = absolute_normalized(source_dir)
            .map_err(|e| ScanError::io(source_dir, IoOperation::Read, e))?;

        let mut paths = Vec::new();
        let walker = WalkDir::new(&root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| !is_skipped_dir(e));

        for entry in walker {
            let entry = entry.map_err(|e| {
                let path = e.path().unwrap_or(&root).to_path_buf();
                ScanError::io(path, IoOperation::Read, e.into())
            })?;

            if !entry.file_type().is_file() {
                continue;
            }
            if is_scannable(entry.path()) {
                paths.push(entry.into_path());
            } else {
                debug!(path = %entry.path().display(), "Ignoring file");
            }
        }

        Ok(Self {
            version: MANIFEST_VERSION,
            schema: MANIFEST_SCHEMA,
            paths,
        })
    }
}

/// Write the manifest for `source_dir` to `out_path` as pretty-printed JSON.
pub fn generate(source_dir: &Path, out_path: &Path) -> Result<PrescanManifest> {
    debug!(
        source_dir = %source_dir.display(),
        out_path = %out_path.display(),
        "Generating prescan data"
    );
    let manifest = PrescanManifest::collect(source_dir)?;

    let file =
        File::create(out_path).map_err(|e| ScanError::io(out_path, IoOperation::Write, e))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, &manifest)
        .map_err(|e| ScanError::io(out_path, IoOperation::Write, e.into()))?;
    writer
        .flush()
        .map_err(|e| ScanError::io(out_path, IoOperation::Write, e))?;

    debug!(files = manifest.paths.len(), "Prescan data written");
    Ok(manifest)
}

fn is_skipped_dir(entry: &DirEntry) -> bool {
    if entry.depth() == 0 || !entry.file_type().is_dir() {
        return false;
    }
    let skipped = entry.file_name() == SKIPPED_DIR;
    if skipped {
        debug!(path = %entry.path().display(), "Skipping dir");
    }
    skipped
}

fn is_scannable(path: &Path) -> bool {
    if path.file_name().is_some_and(|n| n == DESCRIPTOR_NAME) {
        return true;
    }
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| SOURCE_EXTENSIONS.contains(&ext))
}

/// Absolute form of `path` with `.` and `..` removed, without touching
/// symlinks.
fn absolute_normalized(path: &Path) -> std::io::Result<PathBuf> {
    let absolute = std::path::absolute(path)?;
    let mut normalized = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other),
        }
    }
    Ok(normalized)
}
