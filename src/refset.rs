//! Reference patterns: the files whose contents we search for.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use crate::error::{FilehuntError, Result};

/// One reference file, fully read into memory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReferencePattern {
    /// File name component, used in labels and bookmark notes
    pub name: String,
    /// Full path the file was read from
    pub path: PathBuf,
    /// SHA-256 of the contents, hex-encoded
    pub sha256: String,
    /// The byte sequence to search for
    #[serde(skip)]
    pub bytes: Vec<u8>,
}

impl ReferencePattern {
    /// Read a single file into a pattern. Empty files are rejected: they
    /// would match at every address.
    pub fn from_file(path: &Path) -> Result<Self> {
        let bytes = fs::read(path)?;
        if bytes.is_empty() {
            return Err(FilehuntError::PatternError(format!(
                "{} is empty",
                path.display()
            )));
        }
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let sha256 = hex::encode(Sha256::digest(&bytes));
        debug!(file = %name, size = bytes.len(), digest = %sha256, "read reference file");
        Ok(ReferencePattern {
            name,
            path: path.to_path_buf(),
            sha256,
            bytes,
        })
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// The full set of reference patterns for one run.
#[derive(Debug, Clone, Default)]
pub struct ReferenceSet {
    patterns: Vec<ReferencePattern>,
}

impl ReferenceSet {
    /// Expand a mixed list of file and directory paths into patterns.
    ///
    /// Directories are walked recursively, entries in sorted order so runs
    /// are deterministic. Unreadable and empty files are skipped with a
    /// warning; an entirely unusable input list is an error.
    pub fn collect<P: AsRef<Path>>(paths: &[P]) -> Result<Self> {
        let mut files: Vec<PathBuf> = Vec::new();
        for path in paths {
            let path = path.as_ref();
            if path.is_dir() {
                walk_dir(path, &mut files)?;
            } else {
                files.push(path.to_path_buf());
            }
        }

        let mut patterns = Vec::new();
        for file in files {
            match ReferencePattern::from_file(&file) {
                Ok(p) => patterns.push(p),
                Err(e) => warn!(file = %file.display(), error = %e, "skipping reference file"),
            }
        }

        if patterns.is_empty() {
            return Err(FilehuntError::PatternError(
                "no usable reference files".to_string(),
            ));
        }
        Ok(ReferenceSet { patterns })
    }

    pub fn patterns(&self) -> &[ReferencePattern] {
        &self.patterns
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// The raw byte sequences, in pattern order, for the search automaton.
    pub fn byte_sequences(&self) -> impl Iterator<Item = &[u8]> {
        self.patterns.iter().map(|p| p.bytes.as_slice())
    }
}

fn walk_dir(dir: &Path, out: &mut Vec<PathBuf>) -> Result<()> {
    let mut entries: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|e| e.ok().map(|e| e.path()))
        .collect();
    entries.sort();
    for entry in entries {
        if entry.is_dir() {
            walk_dir(&entry, out)?;
        } else {
            out.push(entry);
        }
    }
    Ok(())
}
