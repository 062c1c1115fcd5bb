//! Recursive discovery of candidate files.

use std::fmt;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

/// Why an entry was not handed to the decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Directories are descended into, never decoded.
    Directory,
    /// Symlink, socket, fifo or other non-regular entry.
    NotRegularFile,
    /// File name does not end with the configured suffix.
    WrongExtension,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Directory => f.write_str("directory"),
            Self::NotRegularFile => f.write_str("not a regular file"),
            Self::WrongExtension => f.write_str("wrong extension"),
        }
    }
}

/// One visited entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanItem {
    /// Regular file with the right suffix.
    Candidate(PathBuf),
    Skipped { path: PathBuf, reason: SkipReason },
}

/// Walks a directory tree looking for files ending in `.<extension>`.
///
/// Every visited entry is reported, the root included. Directories come out
/// as skipped before their contents. Symlinks are not followed.
#[derive(Debug, Clone)]
pub struct Scanner {
    root: PathBuf,
    suffix: String,
}

impl Scanner {
    pub fn new(root: impl Into<PathBuf>, extension: &str) -> Self {
        Self {
            root: root.into(),
            suffix: format!(".{extension}"),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Lazily walks the tree.
    ///
    /// Listing errors are yielded as `Err`; callers treat them as fatal.
    pub fn iter(&self) -> impl Iterator<Item = Result<ScanItem, walkdir::Error>> + Send + use<> {
        let suffix = self.suffix.clone();
        WalkDir::new(&self.root)
            .follow_links(false)
            .into_iter()
            .map(move |entry| {
                let entry = entry?;
                let file_type = entry.file_type();
                let path = entry.into_path();
                let item = if file_type.is_dir() {
                    ScanItem::Skipped {
                        path,
                        reason: SkipReason::Directory,
                    }
                } else if !file_type.is_file() {
                    ScanItem::Skipped {
                        path,
                        reason: SkipReason::NotRegularFile,
                    }
                } else if !has_suffix(&path, &suffix) {
                    ScanItem::Skipped {
                        path,
                        reason: SkipReason::WrongExtension,
                    }
                } else {
                    ScanItem::Candidate(path)
                };
                Ok(item)
            })
    }
}

fn has_suffix(path: &Path, suffix: &str) -> bool {
    path.file_name()
        .is_some_and(|n| n.as_encoded_bytes().ends_with(suffix.as_bytes()))
}
