//! Copying source files into the archive.

use std::fs::{self, DirBuilder, File};
use std::io;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PlaceError {
    #[error("failed to create directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to copy to {destination}: {source}")]
    Copy {
        destination: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Creates `path` and any missing parents with mode `0755`.
///
/// Succeeds if the directory already exists, including when another thread
/// creates it concurrently.
pub fn create_dir_all(path: &Path) -> io::Result<()> {
    let mut builder = DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(0o755);
    }
    builder.create(path)
}

/// Copies files under an output root.
#[derive(Debug, Clone)]
pub struct Placer {
    output_root: PathBuf,
}

impl Placer {
    pub fn new(output_root: impl Into<PathBuf>) -> Self {
        Self {
            output_root: output_root.into(),
        }
    }

    pub fn output_root(&self) -> &Path {
        &self.output_root
    }

    /// Copies `source` to `relative` under the output root.
    ///
    /// The bytes are staged next to the destination and renamed over it, so
    /// concurrent placements onto one name leave exactly one whole source.
    /// An existing destination is overwritten. The source is left in place.
    /// When the destination already is the source (an archive nested in the
    /// input tree) nothing is written. Returns the full destination path.
    pub fn place(&self, source: &Path, relative: &Path) -> Result<PathBuf, PlaceError> {
        let destination = self.output_root.join(relative);
        let parent = destination
            .parent()
            .map_or_else(|| self.output_root.clone(), Path::to_path_buf);

        create_dir_all(&parent).map_err(|source| PlaceError::CreateDir {
            path: parent.clone(),
            source,
        })?;

        if is_same_file(source, &destination) {
            tracing::debug!(path = %source.display(), "already archived");
            return Ok(destination);
        }

        copy_bytes(source, &parent, &destination).map_err(|source| PlaceError::Copy {
            destination: destination.clone(),
            source,
        })?;

        Ok(destination)
    }
}

fn is_same_file(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

fn copy_bytes(source: &Path, parent: &Path, destination: &Path) -> io::Result<u64> {
    let mut reader = File::open(source)?;
    let mut staged = NamedTempFile::new_in(parent)?;
    let copied = io::copy(&mut reader, &mut staged)?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        staged
            .as_file()
            .set_permissions(fs::Permissions::from_mode(0o644))?;
    }
    staged.as_file().sync_all()?;
    staged.persist(destination).map_err(|e| e.error)?;
    Ok(copied)
}

/// Returns true when both files have identical contents.
pub fn same_contents(a: &Path, b: &Path) -> io::Result<bool> {
    Ok(fs::read(a)? == fs::read(b)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Arc;
    use std::thread;

    use tempfile::TempDir;

    #[test]
    fn copies_into_nested_directory() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("in.fit");
        fs::write(&source, b"activity bytes").unwrap();
        let placer = Placer::new(temp.path().join("out"));

        let dest = placer
            .place(&source, Path::new("2023/2023-06-01T10:00:00Z running 1h0m0s.fit"))
            .unwrap();

        assert_eq!(
            dest,
            temp.path().join("out/2023/2023-06-01T10:00:00Z running 1h0m0s.fit")
        );
        assert_eq!(fs::read(&dest).unwrap(), b"activity bytes");
        assert!(source.exists(), "source must be left in place");
    }

    #[test]
    fn overwrites_existing_destination() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("in.fit");
        fs::write(&source, b"new").unwrap();
        let placer = Placer::new(temp.path().join("out"));
        let relative = Path::new("2023/name.fit");
        fs::create_dir_all(temp.path().join("out/2023")).unwrap();
        fs::write(temp.path().join("out/2023/name.fit"), b"old and longer").unwrap();

        let dest = placer.place(&source, relative).unwrap();

        assert_eq!(fs::read(dest).unwrap(), b"new");
    }

    #[test]
    fn placing_a_file_onto_itself_keeps_its_bytes() {
        let temp = TempDir::new().unwrap();
        let archived = temp.path().join("out/2023/name.fit");
        fs::create_dir_all(archived.parent().unwrap()).unwrap();
        fs::write(&archived, b"archived activity").unwrap();

        let dest = Placer::new(temp.path().join("out"))
            .place(&archived, Path::new("2023/name.fit"))
            .unwrap();

        assert_eq!(dest, archived);
        assert_eq!(fs::read(&archived).unwrap(), b"archived activity");
    }

    #[test]
    fn concurrent_placements_onto_one_name_keep_a_whole_source() {
        let temp = TempDir::new().unwrap();
        let a = temp.path().join("a.fit");
        let b = temp.path().join("b.fit");
        fs::write(&a, vec![b'a'; 4 << 20]).unwrap();
        fs::write(&b, vec![b'b'; 2 << 20]).unwrap();
        let placer = Arc::new(Placer::new(temp.path().join("out")));
        let (a_bytes, b_bytes) = (fs::read(&a).unwrap(), fs::read(&b).unwrap());

        for _ in 0..20 {
            let handles: Vec<_> = [a.clone(), b.clone()]
                .into_iter()
                .map(|source| {
                    let placer = Arc::clone(&placer);
                    thread::spawn(move || placer.place(&source, Path::new("2023/x.fit")))
                })
                .collect();
            for handle in handles {
                handle.join().unwrap().unwrap();
            }

            let dest = fs::read(temp.path().join("out/2023/x.fit")).unwrap();
            assert!(dest == a_bytes || dest == b_bytes, "destination is a mix of sources");
        }

        // No staging files are left behind.
        let names: Vec<_> = fs::read_dir(temp.path().join("out/2023"))
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(names, vec!["x.fit"]);
    }

    #[cfg(unix)]
    #[test]
    fn placed_files_are_world_readable() {
        use std::os::unix::fs::PermissionsExt;

        let temp = TempDir::new().unwrap();
        let source = temp.path().join("in.fit");
        fs::write(&source, b"x").unwrap();

        let dest = Placer::new(temp.path().join("out"))
            .place(&source, Path::new("2023/x.fit"))
            .unwrap();

        let mode = fs::metadata(dest).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o644);
    }

    #[test]
    fn missing_source_is_copy_error() {
        let temp = TempDir::new().unwrap();
        let placer = Placer::new(temp.path().join("out"));

        let err = placer
            .place(&temp.path().join("gone.fit"), Path::new("2023/x.fit"))
            .unwrap_err();

        assert!(matches!(err, PlaceError::Copy { .. }));
    }

    #[test]
    fn blocked_directory_is_create_error() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("in.fit");
        fs::write(&source, b"x").unwrap();
        let out = temp.path().join("out");
        fs::create_dir(&out).unwrap();
        // A file where the year directory should go.
        fs::write(out.join("2023"), b"in the way").unwrap();

        let err = Placer::new(&out)
            .place(&source, Path::new("2023/x.fit"))
            .unwrap_err();

        assert!(matches!(err, PlaceError::CreateDir { .. }));
    }

    #[test]
    fn concurrent_directory_creation_succeeds() {
        let temp = TempDir::new().unwrap();
        let root = Arc::new(temp.path().join("a/b/c"));

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let root = Arc::clone(&root);
                thread::spawn(move || create_dir_all(&root.join(format!("d{}", i % 2))))
            })
            .collect();

        for handle in handles {
            handle.join().unwrap().unwrap();
        }
        assert!(root.join("d0").is_dir());
        assert!(root.join("d1").is_dir());
    }

    #[test]
    fn same_contents_compares_bytes() {
        let temp = TempDir::new().unwrap();
        let a = temp.path().join("a");
        let b = temp.path().join("b");
        fs::write(&a, b"same").unwrap();
        fs::write(&b, b"same").unwrap();
        assert!(same_contents(&a, &b).unwrap());
        fs::write(&b, b"different").unwrap();
        assert!(!same_contents(&a, &b).unwrap());
    }
}
