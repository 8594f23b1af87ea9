//! Locating CSV files on disk and reading them within the upload limit.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::debug;
use thiserror::Error;
use walkdir::{DirEntry, WalkDir};

/// How deep the file picker looks below its root directory.
pub const DEFAULT_SCAN_DEPTH: usize = 3;

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("{} is not a file", .0.display())]
    NotFound(PathBuf),
    #[error("{name} is {size_mb:.1} MB, larger than the {limit_mb} MB limit")]
    TooLarge {
        name: String,
        size_mb: f64,
        limit_mb: u64,
    },
    #[error("could not read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// A file selected for upload: display name plus raw contents.
#[derive(Debug, Clone)]
pub struct Upload {
    pub name: String,
    pub bytes: Vec<u8>,
}

/// Lists `.csv` files under `root`, skipping hidden entries, sorted by path.
pub fn discover_csv_files(root: &Path, max_depth: usize) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(root)
        .max_depth(max_depth)
        .into_iter()
        .filter_entry(|entry| entry.depth() == 0 || !is_hidden(entry))
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file() && has_csv_extension(entry.path()))
        .map(DirEntry::into_path)
        .collect();
    files.sort();
    debug!("Found {} CSV files under {}", files.len(), root.display());
    files
}

/// Reads `path` if it is no larger than `max_bytes`. The size is checked
/// before any content is read.
pub fn read_upload(path: &Path, max_bytes: u64) -> Result<Upload, UploadError> {
    let io_err = |source| UploadError::Io {
        path: path.to_path_buf(),
        source,
    };
    let metadata = fs::metadata(path).map_err(|err| match err.kind() {
        io::ErrorKind::NotFound => UploadError::NotFound(path.to_path_buf()),
        _ => io_err(err),
    })?;
    if !metadata.is_file() {
        return Err(UploadError::NotFound(path.to_path_buf()));
    }

    let name = display_name(path);
    if metadata.len() > max_bytes {
        return Err(UploadError::TooLarge {
            name,
            size_mb: metadata.len() as f64 / (1024.0 * 1024.0),
            limit_mb: max_bytes / (1024 * 1024),
        });
    }

    let bytes = fs::read(path).map_err(io_err)?;
    Ok(Upload { name, bytes })
}

/// The identifying name of an upload: its file name, not its full path.
pub fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .map(|name| name.starts_with('.'))
        .unwrap_or(false)
}

fn has_csv_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("csv"))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    #[test]
    fn discovers_csv_files_and_skips_hidden_ones() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("b.csv"), "x\n1\n").unwrap();
        fs::write(dir.path().join("A.CSV"), "x\n1\n").unwrap();
        fs::write(dir.path().join("notes.txt"), "hi").unwrap();
        fs::write(dir.path().join(".secret.csv"), "x\n1\n").unwrap();
        fs::create_dir_all(dir.path().join("nested/deeper")).unwrap();
        fs::write(dir.path().join("nested/c.csv"), "x\n1\n").unwrap();
        fs::write(dir.path().join("nested/deeper/d.csv"), "x\n1\n").unwrap();
        fs::create_dir_all(dir.path().join(".git")).unwrap();
        fs::write(dir.path().join(".git/e.csv"), "x\n1\n").unwrap();

        let names: Vec<String> = discover_csv_files(dir.path(), 2)
            .iter()
            .map(|path| {
                path.strip_prefix(dir.path())
                    .unwrap()
                    .to_string_lossy()
                    .replace('\\', "/")
            })
            .collect();
        assert_eq!(names, ["A.CSV", "b.csv", "nested/c.csv"]);
    }

    #[test]
    fn reads_file_within_limit() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("sales.csv");
        fs::write(&path, "a,b\n1,2\n").unwrap();
        let upload = read_upload(&path, 1024).unwrap();
        assert_eq!(upload.name, "sales.csv");
        assert_eq!(upload.bytes, b"a,b\n1,2\n");
    }

    #[test]
    fn rejects_oversized_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("big.csv");
        fs::write(&path, vec![b'x'; 2048]).unwrap();
        let err = read_upload(&path, 1024).unwrap_err();
        assert!(matches!(err, UploadError::TooLarge { ref name, .. } if name == "big.csv"));
    }

    #[test]
    fn missing_file_and_directory_are_not_found() {
        let dir = tempdir().unwrap();
        assert!(matches!(
            read_upload(&dir.path().join("nope.csv"), 1024),
            Err(UploadError::NotFound(_))
        ));
        assert!(matches!(
            read_upload(dir.path(), 1024),
            Err(UploadError::NotFound(_))
        ));
    }
}
