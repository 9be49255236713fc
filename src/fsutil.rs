use std::fs::{DirBuilder, OpenOptions};
use std::io::{self, Write};
use std::os::unix::fs::{DirBuilderExt, OpenOptionsExt};
use std::path::{Path, PathBuf};

/// Mode of files written by [`write_file_truncate`].
pub const FILE_MODE: u32 = 0o600;

/// Mode of directories created by [`create_dir_all`].
pub const DIR_MODE: u32 = 0o700;

/// I/O error annotated with the path it occurred on.
#[derive(Debug, thiserror::Error)]
#[error("failed to {op} `{path}`: {source}")]
pub struct PathError {
    pub op: &'static str,
    pub path: PathBuf,
    #[source]
    pub source: io::Error,
}

impl PathError {
    fn new(op: &'static str, path: &Path, source: io::Error) -> Self {
        Self {
            op,
            path: path.to_path_buf(),
            source,
        }
    }

    /// Returns the [`io::ErrorKind`] of the underlying error.
    pub fn kind(&self) -> io::ErrorKind {
        self.source.kind()
    }
}

/// Reads the whole file at `path` into memory.
///
/// # Errors
///
/// Returns a [`PathError`] if the file cannot be opened or read.
pub fn read_file(path: impl AsRef<Path>) -> Result<Vec<u8>, PathError> {
    let path = path.as_ref();
    std::fs::read(path).map_err(|source| PathError::new("read", path, source))
}

/// Creates or truncates the file at `path` and writes `contents` into it.
///
/// New files are created with [`FILE_MODE`]. There is no temporary file and
/// rename: a crash in the middle of the write leaves a partial file behind.
///
/// # Errors
///
/// Returns a [`PathError`] if the file cannot be opened or written.
///
/// # Example
/// ```no_run
/// # use local_storage_udev_writer::fsutil;
/// fsutil::write_file_truncate("/run/udev/rules.d/99-example.rules", b"LABEL=\"out\"\n")?;
/// # Ok::<(), fsutil::PathError>(())
/// ```
pub fn write_file_truncate(path: impl AsRef<Path>, contents: &[u8]) -> Result<(), PathError> {
    let path = path.as_ref();
    let mut file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(FILE_MODE)
        .open(path)
        .map_err(|source| PathError::new("open", path, source))?;

    file.write_all(contents)
        .and_then(|_| file.flush())
        .map_err(|source| PathError::new("write", path, source))
}

/// Removes the file at `path`.
///
/// # Errors
///
/// Returns a [`PathError`] if the file cannot be removed, including when it
/// does not exist.
pub fn remove_file(path: impl AsRef<Path>) -> Result<(), PathError> {
    let path = path.as_ref();
    std::fs::remove_file(path).map_err(|source| PathError::new("remove", path, source))
}

/// Recursively creates `path` and its parents with [`DIR_MODE`].
///
/// # Errors
///
/// Returns a [`PathError`] if any component cannot be created.
pub fn create_dir_all(path: impl AsRef<Path>) -> Result<(), PathError> {
    let path = path.as_ref();
    DirBuilder::new()
        .recursive(true)
        .mode(DIR_MODE)
        .create(path)
        .map_err(|source| PathError::new("create directory", path, source))
}
