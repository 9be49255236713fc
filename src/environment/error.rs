use std::path::PathBuf;

/// Errors that may occur while inspecting the host environment.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to check if path `{path}` exists: {source}")]
    ExistenceCheck {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("host mount namespace `{path}` does not exist, is the host /proc mounted?")]
    MissingMountNamespace { path: PathBuf },
    #[error("failed to read symlink `{path}`: {source}")]
    ReadSymlink {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
