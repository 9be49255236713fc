use crate::{config, environment, fsutil};

/// Errors that prevent the daemon from starting.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] config::Error),
    #[error("can't create directory for udev rules: {0}")]
    RulesDir(#[source] fsutil::PathError),
    #[error("can't use nsenter: {0}")]
    NsEnter(#[source] environment::Error),
    #[error("failed to install signal handler: {0}")]
    Signal(#[source] std::io::Error),
}

/// Logs and discards errors that must not stop the daemon.
pub trait ResultOkLogExt<T, E> {
    /// Converts `self` into an [`Option`], logging the error prefixed with
    /// `context` at error level.
    fn ok_log(self, context: &str) -> Option<T>;
}

impl<T, E> ResultOkLogExt<T, E> for std::result::Result<T, E>
where
    E: std::error::Error,
{
    fn ok_log(self, context: &str) -> Option<T> {
        match self {
            Ok(ok) => Some(ok),
            Err(err) => {
                log::error!("{context}: {err}");
                None
            }
        }
    }
}
