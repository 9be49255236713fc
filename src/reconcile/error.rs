use crate::{exec, fsutil};

/// Errors that fail a single reconciliation.
///
/// None of them is fatal, the next tick retries from the last applied state.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to read config file: {0}")]
    ReadConfig(#[source] fsutil::PathError),
    #[error("failed to write udev rules: {0}")]
    WriteRules(#[source] fsutil::PathError),
    #[error("failed to reload udev rules: error executing {command}: {output} ({source})")]
    Reload {
        command: String,
        output: String,
        #[source]
        source: exec::Error,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
