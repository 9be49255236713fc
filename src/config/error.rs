/// Errors caused by invalid command-line input.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config file must be specified")]
    MissingConfigFile,
    #[error("name must be specified")]
    MissingName,
    #[error("name {name:?} is not a valid name, it must match {pattern:?} and be at most {max_len} characters long")]
    InvalidName {
        name: String,
        pattern: &'static str,
        max_len: usize,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
