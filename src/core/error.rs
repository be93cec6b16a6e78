use thiserror::Error;

#[derive(Error, Debug)]
pub enum RepositoryError {
    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(String),

    #[error("Invalid force-method argument: {0}")]
    InvalidForceMethod(String),

    #[error("Invalid assertion argument: {0}")]
    InvalidAssertion(String),

    #[error("Assertion callback must produce an error value")]
    InvalidCallback,

    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Transaction error: {0}")]
    Transaction(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Source error: {0}")]
    Source(String),

    #[error("Lock error: {0}")]
    Lock(String),
}

pub type Result<T> = std::result::Result<T, RepositoryError>;

impl<T> From<std::sync::PoisonError<T>> for RepositoryError {
    fn from(err: std::sync::PoisonError<T>) -> Self {
        Self::Lock(err.to_string())
    }
}
