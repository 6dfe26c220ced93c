use model::CategoryId;
use thiserror::Error;

/// Error types for the compute module
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ComputeError {
    /// The requested category is not part of the forest
    #[error("Category {0} not found")]
    UnknownCategory(CategoryId),
}

/// Type alias for Result with ComputeError
pub type Result<T> = std::result::Result<T, ComputeError>;
