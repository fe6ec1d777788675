//! Error types surfaced by the workflow façade.

use thiserror::Error;

use crate::sites::SiteError;
use crate::store::StoreError;
use crate::users::RegistryError;

/// Errors returned to callers of [`DataWorkflow`](super::DataWorkflow).
#[derive(Error, Debug)]
pub enum Error {
    /// Caller-supplied data violates a precondition.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Delegation to the request manager failed; carries the original message.
    #[error("execution error: {0}")]
    ExecutionError(String),

    /// Declared operation with no defined behavior.
    #[error("operation '{0}' is not implemented")]
    Unimplemented(&'static str),

    /// The request document store failed.
    #[error("document store error: {0}")]
    Store(#[from] StoreError),

    /// The site catalog could not be loaded.
    #[error("site catalog error: {0}")]
    Sites(#[from] SiteError),

    /// The user registry failed.
    #[error("user registry error: {0}")]
    Registry(#[from] RegistryError),
}

/// Result type for façade operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::InvalidParameter("asyncdest T9_XX is unknown".to_string());
        assert!(err.to_string().contains("T9_XX"));

        let err = Error::ExecutionError("duplicate request".to_string());
        assert_eq!(err.to_string(), "execution error: duplicate request");

        let err = Error::Unimplemented("kill");
        assert!(err.to_string().contains("'kill'"));
    }
}
