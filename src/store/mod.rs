//! External Request Systems
//!
//! The façade persists normalized records to a document store and drives
//! their lifecycle through a request manager. Both are traits so the real
//! services can be swapped for local implementations.
//!
//! - [`document`]: Request document store
//! - [`manager`]: Request check-in and state transitions

pub mod document;
pub mod manager;

use thiserror::Error;

pub use document::{JsonFileStore, MemoryStore, RequestStore};
pub use manager::{LocalRequestManager, ManagerError, RequestManager, RequestStatus};

/// Errors raised by a request document store.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("request '{0}' already exists")]
    AlreadyExists(String),

    #[error("invalid document name '{0}'")]
    InvalidName(String),

    #[error("failed to access document store: {0}")]
    Io(#[from] std::io::Error),

    #[error("corrupt request document: {0}")]
    Json(#[from] serde_json::Error),
}
