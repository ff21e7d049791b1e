use common::OperationName;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Operation not found: {0}")]
    NotFound(OperationName),
    #[error("Operation already exists: {0}")]
    AlreadyExists(OperationName),
    #[error("Operation {0} is done and can no longer change")]
    Finished(OperationName),
}
