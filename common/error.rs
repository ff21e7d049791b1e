use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommonError {
    #[error("Operation name not valid: {0:?}")]
    InvalidName(String),
}
