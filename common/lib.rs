mod error;
mod name;

pub use error::CommonError;
pub use name::{OperationName, OPERATIONS_COLLECTION};
