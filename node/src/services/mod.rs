//! Serves the `google.longrunning.Operations` API

mod operations;
pub use operations::OperationsService;
