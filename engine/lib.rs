use async_trait::async_trait;
use thiserror::Error;

mod runner;
pub mod sleep;

pub use runner::{Engine, JobStage, JobStatus};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum JobError {
    #[error("Job failed: {0}")]
    Failed(String),
    #[error("Invalid job: {0}")]
    InvalidArgument(String),
}

/// A unit of server-side work whose progress is exposed as a long-running operation.
#[async_trait]
pub trait Job: Send + Sync + 'static {
    /// Run the job to completion, producing the operation's response payload.
    async fn run(&self) -> Result<prost_types::Any, JobError>;
}
