use async_trait::async_trait;
use common::OperationName;
use protos::longrunning::Operation;

mod error;
mod memory;

pub use error::StoreError;
pub use memory::InMemory;

/// Which operations a listing should return.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ListFilter {
    #[default]
    All,
    Done(bool),
}

impl ListFilter {
    pub fn matches(&self, operation: &Operation) -> bool {
        match self {
            ListFilter::All => true,
            ListFilter::Done(done) => operation.done == *done,
        }
    }
}

/// One page of a listing, ordered by operation name.
#[derive(Debug, Default)]
pub struct Page {
    pub operations: Vec<Operation>,
    /// Name of the last operation returned when more matching operations follow it.
    pub next_after: Option<OperationName>,
}

#[async_trait]
pub trait OperationStore: Clone + Send + Sync + 'static {
    async fn insert(&self, name: OperationName, operation: Operation) -> Result<(), StoreError>;

    /// Replace the snapshot of an existing operation. Deleted and finished
    /// operations are left untouched.
    async fn update(&self, name: &OperationName, operation: Operation) -> Result<(), StoreError>;

    async fn get(&self, name: &OperationName) -> Result<Operation, StoreError>;

    async fn remove(&self, name: &OperationName) -> Result<Operation, StoreError>;

    /// Up to `limit` operations under `parent` whose names sort after `after`.
    async fn list(
        &self,
        parent: &str,
        filter: ListFilter,
        after: Option<&OperationName>,
        limit: usize,
    ) -> Result<Page, StoreError>;
}
