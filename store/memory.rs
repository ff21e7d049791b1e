use crate::error::StoreError;
use crate::{ListFilter, Page};
use async_trait::async_trait;
use common::OperationName;
use protos::longrunning::Operation;
use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Clone, Default, Debug)]
pub struct InMemory {
    operations: Arc<Mutex<BTreeMap<OperationName, Operation>>>,
}

#[async_trait]
impl crate::OperationStore for InMemory {
    async fn insert(&self, name: OperationName, operation: Operation) -> Result<(), StoreError> {
        let mut operations = self.operations.lock().await;
        if operations.contains_key(&name) {
            return Err(StoreError::AlreadyExists(name));
        }
        log::info!("insert: {}", name);
        operations.insert(name, operation);
        Ok(())
    }

    async fn update(&self, name: &OperationName, operation: Operation) -> Result<(), StoreError> {
        let mut operations = self.operations.lock().await;
        let current = operations
            .get_mut(name)
            .ok_or_else(|| StoreError::NotFound(name.clone()))?;
        if current.done {
            return Err(StoreError::Finished(name.clone()));
        }
        log::info!("update: {} / done={}", name, operation.done);
        *current = operation;
        Ok(())
    }

    async fn get(&self, name: &OperationName) -> Result<Operation, StoreError> {
        let operations = self.operations.lock().await;
        log::debug!("get: {}", name);
        operations
            .get(name)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(name.clone()))
    }

    async fn remove(&self, name: &OperationName) -> Result<Operation, StoreError> {
        let mut operations = self.operations.lock().await;
        log::info!("remove: {}", name);
        operations
            .remove(name)
            .ok_or_else(|| StoreError::NotFound(name.clone()))
    }

    async fn list(
        &self,
        parent: &str,
        filter: ListFilter,
        after: Option<&OperationName>,
        limit: usize,
    ) -> Result<Page, StoreError> {
        let operations = self.operations.lock().await;
        let lower = match after {
            Some(name) => Bound::Excluded(name),
            None => Bound::Unbounded,
        };

        let mut page = Page::default();
        let mut matching = operations
            .range::<OperationName, _>((lower, Bound::Unbounded))
            .filter(|(name, operation)| name.is_in(parent) && filter.matches(operation));
        for (name, operation) in matching.by_ref().take(limit) {
            page.operations.push(operation.clone());
            page.next_after = Some(name.clone());
        }
        if matching.next().is_none() {
            page.next_after = None;
        }
        log::debug!("list: {parent:?} -> {}", page.operations.len());
        Ok(page)
    }
}
