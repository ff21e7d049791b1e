use common::OperationName;
use engine::Engine;
use protos::longrunning::{
    CancelOperationRequest, DeleteOperationRequest, GetOperationRequest, ListOperationsRequest,
    ListOperationsResponse, Operation, WaitOperationRequest,
};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use store::{ListFilter, OperationStore, StoreError};
use tonic::{Request, Response, Status};
use tracing::{debug, instrument};

use crate::NodeConfig;

/// Longest a single WaitOperation call blocks, whatever it asks for.
const MAX_WAIT: Duration = Duration::from_secs(60);
const WAIT_POLL_INTERVAL: Duration = Duration::from_millis(20);

pub struct OperationsService<S> {
    store: S,
    engine: Engine,
    config: Arc<NodeConfig>,
}

impl<S: OperationStore> OperationsService<S> {
    pub fn new(store: S, engine: Engine, config: Arc<NodeConfig>) -> Self {
        OperationsService {
            store,
            engine,
            config,
        }
    }

    fn page_size(&self, requested: i32) -> Result<usize, Status> {
        // A zero-sized page would end the listing at once.
        let max = self.config.max_page_size.max(1);
        match requested {
            0 => Ok(self.config.default_page_size.clamp(1, max)),
            n if n < 0 => Err(Status::invalid_argument(format!(
                "page_size must not be negative, got {n}"
            ))),
            n => Ok((n as usize).min(max)),
        }
    }
}

fn parse_name(name: &str) -> Result<OperationName, Status> {
    OperationName::from_str(name).map_err(|e| Status::invalid_argument(e.to_string()))
}

fn parse_filter(filter: &str) -> Result<ListFilter, Status> {
    if filter.trim().is_empty() {
        return Ok(ListFilter::All);
    }
    let unsupported = || Status::invalid_argument(format!("Unsupported filter: {filter:?}"));
    let (key, value) = filter.split_once('=').ok_or_else(unsupported)?;
    match (key.trim(), value.trim()) {
        ("done", "true") => Ok(ListFilter::Done(true)),
        ("done", "false") => Ok(ListFilter::Done(false)),
        _ => Err(unsupported()),
    }
}

fn wait_timeout(timeout: Option<prost_types::Duration>) -> Result<Duration, Status> {
    let Some(timeout) = timeout else {
        return Ok(MAX_WAIT);
    };
    if timeout.seconds < 0 || timeout.nanos < 0 {
        return Err(Status::invalid_argument(format!(
            "timeout must not be negative, got {timeout:?}"
        )));
    }
    Ok(Duration::new(timeout.seconds as u64, timeout.nanos as u32).min(MAX_WAIT))
}

fn encode_token(after: &OperationName) -> String {
    base16ct::lower::encode_string(after.as_str().as_bytes())
}

fn decode_token(token: &str) -> Result<Option<OperationName>, Status> {
    if token.is_empty() {
        return Ok(None);
    }
    let invalid = || Status::invalid_argument(format!("Invalid page token: {token:?}"));
    let bytes = base16ct::lower::decode_vec(token).map_err(|_| invalid())?;
    let name = String::from_utf8(bytes).map_err(|_| invalid())?;
    OperationName::from_str(&name).map(Some).map_err(|_| invalid())
}

fn store_status(err: StoreError) -> Status {
    match err {
        StoreError::NotFound(name) => Status::not_found(format!("Operation not found: {name}")),
        StoreError::AlreadyExists(name) => Status::already_exists(name.to_string()),
        StoreError::Finished(name) => Status::failed_precondition(name.to_string()),
    }
}

#[tonic::async_trait]
impl<S: OperationStore> protos::Operations for OperationsService<S> {
    #[instrument(skip_all)]
    async fn list_operations(
        &self,
        request: Request<ListOperationsRequest>,
    ) -> Result<Response<ListOperationsResponse>, Status> {
        if !self.config.list_enabled {
            return Err(Status::unimplemented("ListOperations is disabled on this node"));
        }
        let request = request.into_inner();
        let filter = parse_filter(&request.filter)?;
        let limit = self.page_size(request.page_size)?;
        let after = decode_token(&request.page_token)?;
        debug!(parent = %request.name, ?filter, limit, "listing");

        let page = self
            .store
            .list(&request.name, filter, after.as_ref(), limit)
            .await
            .map_err(store_status)?;
        Ok(Response::new(ListOperationsResponse {
            operations: page.operations,
            next_page_token: page.next_after.as_ref().map(encode_token).unwrap_or_default(),
        }))
    }

    #[instrument(skip_all, fields(name))]
    async fn get_operation(
        &self,
        request: Request<GetOperationRequest>,
    ) -> Result<Response<Operation>, Status> {
        let name = parse_name(&request.into_inner().name)?;
        tracing::Span::current().record("name", name.as_str());
        let operation = self.store.get(&name).await.map_err(store_status)?;
        Ok(Response::new(operation))
    }

    #[instrument(skip_all, fields(name))]
    async fn delete_operation(
        &self,
        request: Request<DeleteOperationRequest>,
    ) -> Result<Response<()>, Status> {
        if !self.config.delete_enabled {
            return Err(Status::unimplemented("DeleteOperation is disabled on this node"));
        }
        let name = parse_name(&request.into_inner().name)?;
        tracing::Span::current().record("name", name.as_str());
        // The job keeps running; its later updates find nothing to overwrite.
        self.store.remove(&name).await.map_err(store_status)?;
        Ok(Response::new(()))
    }

    #[instrument(skip_all, fields(name))]
    async fn cancel_operation(
        &self,
        request: Request<CancelOperationRequest>,
    ) -> Result<Response<()>, Status> {
        if !self.config.cancel_enabled {
            return Err(Status::unimplemented("CancelOperation is disabled on this node"));
        }
        let name = parse_name(&request.into_inner().name)?;
        tracing::Span::current().record("name", name.as_str());
        let operation = self.store.get(&name).await.map_err(store_status)?;
        if operation.done {
            debug!("already done, nothing to cancel");
            return Ok(Response::new(()));
        }
        if !self.engine.cancel(&name).await {
            debug!("job finished before it could be cancelled");
        }
        Ok(Response::new(()))
    }

    /// Block until the operation is done or the timeout passes, then return
    /// its latest snapshot either way.
    #[instrument(skip_all, fields(name))]
    async fn wait_operation(
        &self,
        request: Request<WaitOperationRequest>,
    ) -> Result<Response<Operation>, Status> {
        let request = request.into_inner();
        let name = parse_name(&request.name)?;
        tracing::Span::current().record("name", name.as_str());
        let deadline = Instant::now() + wait_timeout(request.timeout)?;
        loop {
            let operation = self.store.get(&name).await.map_err(store_status)?;
            if operation.done || Instant::now() >= deadline {
                return Ok(Response::new(operation));
            }
            tokio::time::sleep_until(deadline.min(Instant::now() + WAIT_POLL_INTERVAL)).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_grammar() {
        assert_eq!(parse_filter("").unwrap(), ListFilter::All);
        assert_eq!(parse_filter("done=true").unwrap(), ListFilter::Done(true));
        assert_eq!(parse_filter(" done = false ").unwrap(), ListFilter::Done(false));
        assert_eq!(parse_filter("  ").unwrap(), ListFilter::All);
        for filter in [
            "done=maybe",
            "name=operations/a",
            "done",
            "d one = tr ue",
            "done=true=false",
            "done==true",
        ] {
            assert_eq!(
                parse_filter(filter).unwrap_err().code(),
                tonic::Code::InvalidArgument
            );
        }
    }

    #[test]
    fn page_tokens_name_the_last_operation() {
        let name = OperationName::from_str("operations/abc").unwrap();
        let token = encode_token(&name);
        assert_eq!(decode_token(&token).unwrap(), Some(name));
        assert_eq!(decode_token("").unwrap(), None);
        for token in ["zz", "abc", "2f"] {
            assert_eq!(
                decode_token(token).unwrap_err().code(),
                tonic::Code::InvalidArgument
            );
        }
    }

    #[test]
    fn page_size_defaults_and_clamps() {
        let service = OperationsService::new(
            store::InMemory::default(),
            Engine::new(),
            Arc::new(NodeConfig {
                default_page_size: 7,
                max_page_size: 20,
                ..Default::default()
            }),
        );
        assert_eq!(service.page_size(0).unwrap(), 7);
        assert_eq!(service.page_size(5).unwrap(), 5);
        assert_eq!(service.page_size(500).unwrap(), 20);
        assert_eq!(
            service.page_size(-1).unwrap_err().code(),
            tonic::Code::InvalidArgument
        );
    }

    #[test]
    fn default_page_size_never_exceeds_the_max() {
        let service = |default_page_size, max_page_size| {
            OperationsService::new(
                store::InMemory::default(),
                Engine::new(),
                Arc::new(NodeConfig {
                    default_page_size,
                    max_page_size,
                    ..Default::default()
                }),
            )
        };
        assert_eq!(service(50, 1).page_size(0).unwrap(), 1);
        assert_eq!(service(0, 10).page_size(0).unwrap(), 1);
        assert_eq!(service(0, 0).page_size(0).unwrap(), 1);
        assert_eq!(service(0, 0).page_size(5).unwrap(), 1);
    }

    #[test]
    fn wait_timeouts_are_capped() {
        assert_eq!(wait_timeout(None).unwrap(), MAX_WAIT);
        let timeout = |seconds, nanos| prost_types::Duration { seconds, nanos };
        assert_eq!(
            wait_timeout(Some(timeout(1, 500_000_000))).unwrap(),
            Duration::from_millis(1500)
        );
        assert_eq!(wait_timeout(Some(timeout(3600, 0))).unwrap(), MAX_WAIT);
        assert_eq!(
            wait_timeout(Some(timeout(-1, 0))).unwrap_err().code(),
            tonic::Code::InvalidArgument
        );
    }

    mod wait {
        use super::*;
        use crate::Node;
        use engine::sleep::SleepJob;
        use protos::Operations;

        fn wait(name: &str, timeout: Option<Duration>) -> Request<WaitOperationRequest> {
            Request::new(WaitOperationRequest {
                name: name.to_string(),
                timeout: timeout.map(|t| prost_types::Duration {
                    seconds: t.as_secs() as i64,
                    nanos: t.subsec_nanos() as i32,
                }),
            })
        }

        #[tokio::test]
        async fn returns_once_the_operation_is_done() {
            let node = Node::new(NodeConfig::default());
            let name = node
                .submit(SleepJob::new(Duration::from_millis(30)))
                .await
                .unwrap();
            let operation = node
                .service()
                .wait_operation(wait(name.as_str(), Some(Duration::from_secs(10))))
                .await
                .unwrap()
                .into_inner();
            assert!(operation.done);
            assert_eq!(operation.name, name.as_str());
        }

        #[tokio::test]
        async fn returns_the_pending_snapshot_at_the_timeout() {
            let node = Node::new(NodeConfig::default());
            let name = node
                .submit(SleepJob::new(Duration::from_secs(3600)))
                .await
                .unwrap();
            let started = Instant::now();
            let operation = node
                .service()
                .wait_operation(wait(name.as_str(), Some(Duration::from_millis(50))))
                .await
                .unwrap()
                .into_inner();
            assert!(!operation.done);
            assert!(started.elapsed() >= Duration::from_millis(50));
        }

        #[tokio::test]
        async fn unknown_and_malformed_names() {
            let service = Node::new(NodeConfig::default()).service();
            let status = service
                .wait_operation(wait("operations/missing", None))
                .await
                .unwrap_err();
            assert_eq!(status.code(), tonic::Code::NotFound);
            let status = service
                .wait_operation(wait("operations//bad name", None))
                .await
                .unwrap_err();
            assert_eq!(status.code(), tonic::Code::InvalidArgument);
        }
    }
}
