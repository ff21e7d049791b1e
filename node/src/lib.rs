use common::OperationName;
use engine::{Engine, Job, JobStage};
use prost_types::Timestamp;
use protos::OperationsServer;
use std::sync::Arc;
use std::time::SystemTime;
use store::{InMemory, OperationStore, StoreError};
use tonic::transport::Server;
use tracing::{debug, info, warn};

mod config;
mod services;
mod snapshot;

pub use config::{ConfigError, JobConfig, NodeConfig};
pub use services::OperationsService;

pub enum Connection {
    // Default gRPC over TCP
    Tcp(std::net::SocketAddr),
    // Unix Domain Socket. Used for testing.
    Uds(tokio_stream::wrappers::UnixListenerStream),
}

/// Owns the operations a node serves and the jobs behind them.
#[derive(Clone)]
pub struct Node<S = InMemory> {
    store: S,
    engine: Engine,
    config: Arc<NodeConfig>,
}

impl Node<InMemory> {
    pub fn new(config: NodeConfig) -> Self {
        Node::with_store(InMemory::default(), config)
    }
}

impl<S: OperationStore> Node<S> {
    pub fn with_store(store: S, config: NodeConfig) -> Self {
        Node {
            store,
            engine: Engine::new(),
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    pub fn service(&self) -> OperationsService<S> {
        OperationsService::new(self.store.clone(), self.engine.clone(), self.config.clone())
    }

    /// Start `job` and return the name of the operation tracking it.
    ///
    /// The operation is visible as soon as this returns. Every stage the job
    /// goes through replaces the stored snapshot until the operation is done
    /// or somebody deletes it.
    pub async fn submit<J: Job>(&self, job: J) -> Result<OperationName, StoreError> {
        let name = OperationName::generate();
        let created = Timestamp::from(SystemTime::now());
        self.store
            .insert(
                name.clone(),
                snapshot::to_operation(name.as_str(), JobStage::Queued, &created),
            )
            .await?;

        let mut stages = self.engine.execute(name.clone(), job).await;
        let store = self.store.clone();
        tokio::spawn(async move {
            while let Some(status) = stages.recv().await {
                let operation = snapshot::to_operation(status.name.as_str(), status.stage, &created);
                match store.update(&status.name, operation).await {
                    Ok(()) => {}
                    Err(StoreError::NotFound(name)) => {
                        debug!(%name, "operation was deleted, dropping update");
                    }
                    Err(err) => warn!("{err}"),
                }
            }
        });

        info!(%name, "submitted");
        Ok(name)
    }
}

pub async fn start_node<S: OperationStore>(
    node: Node<S>,
    conn: Connection,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let server = Server::builder()
        .trace_fn(|event| tracing::info_span!("gRPC Request", api = event.uri().path()))
        .add_service(OperationsServer::new(node.service()));

    match conn {
        Connection::Tcp(address) => {
            info!(%address, "serving");
            server.serve(address).await?;
        }
        Connection::Uds(uds_stream) => {
            server.serve_with_incoming(uds_stream).await?;
        }
    }
    Ok(())
}
