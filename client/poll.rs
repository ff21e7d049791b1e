use protos::longrunning::{GetOperationRequest, Operation};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

use crate::{LroError, OperationsClient, Transport};

impl<T: Transport> OperationsClient<T> {
    /// Poll `name` every `interval`, yielding each snapshot.
    ///
    /// The stream ends after the first snapshot with `done` set or after the
    /// first error. Nothing is retried.
    pub fn watch(
        &self,
        name: &str,
        interval: Duration,
    ) -> ReceiverStream<Result<Operation, LroError>> {
        let (tx, rx) = mpsc::channel(8);
        let client = self.clone();
        let name = name.to_string();
        tokio::spawn(async move {
            loop {
                let snapshot = client
                    .get_operation(GetOperationRequest { name: name.clone() }, None)
                    .await;
                let finished = !matches!(&snapshot, Ok(operation) if !operation.done);
                if tx.send(snapshot).await.is_err() || finished {
                    break;
                }
                tokio::time::sleep(interval).await;
            }
            tracing::debug!(%name, "stopped watching");
        });
        ReceiverStream::new(rx)
    }

    /// Poll `name` every `interval` until it is done and return the final
    /// snapshot. Gives up with [`LroError::DeadlineExceeded`] once `deadline`
    /// has passed.
    pub async fn wait(
        &self,
        name: &str,
        interval: Duration,
        deadline: Option<Duration>,
    ) -> Result<Operation, LroError> {
        match deadline {
            Some(deadline) => tokio::time::timeout(deadline, self.poll_until_done(name, interval))
                .await
                .map_err(|_| LroError::DeadlineExceeded)?,
            None => self.poll_until_done(name, interval).await,
        }
    }

    async fn poll_until_done(&self, name: &str, interval: Duration) -> Result<Operation, LroError> {
        loop {
            let operation = self
                .get_operation(
                    GetOperationRequest {
                        name: name.to_string(),
                    },
                    None,
                )
                .await?;
            if operation.done {
                return Ok(operation);
            }
            tracing::trace!(%name, "not done yet");
            tokio::time::sleep(interval).await;
        }
    }
}
