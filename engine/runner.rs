use common::OperationName;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, watch, Mutex};

use crate::{Job, JobError};

#[derive(Debug)]
pub struct JobStatus {
    pub name: OperationName,
    pub stage: JobStage,
}

#[derive(Debug, Clone, PartialEq)]
pub enum JobStage {
    Queued,
    Running,
    Done(prost_types::Any),
    Failed(JobError),
    Cancelled,
}

impl JobStage {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, JobStage::Queued | JobStage::Running)
    }
}

/// Spawns jobs and reports their stages. Clones share the set of running jobs.
#[derive(Clone, Default, Debug)]
pub struct Engine {
    running: Arc<Mutex<HashMap<OperationName, watch::Sender<bool>>>>,
}

async fn cancelled(rx: &mut watch::Receiver<bool>) {
    while !*rx.borrow() {
        if rx.changed().await.is_err() {
            // Nobody can cancel any more.
            futures::future::pending::<()>().await;
        }
    }
}

impl Engine {
    pub fn new() -> Self {
        Engine::default()
    }

    /// Start `job` under `name`. Every stage change is sent on the returned
    /// channel, ending with exactly one terminal stage.
    pub async fn execute<J: Job>(&self, name: OperationName, job: J) -> mpsc::Receiver<JobStatus> {
        let (tx, rx) = mpsc::channel(32);
        let (cancel_tx, mut cancel_rx) = watch::channel(false);
        self.running.lock().await.insert(name.clone(), cancel_tx);

        let running = self.running.clone();
        tokio::spawn(async move {
            let report = |stage: JobStage| {
                let tx = tx.clone();
                let name = name.clone();
                async move {
                    if tx.send(JobStatus { name: name.clone(), stage }).await.is_err() {
                        log::warn!("{name} | stage dropped, nobody is listening");
                    }
                }
            };

            log::info!("{name} | Queued");
            report(JobStage::Queued).await;

            let stage = if *cancel_rx.borrow() {
                JobStage::Cancelled
            } else {
                log::info!("{name} | Running");
                report(JobStage::Running).await;
                tokio::select! {
                    biased;
                    _ = cancelled(&mut cancel_rx) => JobStage::Cancelled,
                    result = job.run() => match result {
                        Ok(response) => JobStage::Done(response),
                        Err(err) => JobStage::Failed(err),
                    },
                }
            };

            running.lock().await.remove(&name);
            log::info!("{name} | {stage:?}");
            report(stage).await;
        });

        rx
    }

    /// Signal the job running under `name` to stop. Returns false when no such
    /// job is running any more.
    pub async fn cancel(&self, name: &OperationName) -> bool {
        match self.running.lock().await.get(name) {
            Some(tx) => {
                log::info!("{name} | Cancel requested");
                tx.send_replace(true);
                true
            }
            None => false,
        }
    }

    pub async fn is_running(&self, name: &OperationName) -> bool {
        self.running.lock().await.contains_key(name)
    }
}
