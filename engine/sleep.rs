use async_trait::async_trait;
use prost::Message;
use std::time::Duration;

use crate::{Job, JobError};

pub static DURATION_TYPE: &str = "type.googleapis.com/google.protobuf.Duration";

/// Sleeps for a fixed time, then succeeds with the slept duration or fails
/// with a fixed message.
#[derive(Debug, Clone)]
pub struct SleepJob {
    duration: Duration,
    failure: Option<String>,
}

impl SleepJob {
    pub fn new(duration: Duration) -> Self {
        SleepJob {
            duration,
            failure: None,
        }
    }

    pub fn failing(duration: Duration, message: &str) -> Self {
        SleepJob {
            duration,
            failure: Some(message.to_string()),
        }
    }
}

#[async_trait]
impl Job for SleepJob {
    async fn run(&self) -> Result<prost_types::Any, JobError> {
        tokio::time::sleep(self.duration).await;
        if let Some(message) = &self.failure {
            return Err(JobError::Failed(message.clone()));
        }
        let slept = prost_types::Duration {
            seconds: i64::try_from(self.duration.as_secs())
                .map_err(|e| JobError::InvalidArgument(format!("duration too long: {e}")))?,
            nanos: self.duration.subsec_nanos() as i32,
        };
        Ok(prost_types::Any {
            type_url: DURATION_TYPE.to_string(),
            value: slept.encode_to_vec(),
        })
    }
}
