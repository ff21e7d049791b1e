use engine::{JobError, JobStage};
use prost::Message;
use prost_types::Timestamp;
use protos::longrunning::{operation, Operation};
use protos::node::{job_stage, JobMetadata};
use protos::rpc;

fn stage_value(stage: &JobStage) -> job_stage::Value {
    match stage {
        JobStage::Queued => job_stage::Value::Queued,
        JobStage::Running => job_stage::Value::Running,
        JobStage::Done(_) => job_stage::Value::Completed,
        JobStage::Failed(_) => job_stage::Value::Failed,
        JobStage::Cancelled => job_stage::Value::Cancelled,
    }
}

fn error_status(err: &JobError) -> rpc::Status {
    let (code, message) = match err {
        JobError::Failed(info) => (rpc::Code::Aborted, info.clone()),
        JobError::InvalidArgument(info) => (
            rpc::Code::InvalidArgument,
            format!("Invalid Argument: {info}"),
        ),
    };
    rpc::Status {
        code: code.into(),
        message,
        ..Default::default()
    }
}

/// The operation a client sees while its job is at `stage`.
pub(crate) fn to_operation(name: &str, stage: JobStage, create_time: &Timestamp) -> Operation {
    let metadata = JobMetadata {
        stage: stage_value(&stage).into(),
        create_time: Some(create_time.clone()),
        update_time: Some(Timestamp::from(std::time::SystemTime::now())),
    };

    let result = match stage {
        JobStage::Queued | JobStage::Running => None,
        JobStage::Done(response) => Some(operation::Result::Response(response)),
        JobStage::Failed(err) => Some(operation::Result::Error(error_status(&err))),
        JobStage::Cancelled => Some(operation::Result::Error(rpc::Status {
            code: rpc::Code::Cancelled.into(),
            message: String::from("Operation was cancelled"),
            ..Default::default()
        })),
    };

    Operation {
        name: name.to_string(),
        metadata: Some(prost_types::Any {
            type_url: protos::JOB_METADATA.to_string(),
            value: metadata.encode_to_vec(),
        }),
        done: result.is_some(),
        result,
    }
}
