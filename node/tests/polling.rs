use crate::{default_node, lro_test};
use engine::sleep::SleepJob;
use lro_client::{CallOptions, LroError, OperationState, API_KEY_HEADER};
use protos::longrunning::GetOperationRequest;
use std::time::Duration;
use tokio_stream::StreamExt;

#[tokio::test]
async fn watch_ends_with_the_terminal_snapshot() {
    let node = default_node();
    let name = node
        .submit(SleepJob::new(Duration::from_millis(50)))
        .await
        .unwrap();
    lro_test(node, |_, client| async move {
        let snapshots: Vec<_> = client
            .watch(name.as_str(), Duration::from_millis(5))
            .collect()
            .await;
        let (last, rest) = snapshots.split_last().unwrap();
        let last = last.as_ref().unwrap();
        assert!(last.done);
        assert!(matches!(
            OperationState::from(last),
            OperationState::Succeeded(ref response) if response.type_url == engine::sleep::DURATION_TYPE
        ));
        assert!(rest.iter().all(|s| !s.as_ref().unwrap().done));
    })
    .await;
}

#[tokio::test]
async fn failed_jobs_surface_their_error() {
    let node = default_node();
    let name = node
        .submit(SleepJob::failing(Duration::from_millis(1), "out of tape"))
        .await
        .unwrap();
    lro_test(node, |_, client| async move {
        let operation = client
            .wait(name.as_str(), Duration::from_millis(5), Some(Duration::from_secs(5)))
            .await
            .unwrap();
        let OperationState::Failed(status) = OperationState::from(&operation) else {
            panic!("expected a failure, got {operation:?}");
        };
        assert_eq!(status.message, "out of tape");
    })
    .await;
}

#[tokio::test]
async fn wait_respects_its_deadline() {
    let node = default_node();
    let name = node
        .submit(SleepJob::new(Duration::from_secs(3600)))
        .await
        .unwrap();
    lro_test(node, |_, client| async move {
        let result = client
            .wait(
                name.as_str(),
                Duration::from_millis(5),
                Some(Duration::from_millis(100)),
            )
            .await;
        assert!(matches!(result, Err(LroError::DeadlineExceeded)));
    })
    .await;
}

#[tokio::test]
async fn per_call_options_travel_over_the_wire() {
    let node = default_node();
    let name = node
        .submit(SleepJob::new(Duration::from_secs(3600)))
        .await
        .unwrap();
    lro_test(node, |_, client| async move {
        let options = CallOptions::new()
            .with_timeout(Duration::from_secs(5))
            .with_header(API_KEY_HEADER, "secret");
        let operation = client
            .get_operation(
                GetOperationRequest {
                    name: name.to_string(),
                },
                Some(options),
            )
            .await
            .unwrap();
        assert_eq!(operation.name, name.as_str());
    })
    .await;
}
