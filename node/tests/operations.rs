use crate::{default_node, lro_test};
use engine::sleep::SleepJob;
use lro_client::{LroError, OperationState};
use node_lib::{Node, NodeConfig};
use prost::Message;
use protos::longrunning::{
    CancelOperationRequest, DeleteOperationRequest, GetOperationRequest, ListOperationsRequest,
};
use protos::node::{job_stage, JobMetadata};
use std::collections::HashSet;
use std::time::Duration;

static FOREVER: Duration = Duration::from_secs(3600);

fn get(name: &str) -> GetOperationRequest {
    GetOperationRequest {
        name: name.to_string(),
    }
}

fn list(filter: &str, page_size: i32, page_token: &str) -> ListOperationsRequest {
    ListOperationsRequest {
        name: String::from("operations"),
        filter: filter.to_string(),
        page_size,
        page_token: page_token.to_string(),
    }
}

#[tokio::test]
async fn get_returns_the_named_operation() {
    let node = default_node();
    let name = node.submit(SleepJob::new(FOREVER)).await.unwrap();
    lro_test(node, |_, client| async move {
        let operation = client.get_operation(get(name.as_str()), None).await.unwrap();
        assert_eq!(operation.name, name.as_str());
        assert!(!operation.done);

        let metadata = operation.metadata.unwrap();
        assert_eq!(metadata.type_url, protos::JOB_METADATA);
        let metadata = JobMetadata::decode(metadata.value.as_slice()).unwrap();
        assert!(metadata.create_time.is_some());
        assert!(
            metadata.stage == job_stage::Value::Queued as i32
                || metadata.stage == job_stage::Value::Running as i32
        );
    })
    .await;
}

#[tokio::test]
async fn unknown_and_malformed_names() {
    lro_test(default_node(), |_, client| async move {
        let result = client.get_operation(get("operations/missing"), None).await;
        assert!(matches!(result, Err(LroError::NotFound(_))));

        let result = client.get_operation(get("operations//bad name"), None).await;
        assert!(matches!(result, Err(LroError::InvalidArgument(_))));
    })
    .await;
}

#[tokio::test]
async fn delete_then_get_is_not_found() {
    let node = default_node();
    let name = node.submit(SleepJob::new(FOREVER)).await.unwrap();
    lro_test(node, |_, client| async move {
        let delete = DeleteOperationRequest {
            name: name.to_string(),
        };
        client.delete_operation(delete.clone(), None).await.unwrap();

        let result = client.get_operation(get(name.as_str()), None).await;
        assert!(matches!(result, Err(LroError::NotFound(_))));

        let result = client.delete_operation(delete, None).await;
        assert!(matches!(result, Err(LroError::NotFound(_))));
    })
    .await;
}

#[tokio::test]
async fn list_pages_are_disjoint_and_complete() {
    let node = default_node();
    let mut submitted = HashSet::new();
    for _ in 0..23 {
        submitted.insert(node.submit(SleepJob::new(FOREVER)).await.unwrap().to_string());
    }

    lro_test(node, |_, client| async move {
        let mut seen = HashSet::new();
        let mut pages = 0;
        let mut token = String::new();
        loop {
            let page = client
                .list_operations(list("", 5, &token), None)
                .await
                .unwrap();
            pages += 1;
            assert!(page.operations.len() <= 5);
            for operation in page.operations {
                assert!(seen.insert(operation.name), "listed twice");
            }
            if page.next_page_token.is_empty() {
                break;
            }
            token = page.next_page_token;
        }
        assert_eq!(pages, 5);
        assert_eq!(seen, submitted);
    })
    .await;
}

#[tokio::test]
async fn list_filters_on_done() {
    let node = default_node();
    let running = node.submit(SleepJob::new(FOREVER)).await.unwrap();
    let finished = node
        .submit(SleepJob::new(Duration::from_millis(1)))
        .await
        .unwrap();

    lro_test(node, |_, client| async move {
        client
            .wait(finished.as_str(), Duration::from_millis(5), Some(Duration::from_secs(5)))
            .await
            .unwrap();

        let done = client
            .list_operations(list("done=true", 0, ""), None)
            .await
            .unwrap();
        let names: Vec<_> = done.operations.iter().map(|o| o.name.as_str()).collect();
        assert_eq!(names, [finished.as_str()]);

        let pending = client
            .list_operations(list("done=false", 0, ""), None)
            .await
            .unwrap();
        let names: Vec<_> = pending.operations.iter().map(|o| o.name.as_str()).collect();
        assert_eq!(names, [running.as_str()]);

        let other = client
            .list_operations(
                ListOperationsRequest {
                    name: String::from("elsewhere"),
                    ..Default::default()
                },
                None,
            )
            .await
            .unwrap();
        assert!(other.operations.is_empty());
    })
    .await;
}

#[tokio::test]
async fn bad_list_requests_are_invalid_arguments() {
    let node = default_node();
    node.submit(SleepJob::new(FOREVER)).await.unwrap();
    lro_test(node, |_, client| async move {
        for request in [
            list("", 0, "not-hex"),
            list("", -1, ""),
            list("name=operations/a", 0, ""),
            list("d one = tr ue", 0, ""),
        ] {
            let result = client.list_operations(request, None).await;
            assert!(
                matches!(result, Err(LroError::InvalidArgument(_))),
                "{result:?}"
            );
        }
    })
    .await;
}

#[tokio::test]
async fn disabled_methods_are_unimplemented() {
    let node = Node::new(NodeConfig {
        list_enabled: false,
        cancel_enabled: false,
        delete_enabled: false,
        ..Default::default()
    });
    let name = node.submit(SleepJob::new(FOREVER)).await.unwrap();
    lro_test(node, |_, client| async move {
        let result = client
            .list_operations(ListOperationsRequest::default(), None)
            .await;
        assert!(matches!(result, Err(LroError::Unimplemented(_))));

        let result = client
            .cancel_operation(
                CancelOperationRequest {
                    name: name.to_string(),
                },
                None,
            )
            .await;
        assert!(matches!(result, Err(LroError::Unimplemented(_))));

        let result = client
            .delete_operation(
                DeleteOperationRequest {
                    name: name.to_string(),
                },
                None,
            )
            .await;
        assert!(matches!(result, Err(LroError::Unimplemented(_))));

        // Gets still work, and the refused delete removed nothing.
        client.get_operation(get(name.as_str()), None).await.unwrap();
    })
    .await;
}

#[tokio::test]
async fn cancel_is_observed_by_polling() {
    let node = default_node();
    let name = node.submit(SleepJob::new(FOREVER)).await.unwrap();
    lro_test(node, |_, client| async move {
        client
            .cancel_operation(
                CancelOperationRequest {
                    name: name.to_string(),
                },
                None,
            )
            .await
            .unwrap();

        let operation = client
            .wait(name.as_str(), Duration::from_millis(5), Some(Duration::from_secs(5)))
            .await
            .unwrap();
        assert!(OperationState::from(&operation).is_cancelled());

        // Cancelling a finished operation is accepted and changes nothing.
        client
            .cancel_operation(
                CancelOperationRequest {
                    name: name.to_string(),
                },
                None,
            )
            .await
            .unwrap();
        let again = client.get_operation(get(name.as_str()), None).await.unwrap();
        assert_eq!(again.result, operation.result);

        let result = client
            .cancel_operation(
                CancelOperationRequest {
                    name: String::from("operations/missing"),
                },
                None,
            )
            .await;
        assert!(matches!(result, Err(LroError::NotFound(_))));
    })
    .await;
}

#[tokio::test]
async fn cancelled_call_completes_exactly_once() {
    let node = default_node();
    let name = node.submit(SleepJob::new(FOREVER)).await.unwrap();
    lro_test(node, |_, client| async move {
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let canceller = client
            .get_operation(get(name.as_str()), None)
            .on_complete(move |result| tx.send(result).unwrap());
        canceller.cancel();

        match rx.recv().await.unwrap() {
            Err(LroError::Cancelled) => {}
            Ok(operation) => assert_eq!(operation.name, name.as_str()),
            Err(err) => panic!("unexpected error: {err}"),
        }
        // The sender is gone once the handler has run.
        assert!(rx.recv().await.is_none());
    })
    .await;
}

#[tokio::test]
async fn concurrent_gets_do_not_cross_talk() {
    let node = default_node();
    let mut names = vec![];
    for _ in 0..100 {
        names.push(node.submit(SleepJob::new(FOREVER)).await.unwrap());
    }
    lro_test(node, |_, client| async move {
        let calls = names
            .iter()
            .map(|name| client.get_operation(get(name.as_str()), None));
        let results = futures::future::join_all(calls).await;
        for (name, result) in names.iter().zip(results) {
            assert_eq!(result.unwrap().name, name.as_str());
        }
    })
    .await;
}
