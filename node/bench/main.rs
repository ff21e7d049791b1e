use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use engine::sleep::SleepJob;
use lro_client::{ClientConfig, OperationsClient};
use node_lib::{Connection, Node, NodeConfig};
use protos::longrunning::GetOperationRequest;
use std::time::Duration;
use tempfile::TempPath;
use tokio::net::UnixListener;
use tokio::runtime::Runtime;
use tokio_stream::wrappers::UnixListenerStream;

fn setup_node_benchmark(operations: usize) -> (Runtime, TempPath, OperationsClient, Vec<String>) {
    let rt = Runtime::new().expect("tokio runtime initialization");

    // Set up the stream
    let (stream, socket) = rt.block_on(async {
        // Create a new UDS file
        let socket = tempfile::NamedTempFile::new().unwrap().into_temp_path();
        std::fs::remove_file(&socket).unwrap();

        let uds = UnixListener::bind(&socket).unwrap();
        (UnixListenerStream::new(uds), socket)
    });

    // Seed the node and start the server
    let node = Node::new(NodeConfig::default());
    let names = rt.block_on(async {
        let mut names = vec![];
        for _ in 0..operations {
            let name = node
                .submit(SleepJob::new(Duration::from_secs(3600)))
                .await
                .unwrap();
            names.push(name.to_string());
        }
        names
    });
    rt.spawn(async move {
        let result = node_lib::start_node(node, Connection::Uds(stream)).await;
        assert!(result.is_ok());
    });

    // Create a client for the lro node
    let client = rt.block_on(async {
        let config = ClientConfig::new(&format!("unix://{}", socket.display()));
        OperationsClient::connect(&config).await.unwrap()
    });

    (rt, socket, client, names)
}

async fn get_all(client: OperationsClient, names: &[String]) {
    let calls = names.iter().map(|name| {
        client.get_operation(
            GetOperationRequest {
                name: name.clone(),
            },
            None,
        )
    });
    for result in futures::future::join_all(calls).await {
        result.unwrap();
    }
}

fn concurrent_get_benchmark(c: &mut Criterion) {
    let (rt, _socket, client, names) = setup_node_benchmark(256);

    let mut group = c.benchmark_group("concurrent_get");
    for concurrency in [1, 8, 64, 256].iter() {
        group.throughput(Throughput::Elements(*concurrency as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(concurrency),
            concurrency,
            |b, &concurrency| {
                let names = &names[..concurrency];
                b.to_async(&rt).iter(|| get_all(client.clone(), names))
            },
        );
    }
    group.finish();
}

criterion_group!(benches, concurrent_get_benchmark);
criterion_main!(benches);
