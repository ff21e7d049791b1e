use clap::Parser;
use engine::sleep::SleepJob;
use node_lib::{Connection, Node, NodeConfig};
use std::path::PathBuf;
use tracing::info;

use tracing_chrome::{ChromeLayerBuilder, TraceStyle};
use tracing_subscriber::prelude::*;

#[derive(Parser, Debug)]
#[command(name = "lro-node")]
#[command(version = "0.1")]
#[command(about = "Serves google.longrunning.Operations for locally run jobs", long_about = None)]
struct Args {
    /// Path to lro node configuration file
    #[arg(long)]
    config: PathBuf,

    /// Enable traces for visualizing in https://ui.perfetto.dev
    #[arg(long)]
    trace: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let args = Args::parse();

    let config = NodeConfig::read(args.config).await?;

    let _guard = if args.trace {
        let (chrome_layer, guard) = ChromeLayerBuilder::new()
            .include_args(true)
            .trace_style(TraceStyle::Async)
            .build();
        tracing_subscriber::registry().with(chrome_layer).init();
        Some(guard)
    } else {
        tracing_subscriber::fmt::init();
        None
    };

    let address = config.address;
    let jobs = config.jobs.clone();
    let node = Node::new(config);
    for job in jobs {
        let name = if job.fail {
            node.submit(SleepJob::failing(job.duration(), "configured to fail"))
                .await?
        } else {
            node.submit(SleepJob::new(job.duration())).await?
        };
        info!(%name, duration_ms = job.duration_ms, "seeded operation");
    }

    node_lib::start_node(node, Connection::Tcp(address)).await?;
    Ok(())
}
