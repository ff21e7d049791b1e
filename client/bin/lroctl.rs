use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use lro_client::{ClientConfig, OperationState, OperationsClient};
use protos::longrunning::{
    CancelOperationRequest, DeleteOperationRequest, GetOperationRequest, ListOperationsRequest,
    Operation,
};
use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "lroctl")]
#[command(version = "0.1")]
#[command(about = "Inspect and manage long-running operations", long_about = None)]
struct Args {
    /// Path to a configuration file with a [client] table
    #[arg(long, conflicts_with = "host")]
    config: Option<PathBuf>,

    /// Server to talk to, `http://host:port` or `unix:///path/to.sock`
    #[arg(long)]
    host: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the latest state of an operation
    Get { name: String },
    /// List operations
    List {
        #[arg(long, default_value = "")]
        parent: String,
        #[arg(long, default_value = "")]
        filter: String,
        #[arg(long, default_value_t = 0)]
        page_size: i32,
        #[arg(long, default_value = "")]
        page_token: String,
    },
    /// Ask the server to cancel an operation
    Cancel { name: String },
    /// Forget an operation
    Delete { name: String },
    /// Poll until an operation is done and print its final state
    Wait {
        name: String,
        /// Give up after this many seconds
        #[arg(long)]
        deadline: Option<u64>,
    },
}

/// JSON rendering of an operation snapshot.
#[derive(Serialize)]
struct OperationView {
    name: String,
    done: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    metadata_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_bytes: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error_code: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error_message: Option<String>,
}

impl From<&Operation> for OperationView {
    fn from(operation: &Operation) -> Self {
        let mut view = OperationView {
            name: operation.name.clone(),
            done: operation.done,
            metadata_type: operation.metadata.as_ref().map(|m| m.type_url.clone()),
            response_type: None,
            response_bytes: None,
            error_code: None,
            error_message: None,
        };
        match OperationState::from(operation) {
            OperationState::Running => {}
            OperationState::Succeeded(response) => {
                view.response_type = Some(response.type_url.clone());
                view.response_bytes = Some(response.value.len());
            }
            OperationState::Failed(status) => {
                view.error_code = Some(status.code);
                view.error_message = Some(status.message);
            }
        }
        view
    }
}

#[derive(Serialize)]
struct PageView {
    operations: Vec<OperationView>,
    #[serde(skip_serializing_if = "String::is_empty")]
    next_page_token: String,
}

fn print<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = match (args.config, args.host) {
        (Some(path), _) => ClientConfig::read(&path)
            .await
            .with_context(|| format!("loading {}", path.display()))?,
        (None, Some(host)) => ClientConfig::new(&host),
        (None, None) => bail!("one of --config or --host is required"),
    };

    let client = OperationsClient::connect(&config)
        .await
        .with_context(|| format!("connecting to {}", config.host))?;

    match args.command {
        Command::Get { name } => {
            let operation = client
                .get_operation(GetOperationRequest { name }, None)
                .await?;
            print(&OperationView::from(&operation))?;
        }
        Command::List {
            parent,
            filter,
            page_size,
            page_token,
        } => {
            let page = client
                .list_operations(
                    ListOperationsRequest {
                        name: parent,
                        filter,
                        page_size,
                        page_token,
                    },
                    None,
                )
                .await?;
            print(&PageView {
                operations: page.operations.iter().map(OperationView::from).collect(),
                next_page_token: page.next_page_token,
            })?;
        }
        Command::Cancel { name } => {
            client
                .cancel_operation(CancelOperationRequest { name: name.clone() }, None)
                .await?;
            eprintln!("cancellation requested for {name}");
        }
        Command::Delete { name } => {
            client
                .delete_operation(DeleteOperationRequest { name: name.clone() }, None)
                .await?;
            eprintln!("deleted {name}");
        }
        Command::Wait { name, deadline } => {
            let operation = client
                .wait(
                    &name,
                    config.poll_interval(),
                    deadline.map(Duration::from_secs),
                )
                .await?;
            print(&OperationView::from(&operation))?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use protos::longrunning::operation;

    #[test]
    fn response_bytes_counts_the_payload_only() {
        let operation = Operation {
            name: String::from("operations/a"),
            done: true,
            result: Some(operation::Result::Response(prost_types::Any {
                type_url: String::from("type.googleapis.com/google.protobuf.Duration"),
                value: vec![8, 1],
            })),
            ..Default::default()
        };
        let view = OperationView::from(&operation);
        assert_eq!(view.response_bytes, Some(2));
        assert_eq!(
            view.response_type.as_deref(),
            Some("type.googleapis.com/google.protobuf.Duration")
        );
    }
}
