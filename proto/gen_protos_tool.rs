//! Regenerates `genproto/` from the `.proto` files in this directory.
//!
//! ```sh
//! cargo run -p protos --example gen_protos_tool -- -o proto/genproto \
//!     google/longrunning/operations.proto google/rpc/status.proto \
//!     google/rpc/code.proto lro/node/v1/job.proto
//! ```
//!
//! Needs `protoc` on the PATH (or `PROTOC` set). Run from `proto/` so the
//! inputs resolve against the include root.

use std::path::PathBuf;

use clap::{Arg, ArgAction, Command};
use prost_build::Config;

fn main() -> std::io::Result<()> {
    let matches = Command::new("Rust gRPC Codegen")
        .about("Codegen grpc/protobuf bindings for rust")
        .arg(
            Arg::new("inputs")
                .required(true)
                .action(ArgAction::Append)
                .help("Input proto files"),
        )
        .arg(
            Arg::new("output_dir")
                .short('o')
                .required(true)
                .long("output_dir")
                .help("Output directory"),
        )
        .get_matches();
    let paths = matches
        .get_many::<String>("inputs")
        .expect("inputs are required")
        .collect::<Vec<&String>>();
    let output_dir = PathBuf::from(
        matches
            .get_one::<String>("output_dir")
            .expect("output_dir is required"),
    );

    // The client crate brings its own transport, so only servers are generated.
    tonic_build::configure()
        .build_client(false)
        .build_server(true)
        .out_dir(&output_dir)
        .compile_with_config(Config::new(), &paths, &["."])?;

    // prost writes `<package>.rs`; proto/lib.rs includes `<package>.pb.rs`.
    for entry in std::fs::read_dir(&output_dir)? {
        let path = entry?.path();
        let name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
        if name.ends_with(".rs") && !name.ends_with(".pb.rs") {
            std::fs::rename(&path, path.with_extension("pb.rs"))?;
        }
    }
    Ok(())
}
