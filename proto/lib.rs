//! Checked-in prost/tonic bindings for the long-running operations API.
//!
//! The files under `genproto/` are generated from the `.proto` files next to this one
//! (`google/longrunning`, `google/rpc` and the node's `lro/node/v1/job.proto`) by
//! `gen_protos_tool.rs`. Only server stubs are generated.

pub use google::longrunning::{
    self as longrunning,
    operations_server::{Operations, OperationsServer},
};
pub use google::rpc;
pub use lro::node::v1 as node;

/// Fully qualified type URL of the metadata message attached by lro nodes.
pub static JOB_METADATA: &str = "type.googleapis.com/lro.node.v1.JobMetadata";

mod google {
    pub mod longrunning {
        include!("genproto/google.longrunning.pb.rs");
    }
    pub mod rpc {
        include!("genproto/google.rpc.pb.rs");
    }
}

mod lro {
    pub mod node {
        pub mod v1 {
            include!("genproto/lro.node.v1.pb.rs");
        }
    }
}
