pub mod classifier;
pub mod identity;
pub mod node;
pub mod workload;

pub use identity::WorkloadIdentity;
pub use node::{Node, NodeView, Taint, TaintEffect};
pub use workload::{OwnerReference, Workload};
