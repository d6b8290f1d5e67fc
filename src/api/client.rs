//! `ClusterApi` trait boundary. The control loop and
//! waiters talk to the orchestrator's control plane only through this
//! trait; `http::HttpClusterApi` is the one concrete implementation shipped
//! with this crate, and `fake::FakeClusterApi` backs tests and
//! `--self-check`.

use async_trait::async_trait;

use crate::domain::{Node, NodeView, Workload, WorkloadIdentity};
use crate::error::Result;

#[async_trait]
pub trait ClusterApi: Send + Sync {
    /// Ready nodes together with the workloads currently bound to each.
    async fn list_ready_nodes(&self) -> Result<Vec<NodeView>>;

    /// Workloads in `namespace` that lack a node binding.
    async fn list_unscheduled_workloads(&self, namespace: &str) -> Result<Vec<Workload>>;

    /// Workloads currently bound to `node_name`, used to re-simulate
    /// against a fresh snapshot immediately after tainting.
    async fn list_workloads_on_node(&self, node_name: &str) -> Result<Vec<Workload>>;

    /// Fetches the live state of a single workload, used by the waiter.
    /// Returns `Ok(None)` if it no longer exists.
    async fn get_workload(&self, namespace: &str, name: &str) -> Result<Option<Workload>>;

    /// Persists a full node object. The caller must pass a copy it
    /// produced by mutating a previously-fetched snapshot.
    async fn update_node(&self, node: &Node) -> Result<()>;

    /// Initiates deletion of a workload, optionally overriding its grace
    /// period.
    async fn delete_workload(&self, identity: &WorkloadIdentity, grace_period_seconds: Option<i64>) -> Result<()>;
}
