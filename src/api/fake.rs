//! In-memory `ClusterApi` + `EventSink` used by `--self-check` and the
//! integration test suite. Not wired up for production use; real
//! deployments construct `HttpClusterApi` instead.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::domain::{Node, NodeView, Workload, WorkloadIdentity};
use crate::error::Result;
use crate::events::EventSink;

use super::client::ClusterApi;

#[derive(Debug, Clone)]
pub struct RecordedEvent {
    pub subject: WorkloadIdentity,
    pub reason: String,
    pub message: String,
}

#[derive(Debug, Clone)]
pub struct RecordedDeletion {
    pub identity: WorkloadIdentity,
    pub grace_period_seconds: Option<i64>,
}

#[derive(Default)]
struct State {
    nodes: Vec<NodeView>,
    unscheduled: HashMap<String, Vec<Workload>>,
    events: Vec<RecordedEvent>,
    deletions: Vec<RecordedDeletion>,
}

/// A synchronous, in-process stand-in for the orchestrator's control
/// plane. State is guarded by a plain `std::sync::Mutex`; every method
/// locks, mutates, and unlocks without crossing an `.await`, so it is safe
/// to call from async tests despite not using `tokio::sync::Mutex`.
#[derive(Default)]
pub struct FakeClusterApi {
    state: Mutex<State>,
}

impl FakeClusterApi {
    pub fn new() -> Self {
        FakeClusterApi::default()
    }

    pub fn with_node(&self, view: NodeView) -> &Self {
        self.state.lock().unwrap().nodes.push(view);
        self
    }

    pub fn with_unscheduled(&self, namespace: impl Into<String>, workload: Workload) -> &Self {
        self.state.lock().unwrap().unscheduled.entry(namespace.into()).or_default().push(workload);
        self
    }

    /// Simulates the primary scheduler binding a workload to a node.
    pub fn bind(&self, namespace: &str, name: &str, node_name: &str) {
        let mut state = self.state.lock().unwrap();
        if let Some(list) = state.unscheduled.get_mut(namespace) {
            if let Some(pos) = list.iter().position(|w| w.name == name) {
                let mut w = list.remove(pos);
                w.bound_node = Some(node_name.to_string());
                if let Some(view) = state.nodes.iter_mut().find(|v| v.node.name == node_name) {
                    view.residents.push(w);
                }
            }
        }
    }

    pub fn events(&self) -> Vec<RecordedEvent> {
        self.state.lock().unwrap().events.clone()
    }

    pub fn deletions(&self) -> Vec<RecordedDeletion> {
        self.state.lock().unwrap().deletions.clone()
    }

    pub fn node_views(&self) -> Vec<NodeView> {
        self.state.lock().unwrap().nodes.clone()
    }
}

#[async_trait]
impl ClusterApi for FakeClusterApi {
    async fn list_ready_nodes(&self) -> Result<Vec<NodeView>> {
        Ok(self.state.lock().unwrap().nodes.clone())
    }

    async fn list_unscheduled_workloads(&self, namespace: &str) -> Result<Vec<Workload>> {
        Ok(self.state.lock().unwrap().unscheduled.get(namespace).cloned().unwrap_or_default())
    }

    async fn list_workloads_on_node(&self, node_name: &str) -> Result<Vec<Workload>> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .nodes
            .iter()
            .find(|v| v.node.name == node_name)
            .map(|v| v.residents.clone())
            .unwrap_or_default())
    }

    async fn get_workload(&self, namespace: &str, name: &str) -> Result<Option<Workload>> {
        let state = self.state.lock().unwrap();
        if let Some(found) = state.unscheduled.get(namespace).and_then(|list| list.iter().find(|w| w.name == name)) {
            return Ok(Some(found.clone()));
        }
        for view in &state.nodes {
            if let Some(found) = view.residents.iter().find(|w| w.namespace == namespace && w.name == name) {
                return Ok(Some(found.clone()));
            }
        }
        Ok(None)
    }

    async fn update_node(&self, node: &Node) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if let Some(view) = state.nodes.iter_mut().find(|v| v.node.name == node.name) {
            view.node = node.clone();
        }
        Ok(())
    }

    async fn delete_workload(&self, identity: &WorkloadIdentity, grace_period_seconds: Option<i64>) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.deletions.push(RecordedDeletion { identity: identity.clone(), grace_period_seconds });

        let (namespace, name) = identity.as_str().split_once('/').unwrap_or((identity.as_str(), ""));
        for view in &mut state.nodes {
            view.residents.retain(|w| !(w.namespace == namespace && w.name == name));
        }
        Ok(())
    }
}

#[async_trait]
impl EventSink for FakeClusterApi {
    async fn emit(&self, subject: &WorkloadIdentity, reason: &str, message: String) -> Result<()> {
        self.state.lock().unwrap().events.push(RecordedEvent { subject: subject.clone(), reason: reason.to_string(), message });
        Ok(())
    }
}
