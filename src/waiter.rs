//! Waiter.
//!
//! One independent task per active reservation. Polls the live state of the
//! critical workload once per second until it acquires a node binding or
//! the pod-scheduled timeout expires; either way, removes it from the
//! In-Flight Set on return. Never touches the reservation taint — Taint GC
//! reclaims that on the next tick.

use std::sync::Arc;
use std::time::Duration;

use crate::api::client::ClusterApi;
use crate::domain::WorkloadIdentity;
use crate::inflight::InFlightSet;

const POLL_INTERVAL: Duration = Duration::from_secs(1);

pub async fn run_waiter(
    api: Arc<dyn ClusterApi>,
    in_flight: Arc<InFlightSet>,
    identity: WorkloadIdentity,
    namespace: String,
    name: String,
    timeout: Duration,
) {
    let outcome = tokio::time::timeout(timeout, poll_until_bound(&*api, &namespace, &name)).await;

    match outcome {
        Ok(()) => tracing::info!(workload = %identity, "critical workload bound; releasing reservation"),
        Err(_) => tracing::warn!(workload = %identity, timeout_secs = timeout.as_secs(), "pod-scheduled timeout expired; releasing reservation"),
    }

    in_flight.remove(&identity).await;
}

async fn poll_until_bound(api: &dyn ClusterApi, namespace: &str, name: &str) {
    let mut interval = tokio::time::interval(POLL_INTERVAL);
    loop {
        interval.tick().await;
        match api.get_workload(namespace, name).await {
            Ok(Some(workload)) if workload.is_bound() => return,
            Ok(Some(_)) => continue,
            Ok(None) => {
                // The workload vanished (deleted, or resubmitted under a new
                // name); nothing more for this waiter to do.
                return;
            }
            Err(e) => {
                tracing::debug!(namespace, name, error = %e, "transient error polling workload state");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::fake::FakeClusterApi;
    use crate::domain::{NodeView, Workload};
    use crate::domain::node::Node;
    use std::collections::HashMap;

    fn unbound(namespace: &str, name: &str) -> Workload {
        Workload {
            namespace: namespace.to_string(),
            name: name.to_string(),
            priority: None,
            annotations: HashMap::new(),
            labels: HashMap::new(),
            owner_references: Vec::new(),
            bound_node: None,
            termination_grace_seconds: None,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn removes_from_in_flight_once_bound() {
        let api = Arc::new(FakeClusterApi::new());
        api.with_node(NodeView::new(Node::new("node-a"), vec![]));
        api.with_unscheduled("kube-system", unbound("kube-system", "crit"));

        let in_flight = Arc::new(InFlightSet::new());
        let identity = WorkloadIdentity::new("kube-system", "crit");
        in_flight.add(identity.clone()).await;

        let api_clone = api.clone();
        let in_flight_clone = in_flight.clone();
        let handle = tokio::spawn(run_waiter(
            api_clone,
            in_flight_clone,
            identity.clone(),
            "kube-system".to_string(),
            "crit".to_string(),
            Duration::from_secs(60),
        ));

        tokio::time::advance(Duration::from_secs(2)).await;
        api.bind("kube-system", "crit", "node-a");
        tokio::time::advance(Duration::from_secs(2)).await;

        handle.await.unwrap();
        assert!(!in_flight.contains(&identity).await);
    }

    #[tokio::test(start_paused = true)]
    async fn removes_from_in_flight_on_timeout() {
        let api = Arc::new(FakeClusterApi::new());
        api.with_unscheduled("kube-system", unbound("kube-system", "crit"));

        let in_flight = Arc::new(InFlightSet::new());
        let identity = WorkloadIdentity::new("kube-system", "crit");
        in_flight.add(identity.clone()).await;

        let handle = tokio::spawn(run_waiter(
            api.clone(),
            in_flight.clone(),
            identity.clone(),
            "kube-system".to_string(),
            "crit".to_string(),
            Duration::from_secs(5),
        ));

        tokio::time::advance(Duration::from_secs(10)).await;
        handle.await.unwrap();
        assert!(!in_flight.contains(&identity).await);
    }
}
