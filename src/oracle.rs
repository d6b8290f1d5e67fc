//! Feasibility Oracle trait boundary and reference implementation.
//!
//! Answers one question: would this candidate workload fit on this node
//! alongside these residents? The admission simulator treats the answer as
//! opaque and never inspects the rejection reason beyond logging it.

use std::collections::HashMap;

use crate::domain::{Node, Workload};

/// Why a candidate workload was rejected by an oracle. Carried back to the
/// caller for logging; never inspected by the simulator's control flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectionReason {
    InsufficientCapacity { requested_millicores: i64, available_millicores: i64 },
    Other(String),
}

impl std::fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RejectionReason::InsufficientCapacity { requested_millicores, available_millicores } => write!(
                f,
                "insufficient capacity: requested {requested_millicores}m, {available_millicores}m available"
            ),
            RejectionReason::Other(msg) => write!(f, "{msg}"),
        }
    }
}

/// Given a node snapshot, its current residents, and a candidate workload,
/// reports whether the candidate would schedule there. Implementations must
/// be pure: deterministic for a fixed `(node, residents, candidate)` input
/// within a single tick.
///
/// Production deployments back this with the real scheduler predicate
/// library, which stays out of scope for this crate; `CapacityOracle`
/// below is the reference implementation used by tests and `--self-check`.
pub trait FeasibilityOracle: Send + Sync {
    fn feasible(&self, node: &Node, residents: &[Workload], candidate: &Workload) -> Result<(), RejectionReason>;
}

/// Annotation a workload carries its requested millicores under, read by
/// `CapacityOracle`. Defaults to `0` when absent or unparsable.
pub const REQUESTED_MILLICORES_ANNOTATION: &str = "rescheduler.example.com/requested-millicores";
/// Annotation a workload carries its requested memory (MB) under.
pub const REQUESTED_MEMORY_MB_ANNOTATION: &str = "rescheduler.example.com/requested-memory-mb";

fn requested(workload: &Workload) -> (i64, i64) {
    let millicores = workload
        .annotations
        .get(REQUESTED_MILLICORES_ANNOTATION)
        .and_then(|v| v.parse::<i64>().ok())
        .unwrap_or(0);
    let memory_mb = workload
        .annotations
        .get(REQUESTED_MEMORY_MB_ANNOTATION)
        .and_then(|v| v.parse::<i64>().ok())
        .unwrap_or(0);
    (millicores, memory_mb)
}

/// Deterministic, bin-packing-by-sum oracle: a node has a fixed capacity
/// (millicores, memory MB); a candidate fits iff the sum of residents'
/// requests plus its own does not exceed that capacity. Intentionally
/// simplistic — it exists so the crate's own tests and
/// `--self-check` mode have something to run against without a real
/// predicate library wired up.
#[derive(Debug, Clone)]
pub struct CapacityOracle {
    default_capacity: (i64, i64),
    node_capacities: HashMap<String, (i64, i64)>,
}

impl CapacityOracle {
    pub fn new(default_millicores: i64, default_memory_mb: i64) -> Self {
        CapacityOracle { default_capacity: (default_millicores, default_memory_mb), node_capacities: HashMap::new() }
    }

    /// Overrides the capacity of a specific node; nodes not listed fall back
    /// to the default passed to `new`.
    pub fn with_node_capacity(mut self, node_name: impl Into<String>, millicores: i64, memory_mb: i64) -> Self {
        self.node_capacities.insert(node_name.into(), (millicores, memory_mb));
        self
    }

    fn capacity_for(&self, node_name: &str) -> (i64, i64) {
        self.node_capacities.get(node_name).copied().unwrap_or(self.default_capacity)
    }
}

impl FeasibilityOracle for CapacityOracle {
    fn feasible(&self, node: &Node, residents: &[Workload], candidate: &Workload) -> Result<(), RejectionReason> {
        let (capacity_millicores, capacity_memory_mb) = self.capacity_for(&node.name);

        let (mut used_millicores, mut used_memory_mb) = (0i64, 0i64);
        for resident in residents {
            let (m, mem) = requested(resident);
            used_millicores += m;
            used_memory_mb += mem;
        }

        let (candidate_millicores, candidate_memory_mb) = requested(candidate);
        let total_millicores = used_millicores + candidate_millicores;
        let total_memory_mb = used_memory_mb + candidate_memory_mb;

        if total_millicores <= capacity_millicores && total_memory_mb <= capacity_memory_mb {
            Ok(())
        } else if total_millicores > capacity_millicores {
            Err(RejectionReason::InsufficientCapacity {
                requested_millicores: total_millicores,
                available_millicores: capacity_millicores,
            })
        } else {
            Err(RejectionReason::Other(format!(
                "insufficient memory: requested {total_memory_mb}MB, {capacity_memory_mb}MB available"
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap as Map;

    fn workload_with(millicores: i64, memory_mb: i64) -> Workload {
        let mut annotations = Map::new();
        annotations.insert(REQUESTED_MILLICORES_ANNOTATION.to_string(), millicores.to_string());
        annotations.insert(REQUESTED_MEMORY_MB_ANNOTATION.to_string(), memory_mb.to_string());
        Workload {
            namespace: "default".into(),
            name: "w".into(),
            priority: None,
            annotations,
            labels: Map::new(),
            owner_references: Vec::new(),
            bound_node: None,
            termination_grace_seconds: None,
        }
    }

    #[test]
    fn fits_when_under_capacity() {
        let oracle = CapacityOracle::new(1000, 1000);
        let node = Node::new("node-a");
        let resident = workload_with(400, 400);
        let candidate = workload_with(400, 400);
        assert!(oracle.feasible(&node, &[resident], &candidate).is_ok());
    }

    #[test]
    fn rejects_when_over_capacity() {
        let oracle = CapacityOracle::new(1000, 1000);
        let node = Node::new("node-a");
        let resident = workload_with(800, 200);
        let candidate = workload_with(400, 200);
        let err = oracle.feasible(&node, &[resident], &candidate).unwrap_err();
        assert!(matches!(err, RejectionReason::InsufficientCapacity { .. }));
    }

    #[test]
    fn unannotated_workloads_request_nothing() {
        let oracle = CapacityOracle::new(0, 0);
        let node = Node::new("node-a");
        let candidate = Workload {
            namespace: "default".into(),
            name: "w".into(),
            priority: None,
            annotations: Map::new(),
            labels: Map::new(),
            owner_references: Vec::new(),
            bound_node: None,
            termination_grace_seconds: None,
        };
        assert!(oracle.feasible(&node, &[], &candidate).is_ok());
    }

    #[test]
    fn per_node_capacity_override() {
        let oracle = CapacityOracle::new(100, 100).with_node_capacity("big", 10_000, 10_000);
        let big = Node::new("big");
        let candidate = workload_with(5_000, 5_000);
        assert!(oracle.feasible(&big, &[], &candidate).is_ok());

        let small = Node::new("small");
        assert!(oracle.feasible(&small, &[], &candidate).is_err());
    }
}
