//! Admission Simulator.
//!
//! Decides, for one candidate node, which residents must be evicted before
//! a critical workload fits. Never mutates the node or the cluster; every
//! step operates on a simulated copy of the resident set.

use crate::domain::classifier::{is_evictable, is_protected};
use crate::domain::{Node, Workload};
use crate::oracle::{FeasibilityOracle, RejectionReason};

/// Outcome of simulating admission of a critical workload onto one node.
#[derive(Debug)]
pub enum SimulationOutcome {
    /// The workload fits, possibly after evicting `evictees` (empty when it
    /// fits among the protected residents alone).
    Fits { evictees: Vec<Workload> },
    DoesNotFit(RejectionReason),
}

/// Runs the partition-then-greedy-evict algorithm against `residents` as
/// they stand right now on `node`. The caller owns re-simulating against a
/// fresher snapshot where the contract requires it.
pub fn simulate_admission(
    node: &Node,
    residents: &[Workload],
    critical: &Workload,
    system_namespace: &str,
    oracle: &dyn FeasibilityOracle,
) -> SimulationOutcome {
    let (protected, evictable): (Vec<Workload>, Vec<Workload>) =
        residents.iter().cloned().partition(|w| is_protected(w, system_namespace));

    debug_assert!(evictable.iter().all(|w| is_evictable(w, system_namespace)));

    // Step 2: does the critical workload fit among protected residents alone?
    if let Err(reason) = oracle.feasible(node, &protected, critical) {
        return SimulationOutcome::DoesNotFit(reason);
    }

    // Step 3: extend the simulated residents with the critical workload.
    let mut simulated = protected;
    simulated.push(critical.clone());

    // Step 4: walk evictable residents in input order, keeping whichever
    // still fit once the critical workload (and previously-kept residents)
    // are accounted for.
    let mut evictees = Vec::new();
    for resident in evictable {
        match oracle.feasible(node, &simulated, &resident) {
            Ok(()) => simulated.push(resident),
            Err(_) => evictees.push(resident),
        }
    }

    SimulationOutcome::Fits { evictees }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::workload::{OwnerReference, CRITICAL_POD_ANNOTATION};
    use crate::oracle::CapacityOracle;
    use std::collections::HashMap;

    fn workload(name: &str, namespace: &str, millicores: i64) -> Workload {
        let mut annotations = HashMap::new();
        annotations.insert(crate::oracle::REQUESTED_MILLICORES_ANNOTATION.to_string(), millicores.to_string());
        Workload {
            namespace: namespace.into(),
            name: name.into(),
            priority: None,
            annotations,
            labels: HashMap::new(),
            owner_references: Vec::new(),
            bound_node: None,
            termination_grace_seconds: None,
        }
    }

    fn critical(name: &str, millicores: i64) -> Workload {
        let mut w = workload(name, "kube-system", millicores);
        w.annotations.insert(CRITICAL_POD_ANNOTATION.into(), "".into());
        w
    }

    #[test]
    fn fits_without_eviction_when_room_exists() {
        let node = Node::new("node-a");
        let oracle = CapacityOracle::new(1000, 1000);
        let crit = critical("crit", 100);
        let outcome = simulate_admission(&node, &[], &crit, "kube-system", &oracle);
        match outcome {
            SimulationOutcome::Fits { evictees } => assert!(evictees.is_empty()),
            SimulationOutcome::DoesNotFit(r) => panic!("unexpected rejection: {r}"),
        }
    }

    #[test]
    fn evicts_the_victim_that_blocks_the_critical_workload() {
        let node = Node::new("node-a");
        let oracle = CapacityOracle::new(500, 1000);
        let victim = workload("victim", "default", 400);
        let crit = critical("crit", 300);

        match simulate_admission(&node, &[victim.clone()], &crit, "kube-system", &oracle) {
            SimulationOutcome::Fits { evictees } => assert_eq!(evictees, vec![victim]),
            SimulationOutcome::DoesNotFit(r) => panic!("unexpected rejection: {r}"),
        }
    }

    #[test]
    fn rejects_when_protected_residents_alone_exceed_capacity() {
        let node = Node::new("node-a");
        let oracle = CapacityOracle::new(100, 1000);
        let mut daemon = workload("ds", "default", 150);
        daemon.owner_references.push(OwnerReference { kind: "DaemonSet".into(), name: "ds".into() });
        let crit = critical("crit", 1);

        match simulate_admission(&node, &[daemon], &crit, "kube-system", &oracle) {
            SimulationOutcome::Fits { .. } => panic!("expected rejection"),
            SimulationOutcome::DoesNotFit(_) => {}
        }
    }

    #[test]
    fn never_evicts_protected_residents() {
        let node = Node::new("node-a");
        let oracle = CapacityOracle::new(100, 1000);
        let mut daemon = workload("ds", "default", 90);
        daemon.owner_references.push(OwnerReference { kind: "DaemonSet".into(), name: "ds".into() });
        let victim = workload("victim", "default", 90);
        let crit = critical("crit", 10);

        match simulate_admission(&node, &[daemon.clone(), victim.clone()], &crit, "kube-system", &oracle) {
            SimulationOutcome::Fits { evictees } => {
                assert_eq!(evictees, vec![victim]);
                assert!(!evictees.contains(&daemon));
            }
            SimulationOutcome::DoesNotFit(r) => panic!("unexpected rejection: {r}"),
        }
    }

    #[test]
    fn keeps_evictable_residents_that_still_fit() {
        let node = Node::new("node-a");
        let oracle = CapacityOracle::new(1000, 1000);
        let small_victim = workload("small", "default", 50);
        let crit = critical("crit", 100);

        match simulate_admission(&node, &[small_victim], &crit, "kube-system", &oracle) {
            SimulationOutcome::Fits { evictees } => assert!(evictees.is_empty()),
            SimulationOutcome::DoesNotFit(r) => panic!("unexpected rejection: {r}"),
        }
    }
}
