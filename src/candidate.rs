//! Candidate-Node Selection.

use crate::domain::{NodeView, Workload};
use crate::oracle::FeasibilityOracle;
use crate::simulator::{simulate_admission, SimulationOutcome};

pub struct Candidate {
    pub node: NodeView,
    pub evictees: Vec<Workload>,
}

/// First-fit over `nodes` in input order. Nodes already carrying a
/// reservation taint are skipped and take no further part in the pass —
/// a node under one critical workload's reservation is never double-booked
/// for another.
pub fn select_candidate_node(
    nodes: &[NodeView],
    critical: &Workload,
    system_namespace: &str,
    oracle: &dyn FeasibilityOracle,
) -> Option<Candidate> {
    for view in nodes {
        if view.node.has_any_reservation_taint() {
            tracing::warn!(node = %view.node.name, "skipping node already holding a reservation taint");
            continue;
        }

        match simulate_admission(&view.node, &view.residents, critical, system_namespace, oracle) {
            SimulationOutcome::Fits { evictees } => {
                return Some(Candidate { node: view.clone(), evictees });
            }
            SimulationOutcome::DoesNotFit(reason) => {
                tracing::debug!(node = %view.node.name, %reason, "node rejected by oracle");
            }
        }
    }

    None
}
