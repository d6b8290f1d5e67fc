//! Reservation Protocol and Taint GC.

use crate::api::client::ClusterApi;
use crate::api::dto::{parse_legacy_taints, serialize_legacy_taints, LegacyTaintDto};
use crate::candidate::Candidate;
use crate::domain::node::{CRITICAL_ADDONS_ONLY_TAINT_KEY, LEGACY_TAINTS_ANNOTATION};
use crate::domain::Workload;
use crate::error::Result;
use crate::events::{emit_deleted_by_rescheduler, EventSink};
use crate::inflight::InFlightSet;
use crate::oracle::FeasibilityOracle;
use crate::simulator::{simulate_admission, SimulationOutcome};

/// Examines every ready node and removes any critical-reservation taint
/// whose value is not in the In-Flight Set. Running this twice with no
/// intervening state change is a no-op, because `Node::with_reclaimed_taints`
/// returns `None` when nothing would change.
pub async fn run_taint_gc(api: &dyn ClusterApi, in_flight: &InFlightSet) -> Result<()> {
    let nodes = api.list_ready_nodes().await?;
    let snapshot = in_flight.snapshot().await;
    let membership = |value: &str| snapshot.iter().any(|id| id.as_str() == value);

    for view in nodes {
        if let Some(reclaimed) = view.node.with_reclaimed_taints(&membership) {
            if let Err(e) = api.update_node(&reclaimed).await {
                tracing::warn!(node = %view.node.name, error = %e, "failed to reclaim stale reservation taint");
            }
        }
    }

    Ok(())
}

/// One-shot startup pass: strips every `CriticalAddonsOnly` entry
/// from the legacy JSON-in-annotation taint list, unconditional of
/// In-Flight Set membership. Idempotent: a second pass finds nothing left
/// to strip.
pub async fn migrate_legacy_taints(api: &dyn ClusterApi) -> Result<()> {
    let nodes = api.list_ready_nodes().await?;

    for view in nodes {
        let Some(legacy) = parse_legacy_taints(&view.node)? else { continue };
        let original_len = legacy.len();

        let retained: Vec<LegacyTaintDto> = legacy.into_iter().filter(|t| t.key != CRITICAL_ADDONS_ONLY_TAINT_KEY).collect();
        if retained.len() == original_len {
            continue;
        }

        let mut updated = view.node.clone();
        updated.annotations.insert(LEGACY_TAINTS_ANNOTATION.to_string(), serialize_legacy_taints(&retained)?);

        if let Err(e) = api.update_node(&updated).await {
            tracing::warn!(node = %view.node.name, error = %e, "failed to migrate legacy reservation taint");
        }
    }

    Ok(())
}

pub enum ReservationError {
    /// Taint failed to persist; the caller does nothing further.
    TaintPersistFailed,
    /// The workload no longer fits once re-simulated against a fresh
    /// snapshot; taint GC reclaims the now-orphaned taint.
    NoLongerFits,
    /// An eviction failed; taint cleanup is deferred to taint GC.
    EvictionFailed,
}

/// Transitions a selected node from its current resident set to "reserved
/// for `critical`", evicting `candidate.evictees`. Does not touch the
/// In-Flight Set or spawn the waiter — the caller does both only after
/// this returns `Ok`.
pub async fn reserve(
    api: &dyn ClusterApi,
    events: &dyn EventSink,
    oracle: &dyn FeasibilityOracle,
    candidate: Candidate,
    critical: &Workload,
    system_namespace: &str,
    grace_period_seconds: i64,
) -> std::result::Result<(), ReservationError> {
    let identity = critical.identity();

    // Step 1: taint and persist.
    let tainted_node = candidate.node.node.with_reservation_taint(&identity);
    if api.update_node(&tainted_node).await.is_err() {
        return Err(ReservationError::TaintPersistFailed);
    }

    // Step 2: re-simulate on a fresh snapshot.
    let fresh_residents = api.list_workloads_on_node(&tainted_node.name).await.unwrap_or_else(|e| {
        tracing::warn!(node = %tainted_node.name, error = %e, "failed to fetch fresh residents; re-simulating against the stale discovery-time snapshot");
        candidate.node.residents.clone()
    });
    match simulate_admission(&tainted_node, &fresh_residents, critical, system_namespace, oracle) {
        SimulationOutcome::DoesNotFit(_) => return Err(ReservationError::NoLongerFits),
        SimulationOutcome::Fits { evictees } => {
            // Step 3: evict.
            for evictee in &evictees {
                let effective_grace = effective_grace(grace_period_seconds, evictee.termination_grace_seconds);
                if api.delete_workload(&evictee.identity(), effective_grace).await.is_err() {
                    return Err(ReservationError::EvictionFailed);
                }
                if let Err(e) = emit_deleted_by_rescheduler(events, &evictee.identity(), &identity).await {
                    tracing::warn!(evictee = %evictee.identity(), workload = %identity, error = %e, "failed to emit DeletedByRescheduler event");
                }
            }
        }
    }

    Ok(())
}

/// Computes the grace period actually granted to an evictee:
/// - a negative configured grace never overrides the workload's own grace;
/// - a non-negative configured grace overrides only if it is smaller than
///   the workload's own (or the workload has none).
pub fn effective_grace(configured: i64, workload_grace: Option<i64>) -> Option<i64> {
    if configured < 0 {
        return workload_grace;
    }

    match workload_grace {
        Some(own) if own <= configured => Some(own),
        _ => Some(configured),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_grace_period_forces_immediate_termination() {
        assert_eq!(effective_grace(0, Some(30)), Some(0));
        assert_eq!(effective_grace(0, None), Some(0));
    }

    #[test]
    fn negative_grace_period_never_overrides() {
        assert_eq!(effective_grace(-1, Some(30)), Some(30));
        assert_eq!(effective_grace(-1, None), None);
    }

    #[test]
    fn configured_grace_overrides_only_when_smaller() {
        assert_eq!(effective_grace(10, Some(30)), Some(10));
        assert_eq!(effective_grace(10, Some(5)), Some(5));
        assert_eq!(effective_grace(10, None), Some(10));
    }
}
