//! Control Loop.
//!
//! Periodic reconciliation tying together Taint GC, Discover, Place, and a
//! second Taint GC pass. Each tick starts fresh: a per-workload failure is
//! logged and skipped, never propagated out of the tick.

use std::sync::Arc;
use std::time::Duration;

use crate::api::client::ClusterApi;
use crate::candidate::select_candidate_node;
use crate::domain::classifier::{is_critical, is_daemon_managed};
use crate::events::{emit_pod_does_not_fit_any_node, EventSink};
use crate::inflight::InFlightSet;
use crate::metrics::Metrics;
use crate::oracle::FeasibilityOracle;
use crate::reservation::{reserve, run_taint_gc, ReservationError};
use crate::waiter::run_waiter;

#[derive(Debug, Clone)]
pub struct ControlLoopConfig {
    pub system_namespace: String,
    pub housekeeping_interval: Duration,
    pub initial_delay: Duration,
    pub pod_scheduled_timeout: Duration,
    pub grace_period_seconds: i64,
    /// When true, the tick still lists nodes/workloads and runs candidate
    /// selection, but stops short of tainting, evicting, or running Taint
    /// GC's writes. Used by `--self-check` to validate wiring against a
    /// real cluster without mutating it.
    pub dry_run: bool,
}

pub struct ControlLoop {
    pub api: Arc<dyn ClusterApi>,
    pub events: Arc<dyn EventSink>,
    pub oracle: Arc<dyn FeasibilityOracle>,
    pub in_flight: Arc<InFlightSet>,
    pub metrics: Arc<Metrics>,
    pub config: ControlLoopConfig,
}

impl ControlLoop {
    /// Runs the startup migration, waits out the initial delay, then ticks
    /// forever at `housekeeping_interval`.
    pub async fn run(&self) {
        if let Err(e) = crate::reservation::migrate_legacy_taints(&*self.api).await {
            tracing::error!(error = %e, "legacy taint migration failed");
        }

        tokio::time::sleep(self.config.initial_delay).await;

        let mut tick_number: u64 = 0;
        let mut interval = tokio::time::interval(self.config.housekeeping_interval);
        loop {
            interval.tick().await;
            tick_number += 1;
            self.tick(tick_number).await;
        }
    }

    /// One reconciliation pass. Never returns an error: failures are
    /// logged and contained to their phase or workload.
    pub async fn tick(&self, tick_number: u64) {
        let span = tracing::info_span!("tick", tick_number);
        let _enter = span.enter();

        // Phase 1: Taint GC.
        if !self.config.dry_run {
            if let Err(e) = run_taint_gc(&*self.api, &self.in_flight).await {
                tracing::error!(error = %e, "taint GC (phase 1) failed");
            }
        }

        // Phase 2: Discover.
        let discovered = match self.discover().await {
            Ok(workloads) => workloads,
            Err(e) => {
                tracing::error!(error = %e, "failed to discover unscheduled workloads");
                Vec::new()
            }
        };

        // Phase 3: Place.
        for workload in discovered {
            self.place_one(&workload).await;
        }

        // Phase 4: Taint GC again (the In-Flight Set may have grown or shrunk).
        if !self.config.dry_run {
            if let Err(e) = run_taint_gc(&*self.api, &self.in_flight).await {
                tracing::error!(error = %e, "taint GC (phase 4) failed");
            }
        }
    }

    async fn discover(&self) -> crate::error::Result<Vec<crate::domain::Workload>> {
        let unscheduled = self.api.list_unscheduled_workloads(&self.config.system_namespace).await?;

        let mut out = Vec::new();
        for workload in unscheduled {
            if !is_critical(&workload, &self.config.system_namespace) || !is_daemon_managed(&workload) {
                continue;
            }
            if self.in_flight.contains(&workload.identity()).await {
                continue;
            }
            out.push(workload);
        }
        Ok(out)
    }

    async fn place_one(&self, critical: &crate::domain::Workload) {
        let identity = critical.identity();

        self.metrics.record_unschedulable_critical_workload(critical.app_label());

        let nodes = match self.api.list_ready_nodes().await {
            Ok(nodes) => nodes,
            Err(e) => {
                tracing::error!(workload = %identity, error = %e, "failed to list ready nodes");
                return;
            }
        };

        let candidate = select_candidate_node(&nodes, critical, &self.config.system_namespace, &*self.oracle);

        let Some(candidate) = candidate else {
            tracing::info!(workload = %identity, "no node fits, even after evicting every evictable resident");
            if let Err(e) = emit_pod_does_not_fit_any_node(&*self.events, &identity).await {
                tracing::warn!(workload = %identity, error = %e, "failed to emit PodDoestFitAnyNode event");
            }
            return;
        };

        let evictee_count = candidate.evictees.len();

        if self.config.dry_run {
            tracing::info!(workload = %identity, node = %candidate.node.node.name, evictions = evictee_count, "dry run: would reserve this node");
            return;
        }

        match reserve(
            &*self.api,
            &*self.events,
            &*self.oracle,
            candidate,
            critical,
            &self.config.system_namespace,
            self.config.grace_period_seconds,
        )
        .await
        {
            Ok(()) => {
                self.metrics.record_workloads_deleted(evictee_count as u64);
                self.in_flight.add(identity.clone()).await;

                tokio::spawn(run_waiter(
                    self.api.clone(),
                    self.in_flight.clone(),
                    identity.clone(),
                    critical.namespace.clone(),
                    critical.name.clone(),
                    self.config.pod_scheduled_timeout,
                ));

                tracing::info!(workload = %identity, evictions = evictee_count, "reservation placed");
            }
            Err(ReservationError::TaintPersistFailed) => {
                tracing::warn!(workload = %identity, "failed to persist reservation taint");
            }
            Err(ReservationError::NoLongerFits) => {
                tracing::warn!(workload = %identity, "workload no longer fits after re-simulation; taint GC will reclaim");
            }
            Err(ReservationError::EvictionFailed) => {
                tracing::warn!(workload = %identity, "an eviction failed mid-reservation; taint GC will reclaim");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::fake::FakeClusterApi;
    use crate::domain::node::Node;
    use crate::domain::workload::{CRITICAL_POD_ANNOTATION, DAEMONSET_OWNER_KIND};
    use crate::domain::{NodeView, OwnerReference, Workload};
    use crate::events::REASON_DELETED_BY_RESCHEDULER;
    use crate::oracle::{CapacityOracle, REQUESTED_MILLICORES_ANNOTATION};
    use std::collections::HashMap;

    fn critical_daemon(name: &str, millicores: i64) -> Workload {
        let mut annotations = HashMap::new();
        annotations.insert(CRITICAL_POD_ANNOTATION.to_string(), "".to_string());
        annotations.insert(REQUESTED_MILLICORES_ANNOTATION.to_string(), millicores.to_string());
        Workload {
            namespace: "kube-system".to_string(),
            name: name.to_string(),
            priority: None,
            annotations,
            labels: HashMap::new(),
            owner_references: vec![OwnerReference { kind: DAEMONSET_OWNER_KIND.to_string(), name: "ds".to_string() }],
            bound_node: None,
            termination_grace_seconds: None,
        }
    }

    fn victim(name: &str, millicores: i64) -> Workload {
        let mut annotations = HashMap::new();
        annotations.insert(REQUESTED_MILLICORES_ANNOTATION.to_string(), millicores.to_string());
        Workload {
            namespace: "default".to_string(),
            name: name.to_string(),
            priority: None,
            annotations,
            labels: HashMap::new(),
            owner_references: Vec::new(),
            bound_node: None,
            termination_grace_seconds: None,
        }
    }

    fn config() -> ControlLoopConfig {
        ControlLoopConfig {
            system_namespace: "kube-system".to_string(),
            housekeeping_interval: Duration::from_secs(10),
            initial_delay: Duration::from_secs(0),
            pod_scheduled_timeout: Duration::from_secs(600),
            grace_period_seconds: 10,
            dry_run: false,
        }
    }

    #[tokio::test]
    async fn empty_cluster_produces_no_mutations() {
        let api = Arc::new(FakeClusterApi::new());
        api.with_node(NodeView::new(Node::new("a"), vec![]));
        api.with_node(NodeView::new(Node::new("b"), vec![]));
        api.with_node(NodeView::new(Node::new("c"), vec![]));

        let control_loop = ControlLoop {
            api: api.clone(),
            events: api.clone(),
            oracle: Arc::new(CapacityOracle::new(1000, 1000)),
            in_flight: Arc::new(InFlightSet::new()),
            metrics: Arc::new(Metrics::new().unwrap()),
            config: config(),
        };

        control_loop.tick(1).await;

        assert!(api.events().is_empty());
        assert!(api.deletions().is_empty());
        for view in api.node_views() {
            assert!(view.node.taints.is_empty());
        }
    }

    #[tokio::test]
    async fn simple_placement_taints_and_evicts() {
        let api = Arc::new(FakeClusterApi::new());
        api.with_node(NodeView::new(Node::new("node-a"), vec![victim("victim", 900)]));
        api.with_unscheduled("kube-system", critical_daemon("crit", 100));

        let control_loop = ControlLoop {
            api: api.clone(),
            events: api.clone(),
            oracle: Arc::new(CapacityOracle::new(1000, 1000)),
            in_flight: Arc::new(InFlightSet::new()),
            metrics: Arc::new(Metrics::new().unwrap()),
            config: config(),
        };

        control_loop.tick(1).await;

        let nodes = api.node_views();
        let node_a = nodes.iter().find(|v| v.node.name == "node-a").unwrap();
        assert!(node_a.node.has_any_reservation_taint());

        let deletions = api.deletions();
        assert_eq!(deletions.len(), 1);
        assert_eq!(deletions[0].identity.as_str(), "default/victim");
        assert_eq!(deletions[0].grace_period_seconds, Some(10));

        let events = api.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].reason, REASON_DELETED_BY_RESCHEDULER);

        assert!(control_loop.in_flight.contains_value("kube-system/crit").await);
    }

    #[tokio::test]
    async fn no_node_fits_emits_event_and_makes_no_changes() {
        let api = Arc::new(FakeClusterApi::new());
        api.with_node(NodeView::new(Node::new("node-a"), vec![]));
        api.with_unscheduled("kube-system", critical_daemon("crit", 10_000));

        let control_loop = ControlLoop {
            api: api.clone(),
            events: api.clone(),
            oracle: Arc::new(CapacityOracle::new(1000, 1000)),
            in_flight: Arc::new(InFlightSet::new()),
            metrics: Arc::new(Metrics::new().unwrap()),
            config: config(),
        };

        control_loop.tick(1).await;

        assert!(api.deletions().is_empty());
        let events = api.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].reason, crate::events::REASON_POD_DOES_NOT_FIT_ANY_NODE);
        for view in api.node_views() {
            assert!(!view.node.has_any_reservation_taint());
        }
    }

    #[tokio::test]
    async fn dry_run_selects_candidate_without_mutating() {
        let api = Arc::new(FakeClusterApi::new());
        api.with_node(NodeView::new(Node::new("node-a"), vec![victim("victim", 900)]));
        api.with_unscheduled("kube-system", critical_daemon("crit", 100));

        let mut cfg = config();
        cfg.dry_run = true;

        let control_loop = ControlLoop {
            api: api.clone(),
            events: api.clone(),
            oracle: Arc::new(CapacityOracle::new(1000, 1000)),
            in_flight: Arc::new(InFlightSet::new()),
            metrics: Arc::new(Metrics::new().unwrap()),
            config: cfg,
        };

        control_loop.tick(1).await;

        assert!(api.deletions().is_empty());
        assert!(api.events().is_empty());
        for view in api.node_views() {
            assert!(!view.node.has_any_reservation_taint());
        }
    }
}
