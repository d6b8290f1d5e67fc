use std::collections::HashMap;

use super::identity::WorkloadIdentity;
use super::workload::Workload;

/// Key used by the critical-reservation taint.
pub const CRITICAL_ADDONS_ONLY_TAINT_KEY: &str = "CriticalAddonsOnly";

/// Annotation that carries the legacy, JSON-serialized taint list. Stripped
/// of any `CriticalAddonsOnly` entries once at startup.
pub const LEGACY_TAINTS_ANNOTATION: &str = "scheduler.alpha.kubernetes.io/taints";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaintEffect {
    NoSchedule,
    PreferNoSchedule,
    NoExecute,
}

impl TaintEffect {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaintEffect::NoSchedule => "NoSchedule",
            TaintEffect::PreferNoSchedule => "PreferNoSchedule",
            TaintEffect::NoExecute => "NoExecute",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "NoSchedule" => Some(TaintEffect::NoSchedule),
            "PreferNoSchedule" => Some(TaintEffect::PreferNoSchedule),
            "NoExecute" => Some(TaintEffect::NoExecute),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Taint {
    pub key: String,
    pub value: String,
    pub effect: TaintEffect,
}

impl Taint {
    pub fn is_critical_reservation(&self) -> bool {
        self.key == CRITICAL_ADDONS_ONLY_TAINT_KEY && self.effect == TaintEffect::NoSchedule
    }

    /// Builds the reservation taint for a given critical workload identity.
    pub fn reservation_for(identity: &WorkloadIdentity) -> Self {
        Taint {
            key: CRITICAL_ADDONS_ONLY_TAINT_KEY.to_string(),
            value: identity.as_str().to_string(),
            effect: TaintEffect::NoSchedule,
        }
    }
}

/// A host, as read from the cluster API. Treated as an immutable snapshot
/// everywhere in this crate; any mutation happens on a `.clone()` before
/// being handed back to `ClusterApi::update_node`.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub name: String,
    pub taints: Vec<Taint>,
    pub annotations: HashMap<String, String>,
}

impl Node {
    pub fn new(name: impl Into<String>) -> Self {
        Node { name: name.into(), taints: Vec::new(), annotations: HashMap::new() }
    }

    pub fn has_any_reservation_taint(&self) -> bool {
        self.taints.iter().any(Taint::is_critical_reservation)
    }

    pub fn reservation_taint_for(&self, identity: &WorkloadIdentity) -> Option<&Taint> {
        self.taints.iter().find(|t| t.is_critical_reservation() && t.value == identity.as_str())
    }

    /// Appends the reservation taint for `identity`, returning a new node.
    /// The caller is responsible for persisting the result via `update_node`.
    pub fn with_reservation_taint(&self, identity: &WorkloadIdentity) -> Self {
        let mut next = self.clone();
        next.taints.push(Taint::reservation_for(identity));
        next
    }

    /// Removes every critical-reservation taint whose value is not
    /// `in_flight`. Returns `None` if nothing changed, so a GC pass over an
    /// already-clean node is a no-op.
    pub fn with_reclaimed_taints(&self, in_flight: &dyn Fn(&str) -> bool) -> Option<Self> {
        let retained: Vec<Taint> = self
            .taints
            .iter()
            .filter(|t| !t.is_critical_reservation() || in_flight(&t.value))
            .cloned()
            .collect();

        if retained.len() == self.taints.len() {
            None
        } else {
            let mut next = self.clone();
            next.taints = retained;
            Some(next)
        }
    }
}

/// A node together with the workloads currently bound to it, as produced by
/// the Node Pool View.
#[derive(Debug, Clone)]
pub struct NodeView {
    pub node: Node,
    pub residents: Vec<Workload>,
}

impl NodeView {
    pub fn new(node: Node, residents: Vec<Workload>) -> Self {
        NodeView { node, residents }
    }
}
