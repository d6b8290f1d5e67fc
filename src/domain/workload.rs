use std::collections::HashMap;

use super::identity::WorkloadIdentity;

/// Annotation carrying the legacy critical-pod marker. Present with an
/// empty-string value iff the workload is explicitly marked critical.
pub const CRITICAL_POD_ANNOTATION: &str = "scheduler.alpha.kubernetes.io/critical-pod";

/// Annotation carrying the mirror-pod marker (static pods mirrored from a
/// node-local manifest are not managed by the cluster API and must never be
/// evicted).
pub const MIRROR_POD_ANNOTATION: &str = "kubernetes.io/config.mirror";

/// Owner-reference kind used by per-node daemon controllers.
pub const DAEMONSET_OWNER_KIND: &str = "DaemonSet";

/// Priority at or above which a workload is implicitly critical, regardless
/// of annotations.
pub const SYSTEM_CRITICAL_THRESHOLD: i32 = 2_000_000_000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnerReference {
    pub kind: String,
    pub name: String,
}

/// A scheduled unit, as read from the cluster API. Treated as an immutable
/// snapshot everywhere in this crate — any mutation happens on a `.clone()`.
#[derive(Debug, Clone, PartialEq)]
pub struct Workload {
    pub namespace: String,
    pub name: String,
    pub priority: Option<i32>,
    pub annotations: HashMap<String, String>,
    pub labels: HashMap<String, String>,
    pub owner_references: Vec<OwnerReference>,
    pub bound_node: Option<String>,
    pub termination_grace_seconds: Option<i64>,
}

impl Workload {
    pub fn identity(&self) -> WorkloadIdentity {
        WorkloadIdentity::new(&self.namespace, &self.name)
    }

    pub fn is_bound(&self) -> bool {
        self.bound_node.is_some()
    }

    /// The value of the well-known `app` label, or `"unknown"`, used to
    /// label the `rescheduler_unschedulable_critical_workloads_total` metric.
    pub fn app_label(&self) -> &str {
        self.labels.get("app").map(String::as_str).unwrap_or("unknown")
    }

    fn has_empty_annotation(&self, key: &str) -> bool {
        self.annotations.get(key).is_some_and(|v| v.is_empty())
    }

    pub fn has_owner_of_kind(&self, kind: &str) -> bool {
        self.owner_references.iter().any(|r| r.kind == kind)
    }

    pub(crate) fn has_critical_pod_annotation(&self) -> bool {
        self.has_empty_annotation(CRITICAL_POD_ANNOTATION)
    }

    pub(crate) fn has_mirror_annotation(&self) -> bool {
        self.annotations.contains_key(MIRROR_POD_ANNOTATION)
    }

    pub(crate) fn has_system_critical_priority(&self) -> bool {
        self.priority.is_some_and(|p| p >= SYSTEM_CRITICAL_THRESHOLD)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn workload() -> Workload {
        Workload {
            namespace: "kube-system".into(),
            name: "crit".into(),
            priority: None,
            annotations: HashMap::new(),
            labels: HashMap::new(),
            owner_references: Vec::new(),
            bound_node: None,
            termination_grace_seconds: None,
        }
    }

    #[test]
    fn identity_is_namespace_slash_name() {
        assert_eq!(workload().identity().as_str(), "kube-system/crit");
    }

    #[test]
    fn app_label_defaults_to_unknown() {
        assert_eq!(workload().app_label(), "unknown");
    }

    #[test]
    fn app_label_reads_well_known_label() {
        let mut w = workload();
        w.labels.insert("app".into(), "nginx".into());
        assert_eq!(w.app_label(), "nginx");
    }

    #[test]
    fn critical_pod_annotation_requires_empty_value() {
        let mut w = workload();
        w.annotations.insert(CRITICAL_POD_ANNOTATION.into(), "not-empty".into());
        assert!(!w.has_critical_pod_annotation());
        w.annotations.insert(CRITICAL_POD_ANNOTATION.into(), "".into());
        assert!(w.has_critical_pod_annotation());
    }
}
