//! Pure, side-effect-free workload predicates.
//!
//! Every predicate here is a function of its inputs alone; calling any of
//! them `N` times with unchanged inputs returns the same result.

use super::workload::{Workload, DAEMONSET_OWNER_KIND};

pub fn is_mirror(workload: &Workload) -> bool {
    workload.has_mirror_annotation()
}

pub fn is_daemon_managed(workload: &Workload) -> bool {
    workload.has_owner_of_kind(DAEMONSET_OWNER_KIND)
}

/// A workload is critical iff it lives in `system_namespace` AND (carries
/// the critical annotation with an empty value OR has a priority at or
/// above the system-critical threshold).
pub fn is_critical(workload: &Workload, system_namespace: &str) -> bool {
    workload.namespace == system_namespace
        && (workload.has_critical_pod_annotation() || workload.has_system_critical_priority())
}

/// Protected = Mirror ∨ Daemon-managed ∨ Critical. The rescheduler never
/// deletes a Protected workload (invariant I2).
pub fn is_protected(workload: &Workload, system_namespace: &str) -> bool {
    is_mirror(workload) || is_daemon_managed(workload) || is_critical(workload, system_namespace)
}

pub fn is_evictable(workload: &Workload, system_namespace: &str) -> bool {
    !is_protected(workload, system_namespace)
}
