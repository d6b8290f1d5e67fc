//! User-visible event reasons and the sink trait that emits them. Named to
//! match the upstream rescheduler's event reasons exactly, typo included,
//! since operators' existing alerting may key off them.

use async_trait::async_trait;

use crate::domain::WorkloadIdentity;
use crate::error::Result;

pub const REASON_POD_DOES_NOT_FIT_ANY_NODE: &str = "PodDoestFitAnyNode";
pub const REASON_DELETED_BY_RESCHEDULER: &str = "DeletedByRescheduler";

#[async_trait]
pub trait EventSink: Send + Sync {
    async fn emit(&self, subject: &WorkloadIdentity, reason: &str, message: String) -> Result<()>;
}

pub async fn emit_pod_does_not_fit_any_node(sink: &dyn EventSink, critical: &WorkloadIdentity) -> Result<()> {
    sink.emit(critical, REASON_POD_DOES_NOT_FIT_ANY_NODE, format!("No nodes are available that match all of the predicates: {critical} is unschedulable.")).await
}

pub async fn emit_deleted_by_rescheduler(sink: &dyn EventSink, evictee: &WorkloadIdentity, critical: &WorkloadIdentity) -> Result<()> {
    sink.emit(evictee, REASON_DELETED_BY_RESCHEDULER, format!("Deleted by the rescheduler in order to make room for critical workload {critical}.")).await
}
