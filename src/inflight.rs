//! In-Flight Set: the workload identities currently under an active
//! reservation.
//!
//! The only state shared between the control loop and its waiter tasks.
//! Guarded by a `tokio::sync::Mutex` so membership test, add, and remove
//! serialize without ever holding a blocking lock across an `.await`.

use std::collections::HashSet;

use tokio::sync::Mutex;

use crate::domain::WorkloadIdentity;

#[derive(Debug, Default)]
pub struct InFlightSet {
    inner: Mutex<HashSet<WorkloadIdentity>>,
}

impl InFlightSet {
    pub fn new() -> Self {
        InFlightSet { inner: Mutex::new(HashSet::new()) }
    }

    pub async fn add(&self, identity: WorkloadIdentity) {
        self.inner.lock().await.insert(identity);
    }

    pub async fn remove(&self, identity: &WorkloadIdentity) {
        self.inner.lock().await.remove(identity);
    }

    pub async fn contains(&self, identity: &WorkloadIdentity) -> bool {
        self.inner.lock().await.contains(identity)
    }

    /// Membership test against a taint's raw `value` string, used by Taint
    /// GC without having to parse it back into a `WorkloadIdentity`.
    pub async fn contains_value(&self, value: &str) -> bool {
        self.inner.lock().await.iter().any(|id| id.as_str() == value)
    }

    pub async fn snapshot(&self) -> HashSet<WorkloadIdentity> {
        self.inner.lock().await.clone()
    }
}
