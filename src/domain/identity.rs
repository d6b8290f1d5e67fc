use serde::{Deserialize, Serialize};
use std::fmt;

/// `namespace/name` identity of a workload, as embedded in a reservation
/// taint's `value` field. Cheap to clone and compare; used both as a map key
/// (In-Flight Set) and as taint payload text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WorkloadIdentity(String);

impl WorkloadIdentity {
    pub fn new(namespace: impl AsRef<str>, name: impl AsRef<str>) -> Self {
        Self(format!("{}/{}", namespace.as_ref(), name.as_ref()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WorkloadIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<WorkloadIdentity> for String {
    fn from(id: WorkloadIdentity) -> Self {
        id.0
    }
}
