//! Cluster API client configuration.

use std::fs;
use std::path::Path;

use crate::error::{Error, Result};

const IN_CLUSTER_TOKEN_PATH: &str = "/var/run/secrets/kubernetes.io/serviceaccount/token";
const IN_CLUSTER_CA_PATH: &str = "/var/run/secrets/kubernetes.io/serviceaccount/ca.crt";
const IN_CLUSTER_HOST_ENV: &str = "KUBERNETES_SERVICE_HOST";
const IN_CLUSTER_PORT_ENV: &str = "KUBERNETES_SERVICE_PORT_HTTPS";

/// Where and how the client reaches the orchestrator's control plane.
/// Selected by the `running-in-cluster` flag.
#[derive(Debug, Clone)]
pub enum ApiConfig {
    /// Service-account token and CA bundle read from the well-known mount
    /// paths; base URL derived from the `KUBERNETES_SERVICE_HOST`/`_PORT`
    /// environment pair that the orchestrator injects into every pod.
    InCluster { base_url: String, token: String, ca_bundle: Vec<u8> },
    /// Explicit base URL and bearer token, for running the rescheduler
    /// outside the cluster it manages (development, or a management
    /// cluster pattern).
    External { base_url: String, token: Option<String> },
}

impl ApiConfig {
    pub fn in_cluster() -> Result<Self> {
        let host = std::env::var(IN_CLUSTER_HOST_ENV)
            .map_err(|_| Error::ClientConstruction(format!("{IN_CLUSTER_HOST_ENV} is not set; not running in a cluster?")))?;
        let port = std::env::var(IN_CLUSTER_PORT_ENV).unwrap_or_else(|_| "443".to_string());

        let token = read_mounted_file(IN_CLUSTER_TOKEN_PATH)?;
        let token = String::from_utf8(token)
            .map_err(|e| Error::ClientConstruction(format!("service account token is not valid UTF-8: {e}")))?;
        let ca_bundle = read_mounted_file(IN_CLUSTER_CA_PATH)?;

        Ok(ApiConfig::InCluster { base_url: format!("https://{host}:{port}"), token, ca_bundle })
    }

    pub fn external(base_url: impl Into<String>, token: Option<String>) -> Self {
        ApiConfig::External { base_url: base_url.into(), token }
    }

    pub fn base_url(&self) -> &str {
        match self {
            ApiConfig::InCluster { base_url, .. } => base_url,
            ApiConfig::External { base_url, .. } => base_url,
        }
    }

    pub fn bearer_token(&self) -> Option<&str> {
        match self {
            ApiConfig::InCluster { token, .. } => Some(token.as_str()),
            ApiConfig::External { token, .. } => token.as_deref(),
        }
    }
}

fn read_mounted_file(path: &str) -> Result<Vec<u8>> {
    fs::read(Path::new(path)).map_err(|e| Error::ClientConstruction(format!("failed to read {path}: {e}")))
}
