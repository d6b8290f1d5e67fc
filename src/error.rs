use thiserror::Error;

/// Flat, crate-wide error type. Every fallible boundary collapses into one of
/// these variants rather than threading a per-module error tree through the
/// call stack.
#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to construct cluster API client: {0}")]
    ClientConstruction(String),

    #[error("failed to construct feasibility oracle: {0}")]
    OracleConstruction(String),

    #[error("failed to bind metrics listener on {0}: {1}")]
    MetricsBind(String, std::io::Error),

    #[error("cluster API request failed: {0}")]
    ClusterApi(#[from] ClusterApiError),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("failed to decode JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Transient failures talking to the orchestrator's control plane. These are
/// never fatal to the process — the caller logs and skips the affected item
/// for the current tick.
#[derive(Debug, Error)]
pub enum ClusterApiError {
    #[error("http transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("unexpected response status {status} from {endpoint}")]
    UnexpectedStatus { status: u16, endpoint: String },

    #[error("failed to decode response body: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("update conflicted with a concurrent modification of {0}")]
    Conflict(String),

    #[error("workload {0} not found")]
    NotFound(String),

    #[error("unknown taint effect {0:?}")]
    InvalidTaintEffect(String),
}

pub type Result<T> = std::result::Result<T, Error>;
