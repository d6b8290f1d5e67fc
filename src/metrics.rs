//! Metrics endpoint: a minimal `axum` router exporting Prometheus text
//! format via the `prometheus` crate's default registry.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use prometheus::{Encoder, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};

use crate::error::{Error, Result};

pub struct Metrics {
    registry: Registry,
    unschedulable_critical_workloads: IntCounterVec,
    workloads_deleted: IntCounter,
}

impl Metrics {
    pub fn new() -> Result<Self> {
        let registry = Registry::new();

        let unschedulable_critical_workloads = IntCounterVec::new(
            Opts::new(
                "rescheduler_unschedulable_critical_workloads_total",
                "Count of unschedulable critical workloads observed, labeled by application name",
            ),
            &["app"],
        )
        .map_err(|e| Error::Config(format!("failed to construct metric: {e}")))?;

        let workloads_deleted = IntCounter::new("rescheduler_workloads_deleted_total", "Count of workloads deleted by the rescheduler")
            .map_err(|e| Error::Config(format!("failed to construct metric: {e}")))?;

        registry
            .register(Box::new(unschedulable_critical_workloads.clone()))
            .map_err(|e| Error::Config(format!("failed to register metric: {e}")))?;
        registry
            .register(Box::new(workloads_deleted.clone()))
            .map_err(|e| Error::Config(format!("failed to register metric: {e}")))?;

        Ok(Metrics { registry, unschedulable_critical_workloads, workloads_deleted })
    }

    pub fn record_unschedulable_critical_workload(&self, app_label: &str) {
        self.unschedulable_critical_workloads.with_label_values(&[app_label]).inc();
    }

    pub fn record_workloads_deleted(&self, count: u64) {
        self.workloads_deleted.inc_by(count);
    }

    fn render(&self) -> String {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer).expect("prometheus encoding is infallible for well-formed metrics");
        String::from_utf8(buffer).expect("prometheus text encoder always emits UTF-8")
    }
}

async fn metrics_handler(State(metrics): State<Arc<Metrics>>) -> impl IntoResponse {
    ([("content-type", "text/plain; version=0.0.4")], metrics.render())
}

async fn healthz_handler() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

pub fn router(metrics: Arc<Metrics>) -> Router {
    Router::new().route("/metrics", get(metrics_handler)).route("/healthz", get(healthz_handler)).with_state(metrics)
}

/// Binds and serves the metrics router on `listen_address`. Bind failure is
/// fatal.
pub async fn serve(listen_address: &str, metrics: Arc<Metrics>) -> Result<()> {
    let addr: SocketAddr = listen_address.parse().map_err(|e| Error::Config(format!("invalid listen-address {listen_address}: {e}")))?;

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| Error::MetricsBind(listen_address.to_string(), e))?;

    tracing::info!(%listen_address, "metrics endpoint listening");

    axum::serve(listener, router(metrics))
        .await
        .map_err(|e| Error::MetricsBind(listen_address.to_string(), std::io::Error::other(e)))
}
