use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;

use critical_rescheduler::api::config::ApiConfig;
use critical_rescheduler::api::http::HttpClusterApi;
use critical_rescheduler::cli::CliArgs;
use critical_rescheduler::control_loop::{ControlLoop, ControlLoopConfig};
use critical_rescheduler::inflight::InFlightSet;
use critical_rescheduler::metrics::{self, Metrics};
use critical_rescheduler::oracle::CapacityOracle;
use critical_rescheduler::{error, logger};

/// Default capacity the reference `CapacityOracle` assumes for every node
/// when no real predicate library is wired up. Production deployments
/// supply their own `FeasibilityOracle`; this exists only so `--self-check`
/// and the binary's standalone mode have something to run.
const DEFAULT_CAPACITY_MILLICORES: i64 = 4_000;
const DEFAULT_CAPACITY_MEMORY_MB: i64 = 8_192;

#[tokio::main]
async fn main() -> ExitCode {
    let args = CliArgs::parse();
    logger::init(args.log_level.as_deref());

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "fatal error, exiting");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: CliArgs) -> error::Result<()> {
    let api_config = if args.running_in_cluster {
        ApiConfig::in_cluster()?
    } else {
        let base_url = args
            .api_base_url
            .clone()
            .ok_or_else(|| error::Error::ClientConstruction("--api-base-url is required when --running-in-cluster=false".to_string()))?;
        ApiConfig::external(base_url, args.api_token.clone())
    };

    let cluster_api = Arc::new(HttpClusterApi::new(&api_config, args.content_type())?);
    let oracle = Arc::new(CapacityOracle::new(DEFAULT_CAPACITY_MILLICORES, DEFAULT_CAPACITY_MEMORY_MB));
    let metrics = Arc::new(Metrics::new()?);
    let in_flight = Arc::new(InFlightSet::new());

    let control_loop = ControlLoop {
        api: cluster_api.clone(),
        events: cluster_api.clone(),
        oracle: oracle.clone(),
        in_flight,
        metrics: metrics.clone(),
        config: ControlLoopConfig {
            system_namespace: args.system_namespace.clone(),
            housekeeping_interval: args.housekeeping_interval,
            initial_delay: args.initial_delay,
            pod_scheduled_timeout: args.pod_scheduled_timeout,
            grace_period_seconds: args.grace_period,
            dry_run: args.self_check,
        },
    };

    if args.self_check {
        tracing::info!("running --self-check: one dry tick, no mutation beyond local in-memory state");
        control_loop.tick(0).await;
        return Ok(());
    }

    let listen_address = args.listen_address.clone();
    let metrics_for_server = metrics.clone();
    tokio::spawn(async move {
        if let Err(e) = metrics::serve(&listen_address, metrics_for_server).await {
            tracing::error!(error = %e, "metrics server failed");
        }
    });

    control_loop.run().await;

    Ok(())
}
