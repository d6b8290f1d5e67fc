//! Operator surface, via `clap` derive.

use std::time::Duration;

use clap::Parser;

use crate::api::http::ContentType;

#[derive(Debug, Parser)]
#[command(name = "critical-rescheduler", about = "Guarantees critical workloads always find a place to run")]
pub struct CliArgs {
    /// Use in-cluster service-account config instead of an external base URL/token.
    #[arg(long, default_value_t = true)]
    pub running_in_cluster: bool,

    /// Wire content type to the cluster API.
    #[arg(long, default_value = "protobuf-kubernetes")]
    pub kube_api_content_type: String,

    /// Base URL of the cluster API, required when `--running-in-cluster=false`.
    #[arg(long)]
    pub api_base_url: Option<String>,

    /// Bearer token for the cluster API, used only with `--running-in-cluster=false`.
    #[arg(long)]
    pub api_token: Option<String>,

    /// Tick period.
    #[arg(long, default_value = "10s", value_parser = parse_duration)]
    pub housekeeping_interval: Duration,

    /// Namespace scanned for critical workloads.
    #[arg(long, default_value = "kube-system")]
    pub system_namespace: String,

    /// Wait before first tick, to let existing critical workloads start on their own.
    #[arg(long, default_value = "2m", value_parser = parse_duration)]
    pub initial_delay: Duration,

    /// Waiter deadline.
    #[arg(long, default_value = "10m", value_parser = parse_duration)]
    pub pod_scheduled_timeout: Duration,

    /// Metrics endpoint `host:port`.
    #[arg(long, default_value = "127.0.0.1:9235")]
    pub listen_address: String,

    /// Seconds to grant evicted workloads; negative means "use the workload's own grace", 0 means immediate.
    #[arg(long, default_value_t = 10)]
    pub grace_period: i64,

    /// Run one dry (non-mutating) tick against the real cluster API and exit, to validate configuration.
    #[arg(long, default_value_t = false)]
    pub self_check: bool,

    /// `RUST_LOG`-style filter override.
    #[arg(long)]
    pub log_level: Option<String>,
}

impl CliArgs {
    pub fn content_type(&self) -> ContentType {
        ContentType::parse(&self.kube_api_content_type)
    }
}

fn parse_duration(raw: &str) -> Result<Duration, String> {
    humantime_parse(raw).map_err(|e| format!("invalid duration {raw:?}: {e}"))
}

/// Minimal `<number><unit>` duration parser (`s`, `m`, `h`) so the CLI
/// doesn't need to pull in a dedicated humantime dependency for five flags.
fn humantime_parse(raw: &str) -> Result<Duration, String> {
    let raw = raw.trim();
    let (digits, unit) = raw
        .find(|c: char| !c.is_ascii_digit())
        .map(|idx| raw.split_at(idx))
        .ok_or_else(|| "missing unit (expected s, m, or h)".to_string())?;

    let value: u64 = digits.parse().map_err(|_| format!("not a number: {digits:?}"))?;
    let seconds = match unit {
        "s" => value,
        "m" => value * 60,
        "h" => value * 3600,
        other => return Err(format!("unknown unit {other:?} (expected s, m, or h)")),
    };
    Ok(Duration::from_secs(seconds))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_seconds_minutes_hours() {
        assert_eq!(humantime_parse("10s").unwrap(), Duration::from_secs(10));
        assert_eq!(humantime_parse("2m").unwrap(), Duration::from_secs(120));
        assert_eq!(humantime_parse("1h").unwrap(), Duration::from_secs(3600));
    }

    #[test]
    fn rejects_missing_or_unknown_unit() {
        assert!(humantime_parse("10").is_err());
        assert!(humantime_parse("10x").is_err());
    }
}
