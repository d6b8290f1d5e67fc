pub mod api;
pub mod candidate;
pub mod cli;
pub mod control_loop;
pub mod domain;
pub mod error;
pub mod events;
pub mod inflight;
pub mod logger;
pub mod metrics;
pub mod oracle;
pub mod reservation;
pub mod simulator;
pub mod waiter;
