pub mod client;
pub mod config;
pub mod dto;
pub mod fake;
pub mod http;

pub use client::ClusterApi;
pub use config::ApiConfig;
pub use fake::FakeClusterApi;
pub use http::HttpClusterApi;
