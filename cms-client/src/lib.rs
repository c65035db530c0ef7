pub mod client;
pub mod error;
pub mod metrics_defs;
pub mod rate_limit;
pub mod types;
