//! Metrics emitted by the CMS client.

use shared::metrics_defs::{MetricDef, MetricType};

pub const UPSTREAM_REQUEST_DURATION: MetricDef = MetricDef {
    name: "upstream.request.duration",
    metric_type: MetricType::Histogram,
    description: "Time taken by one upstream CMS call, in seconds",
};

pub const RATE_LIMIT_WAITS: MetricDef = MetricDef {
    name: "upstream.rate_limit.waits",
    metric_type: MetricType::Counter,
    description: "Outbound calls that were delayed by the rate limiter",
};

pub const ALL_METRICS: &[MetricDef] = &[UPSTREAM_REQUEST_DURATION, RATE_LIMIT_WAITS];
