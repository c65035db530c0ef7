//! Metrics emitted by the gateway.

use shared::metrics_defs::{MetricDef, MetricType};

pub const SYNC_CHUNKS_DISPATCHED: MetricDef = MetricDef {
    name: "sync.chunks.dispatched",
    metric_type: MetricType::Counter,
    description: "Chunks sent to the CMS bulk item endpoints",
};

pub const SYNC_CHUNK_FAILURES: MetricDef = MetricDef {
    name: "sync.chunks.failed",
    metric_type: MetricType::Counter,
    description: "Chunks whose dispatch was answered with an error",
};

pub const SYNC_ITEMS_DROPPED: MetricDef = MetricDef {
    name: "sync.items.dropped",
    metric_type: MetricType::Counter,
    description: "Items dropped because cleaning left no fields to send",
};

pub const ALL_METRICS: &[MetricDef] = &[
    SYNC_CHUNKS_DISPATCHED,
    SYNC_CHUNK_FAILURES,
    SYNC_ITEMS_DROPPED,
];
