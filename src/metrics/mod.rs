//! Prometheus metrics for the cinema-queue service

pub mod collector;

pub use collector::{
    MessageMetrics, MetricsCollector, MetricsTimer, PerformanceMetrics, QueueMetrics,
    ServiceMetrics,
};
