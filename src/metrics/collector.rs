//! Metrics collection using Prometheus
//!
//! This module provides metrics collection for the cinema-queue service
//! using Prometheus metrics.

use crate::queue::QueueManagerStats;
use crate::types::TicketClass;
use anyhow::Result;
use prometheus::{
    HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, IntGaugeVec, Opts, Registry,
};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Main metrics collector for the queue service
#[derive(Clone)]
pub struct MetricsCollector {
    /// Prometheus registry
    registry: Arc<Registry>,

    /// Service-level metrics
    service_metrics: ServiceMetrics,

    /// Line and history metrics
    queue_metrics: QueueMetrics,

    /// Decorative message and snapshot metrics
    message_metrics: MessageMetrics,

    /// Performance metrics
    performance_metrics: PerformanceMetrics,
}

/// Service-level metrics
#[derive(Clone)]
pub struct ServiceMetrics {
    /// Service uptime in seconds
    pub uptime_seconds: IntGauge,

    /// Health check status (0=unhealthy, 1=degraded, 2=healthy)
    pub health_status: IntGauge,

    /// Component health status
    pub component_health: IntGaugeVec,
}

/// Line and history metrics
#[derive(Clone)]
pub struct QueueMetrics {
    /// Tickets issued by class
    pub tickets_issued_total: IntCounterVec,

    /// Tickets served by class
    pub tickets_served_total: IntCounterVec,

    /// Serve attempts against an empty line
    pub empty_serves_total: IntCounter,

    /// Session resets
    pub resets_total: IntCounter,

    /// Celebration milestones reached
    pub celebrations_total: IntCounter,

    /// Customers currently waiting by class
    pub waiting: IntGaugeVec,

    /// Served history length
    pub history_length: IntGauge,
}

/// Decorative message and snapshot metrics
#[derive(Clone)]
pub struct MessageMetrics {
    /// Messages attached to served tickets by source
    pub messages_total: IntCounterVec,

    /// Failed history snapshot writes
    pub snapshot_failures_total: IntCounter,
}

/// Performance metrics
#[derive(Clone)]
pub struct PerformanceMetrics {
    /// Queue operation durations
    pub operation_duration: HistogramVec,
}

impl MetricsCollector {
    /// Create a new metrics collector with default registry
    pub fn new() -> Result<Self> {
        let registry = Arc::new(Registry::new());
        Self::with_registry(registry)
    }

    /// Create a new metrics collector with custom registry
    pub fn with_registry(registry: Arc<Registry>) -> Result<Self> {
        let service_metrics = ServiceMetrics::new(&registry)?;
        let queue_metrics = QueueMetrics::new(&registry)?;
        let message_metrics = MessageMetrics::new(&registry)?;
        let performance_metrics = PerformanceMetrics::new(&registry)?;

        Ok(Self {
            registry,
            service_metrics,
            queue_metrics,
            message_metrics,
            performance_metrics,
        })
    }

    /// Get the Prometheus registry
    pub fn registry(&self) -> Arc<Registry> {
        self.registry.clone()
    }

    pub fn service(&self) -> &ServiceMetrics {
        &self.service_metrics
    }

    pub fn queue(&self) -> &QueueMetrics {
        &self.queue_metrics
    }

    pub fn messages(&self) -> &MessageMetrics {
        &self.message_metrics
    }

    pub fn performance(&self) -> &PerformanceMetrics {
        &self.performance_metrics
    }

    /// Refresh gauges from the manager's current state
    pub fn update_from_queue_stats(&self, stats: &QueueManagerStats) {
        self.queue_metrics
            .waiting
            .with_label_values(&[TicketClass::Vip.as_str()])
            .set(stats.vip_waiting as i64);

        self.queue_metrics
            .waiting
            .with_label_values(&[TicketClass::Regular.as_str()])
            .set((stats.waiting - stats.vip_waiting) as i64);

        self.queue_metrics
            .history_length
            .set(stats.history_len as i64);
    }

    /// Record a ticket being issued
    pub fn record_ticket_issued(&self, class: TicketClass) {
        self.queue_metrics
            .tickets_issued_total
            .with_label_values(&[class.as_str()])
            .inc();
    }

    /// Record a customer being served
    pub fn record_ticket_served(&self, class: TicketClass) {
        self.queue_metrics
            .tickets_served_total
            .with_label_values(&[class.as_str()])
            .inc();
    }

    pub fn record_empty_serve(&self) {
        self.queue_metrics.empty_serves_total.inc();
    }

    pub fn record_reset(&self) {
        self.queue_metrics.resets_total.inc();
    }

    pub fn record_celebration(&self) {
        self.queue_metrics.celebrations_total.inc();
    }

    /// Record where a served ticket's message came from
    pub fn record_message(&self, source: &str) {
        self.message_metrics
            .messages_total
            .with_label_values(&[source])
            .inc();
    }

    pub fn record_snapshot_failure(&self) {
        self.message_metrics.snapshot_failures_total.inc();
    }

    /// Record queue operation duration
    pub fn record_operation(&self, operation: &str, duration: Duration) {
        self.performance_metrics
            .operation_duration
            .with_label_values(&[operation])
            .observe(duration.as_secs_f64());
    }

    /// Update health status
    pub fn update_health_status(&self, status: u8) {
        self.service_metrics.health_status.set(status as i64);
    }

    /// Update component health
    pub fn update_component_health(&self, component: &str, healthy: bool) {
        let status = if healthy { 1 } else { 0 };
        self.service_metrics
            .component_health
            .with_label_values(&[component])
            .set(status);
    }

    pub fn update_uptime(&self, uptime: Duration) {
        self.service_metrics
            .uptime_seconds
            .set(uptime.as_secs() as i64);
    }

    /// Create a timer for measuring operation duration
    pub fn start_timer(&self) -> MetricsTimer {
        MetricsTimer::new()
    }
}

/// Timer for measuring operation durations
pub struct MetricsTimer {
    start: Instant,
}

impl MetricsTimer {
    fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Get the elapsed duration
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Stop the timer and return the duration
    pub fn stop(self) -> Duration {
        self.elapsed()
    }
}

impl ServiceMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        let uptime_seconds =
            IntGauge::new("cinema_queue_uptime_seconds", "Service uptime in seconds")?;
        registry.register(Box::new(uptime_seconds.clone()))?;

        let health_status = IntGauge::new(
            "cinema_queue_health_status",
            "Health status (0=unhealthy, 1=degraded, 2=healthy)",
        )?;
        registry.register(Box::new(health_status.clone()))?;

        let component_health = IntGaugeVec::new(
            Opts::new("cinema_queue_component_health", "Component health status"),
            &["component"],
        )?;
        registry.register(Box::new(component_health.clone()))?;

        Ok(Self {
            uptime_seconds,
            health_status,
            component_health,
        })
    }
}

impl QueueMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        let tickets_issued_total = IntCounterVec::new(
            Opts::new("cinema_queue_tickets_issued_total", "Total tickets issued"),
            &["class"],
        )?;
        registry.register(Box::new(tickets_issued_total.clone()))?;

        let tickets_served_total = IntCounterVec::new(
            Opts::new("cinema_queue_tickets_served_total", "Total tickets served"),
            &["class"],
        )?;
        registry.register(Box::new(tickets_served_total.clone()))?;

        let empty_serves_total = IntCounter::new(
            "cinema_queue_empty_serves_total",
            "Serve attempts on an empty line",
        )?;
        registry.register(Box::new(empty_serves_total.clone()))?;

        let resets_total = IntCounter::new("cinema_queue_resets_total", "Session resets")?;
        registry.register(Box::new(resets_total.clone()))?;

        let celebrations_total = IntCounter::new(
            "cinema_queue_celebrations_total",
            "Served-customer milestones reached",
        )?;
        registry.register(Box::new(celebrations_total.clone()))?;

        let waiting = IntGaugeVec::new(
            Opts::new("cinema_queue_waiting", "Customers currently waiting"),
            &["class"],
        )?;
        registry.register(Box::new(waiting.clone()))?;

        let history_length =
            IntGauge::new("cinema_queue_history_length", "Served history length")?;
        registry.register(Box::new(history_length.clone()))?;

        Ok(Self {
            tickets_issued_total,
            tickets_served_total,
            empty_serves_total,
            resets_total,
            celebrations_total,
            waiting,
            history_length,
        })
    }
}

impl MessageMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        let messages_total = IntCounterVec::new(
            Opts::new(
                "cinema_queue_messages_total",
                "Decorative messages attached to served tickets",
            ),
            &["source"],
        )?;
        registry.register(Box::new(messages_total.clone()))?;

        let snapshot_failures_total = IntCounter::new(
            "cinema_queue_snapshot_failures_total",
            "Failed history snapshot writes",
        )?;
        registry.register(Box::new(snapshot_failures_total.clone()))?;

        Ok(Self {
            messages_total,
            snapshot_failures_total,
        })
    }
}

impl PerformanceMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        let operation_duration = HistogramVec::new(
            HistogramOpts::new(
                "cinema_queue_operation_duration_seconds",
                "Queue operation duration",
            )
            .buckets(vec![0.0001, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0]),
            &["operation"],
        )?;
        registry.register(Box::new(operation_duration.clone()))?;

        Ok(Self { operation_duration })
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new().expect("Failed to create default metrics collector")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ticket_counters() {
        let collector = MetricsCollector::new().expect("Failed to create metrics collector");

        collector.record_ticket_issued(TicketClass::Vip);
        collector.record_ticket_issued(TicketClass::Regular);
        collector.record_ticket_issued(TicketClass::Regular);
        collector.record_ticket_served(TicketClass::Vip);
        collector.record_empty_serve();

        let issued = &collector.queue().tickets_issued_total;
        assert_eq!(issued.with_label_values(&["vip"]).get(), 1);
        assert_eq!(issued.with_label_values(&["regular"]).get(), 2);
        assert_eq!(
            collector
                .queue()
                .tickets_served_total
                .with_label_values(&["vip"])
                .get(),
            1
        );
        assert_eq!(collector.queue().empty_serves_total.get(), 1);
    }

    #[test]
    fn test_gauges_follow_queue_stats() {
        let collector = MetricsCollector::new().expect("Failed to create metrics collector");
        let stats = QueueManagerStats {
            waiting: 5,
            vip_waiting: 2,
            history_len: 7,
            ..Default::default()
        };

        collector.update_from_queue_stats(&stats);

        let waiting = &collector.queue().waiting;
        assert_eq!(waiting.with_label_values(&["vip"]).get(), 2);
        assert_eq!(waiting.with_label_values(&["regular"]).get(), 3);
        assert_eq!(collector.queue().history_length.get(), 7);
    }

    #[test]
    fn test_message_sources() {
        let collector = MetricsCollector::new().expect("Failed to create metrics collector");
        collector.record_message("generated");
        collector.record_message("fallback");
        collector.record_message("fallback");

        let messages = &collector.messages().messages_total;
        assert_eq!(messages.with_label_values(&["fallback"]).get(), 2);
        assert_eq!(messages.with_label_values(&["generated"]).get(), 1);
    }

    #[test]
    fn test_health_status_updates() {
        let collector = MetricsCollector::new().expect("Failed to create metrics collector");

        collector.update_health_status(2);
        collector.update_component_health("queue_manager", true);
        collector.update_component_health("history_snapshot", false);

        assert_eq!(collector.service().health_status.get(), 2);
        assert_eq!(
            collector
                .service()
                .component_health
                .with_label_values(&["history_snapshot"])
                .get(),
            0
        );
    }

    #[test]
    fn test_metrics_timer() {
        let collector = MetricsCollector::new().expect("Failed to create metrics collector");
        let timer = collector.start_timer();

        std::thread::sleep(Duration::from_millis(10));
        let duration = timer.elapsed();
        assert!(duration >= Duration::from_millis(10));

        collector.record_operation("serve", timer.stop());
    }
}
